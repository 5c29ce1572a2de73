//! Present value of fixed-coupon bullet bonds.
//!
//! The cashflow schedule is never materialised: each period's coupon (plus the
//! nominal on the final period) is discounted inline while the discount factor
//! is accumulated by iterative multiplication.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::QuantFinanceError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Years};
use crate::QuantFinanceResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Semi-annual coupons unless stated otherwise.
pub const DEFAULT_PAYMENT_FREQUENCY: u32 = 2;

/// Relative distance from nominal within which a bond is reported as priced at par.
const PAR_TOLERANCE: Decimal = dec!(0.000000001);

fn default_payment_frequency() -> u32 {
    DEFAULT_PAYMENT_FREQUENCY
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Terms of a fixed-coupon bond together with the yield it is valued at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondSpec {
    /// Face value repaid at maturity (e.g. 1000)
    pub nominal: Money,
    /// Annual coupon rate as a decimal (0.06 = 6%)
    pub coupon_rate: Rate,
    /// Annual yield to maturity as a decimal
    pub yield_to_maturity: Rate,
    /// Years to maturity; `maturity_years * payment_frequency` must be a whole number
    pub maturity_years: Years,
    /// Coupon payments per year
    #[serde(default = "default_payment_frequency")]
    pub payment_frequency: u32,
}

impl BondSpec {
    /// A semi-annual bond.
    pub fn new(
        nominal: Money,
        coupon_rate: Rate,
        yield_to_maturity: Rate,
        maturity_years: Years,
    ) -> Self {
        BondSpec {
            nominal,
            coupon_rate,
            yield_to_maturity,
            maturity_years,
            payment_frequency: DEFAULT_PAYMENT_FREQUENCY,
        }
    }

    pub fn with_payment_frequency(mut self, payment_frequency: u32) -> Self {
        self.payment_frequency = payment_frequency;
        self
    }

    /// The same bond valued at a different yield.
    pub fn with_yield(&self, yield_to_maturity: Rate) -> Self {
        BondSpec {
            yield_to_maturity,
            ..self.clone()
        }
    }

    /// Coupon paid each period: `nominal * coupon_rate / payment_frequency`.
    pub fn coupon_payment(&self) -> QuantFinanceResult<Money> {
        if self.payment_frequency == 0 {
            return Ok(Decimal::ZERO);
        }
        self.nominal
            .checked_mul(self.coupon_rate)
            .and_then(|annual| annual.checked_div(Decimal::from(self.payment_frequency)))
            .ok_or_else(|| {
                QuantFinanceError::computation(format!(
                    "coupon payment: {} * {} overflows",
                    self.nominal, self.coupon_rate
                ))
            })
    }

    /// Discount rate per coupon period: `yield_to_maturity / payment_frequency`.
    pub fn periodic_yield(&self) -> Rate {
        if self.payment_frequency == 0 {
            return Decimal::ZERO;
        }
        self.yield_to_maturity / Decimal::from(self.payment_frequency)
    }

    /// Number of coupon periods, `maturity_years * payment_frequency`.
    pub fn total_periods(&self) -> QuantFinanceResult<u32> {
        if self.payment_frequency == 0 {
            return Err(QuantFinanceError::bond_spec(
                "payment_frequency",
                "Payment frequency must be at least 1",
            ));
        }
        if self.maturity_years <= Decimal::ZERO {
            return Err(QuantFinanceError::bond_spec(
                "maturity_years",
                "Maturity must be positive",
            ));
        }
        let periods = self
            .maturity_years
            .checked_mul(Decimal::from(self.payment_frequency))
            .ok_or_else(|| {
                QuantFinanceError::bond_spec("maturity_years", "Period count overflows")
            })?;
        if !periods.fract().is_zero() {
            return Err(QuantFinanceError::bond_spec(
                "maturity_years",
                format!(
                    "maturity_years * payment_frequency must be a whole number of periods, got {periods}"
                ),
            ));
        }
        periods.to_u32().filter(|n| *n > 0).ok_or_else(|| {
            QuantFinanceError::bond_spec(
                "maturity_years",
                format!("Period count {periods} is out of range"),
            )
        })
    }
}

/// Whether the bond trades above, at, or below its nominal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceLevel {
    Premium,
    Par,
    Discount,
}

/// Output of bond pricing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondPricingOutput {
    /// Present value of all remaining cashflows at the stated yield
    pub price: Money,
    /// Coupon paid each period
    pub coupon_payment: Money,
    /// Number of coupon periods discounted
    pub total_periods: u32,
    /// Yield per coupon period
    pub periodic_yield: Rate,
    /// Annual coupon / price
    pub current_yield: Rate,
    pub price_level: PriceLevel,
}

// ---------------------------------------------------------------------------
// Discounting
// ---------------------------------------------------------------------------

/// Validated per-period terms of a bond, ready to be discounted.
pub(crate) struct PeriodTerms {
    coupon: Money,
    nominal: Money,
    one_plus_r: Decimal,
    periods: u32,
}

impl PeriodTerms {
    pub(crate) fn from_spec(spec: &BondSpec) -> QuantFinanceResult<Self> {
        validate_spec(spec)?;
        let one_plus_r = Decimal::ONE
            .checked_add(spec.periodic_yield())
            .ok_or_else(|| QuantFinanceError::computation("1 + periodic yield overflows"))?;
        Ok(PeriodTerms {
            coupon: spec.coupon_payment()?,
            nominal: spec.nominal,
            one_plus_r,
            periods: spec.total_periods()?,
        })
    }

    pub(crate) fn one_plus_r(&self) -> Decimal {
        self.one_plus_r
    }

    /// Calls `visit(t, pv)` with the present value of the cashflow paid in each
    /// period `t = 1..=periods`, stopping at the first error.
    pub(crate) fn for_each_discounted(
        &self,
        mut visit: impl FnMut(u32, Money) -> QuantFinanceResult<()>,
    ) -> QuantFinanceResult<()> {
        let mut df = Decimal::ONE;
        for t in 1..=self.periods {
            df = df.checked_mul(self.one_plus_r).ok_or_else(|| {
                QuantFinanceError::computation(format!("discount factor overflow at period {t}"))
            })?;
            let cf = if t == self.periods {
                self.coupon.checked_add(self.nominal).ok_or_else(|| {
                    QuantFinanceError::computation("final coupon plus nominal overflows")
                })?
            } else {
                self.coupon
            };
            let pv = cf.checked_div(df).ok_or_else(|| {
                QuantFinanceError::computation(format!(
                    "discounting cashflow at period {t}: discount factor {df}"
                ))
            })?;
            visit(t, pv)?;
        }
        Ok(())
    }
}

fn validate_spec(spec: &BondSpec) -> QuantFinanceResult<()> {
    if spec.nominal <= Decimal::ZERO {
        return Err(QuantFinanceError::bond_spec(
            "nominal",
            "Nominal must be positive",
        ));
    }
    if spec.coupon_rate < Decimal::ZERO {
        return Err(QuantFinanceError::bond_spec(
            "coupon_rate",
            "Coupon rate cannot be negative",
        ));
    }
    // Also covers payment_frequency and maturity_years.
    spec.total_periods()?;
    if spec.periodic_yield() <= dec!(-1) {
        return Err(QuantFinanceError::bond_spec(
            "yield_to_maturity",
            format!(
                "Periodic discount rate {} must be greater than -1",
                spec.periodic_yield()
            ),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Present value of the bond at its yield to maturity.
///
/// PV = sum_{t=1..N} c / (1+r)^t + nominal / (1+r)^N
pub fn price(spec: &BondSpec) -> QuantFinanceResult<Money> {
    let terms = PeriodTerms::from_spec(spec)?;
    let mut pv = Decimal::ZERO;
    terms.for_each_discounted(|t, cf_pv| {
        pv = pv.checked_add(cf_pv).ok_or_else(|| {
            QuantFinanceError::computation(format!("present value overflows at period {t}"))
        })?;
        Ok(())
    })?;
    Ok(pv)
}

/// Price a bond and report its coupon, period count, current yield and
/// premium/discount classification.
pub fn price_bond(spec: &BondSpec) -> QuantFinanceResult<ComputationOutput<BondPricingOutput>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    let price = price(spec)?;
    if price <= Decimal::ZERO {
        return Err(QuantFinanceError::computation(
            "current yield: bond price is not positive",
        ));
    }

    let current_yield = spec
        .nominal
        .checked_mul(spec.coupon_rate)
        .and_then(|annual_coupon| annual_coupon.checked_div(price))
        .ok_or_else(|| QuantFinanceError::computation("current yield: annual coupon / price"))?;

    let price_level = if (price - spec.nominal).abs() <= spec.nominal * PAR_TOLERANCE {
        PriceLevel::Par
    } else if price > spec.nominal {
        PriceLevel::Premium
    } else {
        PriceLevel::Discount
    };

    let output = BondPricingOutput {
        price,
        coupon_payment: spec.coupon_payment()?,
        total_periods: spec.total_periods()?,
        periodic_yield: spec.periodic_yield(),
        current_yield,
        price_level,
    };
    tracing::debug!(price = %output.price, periods = output.total_periods, "bond priced");

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Bond Pricing — PV of periodic coupons and nominal at YTM",
        spec,
        warnings,
        elapsed,
        output,
    ))
}
