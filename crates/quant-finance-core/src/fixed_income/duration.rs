use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::bonds::{self, BondSpec, PeriodTerms};
use crate::error::QuantFinanceError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::QuantFinanceResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Yield bump used for the central second difference in [`convexity`].
pub const CONVEXITY_BUMP: Rate = dec!(0.01);

const BASIS_POINT: Rate = dec!(0.0001);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// First-order yield sensitivity of a bond.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationMeasures {
    /// PV-weighted average time to the bond's cashflows, in years
    pub macaulay_duration: Decimal,
    /// Macaulay duration / (1 + y/freq) -- percentage price sensitivity
    pub modified_duration: Decimal,
}

/// Output of the bond risk calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondRiskOutput {
    /// Present value at the stated YTM
    pub price: Money,
    pub macaulay_duration: Decimal,
    pub modified_duration: Decimal,
    /// Finite-difference convexity with a 100 bp bump
    pub convexity: Decimal,
    /// Dollar value of one basis point (modified_duration * price * 0.0001)
    pub dv01: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Macaulay and modified duration.
///
/// macaulay = (sum_{t=1..N} t * CF_t / (1+r)^t) / price / freq
pub fn duration(spec: &BondSpec) -> QuantFinanceResult<DurationMeasures> {
    let price = bonds::price(spec)?;
    ensure_positive_price(price, "Macaulay duration")?;

    let terms = PeriodTerms::from_spec(spec)?;
    let mut weighted_sum = Decimal::ZERO;
    terms.for_each_discounted(|t, pv| {
        weighted_sum = Decimal::from(t)
            .checked_mul(pv)
            .and_then(|weighted| weighted_sum.checked_add(weighted))
            .ok_or_else(|| {
                QuantFinanceError::computation(format!(
                    "Macaulay duration: weighted sum overflows at period {t}"
                ))
            })?;
        Ok(())
    })?;

    let freq = Decimal::from(spec.payment_frequency);
    let macaulay_duration = weighted_sum
        .checked_div(price)
        .map(|d| d / freq)
        .ok_or_else(|| QuantFinanceError::computation("Macaulay duration: weighted sum / price"))?;
    let modified_duration = macaulay_duration
        .checked_div(terms.one_plus_r())
        .ok_or_else(|| QuantFinanceError::computation("modified duration: macaulay / (1 + r)"))?;

    Ok(DurationMeasures {
        macaulay_duration,
        modified_duration,
    })
}

/// Convexity estimated by a central second difference of price in yield:
///
/// C = (P(y + dy) + P(y - dy) - 2 P(y)) / (P(y) * dy^2), dy = [`CONVEXITY_BUMP`]
///
/// This is a numerical approximation; it is not the analytic second derivative.
pub fn convexity(spec: &BondSpec) -> QuantFinanceResult<Decimal> {
    let price = bonds::price(spec)?;
    ensure_positive_price(price, "convexity")?;

    let ytm = spec.yield_to_maturity;
    let bumped = |y: Option<Decimal>| {
        y.ok_or_else(|| QuantFinanceError::computation("convexity: bumped yield overflows"))
    };
    let price_up = bonds::price(&spec.with_yield(bumped(ytm.checked_add(CONVEXITY_BUMP))?))?;
    let price_down = bonds::price(&spec.with_yield(bumped(ytm.checked_sub(CONVEXITY_BUMP))?))?;

    price_up
        .checked_add(price_down)
        .and_then(|sum| sum.checked_sub(price.checked_mul(dec!(2))?))
        .and_then(|numerator| numerator.checked_div(price * CONVEXITY_BUMP * CONVEXITY_BUMP))
        .ok_or_else(|| QuantFinanceError::computation("convexity: second difference / price"))
}

/// Price, duration, convexity and DV01 for a fixed-coupon bond.
pub fn calculate_risk_metrics(
    spec: &BondSpec,
) -> QuantFinanceResult<ComputationOutput<BondRiskOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let price = bonds::price(spec)?;
    let DurationMeasures {
        macaulay_duration,
        modified_duration,
    } = duration(spec)?;
    let convexity = convexity(spec)?;
    let dv01 = modified_duration
        .checked_mul(price)
        .map(|dollar_duration| dollar_duration * BASIS_POINT)
        .ok_or_else(|| QuantFinanceError::computation("DV01: modified duration * price"))?;

    if spec.yield_to_maturity < CONVEXITY_BUMP {
        warnings.push(format!(
            "Convexity bump takes the yield below zero ({} - {})",
            spec.yield_to_maturity, CONVEXITY_BUMP
        ));
    }

    let output = BondRiskOutput {
        price,
        macaulay_duration,
        modified_duration,
        convexity,
        dv01,
    };
    tracing::debug!(
        macaulay = %output.macaulay_duration,
        modified = %output.modified_duration,
        convexity = %output.convexity,
        "bond risk metrics"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "bond": spec,
        "convexity_bump": CONVEXITY_BUMP.to_string(),
        "settlement": "assumed on coupon date (no accrued interest)",
    });

    Ok(with_metadata(
        "Bond Duration & Convexity (Macaulay, modified, finite-difference convexity)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

fn ensure_positive_price(price: Money, context: &str) -> QuantFinanceResult<()> {
    if price <= Decimal::ZERO {
        return Err(QuantFinanceError::computation(format!(
            "{context}: bond price {price} is not positive"
        )));
    }
    Ok(())
}
