//! Closed-form yield-to-maturity approximation.
//!
//! `approximate_ytm` is the textbook current-yield approximation
//!
//! ```text
//! ytm ~ [C + (F - P) / n] / [(F + P) / 2]
//! ```
//!
//! It is not a root-find on the pricing equation. For bonds trading far from
//! nominal (deep discount or large premium) it can differ materially from the
//! true YTM; callers needing the exact yield must solve the pricing equation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::QuantFinanceError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Years};
use crate::QuantFinanceResult;

/// Distance from nominal (as a fraction) beyond which the approximation is flagged.
const WIDE_PRICE_THRESHOLD: Decimal = dec!(0.20);

/// Input for the yield approximation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YieldApproximationInput {
    pub nominal: Money,
    /// Observed market price of the bond
    pub market_price: Money,
    /// Annual coupon rate as a decimal
    pub coupon_rate: Rate,
    pub maturity_years: Years,
}

/// Output of the yield approximation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YieldApproximationOutput {
    /// Approximate annual yield to maturity
    pub approximate_ytm: Rate,
    /// Annual coupon / market price; absent when the market price is zero
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_yield: Option<Rate>,
    /// market_price / nominal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_to_nominal: Option<Decimal>,
}

/// Approximate annual YTM from market price.
pub fn approximate_ytm(
    nominal: Money,
    market_price: Money,
    coupon_rate: Rate,
    maturity_years: Years,
) -> QuantFinanceResult<Rate> {
    if maturity_years <= Decimal::ZERO {
        return Err(QuantFinanceError::bond_spec(
            "maturity_years",
            "Maturity must be positive",
        ));
    }
    let midpoint = nominal
        .checked_add(market_price)
        .map(|sum| sum / dec!(2))
        .ok_or_else(|| QuantFinanceError::computation("approximate YTM: nominal + market_price"))?;
    if midpoint.is_zero() {
        return Err(QuantFinanceError::bond_spec(
            "market_price",
            "nominal + market_price must be non-zero",
        ));
    }

    let pull_to_par = nominal
        .checked_sub(market_price)
        .and_then(|gap| gap.checked_div(maturity_years));
    nominal
        .checked_mul(coupon_rate)
        .zip(pull_to_par)
        .and_then(|(coupon_payment, pull)| coupon_payment.checked_add(pull))
        .and_then(|numerator| numerator.checked_div(midpoint))
        .ok_or_else(|| QuantFinanceError::computation("approximate YTM: numerator / midpoint"))
}

/// Approximate YTM with current yield and a warning when the price is far from nominal.
pub fn calculate_approximate_yield(
    input: &YieldApproximationInput,
) -> QuantFinanceResult<ComputationOutput<YieldApproximationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let approximate_ytm = approximate_ytm(
        input.nominal,
        input.market_price,
        input.coupon_rate,
        input.maturity_years,
    )?;

    let current_yield = if input.market_price.is_zero() {
        warnings.push("Market price is zero; current yield undefined".into());
        None
    } else {
        let cy = input
            .nominal
            .checked_mul(input.coupon_rate)
            .and_then(|annual_coupon| annual_coupon.checked_div(input.market_price))
            .ok_or_else(|| QuantFinanceError::computation("current yield: annual coupon / price"))?;
        Some(cy)
    };

    let price_to_nominal = if input.nominal.is_zero() {
        None
    } else {
        let ratio = input.market_price.checked_div(input.nominal).ok_or_else(|| {
            QuantFinanceError::computation("price to nominal: market_price / nominal")
        })?;
        Some(ratio)
    };
    if let Some(ratio) = price_to_nominal {
        let far_from_par = ratio
            .checked_sub(Decimal::ONE)
            .map_or(true, |gap| gap.abs() > WIDE_PRICE_THRESHOLD);
        if far_from_par {
            warnings.push(format!(
                "Market price is {} times nominal; the closed-form approximation diverges from the true YTM for deep discount/premium bonds",
                ratio.round_dp(4)
            ));
        }
    }

    let output = YieldApproximationOutput {
        approximate_ytm,
        current_yield,
        price_to_nominal,
    };
    tracing::debug!(ytm = %output.approximate_ytm, "approximate yield");

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Approximate YTM — [C + (F - P)/n] / [(F + P)/2]",
        input,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_par_returns_coupon_rate_exactly() {
        let ytm = approximate_ytm(dec!(1000), dec!(1000), dec!(0.06), dec!(10)).unwrap();
        assert_eq!(ytm, dec!(0.06));
    }

    #[test]
    fn test_discount_bond_yield_above_coupon() {
        // (50 + 100/5) / 950 = 0.0736842...
        let ytm = approximate_ytm(dec!(1000), dec!(900), dec!(0.05), dec!(5)).unwrap();
        assert!((ytm - dec!(0.0736842)).abs() < dec!(0.0000001), "got {ytm}");
    }

    #[test]
    fn test_premium_bond_yield_below_coupon() {
        let ytm = approximate_ytm(dec!(1000), dec!(1100), dec!(0.05), dec!(5)).unwrap();
        assert!(ytm < dec!(0.05));
    }

    #[test]
    fn test_zero_maturity_rejected() {
        assert!(matches!(
            approximate_ytm(dec!(1000), dec!(950), dec!(0.05), dec!(0)),
            Err(QuantFinanceError::InvalidBondSpec { .. })
        ));
    }

    #[test]
    fn test_zero_midpoint_rejected() {
        assert!(matches!(
            approximate_ytm(dec!(1000), dec!(-1000), dec!(0.05), dec!(5)),
            Err(QuantFinanceError::InvalidBondSpec { .. })
        ));
    }

    #[test]
    fn test_overflowing_midpoint_is_computation_error() {
        let huge = dec!(70000000000000000000000000000);
        assert!(matches!(
            approximate_ytm(huge, huge, dec!(0.05), dec!(5)),
            Err(QuantFinanceError::ComputationError { .. })
        ));
    }

    #[test]
    fn test_overflowing_coupon_is_computation_error() {
        assert!(matches!(
            approximate_ytm(dec!(10000000000000000000000000000), dec!(1), dec!(10), dec!(5)),
            Err(QuantFinanceError::ComputationError { .. })
        ));
    }

    #[test]
    fn test_envelope_overflowing_price_ratio_is_computation_error() {
        // The YTM itself fits; market_price / nominal does not
        let input = YieldApproximationInput {
            nominal: dec!(0.0000000001),
            market_price: dec!(10000000000000000000000000000),
            coupon_rate: dec!(0),
            maturity_years: dec!(1000000000000000000),
        };
        assert!(matches!(
            calculate_approximate_yield(&input),
            Err(QuantFinanceError::ComputationError { .. })
        ));
    }

    #[test]
    fn test_envelope_warns_on_deep_discount() {
        let input = YieldApproximationInput {
            nominal: dec!(1000),
            market_price: dec!(600),
            coupon_rate: dec!(0.02),
            maturity_years: dec!(20),
        };
        let out = calculate_approximate_yield(&input).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.result.price_to_nominal, Some(dec!(0.6)));
    }

    #[test]
    fn test_envelope_near_par_has_no_warning() {
        let input = YieldApproximationInput {
            nominal: dec!(1000),
            market_price: dec!(980),
            coupon_rate: dec!(0.05),
            maturity_years: dec!(8),
        };
        let out = calculate_approximate_yield(&input).unwrap();
        assert!(out.warnings.is_empty());
        let cy = out.result.current_yield.unwrap();
        assert!((cy - dec!(50) / dec!(980)).abs() < dec!(0.0000000001));
    }
}
