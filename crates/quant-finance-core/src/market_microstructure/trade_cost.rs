//! Trade execution cost distribution.
//!
//! Costs below the mode `mu` follow a half-normal with scale `sigma`, costs at
//! or above it a half-Laplace (exponential) with scale `rho`. The mixing
//! weight `h` puts mass `h` on the left half and `1 - h` on the right:
//!
//! ```text
//! f(x) = 2h / (sqrt(2 pi) sigma) * exp(-(x - mu)^2 / (2 sigma^2))   x <  mu
//! f(x) = (1 - h) / rho * exp(-(x - mu) / rho)                       x >= mu
//! ```
//!
//! Both scales are calibrated from the quoted spread, an odd-lot transform of
//! the order size, and a sub-linear power of trade size over participation.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::QuantFinanceError;
use crate::types::{with_metadata, ComputationOutput};
use crate::QuantFinanceResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const SQRT_TWO_OVER_PI: Decimal = dec!(0.7978845608028653558798921199);
const SQRT_TWO_PI: Decimal = dec!(2.506628274631000502415765285);

/// exp(-t) is below Decimal's smallest magnitude (1e-28) past this point.
const EXP_UNDERFLOW: Decimal = dec!(64);

pub const DEFAULT_POINTS_PER_SIDE: usize = 500;

/// Width of each sampled tail in units of its scale parameter.
const CURVE_SCALE_MULTIPLE: Decimal = dec!(3);

fn default_points_per_side() -> usize {
    DEFAULT_POINTS_PER_SIDE
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Linear coefficients `A * (1 - phi1) + B * phi2 * size_term + C` for one scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleCoefficients {
    pub a: Decimal,
    pub b: Decimal,
    pub c: Decimal,
}

/// Calibration inputs for the trade-cost scales.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeCostParams {
    /// Quoted bid/ask spread
    pub spread: Decimal,
    /// Order size (q)
    pub order_size: Decimal,
    /// Odd-lot sensitivity scale (q0)
    pub reference_size: Decimal,
    /// Trade size in units
    pub trade_size: Decimal,
    /// Participation volume the trade size is measured against (V)
    pub participation_rate: Decimal,
    /// Size exponent; empirically sub-linear (e.g. 0.4)
    pub alpha: Decimal,
    /// A1, B1, C1
    pub sigma_coefficients: ScaleCoefficients,
    /// A2, B2, C2
    pub rho_coefficients: ScaleCoefficients,
}

/// Input for sampling the trade-cost density.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeCostInput {
    pub params: TradeCostParams,
    /// Mode of the distribution
    #[serde(default)]
    pub mu: Decimal,
    #[serde(default = "default_points_per_side")]
    pub points_per_side: usize,
}

/// A sampled point of the density.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityPoint {
    pub x: Decimal,
    pub density: Decimal,
}

/// Calibrated distribution and its sampled density.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeCostOutput {
    pub sigma: Decimal,
    pub rho: Decimal,
    /// Mass on the half-normal side
    pub h: Decimal,
    /// q / (1 + q) with q = order_size / reference_size
    pub phi: Decimal,
    /// (trade_size / participation_rate)^alpha
    pub size_term: Decimal,
    /// mu - h * sigma * sqrt(2/pi) + (1 - h) * rho
    pub mean_cost: Decimal,
    /// Density on [mu - 3 sigma, mu]
    pub left_tail: Vec<DensityPoint>,
    /// Density on [mu, mu + 3 rho]
    pub right_tail: Vec<DensityPoint>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Odd-lot transform applied to the `(1 - phi1)` term: `x / (1 + x)`.
pub fn phi1(x: Decimal) -> Decimal {
    x / (Decimal::ONE + x)
}

/// Transform applied to the size term.
// TODO: confirm the intended phi2 with the model owner; it currently matches phi1.
pub fn phi2(x: Decimal) -> Decimal {
    x / (Decimal::ONE + x)
}

/// Calibrate `(sigma, rho)` from spread, order size and trade size.
pub fn sigma_rho(params: &TradeCostParams) -> QuantFinanceResult<(Decimal, Decimal)> {
    let terms = CalibrationTerms::from_params(params)?;
    let sigma = params.spread * terms.scale(&params.sigma_coefficients);
    let rho = params.spread * terms.scale(&params.rho_coefficients);

    if sigma <= Decimal::ZERO {
        return Err(QuantFinanceError::input(
            "sigma_coefficients",
            format!("Calibrated sigma must be positive, got {sigma}"),
        ));
    }
    if rho <= Decimal::ZERO {
        return Err(QuantFinanceError::input(
            "rho_coefficients",
            format!("Calibrated rho must be positive, got {rho}"),
        ));
    }
    Ok((sigma, rho))
}

/// Mass on the half-normal side: `sigma / (sigma + rho * sqrt(2/pi))`.
pub fn mixing_weight(sigma: Decimal, rho: Decimal) -> QuantFinanceResult<Decimal> {
    validate_scales(sigma, rho)?;
    Ok(sigma / (sigma + rho * SQRT_TWO_OVER_PI))
}

/// Probability density of trade cost `x`.
pub fn density(
    x: Decimal,
    mu: Decimal,
    sigma: Decimal,
    rho: Decimal,
    h: Decimal,
) -> QuantFinanceResult<Decimal> {
    validate_scales(sigma, rho)?;
    if h < Decimal::ZERO || h > Decimal::ONE {
        return Err(QuantFinanceError::input(
            "h",
            format!("Mixing weight must lie in [0, 1], got {h}"),
        ));
    }

    // A distance past Decimal's range puts the exponential below its resolution.
    if x < mu {
        let exponent = mu
            .checked_sub(x)
            .and_then(|d| d.checked_div(sigma))
            .and_then(|z| z.checked_mul(z));
        let Some(exponent) = exponent else {
            return Ok(Decimal::ZERO);
        };
        let scale = dec!(2) * h / SQRT_TWO_PI / sigma;
        Ok(scale * decay(exponent / dec!(2))?)
    } else {
        let Some(exponent) = x.checked_sub(mu).and_then(|d| d.checked_div(rho)) else {
            return Ok(Decimal::ZERO);
        };
        Ok((Decimal::ONE - h) / rho * decay(exponent)?)
    }
}

/// Calibrate the distribution and sample its density on both sides of `mu`.
pub fn trade_cost_curve(
    input: &TradeCostInput,
) -> QuantFinanceResult<ComputationOutput<TradeCostOutput>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    if input.points_per_side < 2 {
        return Err(QuantFinanceError::input(
            "points_per_side",
            "At least 2 points per side are required",
        ));
    }

    let terms = CalibrationTerms::from_params(&input.params)?;
    let (sigma, rho) = sigma_rho(&input.params)?;
    let h = mixing_weight(sigma, rho)?;
    let mu = input.mu;

    let left_tail = sample(
        mu - CURVE_SCALE_MULTIPLE * sigma,
        mu,
        input.points_per_side,
        |x| density(x, mu, sigma, rho, h),
    )?;
    let right_tail = sample(
        mu,
        mu + CURVE_SCALE_MULTIPLE * rho,
        input.points_per_side,
        |x| density(x, mu, sigma, rho, h),
    )?;

    let mean_cost = mu - h * sigma * SQRT_TWO_OVER_PI + (Decimal::ONE - h) * rho;

    let output = TradeCostOutput {
        sigma,
        rho,
        h,
        phi: terms.phi,
        size_term: terms.size_term,
        mean_cost,
        left_tail,
        right_tail,
    };
    tracing::debug!(sigma = %output.sigma, rho = %output.rho, h = %output.h, "trade cost calibrated");

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Trade Cost Distribution — half-normal (x < mu) / half-Laplace (x >= mu) mixture",
        &serde_json::json!({
            "params": input.params,
            "mu": mu.to_string(),
            "points_per_side": input.points_per_side,
            "phi1_equals_phi2": true,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Size-dependent factors shared by the sigma and rho calibrations.
struct CalibrationTerms {
    phi: Decimal,
    size_term: Decimal,
}

impl CalibrationTerms {
    fn from_params(params: &TradeCostParams) -> QuantFinanceResult<Self> {
        if params.reference_size <= Decimal::ZERO {
            return Err(QuantFinanceError::input(
                "reference_size",
                "Reference size must be positive",
            ));
        }
        if params.order_size < Decimal::ZERO {
            return Err(QuantFinanceError::input(
                "order_size",
                "Order size cannot be negative",
            ));
        }
        if params.participation_rate <= Decimal::ZERO {
            return Err(QuantFinanceError::input(
                "participation_rate",
                "Participation rate must be positive",
            ));
        }

        let q = params.order_size / params.reference_size;
        let size_ratio = params.trade_size / params.participation_rate;
        Ok(CalibrationTerms {
            // phi1 and phi2 coincide, so one value serves both terms.
            phi: phi1(q),
            size_term: size_power(size_ratio, params.alpha)?,
        })
    }

    fn scale(&self, k: &ScaleCoefficients) -> Decimal {
        k.a * (Decimal::ONE - self.phi) + k.b * self.phi * self.size_term + k.c
    }
}

fn size_power(ratio: Decimal, alpha: Decimal) -> QuantFinanceResult<Decimal> {
    if ratio < Decimal::ZERO {
        return Err(QuantFinanceError::input(
            "trade_size",
            format!("trade_size / participation_rate must be non-negative, got {ratio}"),
        ));
    }
    if ratio.is_zero() {
        return match alpha.cmp(&Decimal::ZERO) {
            std::cmp::Ordering::Greater => Ok(Decimal::ZERO),
            std::cmp::Ordering::Equal => Ok(Decimal::ONE),
            std::cmp::Ordering::Less => Err(QuantFinanceError::input(
                "alpha",
                "Negative alpha is undefined for a zero trade size",
            )),
        };
    }
    if ratio == Decimal::ONE {
        return Ok(Decimal::ONE);
    }
    ratio
        .checked_powd(alpha)
        .ok_or_else(|| QuantFinanceError::computation(format!("size term {ratio}^{alpha}")))
}

/// exp(-t) for t >= 0, flushing values below Decimal precision to zero.
fn decay(t: Decimal) -> QuantFinanceResult<Decimal> {
    if t > EXP_UNDERFLOW {
        return Ok(Decimal::ZERO);
    }
    (-t).checked_exp()
        .ok_or_else(|| QuantFinanceError::computation(format!("exp(-{t})")))
}

fn validate_scales(sigma: Decimal, rho: Decimal) -> QuantFinanceResult<()> {
    if sigma <= Decimal::ZERO {
        return Err(QuantFinanceError::input("sigma", "Sigma must be positive"));
    }
    if rho <= Decimal::ZERO {
        return Err(QuantFinanceError::input("rho", "Rho must be positive"));
    }
    Ok(())
}

/// Evaluate `f` on `n` evenly spaced points from `lo` to `hi` inclusive.
fn sample(
    lo: Decimal,
    hi: Decimal,
    n: usize,
    f: impl Fn(Decimal) -> QuantFinanceResult<Decimal>,
) -> QuantFinanceResult<Vec<DensityPoint>> {
    let step = (hi - lo) / Decimal::from(n - 1);
    (0..n)
        .map(|i| {
            let x = if i == n - 1 {
                hi
            } else {
                lo + step * Decimal::from(i)
            };
            Ok(DensityPoint { x, density: f(x)? })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn coefficients() -> ScaleCoefficients {
        ScaleCoefficients {
            a: dec!(0.1),
            b: dec!(0.2),
            c: dec!(0.3),
        }
    }

    fn corporate_bond_params() -> TradeCostParams {
        TradeCostParams {
            spread: dec!(0.03),
            order_size: dec!(120),
            reference_size: dec!(100),
            trade_size: dec!(100000),
            participation_rate: dec!(100000),
            alpha: dec!(0.4),
            sigma_coefficients: coefficients(),
            rho_coefficients: coefficients(),
        }
    }

    fn assert_close(actual: Decimal, expected: Decimal, tolerance: Decimal, label: &str) {
        let diff = (actual - expected).abs();
        assert!(
            diff <= tolerance,
            "{label}: expected ~{expected}, got {actual} (diff {diff})"
        );
    }

    #[test]
    fn test_phi_transforms_agree() {
        for x in [dec!(0), dec!(0.5), dec!(1.2), dec!(10)] {
            assert_eq!(phi1(x), phi2(x));
        }
        assert_eq!(phi1(dec!(1)), dec!(0.5));
    }

    #[test]
    fn test_sigma_rho_reference_values() {
        // phi = 1.2 / 2.2, size term = 1
        // scale = 0.1 * (1 - phi) + 0.2 * phi + 0.3 = 0.454545...
        let (sigma, rho) = sigma_rho(&corporate_bond_params()).unwrap();
        assert_close(sigma, dec!(0.0136363636), dec!(0.0000000001), "sigma");
        assert_eq!(sigma, rho);
    }

    #[test]
    fn test_size_term_is_sublinear() {
        let mut params = corporate_bond_params();
        params.trade_size = dec!(400000);
        let (sigma_large, _) = sigma_rho(&params).unwrap();
        let (sigma_base, _) = sigma_rho(&corporate_bond_params()).unwrap();
        // 4^0.4 = 1.7411
        let phi = dec!(1.2) / dec!(2.2);
        let expected = dec!(0.03)
            * (dec!(0.1) * (Decimal::ONE - phi) + dec!(0.2) * phi * dec!(1.7411011266) + dec!(0.3));
        assert!(sigma_large > sigma_base);
        assert_close(sigma_large, expected, dec!(0.0000001), "sigma for 4x size");
    }

    #[test]
    fn test_zero_reference_size_rejected() {
        let mut params = corporate_bond_params();
        params.reference_size = Decimal::ZERO;
        assert!(matches!(
            sigma_rho(&params),
            Err(QuantFinanceError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_zero_participation_rejected() {
        let mut params = corporate_bond_params();
        params.participation_rate = Decimal::ZERO;
        assert!(matches!(
            sigma_rho(&params),
            Err(QuantFinanceError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_non_positive_calibrated_scale_rejected() {
        let mut params = corporate_bond_params();
        params.rho_coefficients = ScaleCoefficients {
            a: dec!(0),
            b: dec!(0),
            c: dec!(0),
        };
        assert!(sigma_rho(&params).is_err());
    }

    #[test]
    fn test_zero_trade_size() {
        let mut params = corporate_bond_params();
        params.trade_size = Decimal::ZERO;
        let (sigma, _) = sigma_rho(&params).unwrap();
        let phi = dec!(1.2) / dec!(2.2);
        assert_close(
            sigma,
            dec!(0.03) * (dec!(0.1) * (Decimal::ONE - phi) + dec!(0.3)),
            dec!(0.0000000001),
            "sigma without size term",
        );
    }

    #[test]
    fn test_mixing_weight_equal_scales() {
        // 1 / (1 + sqrt(2/pi))
        let h = mixing_weight(dec!(0.02), dec!(0.02)).unwrap();
        assert_close(h, dec!(0.5562071), dec!(0.000001), "h");
    }

    #[test]
    fn test_mixing_weight_rejects_non_positive_scales() {
        assert!(mixing_weight(dec!(0), dec!(1)).is_err());
        assert!(mixing_weight(dec!(1), dec!(-1)).is_err());
    }

    #[test]
    fn test_density_branches() {
        let (sigma, rho, h) = (dec!(0.5), dec!(2), dec!(0.4));
        let at_mode = density(dec!(0), dec!(0), sigma, rho, h).unwrap();
        assert_eq!(at_mode, (Decimal::ONE - h) / rho);

        // Left branch just below the mode approaches 2h / (sqrt(2 pi) sigma)
        let below = density(dec!(-0.000001), dec!(0), sigma, rho, h).unwrap();
        assert_close(
            below,
            dec!(2) * h / (SQRT_TWO_PI * sigma),
            dec!(0.000001),
            "left limit",
        );
    }

    #[test]
    fn test_density_far_tails_underflow_to_zero() {
        let (sigma, rho, h) = (dec!(0.01), dec!(0.01), dec!(0.5));
        assert_eq!(density(dec!(-10), dec!(0), sigma, rho, h).unwrap(), Decimal::ZERO);
        assert_eq!(density(dec!(10), dec!(0), sigma, rho, h).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_density_distance_beyond_decimal_range_is_zero() {
        // (x - mu) / sigma squared overflows on the left
        let left = density(dec!(-1000000000000000), dec!(0), dec!(0.01), dec!(0.01), dec!(0.5));
        assert_eq!(left.unwrap(), Decimal::ZERO);
        // (x - mu) / rho overflows on the right
        let right = density(
            dec!(1000000000000000000000),
            dec!(0),
            dec!(0.01),
            dec!(0.00000001),
            dec!(0.5),
        );
        assert_eq!(right.unwrap(), Decimal::ZERO);
        // x - mu itself overflows
        let far = density(Decimal::MIN, Decimal::MAX, dec!(1), dec!(1), dec!(0.5));
        assert_eq!(far.unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_density_rejects_bad_weight() {
        assert!(density(dec!(0), dec!(0), dec!(1), dec!(1), dec!(1.5)).is_err());
        assert!(density(dec!(0), dec!(0), dec!(1), dec!(1), dec!(-0.1)).is_err());
    }

    #[test]
    fn test_curve_shape() {
        let input = TradeCostInput {
            params: corporate_bond_params(),
            mu: Decimal::ZERO,
            points_per_side: 50,
        };
        let out = trade_cost_curve(&input).unwrap();
        let r = &out.result;
        assert_eq!(r.left_tail.len(), 50);
        assert_eq!(r.right_tail.len(), 50);
        assert_eq!(r.left_tail.last().unwrap().x, Decimal::ZERO);
        assert_eq!(r.right_tail[0].x, Decimal::ZERO);
        assert_close(r.left_tail[0].x, dec!(-3) * r.sigma, dec!(0.0000000001), "left edge");
        assert_close(r.right_tail[49].x, dec!(3) * r.rho, dec!(0.0000000001), "right edge");
        // Right tail decays monotonically from the mode
        for pair in r.right_tail.windows(2) {
            assert!(pair[1].density < pair[0].density);
        }
    }

    #[test]
    fn test_curve_requires_two_points() {
        let input = TradeCostInput {
            params: corporate_bond_params(),
            mu: Decimal::ZERO,
            points_per_side: 1,
        };
        assert!(trade_cost_curve(&input).is_err());
    }
}
