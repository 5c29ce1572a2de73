use proptest::prelude::*;
use quant_finance_core::fixed_income::bonds::{self, BondSpec};
use quant_finance_core::fixed_income::duration::{calculate_risk_metrics, convexity, duration};
use quant_finance_core::fixed_income::scenarios::{
    calculate_price_scenarios, project_prices, ScenarioInput, YieldShiftRange,
};
use quant_finance_core::fixed_income::yields::approximate_ytm;
use quant_finance_core::QuantFinanceError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Fixed income integration tests: pricing, risk measures, yield
// approximation and scenario projection working together.
// ===========================================================================

fn ten_year_semiannual() -> BondSpec {
    BondSpec::new(dec!(1000), dec!(0.06), dec!(0.06), dec!(10))
}

/// Rate in basis points, 0..=1500 -> 0%..15%
fn bps(n: i64) -> Decimal {
    Decimal::new(n, 4)
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

#[test]
fn test_par_bond_prices_at_nominal() {
    let price = bonds::price(&ten_year_semiannual()).unwrap();
    assert!(
        (price - dec!(1000)).abs() < dec!(0.01),
        "Expected ~1000.00, got {}",
        price
    );
}

#[test]
fn test_pricing_envelope_round_trips_through_json() {
    let json = r#"{
        "nominal": "1000",
        "coupon_rate": "0.05",
        "yield_to_maturity": "0.06",
        "maturity_years": "5",
        "payment_frequency": 1
    }"#;
    let spec: BondSpec = serde_json::from_str(json).unwrap();
    let out = bonds::price_bond(&spec).unwrap();
    assert_eq!(out.result.total_periods, 5);
    assert!(out.result.price < dec!(1000));

    let value = serde_json::to_value(&out).unwrap();
    assert!(value["result"]["price"].is_string());
    assert!(value["metadata"]["version"].is_string());
}

#[test]
fn test_fractional_period_count_rejected() {
    let spec = BondSpec::new(dec!(1000), dec!(0.05), dec!(0.05), dec!(2.3));
    assert!(matches!(
        bonds::price(&spec),
        Err(QuantFinanceError::InvalidBondSpec { .. })
    ));
}

// ---------------------------------------------------------------------------
// Risk measures
// ---------------------------------------------------------------------------

#[test]
fn test_risk_metrics_consistent_with_components() {
    let spec = ten_year_semiannual();
    let out = calculate_risk_metrics(&spec).unwrap().result;
    let d = duration(&spec).unwrap();
    assert_eq!(out.macaulay_duration, d.macaulay_duration);
    assert_eq!(out.modified_duration, d.modified_duration);
    assert_eq!(out.convexity, convexity(&spec).unwrap());
    assert_eq!(out.price, bonds::price(&spec).unwrap());
}

#[test]
fn test_longer_maturity_has_longer_duration() {
    let short = duration(&BondSpec::new(dec!(1000), dec!(0.05), dec!(0.05), dec!(5))).unwrap();
    let long = duration(&BondSpec::new(dec!(1000), dec!(0.05), dec!(0.05), dec!(20))).unwrap();
    assert!(long.macaulay_duration > short.macaulay_duration);
}

// ---------------------------------------------------------------------------
// Yield approximation vs pricing
// ---------------------------------------------------------------------------

#[test]
fn test_approximation_close_to_true_yield_near_par() {
    // Price a bond at 6.5%, then recover the yield from its price
    let spec = BondSpec::new(dec!(1000), dec!(0.06), dec!(0.065), dec!(10));
    let market_price = bonds::price(&spec).unwrap();
    let ytm = approximate_ytm(dec!(1000), market_price, dec!(0.06), dec!(10)).unwrap();
    assert!(
        (ytm - dec!(0.065)).abs() < dec!(0.002),
        "Expected ~6.5%, got {}",
        ytm
    );
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_reversed_default_range_is_empty() {
    let range = YieldShiftRange::new(dec!(0.15), dec!(-0.15), dec!(0.0001));
    let points = project_prices(&ten_year_semiannual(), &range).unwrap();
    assert!(points.is_empty());
}

#[test]
fn test_default_sweep_envelope() {
    let input = ScenarioInput {
        bond: ten_year_semiannual(),
        range: YieldShiftRange::default(),
    };
    let out = calculate_price_scenarios(&input).unwrap().result;
    assert_eq!(out.num_points, 3000);
    assert_eq!(out.points.len(), 3000);
    // Convexity term keeps every projected price positive across +/-15%
    assert!(out.points.iter().all(|p| p.projected_price > Decimal::ZERO));
}

#[test]
fn test_convexity_term_beats_duration_only_projection() {
    let spec = ten_year_semiannual();
    let range = YieldShiftRange::new(dec!(-0.02), dec!(-0.019), dec!(0.001));
    let point = project_prices(&spec, &range).unwrap()[0];
    let repriced = bonds::price(&spec.with_yield(dec!(0.04))).unwrap();
    let base = bonds::price(&spec).unwrap();
    let d_mod = duration(&spec).unwrap().modified_duration;
    let duration_only = base * (Decimal::ONE + d_mod * dec!(0.02));
    assert!((point.projected_price - repriced).abs() < (duration_only - repriced).abs());
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn prop_price_strictly_decreasing_in_yield(
        coupon in 0i64..=1200,
        ytm in 0i64..=1400,
        bump in 1i64..=100,
        years in 1u32..=30,
    ) {
        let spec = BondSpec::new(dec!(1000), bps(coupon), bps(ytm), Decimal::from(years));
        let lower = bonds::price(&spec).unwrap();
        let higher = bonds::price(&spec.with_yield(bps(ytm + bump))).unwrap();
        prop_assert!(higher < lower, "P({}) = {} not below P({}) = {}", ytm + bump, higher, ytm, lower);
    }

    #[test]
    fn prop_par_when_yield_equals_coupon(coupon in 1i64..=1500, years in 1u32..=30) {
        let spec = BondSpec::new(dec!(1000), bps(coupon), bps(coupon), Decimal::from(years));
        let price = bonds::price(&spec).unwrap();
        prop_assert!((price - dec!(1000)).abs() < dec!(0.000001), "price {}", price);
    }

    #[test]
    fn prop_macaulay_within_maturity(
        coupon in 0i64..=1200,
        ytm in 1i64..=1400,
        years in 1u32..=30,
    ) {
        let maturity = Decimal::from(years);
        let spec = BondSpec::new(dec!(1000), bps(coupon), bps(ytm), maturity);
        let d = duration(&spec).unwrap();
        prop_assert!(d.macaulay_duration > Decimal::ZERO);
        prop_assert!(d.macaulay_duration <= maturity + dec!(0.0000001));
        prop_assert!(d.modified_duration < d.macaulay_duration);
    }

    #[test]
    fn prop_convexity_non_negative(
        coupon in 0i64..=1200,
        ytm in 100i64..=1400,
        years in 1u32..=30,
    ) {
        let spec = BondSpec::new(dec!(1000), bps(coupon), bps(ytm), Decimal::from(years));
        prop_assert!(convexity(&spec).unwrap() >= Decimal::ZERO);
    }
}
