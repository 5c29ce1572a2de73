use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use quant_finance_core::fixed_income::bonds::{self, BondSpec, DEFAULT_PAYMENT_FREQUENCY};
use quant_finance_core::fixed_income::duration;
use quant_finance_core::fixed_income::scenarios::{self, ScenarioInput, YieldShiftRange};
use quant_finance_core::fixed_income::yields::{self, YieldApproximationInput};

use crate::input;

/// Inline bond terms; all four of nominal, coupon, yield and maturity are
/// needed to build a bond without an input file.
#[derive(Args)]
pub struct BondTermsArgs {
    /// Face value repaid at maturity
    #[arg(long)]
    pub nominal: Option<Decimal>,

    /// Annual coupon rate as a decimal (0.05 = 5%)
    #[arg(long)]
    pub coupon_rate: Option<Decimal>,

    /// Annual yield to maturity as a decimal
    #[arg(long, allow_hyphen_values = true)]
    pub ytm: Option<Decimal>,

    /// Years to maturity
    #[arg(long)]
    pub maturity_years: Option<Decimal>,

    /// Coupon payments per year
    #[arg(long, default_value_t = DEFAULT_PAYMENT_FREQUENCY)]
    pub frequency: u32,
}

impl BondTermsArgs {
    fn to_spec(&self) -> Option<BondSpec> {
        Some(
            BondSpec::new(
                self.nominal?,
                self.coupon_rate?,
                self.ytm?,
                self.maturity_years?,
            )
            .with_payment_frequency(self.frequency),
        )
    }
}

/// Arguments for bond pricing
#[derive(Args)]
pub struct BondPriceArgs {
    /// Path to JSON/YAML bond specification
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub bond: BondTermsArgs,
}

/// Arguments for duration, convexity and DV01
#[derive(Args)]
pub struct BondRiskArgs {
    /// Path to JSON/YAML bond specification
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub bond: BondTermsArgs,
}

/// Arguments for the approximate yield to maturity
#[derive(Args)]
pub struct BondYieldArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub nominal: Option<Decimal>,

    /// Observed market price
    #[arg(long)]
    pub market_price: Option<Decimal>,

    /// Annual coupon rate as a decimal
    #[arg(long)]
    pub coupon_rate: Option<Decimal>,

    #[arg(long)]
    pub maturity_years: Option<Decimal>,
}

/// Arguments for the duration/convexity scenario sweep
#[derive(Args)]
pub struct BondScenariosArgs {
    /// Path to JSON/YAML scenario input ({ bond, range })
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub bond: BondTermsArgs,

    /// First yield shift
    #[arg(long, allow_hyphen_values = true, default_value = "-0.15")]
    pub start: Decimal,

    /// Sweep stops before this shift
    #[arg(long, allow_hyphen_values = true, default_value = "0.15")]
    pub stop: Decimal,

    /// Shift increment (1 bp by default)
    #[arg(long, allow_hyphen_values = true, default_value = "0.0001")]
    pub step: Decimal,
}

fn resolve_bond(
    path: &Option<String>,
    terms: &BondTermsArgs,
    command: &str,
) -> Result<BondSpec, Box<dyn std::error::Error>> {
    if path.is_none() {
        if let Some(spec) = terms.to_spec() {
            return Ok(spec);
        }
    }
    input::from_file_or_stdin(path, command)
}

pub fn run_bond_price(args: BondPriceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let spec = resolve_bond(&args.input, &args.bond, "bond pricing")?;
    let result = bonds::price_bond(&spec)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_bond_risk(args: BondRiskArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let spec = resolve_bond(&args.input, &args.bond, "bond risk")?;
    let result = duration::calculate_risk_metrics(&spec)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_bond_yield(args: BondYieldArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inline = match (
        args.nominal,
        args.market_price,
        args.coupon_rate,
        args.maturity_years,
    ) {
        (Some(nominal), Some(market_price), Some(coupon_rate), Some(maturity_years))
            if args.input.is_none() =>
        {
            Some(YieldApproximationInput {
                nominal,
                market_price,
                coupon_rate,
                maturity_years,
            })
        }
        _ => None,
    };
    let yield_input = match inline {
        Some(i) => i,
        None => input::from_file_or_stdin(&args.input, "bond yield")?,
    };
    let result = yields::calculate_approximate_yield(&yield_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_bond_scenarios(args: BondScenariosArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let scenario_input = match args.bond.to_spec() {
        Some(bond) if args.input.is_none() => ScenarioInput {
            bond,
            range: YieldShiftRange::new(args.start, args.stop, args.step),
        },
        _ => input::from_file_or_stdin(&args.input, "bond scenarios")?,
    };
    let result = scenarios::calculate_price_scenarios(&scenario_input)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn terms() -> BondTermsArgs {
        BondTermsArgs {
            nominal: Some(dec!(1000)),
            coupon_rate: Some(dec!(0.06)),
            ytm: Some(dec!(0.06)),
            maturity_years: Some(dec!(10)),
            frequency: DEFAULT_PAYMENT_FREQUENCY,
        }
    }

    #[test]
    fn test_inline_terms_build_spec() {
        let spec = terms().to_spec().unwrap();
        assert_eq!(spec.nominal, dec!(1000));
        assert_eq!(spec.payment_frequency, 2);
    }

    #[test]
    fn test_incomplete_terms_give_none() {
        let mut t = terms();
        t.ytm = None;
        assert!(t.to_spec().is_none());
    }

    #[test]
    fn test_run_bond_price_inline() {
        let value = run_bond_price(BondPriceArgs {
            input: None,
            bond: terms(),
        })
        .unwrap();
        assert_eq!(value["result"]["total_periods"], 20);
        assert_eq!(value["result"]["price_level"], "Par");
    }

    #[test]
    fn test_run_bond_scenarios_inline_range() {
        let value = run_bond_scenarios(BondScenariosArgs {
            input: None,
            bond: terms(),
            start: dec!(-0.01),
            stop: dec!(0.01),
            step: dec!(0.005),
        })
        .unwrap();
        assert_eq!(value["result"]["num_points"], 4);
    }
}
