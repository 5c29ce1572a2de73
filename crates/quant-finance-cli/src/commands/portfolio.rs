use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use quant_finance_core::portfolio::drawdown::{self, DrawdownInput, DEFAULT_DRAWDOWN_WINDOW};
use quant_finance_core::portfolio::returns::{self, AssetRiskInput, BetaInput};

use crate::input;

/// Arguments for the annualised Sharpe ratio
#[derive(Args)]
pub struct SharpeArgs {
    /// Path to JSON/YAML input ({ returns, risk_free_rate, benchmark_returns? })
    #[arg(long)]
    pub input: Option<String>,

    /// Comma-separated daily returns (e.g. "0.01,-0.005,0.02")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub returns: Option<Vec<Decimal>>,

    /// Risk-free rate (annualised)
    #[arg(long, default_value = "0")]
    pub risk_free_rate: Decimal,
}

/// Arguments for beta against an index
#[derive(Args)]
pub struct BetaArgs {
    /// Path to JSON/YAML input ({ index_returns, asset_returns })
    #[arg(long)]
    pub input: Option<String>,

    /// Comma-separated index returns
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub index_returns: Option<Vec<Decimal>>,

    /// Comma-separated asset returns, aligned with the index
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub asset_returns: Option<Vec<Decimal>>,
}

/// Arguments for rolling drawdown
#[derive(Args)]
pub struct DrawdownArgs {
    /// Path to JSON/YAML input ({ prices: [{ date, price }], window? })
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a headed `date,price` CSV, oldest first
    #[arg(long, conflicts_with = "input")]
    pub prices_csv: Option<String>,

    /// Trailing window in observations (252 if neither this nor the input sets one)
    #[arg(long)]
    pub window: Option<usize>,
}

pub fn run_sharpe(args: SharpeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let risk_input = match args.returns {
        Some(returns) if args.input.is_none() => AssetRiskInput {
            returns,
            risk_free_rate: args.risk_free_rate,
            benchmark_returns: None,
        },
        _ => input::from_file_or_stdin(&args.input, "sharpe")?,
    };
    let result = returns::calculate_asset_risk(&risk_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_beta(args: BetaArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let beta_input = match (args.index_returns, args.asset_returns) {
        (Some(index_returns), Some(asset_returns)) if args.input.is_none() => BetaInput {
            index_returns,
            asset_returns,
        },
        _ => input::from_file_or_stdin(&args.input, "beta")?,
    };
    let result = returns::calculate_beta(&beta_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_drawdown(args: DrawdownArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let dd_input = match args.prices_csv {
        Some(ref path) => DrawdownInput {
            prices: input::prices::read_price_csv(path)?,
            window: args.window.unwrap_or(DEFAULT_DRAWDOWN_WINDOW),
        },
        None => with_window(
            input::from_file_or_stdin(&args.input, "drawdown")?,
            args.window,
        ),
    };
    let result = drawdown::analyze_drawdown(&dd_input)?;
    Ok(serde_json::to_value(result)?)
}

/// An explicit `--window` wins over the window in the input document.
fn with_window(mut dd_input: DrawdownInput, window: Option<usize>) -> DrawdownInput {
    if let Some(window) = window {
        dd_input.window = window;
    }
    dd_input
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_run_sharpe_inline_returns() {
        let value = run_sharpe(SharpeArgs {
            input: None,
            returns: Some(vec![dec!(0.01), dec!(-0.005), dec!(0.02), dec!(0.0), dec!(0.015)]),
            risk_free_rate: Decimal::ZERO,
        })
        .unwrap();
        assert_eq!(value["result"]["num_observations"], 5);
        assert!(value["result"].get("beta").is_none());
    }

    #[test]
    fn test_run_beta_inline() {
        let idx = vec![dec!(0.01), dec!(-0.02), dec!(0.015)];
        let asset: Vec<Decimal> = idx.iter().map(|r| r * dec!(3)).collect();
        let value = run_beta(BetaArgs {
            input: None,
            index_returns: Some(idx),
            asset_returns: Some(asset),
        })
        .unwrap();
        let beta: Decimal = value["result"]["beta"].as_str().unwrap().parse().unwrap();
        assert!((beta - dec!(3)).abs() < dec!(0.0000000001), "beta {beta}");
        assert_eq!(value["result"]["num_observations"], 3);
        // Same envelope as every other subcommand
        assert!(value["metadata"]["version"].is_string());
        assert_eq!(value["assumptions"]["observations"], 3);
        assert!(value["warnings"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_run_beta_length_mismatch_errors() {
        let err = run_beta(BetaArgs {
            input: None,
            index_returns: Some(vec![dec!(0.01), dec!(0.02)]),
            asset_returns: Some(vec![dec!(0.01)]),
        })
        .unwrap_err();
        assert!(err.to_string().contains("same length"));
    }

    fn file_input(window: usize) -> DrawdownInput {
        let json = format!(
            r#"{{"prices": [{{"date": "2024-03-01", "price": "50"}}], "window": {window}}}"#
        );
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_window_flag_overrides_input_file() {
        assert_eq!(with_window(file_input(30), Some(5)).window, 5);
    }

    #[test]
    fn test_input_file_window_kept_without_flag() {
        assert_eq!(with_window(file_input(30), None).window, 30);
    }
}
