mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::fixed_income::{BondPriceArgs, BondRiskArgs, BondScenariosArgs, BondYieldArgs};
use commands::market_microstructure::TradeCostArgs;
use commands::portfolio::{BetaArgs, DrawdownArgs, SharpeArgs};

/// Bond analytics, asset risk metrics and trade-cost modelling
#[derive(Parser)]
#[command(
    name = "qf",
    version,
    about = "Bond analytics, asset risk metrics and trade-cost modelling",
    long_about = "A CLI for quantitative finance calculations with decimal precision. \
                  Supports bond pricing, duration/convexity, approximate yield, \
                  yield-shift scenarios, Sharpe ratio, beta, rolling drawdown and \
                  the trade-cost distribution."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log computation details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a fixed-coupon bond at its yield to maturity
    BondPrice(BondPriceArgs),
    /// Macaulay/modified duration, convexity and DV01
    BondRisk(BondRiskArgs),
    /// Approximate yield to maturity from market price
    BondYield(BondYieldArgs),
    /// Project prices across a sweep of parallel yield shifts
    BondScenarios(BondScenariosArgs),
    /// Annualised Sharpe ratio of daily returns
    Sharpe(SharpeArgs),
    /// Beta of an asset against an index
    Beta(BetaArgs),
    /// Rolling maximum drawdown of a price series
    Drawdown(DrawdownArgs),
    /// Calibrate and sample the trade-cost distribution
    TradeCost(TradeCostArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

/// Filter used when `RUST_LOG` is unset; covers the core library and this binary.
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "quant_finance_core=debug,qf=debug"
    } else {
        "quant_finance_core=warn,qf=warn"
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    // stdout carries the result; logs go to stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::BondPrice(args) => commands::fixed_income::run_bond_price(args),
        Commands::BondRisk(args) => commands::fixed_income::run_bond_risk(args),
        Commands::BondYield(args) => commands::fixed_income::run_bond_yield(args),
        Commands::BondScenarios(args) => commands::fixed_income::run_bond_scenarios(args),
        Commands::Sharpe(args) => commands::portfolio::run_sharpe(args),
        Commands::Beta(args) => commands::portfolio::run_beta(args),
        Commands::Drawdown(args) => commands::portfolio::run_drawdown(args),
        Commands::TradeCost(args) => commands::market_microstructure::run_trade_cost(args),
        Commands::Version => {
            println!("qf {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_covers_binary_target() {
        // Events logged from main.rs carry the `qf` target
        assert!(default_directive(true).contains("qf=debug"));
        assert!(default_directive(false).contains("qf=warn"));
        assert!(default_directive(true).contains("quant_finance_core=debug"));
    }
}
