use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use quant_finance_core::market_microstructure::trade_cost::{
    self, ScaleCoefficients, TradeCostInput, TradeCostParams, DEFAULT_POINTS_PER_SIDE,
};

use crate::input;

/// Arguments for the trade-cost distribution
#[derive(Args)]
pub struct TradeCostArgs {
    /// Path to JSON/YAML input ({ params, mu?, points_per_side? })
    #[arg(long)]
    pub input: Option<String>,

    /// Quoted bid/ask spread
    #[arg(long)]
    pub spread: Option<Decimal>,

    /// Order size (q)
    #[arg(long)]
    pub order_size: Option<Decimal>,

    /// Odd-lot reference size (q0)
    #[arg(long)]
    pub reference_size: Option<Decimal>,

    /// Trade size in units
    #[arg(long)]
    pub trade_size: Option<Decimal>,

    /// Participation volume (V)
    #[arg(long)]
    pub participation_rate: Option<Decimal>,

    /// Size exponent
    #[arg(long, default_value = "0.4")]
    pub alpha: Decimal,

    /// Sigma coefficients A1,B1,C1
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub sigma_coefficients: Option<Vec<Decimal>>,

    /// Rho coefficients A2,B2,C2
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub rho_coefficients: Option<Vec<Decimal>>,

    /// Mode of the cost distribution
    #[arg(long, allow_hyphen_values = true, default_value = "0")]
    pub mu: Decimal,

    /// Density samples on each side of the mode
    #[arg(long, default_value_t = DEFAULT_POINTS_PER_SIDE)]
    pub points_per_side: usize,
}

fn coefficients(
    values: &[Decimal],
    flag: &str,
) -> Result<ScaleCoefficients, Box<dyn std::error::Error>> {
    match values {
        [a, b, c] => Ok(ScaleCoefficients {
            a: *a,
            b: *b,
            c: *c,
        }),
        _ => Err(format!("--{flag} takes exactly three values: A,B,C").into()),
    }
}

impl TradeCostArgs {
    fn to_input(&self) -> Result<Option<TradeCostInput>, Box<dyn std::error::Error>> {
        let (
            Some(spread),
            Some(order_size),
            Some(reference_size),
            Some(trade_size),
            Some(participation_rate),
            Some(sigma_c),
            Some(rho_c),
        ) = (
            self.spread,
            self.order_size,
            self.reference_size,
            self.trade_size,
            self.participation_rate,
            self.sigma_coefficients.as_deref(),
            self.rho_coefficients.as_deref(),
        )
        else {
            return Ok(None);
        };

        Ok(Some(TradeCostInput {
            params: TradeCostParams {
                spread,
                order_size,
                reference_size,
                trade_size,
                participation_rate,
                alpha: self.alpha,
                sigma_coefficients: coefficients(sigma_c, "sigma-coefficients")?,
                rho_coefficients: coefficients(rho_c, "rho-coefficients")?,
            },
            mu: self.mu,
            points_per_side: self.points_per_side,
        }))
    }
}

pub fn run_trade_cost(args: TradeCostArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inline = if args.input.is_none() {
        args.to_input()?
    } else {
        None
    };
    let cost_input = match inline {
        Some(i) => i,
        None => input::from_file_or_stdin(&args.input, "trade cost")?,
    };
    let result = trade_cost::trade_cost_curve(&cost_input)?;
    Ok(serde_json::to_value(result)?)
}
