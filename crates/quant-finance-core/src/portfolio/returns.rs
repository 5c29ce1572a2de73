use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::QuantFinanceError;
use crate::types::*;
use crate::QuantFinanceResult;

/// Daily observations per year used for annualisation
pub const TRADING_DAYS_PER_YEAR: Decimal = dec!(252);

/// Input for asset risk metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRiskInput {
    /// Daily returns (as decimals, e.g. 0.01 = 1%)
    pub returns: Vec<Decimal>,
    /// Risk-free rate (annualised)
    pub risk_free_rate: Rate,
    /// Daily index returns aligned with `returns`, for beta
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark_returns: Option<Vec<Decimal>>,
}

/// Output of asset risk metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRiskOutput {
    pub sharpe_ratio: Decimal,
    /// Mean daily return * 252
    pub annualised_return: Rate,
    /// Sample standard deviation of daily returns * sqrt(252)
    pub annualised_volatility: Rate,
    pub num_observations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<Decimal>,
}

/// Input for beta of an asset against an index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetaInput {
    /// Daily index returns
    pub index_returns: Vec<Decimal>,
    /// Daily asset returns aligned with `index_returns`
    pub asset_returns: Vec<Decimal>,
}

/// Output of the beta calculation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetaOutput {
    pub beta: Decimal,
    pub num_observations: usize,
}

/// Annualised Sharpe ratio of daily returns.
///
/// excess = r - rfr / 252; sharpe = sqrt(252) * mean(excess) / stddev(excess)
pub fn sharpe_ratio(returns: &[Decimal], risk_free_rate: Rate) -> QuantFinanceResult<Decimal> {
    if returns.len() < 2 {
        return Err(QuantFinanceError::computation(format!(
            "Sharpe ratio: at least 2 return observations required, got {}",
            returns.len()
        )));
    }

    let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
    let excess = returns
        .iter()
        .map(|r| {
            r.checked_sub(daily_rf).ok_or_else(|| {
                QuantFinanceError::computation(format!("Sharpe ratio: excess return {r} - {daily_rf}"))
            })
        })
        .collect::<QuantFinanceResult<Vec<Decimal>>>()?;
    let excess_mean = mean(&excess)?;
    let std_dev = sqrt_decimal(sample_variance(&excess, excess_mean)?)?;
    if std_dev.is_zero() {
        return Err(QuantFinanceError::computation(
            "Sharpe ratio: excess returns have zero standard deviation",
        ));
    }

    sqrt_decimal(TRADING_DAYS_PER_YEAR)?
        .checked_mul(excess_mean)
        .and_then(|scaled| scaled.checked_div(std_dev))
        .ok_or_else(|| QuantFinanceError::computation("Sharpe ratio: mean / standard deviation"))
}

/// Beta = Cov(index, asset) / Var(index), both sample estimators.
pub fn beta(index_returns: &[Decimal], asset_returns: &[Decimal]) -> QuantFinanceResult<Decimal> {
    if index_returns.len() != asset_returns.len() {
        return Err(QuantFinanceError::input(
            "asset_returns",
            format!(
                "Asset returns ({}) must have the same length as index returns ({})",
                asset_returns.len(),
                index_returns.len()
            ),
        ));
    }
    if index_returns.len() < 2 {
        return Err(QuantFinanceError::input(
            "index_returns",
            "At least 2 return observations required",
        ));
    }

    let index_mean = mean(index_returns)?;
    let asset_mean = mean(asset_returns)?;
    let index_var = sample_variance(index_returns, index_mean)?;
    if index_var.is_zero() {
        return Err(QuantFinanceError::input(
            "index_returns",
            "Index returns have zero variance",
        ));
    }

    let cov = covariance(index_returns, asset_returns, index_mean, asset_mean)?;
    cov.checked_div(index_var)
        .ok_or_else(|| QuantFinanceError::computation("beta: covariance / index variance"))
}

/// Beta wrapped in the standard output envelope.
pub fn calculate_beta(input: &BetaInput) -> QuantFinanceResult<ComputationOutput<BetaOutput>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    let output = BetaOutput {
        beta: beta(&input.index_returns, &input.asset_returns)?,
        num_observations: input.index_returns.len(),
    };
    tracing::debug!(beta = %output.beta, observations = output.num_observations, "beta");

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Beta (sample covariance / sample variance of index returns)",
        &serde_json::json!({
            "observations": output.num_observations,
            "estimator": "sample (n - 1)",
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Sharpe ratio, annualised return/volatility and optional beta.
pub fn calculate_asset_risk(
    input: &AssetRiskInput,
) -> QuantFinanceResult<ComputationOutput<AssetRiskOutput>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    let sharpe_ratio = sharpe_ratio(&input.returns, input.risk_free_rate)?;

    let n = input.returns.len();
    let mean_return = mean(&input.returns)?;
    let std_dev = sqrt_decimal(sample_variance(&input.returns, mean_return)?)?;
    let annualised_return = mean_return
        .checked_mul(TRADING_DAYS_PER_YEAR)
        .ok_or_else(|| QuantFinanceError::computation("annualised return: mean * 252"))?;
    let annualised_volatility = std_dev
        .checked_mul(sqrt_decimal(TRADING_DAYS_PER_YEAR)?)
        .ok_or_else(|| QuantFinanceError::computation("annualised volatility: sd * sqrt(252)"))?;

    let beta = match &input.benchmark_returns {
        Some(bench) => Some(beta(bench, &input.returns)?),
        None => None,
    };

    let output = AssetRiskOutput {
        sharpe_ratio,
        annualised_return,
        annualised_volatility,
        num_observations: n,
        beta,
    };
    tracing::debug!(sharpe = %output.sharpe_ratio, observations = n, "asset risk metrics");

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Asset Risk Metrics (annualised Sharpe ratio, beta)",
        &serde_json::json!({
            "observations": n,
            "risk_free_rate": input.risk_free_rate.to_string(),
            "periods_per_year": TRADING_DAYS_PER_YEAR.to_string(),
            "std_dev": "sample (n - 1)",
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Statistical helpers
// ---------------------------------------------------------------------------

fn checked_sum(
    mut terms: impl Iterator<Item = Option<Decimal>>,
    context: &str,
) -> QuantFinanceResult<Decimal> {
    terms
        .try_fold(Decimal::ZERO, |acc, term| acc.checked_add(term?))
        .ok_or_else(|| QuantFinanceError::computation(format!("{context}: sum overflows")))
}

fn mean(values: &[Decimal]) -> QuantFinanceResult<Decimal> {
    if values.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let sum = checked_sum(values.iter().map(|r| Some(*r)), "mean")?;
    Ok(sum / Decimal::from(values.len()))
}

fn sample_variance(values: &[Decimal], mean: Decimal) -> QuantFinanceResult<Decimal> {
    if values.len() < 2 {
        return Ok(Decimal::ZERO);
    }
    let sum_sq = checked_sum(
        values.iter().map(|r| {
            let d = r.checked_sub(mean)?;
            d.checked_mul(d)
        }),
        "sample variance",
    )?;
    Ok(sum_sq / Decimal::from(values.len() - 1))
}

fn covariance(
    a: &[Decimal],
    b: &[Decimal],
    mean_a: Decimal,
    mean_b: Decimal,
) -> QuantFinanceResult<Decimal> {
    let n = a.len().min(b.len());
    if n < 2 {
        return Ok(Decimal::ZERO);
    }
    let sum = checked_sum(
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| x.checked_sub(mean_a)?.checked_mul(y.checked_sub(mean_b)?)),
        "covariance",
    )?;
    Ok(sum / Decimal::from(n - 1))
}

fn sqrt_decimal(val: Decimal) -> QuantFinanceResult<Decimal> {
    val.sqrt()
        .ok_or_else(|| QuantFinanceError::computation(format!("square root of {val}")))
}
