use napi::Result as NapiResult;
use napi_derive::napi;

use quant_finance_core::fixed_income::{bonds, duration, scenarios, yields};
use quant_finance_core::market_microstructure::trade_cost;
use quant_finance_core::portfolio::{drawdown, returns};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Fixed income
// ---------------------------------------------------------------------------

#[napi]
pub fn price_bond(input_json: String) -> NapiResult<String> {
    let spec: bonds::BondSpec = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = bonds::price_bond(&spec).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn bond_risk_metrics(input_json: String) -> NapiResult<String> {
    let spec: bonds::BondSpec = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = duration::calculate_risk_metrics(&spec).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn approximate_yield(input_json: String) -> NapiResult<String> {
    let input: yields::YieldApproximationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = yields::calculate_approximate_yield(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn price_scenarios(input_json: String) -> NapiResult<String> {
    let input: scenarios::ScenarioInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = scenarios::calculate_price_scenarios(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

#[napi]
pub fn asset_risk(input_json: String) -> NapiResult<String> {
    let input: returns::AssetRiskInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = returns::calculate_asset_risk(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn beta(input_json: String) -> NapiResult<String> {
    let input: returns::BetaInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = returns::calculate_beta(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn rolling_drawdown(input_json: String) -> NapiResult<String> {
    let input: drawdown::DrawdownInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = drawdown::analyze_drawdown(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Market microstructure
// ---------------------------------------------------------------------------

#[napi]
pub fn trade_cost_curve(input_json: String) -> NapiResult<String> {
    let input: trade_cost::TradeCostInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = trade_cost::trade_cost_curve(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
