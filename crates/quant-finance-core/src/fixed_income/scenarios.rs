//! Second-order (duration + convexity) price projection across a sweep of
//! parallel yield shifts.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::bonds::{self, BondSpec};
use super::duration::{convexity, duration};
use crate::error::QuantFinanceError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::QuantFinanceResult;

/// Upper bound on the number of shifts a single sweep may generate.
pub const MAX_SCENARIO_POINTS: usize = 1_000_000;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Half-open sweep of yield shifts: `start`, `start + step`, ... while short of `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldShiftRange {
    pub start: Rate,
    pub stop: Rate,
    pub step: Rate,
}

impl Default for YieldShiftRange {
    /// -15% to +15% in 1 bp steps.
    fn default() -> Self {
        YieldShiftRange {
            start: dec!(-0.15),
            stop: dec!(0.15),
            step: dec!(0.0001),
        }
    }
}

impl YieldShiftRange {
    pub fn new(start: Rate, stop: Rate, step: Rate) -> Self {
        YieldShiftRange { start, stop, step }
    }

    /// Number of shifts in the sweep; zero when `step` points away from `stop`.
    pub fn len(&self) -> QuantFinanceResult<usize> {
        if self.step.is_zero() {
            return Err(QuantFinanceError::input("step", "Step must be non-zero"));
        }
        let span = self.stop.checked_sub(self.start).ok_or_else(|| {
            QuantFinanceError::computation(format!(
                "yield shift span {} - {} overflows",
                self.stop, self.start
            ))
        })?;
        let count = span
            .checked_div(self.step)
            .ok_or_else(|| QuantFinanceError::input("step", "Step is too small for the range"))?
            .ceil();
        if count <= Decimal::ZERO {
            return Ok(0);
        }
        count
            .to_usize()
            .filter(|n| *n <= MAX_SCENARIO_POINTS)
            .ok_or_else(|| {
                QuantFinanceError::input(
                    "step",
                    format!("Sweep of {count} points exceeds the limit of {MAX_SCENARIO_POINTS}"),
                )
            })
    }

    pub fn is_empty(&self) -> QuantFinanceResult<bool> {
        Ok(self.len()? == 0)
    }

    /// The shifts themselves, `start + i * step`.
    pub fn shifts(&self) -> QuantFinanceResult<impl Iterator<Item = Rate>> {
        let n = self.len()?;
        let (start, step) = (self.start, self.step);
        // i < len keeps every shift between start and stop.
        Ok((0..n).map(move |i| start + Decimal::from(i) * step))
    }
}

/// One point of the projected price curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioPoint {
    pub yield_shift: Rate,
    /// 1 - D_mod * dy + 0.5 * C * dy^2
    pub price_multiplier: Decimal,
    pub projected_price: Money,
}

/// Input for a scenario sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioInput {
    pub bond: BondSpec,
    #[serde(default)]
    pub range: YieldShiftRange,
}

/// Output of a scenario sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutput {
    pub base_price: Money,
    pub modified_duration: Decimal,
    pub convexity: Decimal,
    pub num_points: usize,
    pub points: Vec<ScenarioPoint>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project prices across `range` using the duration/convexity Taylor expansion.
///
/// Base price, modified duration and convexity are evaluated once at the
/// bond's own yield, not per shift.
pub fn project_prices(
    spec: &BondSpec,
    range: &YieldShiftRange,
) -> QuantFinanceResult<Vec<ScenarioPoint>> {
    let shifts = range.shifts()?;
    let base = BaseSensitivities::at_spec_yield(spec)?;
    shifts.map(|dy| base.project(dy)).collect()
}

/// Price and sensitivities at the bond's stated yield.
struct BaseSensitivities {
    price: Money,
    modified_duration: Decimal,
    convexity: Decimal,
}

impl BaseSensitivities {
    fn at_spec_yield(spec: &BondSpec) -> QuantFinanceResult<Self> {
        Ok(BaseSensitivities {
            price: bonds::price(spec)?,
            modified_duration: duration(spec)?.modified_duration,
            convexity: convexity(spec)?,
        })
    }

    fn project(&self, yield_shift: Rate) -> QuantFinanceResult<ScenarioPoint> {
        let overflow = || {
            QuantFinanceError::computation(format!(
                "price projection overflows at yield shift {yield_shift}"
            ))
        };
        let first_order = self.modified_duration.checked_mul(yield_shift).ok_or_else(overflow)?;
        let second_order = yield_shift
            .checked_mul(yield_shift)
            .and_then(|dy2| dy2.checked_mul(self.convexity))
            .map(|term| term * dec!(0.5))
            .ok_or_else(overflow)?;
        let price_multiplier = Decimal::ONE
            .checked_sub(first_order)
            .and_then(|m| m.checked_add(second_order))
            .ok_or_else(overflow)?;
        let projected_price = price_multiplier.checked_mul(self.price).ok_or_else(overflow)?;
        Ok(ScenarioPoint {
            yield_shift,
            price_multiplier,
            projected_price,
        })
    }
}

/// Scenario sweep wrapped in the standard output envelope.
pub fn calculate_price_scenarios(
    input: &ScenarioInput,
) -> QuantFinanceResult<ComputationOutput<ScenarioOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let shifts = input.range.shifts()?;
    let base = BaseSensitivities::at_spec_yield(&input.bond)?;
    let points: Vec<ScenarioPoint> = shifts
        .map(|dy| base.project(dy))
        .collect::<QuantFinanceResult<_>>()?;
    if points.is_empty() {
        warnings.push(format!(
            "Yield shift range [{}, {}) with step {} is empty",
            input.range.start, input.range.stop, input.range.step
        ));
    }

    let output = ScenarioOutput {
        base_price: base.price,
        modified_duration: base.modified_duration,
        convexity: base.convexity,
        num_points: points.len(),
        points,
    };
    tracing::debug!(points = output.num_points, "price scenarios projected");

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Price projection — 1 - D_mod * dy + 0.5 * C * dy^2",
        input,
        warnings,
        elapsed,
        output,
    ))
}
