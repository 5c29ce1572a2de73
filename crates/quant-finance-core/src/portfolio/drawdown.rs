//! Rolling drawdown of a price series over a trailing window.
//!
//! For each index `i` with window start `s = max(0, i - window + 1)`:
//!
//! - `rolling_max[i] = max(price[s..=i])`
//! - `daily_drawdown[i] = price[i] / rolling_max[i] - 1`
//! - `rolling_max_drawdown[i] = min(daily_drawdown[s..=i])`
//!
//! Both output series are defined from the first observation (minimum
//! periods of one).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Instant;

use crate::error::QuantFinanceError;
use crate::types::*;
use crate::QuantFinanceResult;

/// One trading year of daily observations
pub const DEFAULT_DRAWDOWN_WINDOW: usize = 252;

fn default_window() -> usize {
    DEFAULT_DRAWDOWN_WINDOW
}

/// Input for drawdown analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawdownInput {
    /// Ordered (oldest first) price observations
    pub prices: Vec<PricePoint>,
    /// Trailing window length in observations
    #[serde(default = "default_window")]
    pub window: usize,
}

/// A drawdown value at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawdownPoint {
    pub date: NaiveDate,
    /// Decline from the trailing peak as a non-positive fraction
    pub drawdown: Rate,
}

/// Output of drawdown analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawdownOutput {
    /// price / trailing peak - 1, one entry per observation
    pub daily_drawdown: Vec<DrawdownPoint>,
    /// Worst daily drawdown within the trailing window, one entry per observation
    pub rolling_max_drawdown: Vec<DrawdownPoint>,
    /// Worst daily drawdown over the whole series (earliest date on ties)
    pub global_min: DrawdownPoint,
    /// Worst daily drawdown in the most recent window, dated when it occurred
    pub latest_window_min: DrawdownPoint,
}

/// Compute daily and rolling maximum drawdown.
pub fn drawdown(prices: &[PricePoint], window: usize) -> QuantFinanceResult<DrawdownOutput> {
    validate(prices, window)?;

    let mut peaks =
        RollingExtreme::new(window, |candidate: Decimal, held: Decimal| candidate >= held);
    let mut troughs =
        RollingExtreme::new(window, |candidate: Decimal, held: Decimal| candidate < held);

    let mut daily_drawdown = Vec::with_capacity(prices.len());
    let mut rolling_max_drawdown = Vec::with_capacity(prices.len());
    let mut latest_window_min = None;

    for (i, point) in prices.iter().enumerate() {
        let peak = peaks.push(i, point.price);
        let dd = point
            .price
            .checked_div(peak)
            .map(|ratio| ratio - Decimal::ONE)
            .ok_or_else(|| {
                QuantFinanceError::computation(format!("drawdown on {}: price / peak", point.date))
            })?;
        daily_drawdown.push(DrawdownPoint {
            date: point.date,
            drawdown: dd,
        });

        let (trough_idx, trough) = troughs.push_indexed(i, dd);
        rolling_max_drawdown.push(DrawdownPoint {
            date: point.date,
            drawdown: trough,
        });
        latest_window_min = Some(DrawdownPoint {
            date: prices[trough_idx].date,
            drawdown: trough,
        });
    }

    let global_min = daily_drawdown
        .iter()
        .copied()
        .reduce(|worst, p| if p.drawdown < worst.drawdown { p } else { worst })
        .ok_or_else(|| QuantFinanceError::input("prices", "Price series is empty"))?;
    let latest_window_min = latest_window_min
        .ok_or_else(|| QuantFinanceError::input("prices", "Price series is empty"))?;

    Ok(DrawdownOutput {
        daily_drawdown,
        rolling_max_drawdown,
        global_min,
        latest_window_min,
    })
}

/// Drawdown analysis wrapped in the standard output envelope.
pub fn analyze_drawdown(
    input: &DrawdownInput,
) -> QuantFinanceResult<ComputationOutput<DrawdownOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.prices.len() < input.window {
        warnings.push(format!(
            "Series has {} observations, shorter than the {}-observation window; \
             rolling values use all available history",
            input.prices.len(),
            input.window
        ));
    }
    if input.prices.windows(2).any(|w| w[1].date <= w[0].date) {
        warnings.push("Price dates are not strictly increasing".into());
    }

    let output = drawdown(&input.prices, input.window)?;
    tracing::debug!(
        global_min = %output.global_min.drawdown,
        date = %output.global_min.date,
        "drawdown analysed"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rolling Maximum Drawdown (trailing window, minimum periods = 1)",
        &serde_json::json!({
            "observations": input.prices.len(),
            "window": input.window,
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn validate(prices: &[PricePoint], window: usize) -> QuantFinanceResult<()> {
    if prices.is_empty() {
        return Err(QuantFinanceError::input("prices", "Price series is empty"));
    }
    if window == 0 {
        return Err(QuantFinanceError::input("window", "Window must be at least 1"));
    }
    if let Some(bad) = prices.iter().find(|p| p.price <= Decimal::ZERO) {
        return Err(QuantFinanceError::input(
            "prices",
            format!("Price on {} must be positive, got {}", bad.date, bad.price),
        ));
    }
    Ok(())
}

/// Sliding-window extreme kept in a monotonic deque of (index, value).
///
/// `dominates(candidate, held)` is true when a new value makes an older held
/// value irrelevant for the rest of its lifetime in the window.
struct RollingExtreme<F> {
    window: usize,
    dominates: F,
    deque: VecDeque<(usize, Decimal)>,
}

impl<F: Fn(Decimal, Decimal) -> bool> RollingExtreme<F> {
    fn new(window: usize, dominates: F) -> Self {
        RollingExtreme {
            window,
            dominates,
            deque: VecDeque::with_capacity(window.min(1024)),
        }
    }

    fn push(&mut self, index: usize, value: Decimal) -> Decimal {
        self.push_indexed(index, value).1
    }

    /// Add the observation at `index` and return the window's extreme with its index.
    fn push_indexed(&mut self, index: usize, value: Decimal) -> (usize, Decimal) {
        while let Some(&(_, held)) = self.deque.back() {
            if (self.dominates)(value, held) {
                self.deque.pop_back();
            } else {
                break;
            }
        }
        self.deque.push_back((index, value));
        while let Some(&(front, _)) = self.deque.front() {
            // Indices only grow, so `front <= index`.
            if index - front >= self.window {
                self.deque.pop_front();
            } else {
                break;
            }
        }
        // The element just pushed is never evicted, so the deque is non-empty.
        self.deque.front().copied().unwrap_or((index, value))
    }
}
