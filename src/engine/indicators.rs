//! Rolling indicator computation.
//!
//! Every column is computed once over the full bar sequence (warm-up
//! included) before the simulation loop starts. Entries that are not yet
//! defined — fewer than `period` bars of history — are `f64::NAN` and are
//! never treated as zero.

use std::collections::{HashMap, HashSet};

use crate::models::bar::PriceBar;
use crate::models::strategy::{
    IndicatorKind, IndicatorRef, Operand, StrategyRule, RSI_DEFAULT_PERIOD,
};

/// Default-strategy SMA pair; the RSI gate uses [`RSI_DEFAULT_PERIOD`].
pub const SMA_FAST_PERIOD: u32 = 10;
pub const SMA_SLOW_PERIOD: u32 = 50;

/// Floor for the average-loss denominator in RSI; an all-gains window reads
/// as RS → ∞ (RSI → 100) instead of dividing by zero.
const RSI_EPSILON: f64 = 1e-10;

/// Per-bar values for every required `(indicator, period)` pair, aligned
/// 1:1 with the bar sequence.
#[derive(Debug, Default)]
pub struct IndicatorTable {
    columns: HashMap<IndicatorRef, Vec<f64>>,
}

impl IndicatorTable {
    /// Value of an indicator at a bar index; NaN when not yet defined,
    /// out of range, or the indicator is unsupported.
    pub fn value(&self, indicator: &IndicatorRef, index: usize) -> f64 {
        self.columns
            .get(indicator)
            .and_then(|column| column.get(index))
            .copied()
            .unwrap_or(f64::NAN)
    }

    pub fn sma_fast(&self, index: usize) -> f64 {
        self.value(&IndicatorRef::sma(SMA_FAST_PERIOD), index)
    }

    pub fn sma_slow(&self, index: usize) -> f64 {
        self.value(&IndicatorRef::sma(SMA_SLOW_PERIOD), index)
    }

    pub fn rsi_default(&self, index: usize) -> f64 {
        self.value(&IndicatorRef::rsi(RSI_DEFAULT_PERIOD), index)
    }

    /// Whether every default-strategy indicator is defined at `index`.
    /// False only inside the warm-up window; such bars are skipped by the
    /// simulator.
    pub fn defaults_defined(&self, index: usize) -> bool {
        !self.sma_fast(index).is_nan()
            && !self.sma_slow(index).is_nan()
            && !self.rsi_default(index).is_nan()
    }
}

/// Compute every indicator column a run needs: the default strategy's
/// SMA/RSI plus anything referenced by the user rules (on either side of a
/// condition). Unsupported indicator names get an all-NaN column so rule
/// resolution stays uniform.
pub fn compute_table(bars: &[PriceBar], rules: &[StrategyRule]) -> IndicatorTable {
    let mut required: HashSet<IndicatorRef> = HashSet::from([
        IndicatorRef::sma(SMA_FAST_PERIOD),
        IndicatorRef::sma(SMA_SLOW_PERIOD),
        IndicatorRef::rsi(RSI_DEFAULT_PERIOD),
    ]);
    for rule in rules {
        collect_operand(&rule.condition.left, &mut required);
        collect_operand(&rule.condition.right, &mut required);
    }

    let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let mut columns = HashMap::with_capacity(required.len());
    for indicator in required {
        let column = match &indicator.kind {
            IndicatorKind::Sma => sma(&close, indicator.period as usize),
            IndicatorKind::Rsi => rsi(&close, indicator.period as usize),
            IndicatorKind::Unsupported(_) => vec![f64::NAN; close.len()],
        };
        columns.insert(indicator, column);
    }
    IndicatorTable { columns }
}

fn collect_operand(operand: &Operand, required: &mut HashSet<IndicatorRef>) {
    if let Operand::Indicator(indicator) = operand {
        required.insert(indicator.clone());
    }
}

/// Simple Moving Average over closes. First `period-1` values are NaN.
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    let len = data.len();
    let mut result = vec![f64::NAN; len];
    if period == 0 || len < period {
        return result;
    }
    let mut sum: f64 = data[..period].iter().sum();
    result[period - 1] = sum / period as f64;
    for i in period..len {
        sum += data[i] - data[i - period];
        result[i] = sum / period as f64;
    }
    result
}

/// Relative Strength Index using simple rolling means of the positive and
/// negative close-to-close deltas (not Wilder's smoothed variant). The
/// first defined value is at index `period`, once `period` deltas exist.
pub fn rsi(close: &[f64], period: usize) -> Vec<f64> {
    let len = close.len();
    let mut result = vec![f64::NAN; len];
    if period == 0 || len < period + 1 {
        return result;
    }

    let mut gains = vec![0.0f64; len];
    let mut losses = vec![0.0f64; len];
    for i in 1..len {
        let change = close[i] - close[i - 1];
        if change > 0.0 {
            gains[i] = change;
        } else {
            losses[i] = -change;
        }
    }

    let mut gain_sum: f64 = gains[1..=period].iter().sum();
    let mut loss_sum: f64 = losses[1..=period].iter().sum();
    result[period] = rsi_from_sums(gain_sum, loss_sum, period);
    for i in (period + 1)..len {
        gain_sum += gains[i] - gains[i - period];
        loss_sum += losses[i] - losses[i - period];
        result[i] = rsi_from_sums(gain_sum, loss_sum, period);
    }
    result
}

fn rsi_from_sums(gain_sum: f64, loss_sum: f64, period: usize) -> f64 {
    // max(0) guards rolling-sum drift in the incremental updates.
    let avg_gain = (gain_sum / period as f64).max(0.0);
    let avg_loss = (loss_sum / period as f64).max(0.0);
    let rs = avg_gain / avg_loss.max(RSI_EPSILON);
    100.0 - 100.0 / (1.0 + rs)
}
