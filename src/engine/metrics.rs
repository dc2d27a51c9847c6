//! Summary statistics reduced from the trade log and curves.

use crate::models::result::CurvePoint;
use crate::models::trade::Trade;

/// Aggregate statistics for one run. Percentages are on a 0–100 scale.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub net_profit: f64,
    pub win_rate: f64,
    pub max_drawdown: f64,
    pub profit_factor: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub gross_profit: f64,
    pub gross_loss: f64,
}

/// Reduce a finished run to its summary. `initial_capital` is the clamped
/// starting cash; the empty-input case (no bars loaded) yields all zeros.
pub fn aggregate(
    trades: &[Trade],
    equity_curve: &[CurvePoint],
    underwater: &[CurvePoint],
    initial_capital: f64,
) -> Summary {
    let final_equity = equity_curve
        .last()
        .map(|p| p.value)
        .unwrap_or(initial_capital);
    // The loss floor: a run can never lose more than the capital it started with.
    let net_profit = (final_equity - initial_capital).max(-initial_capital);

    let total_trades = trades.len();
    let winning_trades = trades.iter().filter(|t| t.profit > 0.0).count();
    let win_rate = if total_trades > 0 {
        winning_trades as f64 / total_trades as f64 * 100.0
    } else {
        0.0
    };

    let max_drawdown = underwater
        .iter()
        .map(|p| p.value)
        .fold(f64::INFINITY, f64::min);
    let max_drawdown = if max_drawdown.is_finite() {
        max_drawdown.abs() * 100.0
    } else {
        0.0
    };

    let gross_profit: f64 = trades.iter().filter(|t| t.profit > 0.0).map(|t| t.profit).sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.profit < 0.0)
        .map(|t| t.profit.abs())
        .sum();
    let profit_factor = if gross_loss > 0.0 {
        gross_profit / gross_loss
    } else if gross_profit > 0.0 {
        gross_profit
    } else {
        0.0
    };

    Summary {
        net_profit,
        win_rate,
        max_drawdown,
        profit_factor,
        total_trades,
        winning_trades,
        gross_profit,
        gross_loss,
    }
}
