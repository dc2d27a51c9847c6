//! Portfolio state machine and the bar-replay loop.
//!
//! Two states: flat (no position) and holding (one long position). Each bar
//! applies, in order: warm-up skip, rule decision, stop-loss/take-profit
//! overlay, execution, and a single canonical ledger update that appends one
//! equity and one underwater point.

use tracing::debug;

use crate::models::bar::PriceBar;
use crate::models::job::BacktestJob;
use crate::models::result::CurvePoint;
use crate::models::strategy::StrategyRule;
use crate::models::trade::{Trade, TradeSide};

use super::indicators::IndicatorTable;
use super::rules::BarWindow;
use super::signal::{self, Action};

/// Risk and accounting parameters for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Starting cash, clamped to >= 0.
    pub initial_capital: f64,
    /// Flat rate on gross notional, charged on entry and exit.
    pub commission_rate: f64,
    /// Loss fraction that forces a sell (0.05 = exit at -5%).
    pub stop_loss_pct: f64,
    /// Gain fraction that forces a sell (0.10 = exit at +10%).
    pub take_profit_pct: f64,
}

impl RunConfig {
    pub fn from_job(job: &BacktestJob) -> Self {
        RunConfig {
            initial_capital: job.initial_capital.max(0.0),
            commission_rate: job.commission_rate,
            stop_loss_pct: job.stop_loss_pct(),
            take_profit_pct: job.take_profit_pct(),
        }
    }
}

/// The open long position while holding. Flat is the absence of one.
#[derive(Debug, Clone)]
struct Position {
    quantity: f64,
    entry_price: f64,
    entry_time: i64,
}

/// The ledger threaded through the bar loop: cash, the position, the trade
/// log and both curves. One instance per run; nothing is shared.
#[derive(Debug)]
pub struct Portfolio {
    cash: f64,
    position: Option<Position>,
    peak_equity: f64,
    config: RunConfig,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<CurvePoint>,
    pub underwater: Vec<CurvePoint>,
}

impl Portfolio {
    pub fn new(config: RunConfig) -> Self {
        let cash = config.initial_capital.max(0.0);
        Portfolio {
            cash,
            position: None,
            peak_equity: cash,
            config,
            trades: Vec::new(),
            equity_curve: Vec::new(),
            underwater: Vec::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn is_holding(&self) -> bool {
        self.position.is_some()
    }

    /// Consume the run, yielding the trade log and both curves.
    pub fn into_output(self) -> (Vec<Trade>, Vec<CurvePoint>, Vec<CurvePoint>) {
        (self.trades, self.equity_curve, self.underwater)
    }

    /// Stop-loss/take-profit overlay. Forces a sell regardless of any
    /// rule-derived action; a zero entry value reads as 0% PnL and never
    /// triggers.
    fn risk_overlay_triggers(&self, price: f64) -> bool {
        let Some(position) = &self.position else {
            return false;
        };
        let entry_value = position.quantity * position.entry_price;
        let pnl_pct = if entry_value > 0.0 {
            (position.quantity * price - entry_value) / entry_value
        } else {
            0.0
        };
        pnl_pct <= -self.config.stop_loss_pct || pnl_pct >= self.config.take_profit_pct
    }

    /// All-in buy: the entire cash balance buys quantity such that
    /// `quantity * price * (1 + commission)` exhausts it, so the fee can
    /// never push cash negative.
    fn execute_buy(&mut self, price: f64, time: i64) {
        if self.position.is_some() || self.cash <= 0.0 {
            return;
        }
        let mut quantity = self.cash / (price * (1.0 + self.config.commission_rate));
        if !quantity.is_finite() || quantity <= 0.0 {
            return;
        }
        let mut total_cost = quantity * price * (1.0 + self.config.commission_rate);
        if total_cost > self.cash {
            // Re-derive once if rounding overshot the available cash.
            quantity = self.cash / (price * (1.0 + self.config.commission_rate));
            total_cost = quantity * price * (1.0 + self.config.commission_rate);
        }
        self.cash = (self.cash - total_cost).max(0.0);
        self.position = Some(Position {
            quantity,
            entry_price: price,
            entry_time: time,
        });
        debug!("buy: qty={:.4} price={:.2} cash_left={:.6}", quantity, price, self.cash);
    }

    /// Close the position: net proceeds return to cash and exactly one
    /// trade record is appended.
    fn execute_sell(&mut self, price: f64, time: i64) {
        let Some(position) = self.position.take() else {
            return;
        };
        let gross = position.quantity * price;
        let fee = gross * self.config.commission_rate;
        let net = gross - fee;
        let profit = net - position.quantity * position.entry_price;
        self.cash += net;
        debug!("sell: qty={:.4} price={:.2} profit={:.2}", position.quantity, price, profit);
        self.trades.push(Trade {
            entry_time: position.entry_time,
            exit_time: time,
            entry_price: position.entry_price,
            exit_price: price,
            quantity: position.quantity,
            profit,
            side: TradeSide::Buy,
        });
    }

    /// The canonical per-bar ledger update: one equity point (floored at 0),
    /// peak refresh, one underwater point.
    fn record_curves(&mut self, time: i64, price: f64) {
        let position_value = self
            .position
            .as_ref()
            .map(|p| p.quantity * price)
            .unwrap_or(0.0);
        let equity = (self.cash + position_value).max(0.0);
        self.equity_curve.push(CurvePoint { time, value: equity });
        self.peak_equity = self.peak_equity.max(equity);
        let drawdown = if self.peak_equity > 0.0 {
            equity / self.peak_equity - 1.0
        } else {
            0.0
        };
        self.underwater.push(CurvePoint { time, value: drawdown });
    }

    /// Fold the forced end-of-series liquidation into the final curve
    /// points, keeping both curves 1:1 with the bar sequence.
    fn rewrite_last_curves(&mut self, time: i64) {
        self.equity_curve.pop();
        self.underwater.pop();
        self.record_curves(time, 0.0);
    }
}

/// Replay the bar sequence through the decide/overlay/execute pipeline.
/// Bars where the default-strategy indicators are still undefined (inside
/// the warm-up window) only carry the curves forward.
pub fn simulate(
    bars: &[PriceBar],
    table: &IndicatorTable,
    rules: &[StrategyRule],
    config: RunConfig,
) -> Portfolio {
    let mut portfolio = Portfolio::new(config);

    for (index, bar) in bars.iter().enumerate() {
        let price = bar.close;

        if !table.defaults_defined(index) {
            portfolio.record_curves(bar.timestamp, price);
            continue;
        }

        let window = BarWindow::at(bars, table, index);
        let mut action = signal::decide(rules, &window, portfolio.is_holding());
        if portfolio.risk_overlay_triggers(price) {
            action = Some(Action::Sell);
        }

        match action {
            Some(Action::Buy) => portfolio.execute_buy(price, bar.timestamp),
            Some(Action::Sell) => portfolio.execute_sell(price, bar.timestamp),
            None => {}
        }

        portfolio.record_curves(bar.timestamp, price);
    }

    // Still holding after the last bar: liquidate at its close.
    if portfolio.is_holding() {
        if let Some(last) = bars.last() {
            debug!("end of series while holding, liquidating at {:.2}", last.close);
            portfolio.execute_sell(last.close, last.timestamp);
            portfolio.rewrite_last_curves(last.timestamp);
        }
    }

    portfolio
}
