use serde::{Deserialize, Serialize};

use super::trade::Trade;

/// Terminal status of a backtest job. The engine itself only ever reports
/// `Completed` — a job that reaches the engine with valid inputs always
/// produces a well-formed result. `Failed` is published by the transport
/// collaborator when a job cannot be parsed or dispatched.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Completed,
    Failed,
}

/// One point on the equity or underwater curve. Exactly one of each is
/// emitted per processed bar, append-only and time-ordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurvePoint {
    pub time: i64,
    pub value: f64,
}

/// Result message for one job, shaped for the transport collaborator.
/// Wire field names are camelCase per the platform's message schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub job_id: i64,
    pub status: JobStatus,
    #[serde(rename = "netProfit")]
    pub net_profit: f64,
    /// Percentage on a 0–100 scale.
    #[serde(rename = "winRate")]
    pub win_rate: f64,
    /// Percentage on a 0–100 scale.
    #[serde(rename = "maxDrawdown")]
    pub max_drawdown: f64,
    #[serde(rename = "profitFactor")]
    pub profit_factor: f64,
    #[serde(rename = "totalTrades")]
    pub total_trades: usize,
    #[serde(rename = "equityCurve")]
    pub equity_curve: Vec<CurvePoint>,
    pub underwater: Vec<CurvePoint>,
    pub trades: Vec<Trade>,
}

impl BacktestResult {
    /// Canonical zero-activity result for a job whose data source returned
    /// no bars. This is a valid completed outcome, not a failure.
    pub fn empty(job_id: i64) -> Self {
        BacktestResult {
            job_id,
            status: JobStatus::Completed,
            net_profit: 0.0,
            win_rate: 0.0,
            max_drawdown: 0.0,
            profit_factor: 0.0,
            total_trades: 0,
            equity_curve: Vec::new(),
            underwater: Vec::new(),
            trades: Vec::new(),
        }
    }
}
