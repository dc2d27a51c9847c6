use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::strategy::StrategyPayload;

/// Flat commission on gross notional, charged on entry and exit.
pub const DEFAULT_COMMISSION_RATE: f64 = 0.0015;
/// Loss fraction that forces a sell, e.g. 0.05 = exit at -5%.
pub const DEFAULT_STOP_LOSS: f64 = 0.05;
/// Gain fraction that forces a sell, e.g. 0.10 = exit at +10%.
pub const DEFAULT_TAKE_PROFIT: f64 = 0.10;

/// A backtest job as delivered by the transport collaborator. The free-form
/// `job_config` map carries risk-overlay overrides; unrecognized keys are
/// ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestJob {
    pub job_id: i64,
    pub symbol: String,
    #[serde(default)]
    pub strategy_id: Option<i64>,
    pub data_from: NaiveDate,
    pub data_to: NaiveDate,
    #[serde(default)]
    pub price_source: Option<String>,
    #[serde(default)]
    pub session_id: Option<i64>,
    #[serde(default)]
    pub initial_capital: f64,
    #[serde(default = "default_commission_rate")]
    pub commission_rate: f64,
    #[serde(default)]
    pub job_config: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyPayload>,
}

fn default_commission_rate() -> f64 {
    DEFAULT_COMMISSION_RATE
}

impl BacktestJob {
    pub fn stop_loss_pct(&self) -> f64 {
        self.config_value("stop_loss").unwrap_or(DEFAULT_STOP_LOSS)
    }

    pub fn take_profit_pct(&self) -> f64 {
        self.config_value("take_profit").unwrap_or(DEFAULT_TAKE_PROFIT)
    }

    fn config_value(&self, key: &str) -> Option<f64> {
        self.job_config.get(key).and_then(|v| v.as_f64())
    }
}
