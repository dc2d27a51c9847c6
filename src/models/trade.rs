use serde::{Deserialize, Serialize};

/// Direction of the position a trade closed. The engine is long-only, so
/// every emitted trade carries `Buy` (a closed long); `Sell` exists in the
/// wire vocabulary for compatibility with the platform's message schema.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// A completed round-trip trade, created exactly once per sell (including
/// the forced end-of-series liquidation). Wire field names are camelCase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub entry_time: i64,
    pub exit_time: i64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    pub profit: f64,
    pub side: TradeSide,
}
