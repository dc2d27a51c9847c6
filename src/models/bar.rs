use serde::{Deserialize, Serialize};

/// A single OHLC price bar. `timestamp` is unix epoch seconds.
///
/// Bars arrive from the data collaborator as an ordered sequence with
/// strictly increasing timestamps, already padded with enough warm-up
/// history to make every required indicator defined; a bar's sequence
/// index is its position in that slice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}
