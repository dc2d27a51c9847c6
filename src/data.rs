//! Port to the upstream price-data collaborator.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::errors::EngineError;
use crate::models::bar::PriceBar;

/// Supplies the ordered bar sequence for a symbol and date range.
///
/// Implementations must return bars sorted by time with enough warm-up
/// history before `from` to make every required indicator defined; the
/// engine does no date filtering of its own. Returning an empty vector is
/// the no-data case, not an error.
pub trait BarFeed {
    fn fetch_bars(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PriceBar>, EngineError>;
}

/// In-memory feed keyed by symbol, for tests and callers that already hold
/// the bars. Returns the stored sequence verbatim; date-range preparation is
/// the responsibility of whoever loaded it.
#[derive(Debug, Default)]
pub struct StaticBarFeed {
    series: HashMap<String, Vec<PriceBar>>,
}

impl StaticBarFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, bars: Vec<PriceBar>) {
        self.series.insert(symbol.into(), bars);
    }
}

impl BarFeed for StaticBarFeed {
    fn fetch_bars(
        &self,
        symbol: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<Vec<PriceBar>, EngineError> {
        Ok(self.series.get(symbol).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_symbol_is_no_data_not_an_error() {
        let feed = StaticBarFeed::new();
        let bars = feed
            .fetch_bars(
                "HPG",
                NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            )
            .unwrap();
        assert!(bars.is_empty());
    }

    #[test]
    fn stored_series_round_trips() {
        let mut feed = StaticBarFeed::new();
        feed.insert(
            "HPG",
            vec![PriceBar {
                timestamp: 1_700_000_000,
                open: 10.0,
                high: 11.0,
                low: 9.0,
                close: 10.5,
            }],
        );
        let bars = feed
            .fetch_bars(
                "HPG",
                NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            )
            .unwrap();
        assert_eq!(bars.len(), 1);
        assert!((bars[0].close - 10.5).abs() < f64::EPSILON);
    }
}
