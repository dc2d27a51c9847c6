//! Deterministic, single-asset, long-only strategy backtesting engine.
//!
//! A job (symbol, date range, capital, risk config, optional rule set) plus
//! an ordered, warm-up-padded bar sequence goes in; a complete result
//! message (metrics, equity and underwater curves, trade log) comes out.
//! Price retrieval and the message transport are collaborators of the
//! embedding worker, reached through the [`data::BarFeed`] port.

pub mod data;
pub mod engine;
pub mod errors;
pub mod models;

pub use engine::{run_job, run_job_with_feed, run_jobs};
pub use errors::EngineError;
