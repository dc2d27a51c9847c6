//! The backtesting engine: one deterministic pass over an ordered bar
//! sequence. Indicators are computed up front, each bar resolves to at most
//! one action, the portfolio ledger absorbs it, and the trade log and curves
//! reduce to summary metrics.

pub mod indicators;
pub mod metrics;
pub mod portfolio;
pub mod rules;
pub mod signal;

use rayon::prelude::*;
use tracing::info;

use crate::data::BarFeed;
use crate::errors::EngineError;
use crate::models::bar::PriceBar;
use crate::models::job::BacktestJob;
use crate::models::result::{BacktestResult, JobStatus};
use crate::models::strategy::StrategyRule;

pub use portfolio::{Portfolio, RunConfig};
pub use signal::Action;

/// Run one job against its (already warm-up-padded) bar sequence.
///
/// Decoding the strategy payload is the only fallible step; once decoded,
/// the simulation is total and always yields a COMPLETED result. The
/// transport collaborator drops jobs whose payload fails to decode.
pub fn run_job(job: &BacktestJob, bars: &[PriceBar]) -> Result<BacktestResult, EngineError> {
    let rules = match &job.strategy {
        Some(payload) => payload.decode()?,
        None => Vec::new(),
    };
    Ok(run_decoded(job, bars, &rules))
}

/// As [`run_job`], fetching the bars from the data collaborator first.
pub fn run_job_with_feed(
    job: &BacktestJob,
    feed: &dyn BarFeed,
) -> Result<BacktestResult, EngineError> {
    let bars = feed.fetch_bars(&job.symbol, job.data_from, job.data_to)?;
    run_job(job, &bars)
}

/// Run independent jobs concurrently. Each run owns its state exclusively,
/// so this is a plain parallel map; results come back in input order.
pub fn run_jobs(
    jobs: &[(BacktestJob, Vec<PriceBar>)],
) -> Vec<Result<BacktestResult, EngineError>> {
    jobs.par_iter()
        .map(|(job, bars)| run_job(job, bars))
        .collect()
}

/// Core pipeline with the strategy already decoded.
pub fn run_decoded(
    job: &BacktestJob,
    bars: &[PriceBar],
    rules: &[StrategyRule],
) -> BacktestResult {
    if bars.is_empty() {
        info!("job {}: no price data, returning empty result", job.job_id);
        return BacktestResult::empty(job.job_id);
    }

    if rules.is_empty() {
        info!("job {}: {} bars, default SMA/RSI strategy", job.job_id, bars.len());
    } else {
        info!("job {}: {} bars, {} user rule(s)", job.job_id, bars.len(), rules.len());
    }

    let config = RunConfig::from_job(job);
    let table = indicators::compute_table(bars, rules);
    let portfolio = portfolio::simulate(bars, &table, rules, config.clone());

    let summary = metrics::aggregate(
        &portfolio.trades,
        &portfolio.equity_curve,
        &portfolio.underwater,
        config.initial_capital,
    );
    info!(
        "job {}: done, trades={} net_profit={:.2} max_dd={:.2}%",
        job.job_id, summary.total_trades, summary.net_profit, summary.max_drawdown
    );

    let (trades, equity_curve, underwater) = portfolio.into_output();
    BacktestResult {
        job_id: job.job_id,
        status: JobStatus::Completed,
        net_profit: summary.net_profit,
        win_rate: summary.win_rate,
        max_drawdown: summary.max_drawdown,
        profit_factor: summary.profit_factor,
        total_trades: summary.total_trades,
        equity_curve,
        underwater,
        trades,
    }
}
