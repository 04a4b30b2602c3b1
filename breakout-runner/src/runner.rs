//! Backtest runner: wires together config, bar loading, engine, and metrics.
//!
//! Two entry points:
//! - `run_single_backtest()`: reads CSV bars from the configured directory. Used by the CLI.
//! - `run_with_source()`: takes any `BarSource`. Used by tests and embedders.

use breakout_core::data::{BarSource, CsvBarSource, DataError};
use breakout_core::domain::{EquityPoint, Position, Trade};
use breakout_core::engine::{run_backtest, InstrumentOutcome};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, info_span};

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{load_bars, LoadOptions, SkippedInstrument};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// Every configured instrument failed to load; carries the first failure.
    #[error("no instrument could be loaded: {0}")]
    Data(#[from] DataError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: BacktestConfig,
    pub metrics: PerformanceMetrics,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub initial_equity: f64,
    pub final_equity: f64,
    pub outcomes: Vec<InstrumentOutcome>,
    /// Positions still open when the data ran out. Never booked to equity.
    pub open_positions: Vec<Position>,
    /// Instruments that produced no trades because of missing, broken or too-short data.
    pub skipped: Vec<SkippedInstrument>,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub bar_count: usize,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run a backtest reading `{csv_dir}/{SYMBOL}.csv` for each configured symbol.
pub fn run_single_backtest(
    config: &BacktestConfig,
    opts: &LoadOptions,
) -> Result<BacktestResult, RunError> {
    let timezone = config.timezone()?;
    let source = CsvBarSource::new(&config.data.csv_dir, timezone);
    run_with_source(config, &source, opts)
}

/// Run a backtest with an arbitrary bar source.
///
/// A load failure is fatal for that instrument only: it is reported in
/// `skipped` and the remaining instruments still run. When every instrument
/// fails there is nothing left to simulate, so the run returns
/// [`RunError::Data`] carrying the first failure instead of an empty result
/// that would read as a flat, trade-free backtest.
pub fn run_with_source(
    config: &BacktestConfig,
    source: &dyn BarSource,
    opts: &LoadOptions,
) -> Result<BacktestResult, RunError> {
    // Validation happens before any bar is read.
    let params = config.validate()?;
    let run_id = config.run_id();
    let _span = info_span!("backtest", run_id = %&run_id[..12]).entered();

    let mut loaded = load_bars(&config.symbols, source, opts);
    if loaded.series.is_empty() && !loaded.errors.is_empty() {
        let first = loaded.errors.swap_remove(0);
        error!(error = %first, "no instrument could be loaded");
        return Err(RunError::Data(first));
    }

    info!(
        instruments = loaded.series.len(),
        bars = loaded.bar_count(),
        "running engine"
    );
    let result = run_backtest(
        &params,
        loaded
            .series
            .iter()
            .map(|(symbol, bars)| (symbol.as_str(), bars.as_slice())),
    );

    let metrics = PerformanceMetrics::compute(&result.trades, &result.equity_curve, params.initial_equity);

    let mut skipped = loaded.skipped;
    skipped.extend(result.skipped().map(|(instrument, reason)| SkippedInstrument {
        instrument: instrument.to_string(),
        reason: reason.to_string(),
    }));
    let open_positions: Vec<Position> = result.open_positions().cloned().collect();

    info!(
        trades = result.trades.len(),
        final_equity = result.final_equity,
        total_return = metrics.total_return,
        skipped = skipped.len(),
        "backtest complete"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        config: config.clone(),
        metrics,
        trades: result.trades,
        equity_curve: result.equity_curve,
        initial_equity: result.initial_equity,
        final_equity: result.final_equity,
        outcomes: result.outcomes,
        open_positions,
        skipped,
        dataset_hash: loaded.dataset_hash,
        has_synthetic: loaded.has_synthetic,
        bar_count: loaded.series.iter().map(|(_, b)| b.len()).sum(),
    })
}
