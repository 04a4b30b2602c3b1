//! Breakout Runner: backtest orchestration, metrics and report artifacts.
//!
//! This crate builds on `breakout-core` to provide:
//! - TOML configuration with validation into engine parameters
//! - Parallel bar loading with an optional synthetic fallback
//! - Single-backtest runner with skip accounting
//! - Performance metrics over the trade tape and equity curve
//! - Artifact export (CSV, JSON, Parquet)

pub mod config;
pub mod data_loader;
pub mod metrics;
pub mod reporting;
pub mod runner;

pub use config::{BacktestConfig, ConfigError, RunId};
pub use data_loader::{load_bars, LoadOptions, LoadedData, SkippedInstrument};
pub use metrics::PerformanceMetrics;
pub use reporting::{ArtifactManager, ArtifactPaths};
pub use runner::{run_single_backtest, run_with_source, BacktestResult, RunError};
