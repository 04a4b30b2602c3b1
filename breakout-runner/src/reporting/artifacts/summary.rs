//! Run summary export (JSON): headline numbers plus performance metrics.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::metrics::PerformanceMetrics;
use crate::runner::BacktestResult;

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    run_id: &'a str,
    initial_equity: f64,
    final_equity: f64,
    open_positions: usize,
    has_synthetic: bool,
    metrics: &'a PerformanceMetrics,
}

pub fn write_summary(path: &Path, result: &BacktestResult) -> Result<()> {
    let summary = RunSummary {
        run_id: &result.run_id,
        initial_equity: result.initial_equity,
        final_equity: result.final_equity,
        open_positions: result.open_positions.len(),
        has_synthetic: result.has_synthetic,
        metrics: &result.metrics,
    };
    let json = serde_json::to_string_pretty(&summary).context("Failed to serialize run summary")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write summary to {}", path.display()))?;
    Ok(())
}
