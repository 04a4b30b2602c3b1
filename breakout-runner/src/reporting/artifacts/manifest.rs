//! Run manifest export (JSON).

use anyhow::{Context, Result};
use breakout_core::engine::InstrumentOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::BacktestConfig;
use crate::data_loader::SkippedInstrument;
use crate::runner::BacktestResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: u32,
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    pub config: BacktestConfig,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub bar_count: usize,
    pub outcomes: Vec<InstrumentOutcome>,
    pub skipped: Vec<SkippedInstrument>,
}

impl RunManifest {
    pub fn from_result(result: &BacktestResult, created_at: DateTime<Utc>) -> Self {
        Self {
            schema_version: result.schema_version,
            run_id: result.run_id.clone(),
            created_at,
            config: result.config.clone(),
            dataset_hash: result.dataset_hash.clone(),
            has_synthetic: result.has_synthetic,
            bar_count: result.bar_count,
            outcomes: result.outcomes.clone(),
            skipped: result.skipped.clone(),
        }
    }
}

pub fn write_manifest(path: &Path, result: &BacktestResult) -> Result<()> {
    let manifest = RunManifest::from_result(result, Utc::now());
    let json =
        serde_json::to_string_pretty(&manifest).context("Failed to serialize run manifest")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write manifest to {}", path.display()))?;
    Ok(())
}
