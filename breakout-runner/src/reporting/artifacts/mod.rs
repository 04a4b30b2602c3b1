//! Artifact manager for persisting run outputs.
//!
//! Layout under `{output_dir}/{run_id}/`:
//! - `trades.csv`, `trades.json`: closed trades in processing order
//! - `equity_curve.csv`, `equity_curve.parquet`: one point per closed trade
//! - `summary.json`: headline equity and performance metrics
//! - `manifest.json`: config, provenance, per-instrument outcomes, skipped instruments

mod equity;
mod manifest;
mod summary;
mod trades;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::runner::BacktestResult;

pub use equity::{write_equity_csv, write_equity_parquet};
pub use manifest::RunManifest;
pub use trades::{write_trades_csv, write_trades_json};

/// Artifact paths returned after export.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub run_dir: PathBuf,
    pub manifest: PathBuf,
    pub summary: PathBuf,
    pub equity_csv: PathBuf,
    pub equity_parquet: PathBuf,
    pub trades_csv: PathBuf,
    pub trades_json: PathBuf,
}

/// Manages writing all artifacts for a run.
#[derive(Debug, Clone)]
pub struct ArtifactManager {
    output_dir: PathBuf,
}

impl ArtifactManager {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)
            .context("Failed to create artifact output directory")?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Save complete run artifacts.
    pub fn save_run(&self, result: &BacktestResult) -> Result<ArtifactPaths> {
        let run_dir = self.output_dir.join(&result.run_id);
        std::fs::create_dir_all(&run_dir).context("Failed to create run artifact directory")?;

        let manifest_path = run_dir.join("manifest.json");
        manifest::write_manifest(&manifest_path, result)?;

        let summary_path = run_dir.join("summary.json");
        summary::write_summary(&summary_path, result)?;

        let equity_csv = run_dir.join("equity_curve.csv");
        let equity_parquet = run_dir.join("equity_curve.parquet");
        equity::write_equity_csv(&equity_csv, &result.equity_curve)?;
        equity::write_equity_parquet(&equity_parquet, &result.equity_curve)?;

        let trades_csv = run_dir.join("trades.csv");
        let trades_json = run_dir.join("trades.json");
        trades::write_trades_csv(&trades_csv, &result.trades)?;
        trades::write_trades_json(&trades_json, &result.trades)?;

        info!(dir = %run_dir.display(), "artifacts written");
        Ok(ArtifactPaths {
            run_dir,
            manifest: manifest_path,
            summary: summary_path,
            equity_csv,
            equity_parquet,
            trades_csv,
            trades_json,
        })
    }
}
