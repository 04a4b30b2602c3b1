//! Equity curve export (CSV/Parquet).

use anyhow::{Context, Result};
use breakout_core::domain::EquityPoint;
use polars::prelude::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub fn write_equity_csv(path: &Path, equity: &[EquityPoint]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create equity CSV {}", path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "timestamp,equity")?;
    for point in equity {
        writeln!(out, "{},{}", point.timestamp.to_rfc3339(), point.equity)?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_equity_parquet(path: &Path, equity: &[EquityPoint]) -> Result<()> {
    let timestamps: Vec<String> = equity.iter().map(|p| p.timestamp.to_rfc3339()).collect();
    let values: Vec<f64> = equity.iter().map(|p| p.equity).collect();

    let mut df = DataFrame::new(vec![
        Column::new("timestamp".into(), timestamps),
        Column::new("equity".into(), values),
    ])
    .context("Failed to build equity dataframe")?;

    let mut file = File::create(path)
        .with_context(|| format!("Failed to create equity parquet {}", path.display()))?;
    ParquetWriter::new(&mut file)
        .finish(&mut df)
        .context("Failed to write equity parquet")?;
    Ok(())
}
