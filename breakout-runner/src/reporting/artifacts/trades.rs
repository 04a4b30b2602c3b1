//! Trade tape export (CSV/JSON).

use anyhow::{Context, Result};
use breakout_core::domain::Trade;
use serde::Serialize;
use std::path::Path;

/// One `trades.csv` row.
#[derive(Debug, Serialize)]
struct TradeRow<'a> {
    timestamp_entry: String,
    timestamp_exit: String,
    symbol: &'a str,
    side: &'static str,
    volume: f64,
    entry: f64,
    exit: f64,
    pnl: f64,
    fees: f64,
    reason: &'static str,
}

impl<'a> From<&'a Trade> for TradeRow<'a> {
    fn from(trade: &'a Trade) -> Self {
        Self {
            timestamp_entry: trade.entry_time.to_rfc3339(),
            timestamp_exit: trade.exit_time.to_rfc3339(),
            symbol: &trade.instrument,
            side: trade.side.as_str(),
            volume: trade.size,
            entry: trade.entry_price,
            exit: trade.exit_price,
            pnl: trade.realized_pnl,
            fees: trade.fees,
            reason: trade.exit_reason.as_str(),
        }
    }
}

pub fn write_trades_csv(path: &Path, trades: &[Trade]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create trades CSV {}", path.display()))?;

    if trades.is_empty() {
        wtr.write_record([
            "timestamp_entry",
            "timestamp_exit",
            "symbol",
            "side",
            "volume",
            "entry",
            "exit",
            "pnl",
            "fees",
            "reason",
        ])?;
    }
    for trade in trades {
        wtr.serialize(TradeRow::from(trade))
            .context("Failed to write trade row")?;
    }
    wtr.flush()
        .with_context(|| format!("Failed to flush trades CSV {}", path.display()))?;
    Ok(())
}

pub fn write_trades_json(path: &Path, trades: &[Trade]) -> Result<()> {
    let json = serde_json::to_string_pretty(trades).context("Failed to serialize trades")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write trades JSON {}", path.display()))?;
    Ok(())
}
