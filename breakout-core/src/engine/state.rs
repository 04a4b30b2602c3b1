//! Per-instrument outcome and whole-run result types.

use serde::{Deserialize, Serialize};

use crate::domain::{EquityPoint, Position, Trade};

/// Minimum bars an instrument needs: one to evaluate, one to price the entry.
pub const MIN_BARS: usize = 2;

/// How an instrument's pass through the loop ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Completed,
    Skipped { reason: String },
}

/// Summary of one instrument's processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentOutcome {
    pub instrument: String,
    pub bars: usize,
    pub trades: usize,
    pub equity_before: f64,
    pub final_equity: f64,
    #[serde(flatten)]
    pub status: OutcomeStatus,
    /// Position left open when the bars ran out. Unrealised, never booked to equity.
    pub open_position: Option<Position>,
}

impl InstrumentOutcome {
    pub fn skipped(instrument: impl Into<String>, bars: usize, equity: f64, reason: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            bars,
            trades: 0,
            equity_before: equity,
            final_equity: equity,
            status: OutcomeStatus::Skipped {
                reason: reason.into(),
            },
            open_position: None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, OutcomeStatus::Skipped { .. })
    }

    pub fn skip_reason(&self) -> Option<&str> {
        match &self.status {
            OutcomeStatus::Skipped { reason } => Some(reason),
            OutcomeStatus::Completed => None,
        }
    }
}

/// Output of a complete backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub initial_equity: f64,
    pub final_equity: f64,
    /// Closed trades in processing order: instrument by instrument, then by exit time.
    pub trades: Vec<Trade>,
    /// One point per trade, same order as `trades`.
    pub equity_curve: Vec<EquityPoint>,
    pub outcomes: Vec<InstrumentOutcome>,
}

impl RunResult {
    pub fn open_positions(&self) -> impl Iterator<Item = &Position> {
        self.outcomes.iter().filter_map(|o| o.open_position.as_ref())
    }

    /// `(instrument, reason)` for every instrument the loop did not process.
    pub fn skipped(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.skip_reason().map(|r| (o.instrument.as_str(), r)))
    }
}
