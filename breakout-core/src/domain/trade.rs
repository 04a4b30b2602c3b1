//! Trade: a closed round trip with realised P&L.

use super::position::Side;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which protective level closed the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitReason {
    Stop,
    Target,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::Stop => "stop",
            ExitReason::Target => "target",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed round trip: entry → stop or target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Identification ──
    pub instrument: String,
    pub side: Side,
    pub size: f64,

    // ── Entry ──
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,

    // ── Exit ──
    pub exit_price: f64,
    pub exit_time: DateTime<Utc>,
    pub exit_reason: ExitReason,

    // ── PnL ──
    /// Price P&L on the cost-adjusted fills, before commission.
    pub realized_pnl: f64,
    pub fees: f64,
}

impl Trade {
    /// Return on the trade as a fraction of entry notional, `None` when the
    /// notional is zero.
    pub fn return_pct(&self) -> Option<f64> {
        let notional = self.entry_price * self.size;
        if notional == 0.0 {
            return None;
        }
        Some(self.realized_pnl / notional)
    }

    pub fn is_winner(&self) -> bool {
        self.realized_pnl > 0.0
    }
}
