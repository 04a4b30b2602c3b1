//! Position: the single open exposure an instrument may carry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Long => "long",
            Side::Short => "short",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An open position with its protective stop and profit target.
///
/// At most one exists per instrument. It is created on a signal when the
/// instrument is flat and destroyed when converted into a [`Trade`](super::Trade).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub instrument: String,
    pub side: Side,
    /// Units, not lots. No lot-step rounding is applied.
    pub size: f64,
    /// Cost-adjusted entry fill.
    pub entry_price: f64,
    pub stop_price: f64,
    pub target_price: f64,
    pub entry_time: DateTime<Utc>,
}

impl Position {
    /// Open a position and derive stop/target as percentage offsets of the entry fill.
    ///
    /// Long: stop below, target above. Short: mirrored.
    pub fn open(
        instrument: impl Into<String>,
        side: Side,
        entry_price: f64,
        size: f64,
        sl_pct: f64,
        tp_pct: f64,
        entry_time: DateTime<Utc>,
    ) -> Self {
        let stop_offset = entry_price * sl_pct;
        let target_offset = entry_price * tp_pct;
        let (stop_price, target_price) = match side {
            Side::Long => (entry_price - stop_offset, entry_price + target_offset),
            Side::Short => (entry_price + stop_offset, entry_price - target_offset),
        };
        Self {
            instrument: instrument.into(),
            side,
            size,
            entry_price,
            stop_price,
            target_price,
            entry_time,
        }
    }
}
