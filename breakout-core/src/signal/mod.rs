//! Signal generation: detects intraday breakouts, emits directional intent.
//!
//! Signals are position-agnostic: they see the bar and the threaded intraday
//! state, never the open position or equity. Whether a signal turns into a
//! position is the engine's decision.

pub mod intraday_breakout;

pub use intraday_breakout::{IntradayBreakout, IntradayState};

use crate::domain::Side;
use serde::{Deserialize, Serialize};

/// Outcome of evaluating one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Long,
    Short,
    #[default]
    None,
}

impl Signal {
    /// Direction to enter, if any.
    pub fn side(&self) -> Option<Side> {
        match self {
            Signal::Long => Some(Side::Long),
            Signal::Short => Some(Side::Short),
            Signal::None => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Signal::None)
    }

    /// Resolve the two breakout triggers. Ambiguous bars (both or neither) yield `None`.
    pub fn from_triggers(long: bool, short: bool) -> Self {
        match (long, short) {
            (true, false) => Signal::Long,
            (false, true) => Signal::Short,
            _ => Signal::None,
        }
    }
}
