//! Backtest engine: per-instrument bar loop with a single running equity.
//!
//! Instruments run sequentially. The [`Ledger`](crate::ledger::Ledger) is
//! owned by value and passed from one instrument to the next, so later
//! instruments size their entries from the equity left by earlier ones.

pub mod loop_runner;
pub mod params;
pub mod state;

pub use loop_runner::{run_backtest, run_instrument};
pub use params::EngineParams;
pub use state::{InstrumentOutcome, OutcomeStatus, RunResult, MIN_BARS};
