//! Breakout Core: domain types, session clock, intraday breakout signal, fills, ledger and engine.
//!
//! This crate contains the heart of the simulator:
//! - Domain types (bars, positions, trades, equity points)
//! - Session window membership in a configured timezone
//! - Intraday breakout state machine with explicit threaded state
//! - Spread/slippage fill model and the stop-first exit ledger
//! - The per-instrument bar loop folding a single running equity
//! - Bar sources (CSV, memory) and the position snapshot schema

pub mod data;
pub mod domain;
pub mod engine;
pub mod execution;
pub mod ledger;
pub mod persistence;
pub mod session;
pub mod signal;

pub use engine::{run_backtest, EngineParams, RunResult};
