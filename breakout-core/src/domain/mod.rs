//! Domain types for the breakout simulator

pub mod bar;
pub mod equity;
pub mod position;
pub mod trade;

pub use bar::Bar;
pub use equity::EquityPoint;
pub use position::{Position, Side};
pub use trade::{ExitReason, Trade};
