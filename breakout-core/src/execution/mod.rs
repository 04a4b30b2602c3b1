//! Execution: converts raw trigger prices into cost-adjusted fills.
//!
//! Costs are directional: the buy side pays up, the sell side receives less.
//! Entries trigger at the next bar's open; exits trigger exactly at the
//! breached stop/target level, never at a worse intrabar extreme.

pub mod fill_model;

pub use fill_model::{FillModel, FillSide};
