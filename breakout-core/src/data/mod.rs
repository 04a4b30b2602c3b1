//! Bar sources: where ordered OHLC sequences come from.

pub mod csv_source;
pub mod memory;
pub mod provider;

pub use csv_source::{parse_timestamp, CsvBarSource};
pub use memory::MemoryBarSource;
pub use provider::{first_unordered, BarSource, DataError};
