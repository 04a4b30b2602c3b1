//! Bar source trait and structured error types.
//!
//! A `BarSource` hands the engine a time-ordered bar sequence per instrument.
//! Where the bars come from (CSV export, memory, a synthetic generator) is the
//! implementation's business.

use thiserror::Error;

use crate::domain::Bar;

/// Structured error types for bar loading.
///
/// All variants are fatal for the instrument they name and for nothing else.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no data for instrument '{instrument}'")]
    NoData { instrument: String },

    #[error("unparseable bar for '{instrument}' at line {line}: {reason}")]
    Unparseable {
        instrument: String,
        line: u64,
        reason: String,
    },

    /// `line` is 1-based: the CSV line for file sources, the bar's position
    /// in the series for in-memory sources.
    #[error("bars for '{instrument}' are not strictly increasing in time (line {line})")]
    Unordered { instrument: String, line: u64 },

    #[error("I/O error reading '{instrument}': {source}")]
    Io {
        instrument: String,
        #[source]
        source: std::io::Error,
    },
}

impl DataError {
    pub fn instrument(&self) -> &str {
        match self {
            DataError::NoData { instrument }
            | DataError::Unparseable { instrument, .. }
            | DataError::Unordered { instrument, .. }
            | DataError::Io { instrument, .. } => instrument,
        }
    }

    /// True when the instrument simply has no source, as opposed to a broken one.
    pub fn is_missing(&self) -> bool {
        matches!(self, DataError::NoData { .. })
    }
}

/// Provider of ordered bar sequences.
pub trait BarSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Bars for one instrument, strictly increasing in time.
    fn load(&self, instrument: &str) -> Result<Vec<Bar>, DataError>;
}

/// Check that timestamps strictly increase. Returns the 0-based index of the first offender.
pub fn first_unordered(bars: &[Bar]) -> Option<usize> {
    bars.windows(2)
        .position(|w| w[1].timestamp <= w[0].timestamp)
        .map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bar(hour: u32) -> Bar {
        Bar::new(Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap(), 1.0, 1.0, 1.0, 1.0)
    }

    #[test]
    fn ordered_sequence_passes() {
        assert_eq!(first_unordered(&[bar(1), bar(2), bar(3)]), None);
        assert_eq!(first_unordered(&[]), None);
    }

    #[test]
    fn duplicate_and_backwards_are_flagged() {
        assert_eq!(first_unordered(&[bar(1), bar(1)]), Some(1));
        assert_eq!(first_unordered(&[bar(1), bar(3), bar(2)]), Some(2));
    }

    #[test]
    fn error_reports_instrument() {
        let err = DataError::NoData {
            instrument: "EURUSD".into(),
        };
        assert_eq!(err.instrument(), "EURUSD");
        assert!(err.is_missing());
        assert_eq!(err.to_string(), "no data for instrument 'EURUSD'");
    }
}
