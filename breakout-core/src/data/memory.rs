//! In-memory bar source for tests and embedding.

use std::collections::HashMap;

use super::provider::{first_unordered, BarSource, DataError};
use crate::domain::Bar;

#[derive(Debug, Clone, Default)]
pub struct MemoryBarSource {
    series: HashMap<String, Vec<Bar>>,
}

impl MemoryBarSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, instrument: impl Into<String>, bars: Vec<Bar>) -> Self {
        self.insert(instrument, bars);
        self
    }

    pub fn insert(&mut self, instrument: impl Into<String>, bars: Vec<Bar>) {
        self.series.insert(instrument.into(), bars);
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl BarSource for MemoryBarSource {
    fn name(&self) -> &str {
        "memory"
    }

    fn load(&self, instrument: &str) -> Result<Vec<Bar>, DataError> {
        let bars = self
            .series
            .get(instrument)
            .ok_or_else(|| DataError::NoData {
                instrument: instrument.to_string(),
            })?;
        if let Some(i) = first_unordered(bars) {
            return Err(DataError::Unordered {
                instrument: instrument.to_string(),
                line: i as u64 + 1,
            });
        }
        Ok(bars.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bar(hour: u32) -> Bar {
        Bar::new(Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap(), 1.0, 1.0, 1.0, 1.0)
    }

    #[test]
    fn unknown_instrument_is_no_data() {
        let source = MemoryBarSource::new();
        assert!(matches!(source.load("EURUSD"), Err(DataError::NoData { .. })));
    }

    #[test]
    fn returns_stored_series() {
        let source = MemoryBarSource::new().with_series("EURUSD", vec![bar(1), bar(2)]);
        assert_eq!(source.load("EURUSD").unwrap().len(), 2);
        assert_eq!(source.name(), "memory");
    }

    #[test]
    fn refuses_out_of_order_series() {
        let source = MemoryBarSource::new().with_series("EURUSD", vec![bar(2), bar(1)]);
        assert!(matches!(
            source.load("EURUSD"),
            Err(DataError::Unordered { line: 2, .. })
        ));
    }

    #[test]
    fn unordered_line_counts_bars_from_one() {
        let source = MemoryBarSource::new().with_series("EURUSD", vec![bar(1), bar(3), bar(4), bar(4)]);
        let err = source.load("EURUSD").unwrap_err();
        assert!(matches!(err, DataError::Unordered { line: 4, .. }));
        assert!(err.to_string().contains("line 4"));
    }
}
