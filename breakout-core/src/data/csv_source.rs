//! CSV bar source: one `{INSTRUMENT}.csv` per instrument in a directory.
//!
//! Expected header: `time,open,high,low,close`, extra columns ignored
//! (terminal exports carry `tick_volume`, `spread`, `real_volume`).
//! Rows may arrive in any order; they are sorted and must not repeat a timestamp.
//! A row whose high/low do not bound its open and close is rejected.

use std::path::PathBuf;

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use super::provider::{BarSource, DataError};
use crate::domain::Bar;

/// Naive layouts accepted for the `time` column, interpreted in the source timezone.
/// `%.f` also matches a missing fraction, so `10:00:00` and `10:00:00.250` share a layout.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y.%m.%d %H:%M:%S%.f",
    "%Y.%m.%d %H:%M",
];

/// Epoch seconds between 1973 and 5138 have 9 to 11 digits. Shorter digit
/// runs are compact dates like `20240115`, not instants.
const EPOCH_DIGITS: std::ops::RangeInclusive<usize> = 9..=11;

const COLUMNS: [&str; 5] = ["time", "open", "high", "low", "close"];

/// Reads `{dir}/{instrument}.csv`.
#[derive(Debug, Clone)]
pub struct CsvBarSource {
    dir: PathBuf,
    timezone: Tz,
}

impl CsvBarSource {
    pub fn new(dir: impl Into<PathBuf>, timezone: Tz) -> Self {
        Self {
            dir: dir.into(),
            timezone,
        }
    }

    pub fn path_for(&self, instrument: &str) -> PathBuf {
        self.dir.join(format!("{instrument}.csv"))
    }

    /// Parse CSV text that has already been read.
    pub fn parse(&self, instrument: &str, text: &str) -> Result<Vec<Bar>, DataError> {
        parse_bars(instrument, text.as_bytes(), self.timezone)
    }
}

impl BarSource for CsvBarSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn load(&self, instrument: &str) -> Result<Vec<Bar>, DataError> {
        let path = self.path_for(instrument);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DataError::NoData {
                    instrument: instrument.to_string(),
                })
            }
            Err(source) => {
                return Err(DataError::Io {
                    instrument: instrument.to_string(),
                    source,
                })
            }
        };
        let bars = self.parse(instrument, &text)?;
        debug!(instrument = %instrument, path = %path.display(), bars = bars.len(), "loaded csv bars");
        Ok(bars)
    }
}

fn parse_bars(instrument: &str, input: &[u8], tz: Tz) -> Result<Vec<Bar>, DataError> {
    let unparseable = |line: u64, reason: String| DataError::Unparseable {
        instrument: instrument.to_string(),
        line,
        reason,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| unparseable(1, e.to_string()))?
        .clone();
    let mut idx = [0usize; 5];
    for (slot, name) in idx.iter_mut().zip(COLUMNS) {
        *slot = column_index(&headers, name)
            .ok_or_else(|| unparseable(1, format!("missing column '{name}'")))?;
    }
    let [time_i, open_i, high_i, low_i, close_i] = idx;

    let mut rows: Vec<(Bar, u64)> = Vec::new();
    for (n, record) in reader.records().enumerate() {
        let line = n as u64 + 2;
        let record = record.map_err(|e| unparseable(line, e.to_string()))?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let field = |i: usize, name: &str| {
            record
                .get(i)
                .ok_or_else(|| unparseable(line, format!("missing field '{name}'")))
        };
        let price = |i: usize, name: &str| -> Result<f64, DataError> {
            let raw = field(i, name)?;
            let value: f64 = raw
                .parse()
                .map_err(|_| unparseable(line, format!("invalid {name} '{raw}'")))?;
            if value.is_finite() {
                Ok(value)
            } else {
                Err(unparseable(line, format!("non-finite {name} '{raw}'")))
            }
        };

        let timestamp = parse_timestamp(field(time_i, "time")?, tz).map_err(|r| unparseable(line, r))?;
        let bar = Bar::new(
            timestamp,
            price(open_i, "open")?,
            price(high_i, "high")?,
            price(low_i, "low")?,
            price(close_i, "close")?,
        );
        if !bar.is_sane() {
            return Err(unparseable(
                line,
                format!(
                    "inconsistent prices: open {} high {} low {} close {}",
                    bar.open, bar.high, bar.low, bar.close
                ),
            ));
        }
        rows.push((bar, line));
    }

    rows.sort_by_key(|(bar, _)| bar.timestamp);
    if let Some(dup) = rows
        .windows(2)
        .find(|w| w[0].0.timestamp == w[1].0.timestamp)
    {
        return Err(DataError::Unordered {
            instrument: instrument.to_string(),
            line: dup[1].1,
        });
    }

    Ok(rows.into_iter().map(|(bar, _)| bar).collect())
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}

/// Parse the `time` field.
///
/// Offsets are honoured and naive values are localised to `tz`. A bare integer
/// of 9 to 11 digits is UNIX epoch seconds; other digit-only values are
/// rejected. A local time skipped by a DST transition is an error; an
/// ambiguous one resolves to the earlier instant.
pub fn parse_timestamp(raw: &str, tz: Tz) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        if !EPOCH_DIGITS.contains(&raw.len()) {
            return Err(format!("'{raw}' is neither a date-time nor epoch seconds"));
        }
        let secs: i64 = raw
            .parse()
            .map_err(|_| format!("epoch seconds out of range '{raw}'"))?;
        return DateTime::from_timestamp(secs, 0).ok_or_else(|| format!("epoch seconds out of range '{raw}'"));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| format!("invalid time '{raw}'"))?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(format!("local time '{raw}' does not exist in {tz}")),
    }
}
