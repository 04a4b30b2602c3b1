//! Position snapshot: a flat, explicitly-validated record per instrument.
//!
//! On disk the snapshot is a JSON object keyed by instrument, each value either
//! `null` (flat) or a record:
//!
//! ```json
//! {
//!   "EURUSD": {
//!     "entry_price": 1.1002,
//!     "entry_time": "2024-01-15T10:00:00Z",
//!     "side": "long",
//!     "sl_price": 1.0947,
//!     "tp_price": 1.1057,
//!     "volume": 1818.2
//!   },
//!   "GBPUSD": null
//! }
//! ```
//!
//! Every record field is required and unknown keys are rejected. A `null`
//! field counts as missing. Errors name the offending field; nothing is
//! defaulted.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{Position, Side};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed snapshot: {0}")]
    Malformed(String),

    #[error("snapshot entry '{instrument}' is missing field '{field}'")]
    MissingField {
        instrument: String,
        field: &'static str,
    },

    #[error("snapshot entry '{instrument}' has unknown field '{field}'")]
    UnknownField { instrument: String, field: String },

    #[error("snapshot entry '{instrument}' has invalid field '{field}': {reason}")]
    InvalidField {
        instrument: String,
        field: &'static str,
        reason: String,
    },
}

/// Persisted form of an open position. Field order is alphabetical so the
/// JSON keys come out sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PositionRecord {
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    pub side: Side,
    pub sl_price: f64,
    pub tp_price: f64,
    pub volume: f64,
}

impl PositionRecord {
    /// Record keys, in serialized order.
    pub const FIELDS: [&'static str; 6] = ["entry_price", "entry_time", "side", "sl_price", "tp_price", "volume"];

    pub fn from_position(position: &Position) -> Self {
        Self {
            entry_price: position.entry_price,
            entry_time: position.entry_time,
            side: position.side,
            sl_price: position.stop_price,
            tp_price: position.target_price,
            volume: position.size,
        }
    }

    /// Deserialize one snapshot entry and validate it.
    pub fn from_value(instrument: &str, value: Value) -> Result<Self, SnapshotError> {
        let Value::Object(mut obj) = value else {
            return Err(SnapshotError::Malformed(format!(
                "entry '{instrument}' is not an object or null"
            )));
        };
        obj.retain(|_, v| !v.is_null());

        let value = Value::Object(obj);
        let record = Self::deserialize(&value).map_err(|err| match &value {
            Value::Object(obj) => field_error(instrument, obj, err),
            _ => SnapshotError::Malformed(err.to_string()),
        })?;
        record.validate(instrument)?;
        Ok(record)
    }

    /// Prices and volume must be positive, and stop and target must bracket
    /// the entry on the correct sides.
    pub fn validate(&self, instrument: &str) -> Result<(), SnapshotError> {
        for (field, value) in [
            ("entry_price", self.entry_price),
            ("sl_price", self.sl_price),
            ("tp_price", self.tp_price),
            ("volume", self.volume),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(instrument, field, format!("expected a positive number, got {value}")));
            }
        }

        let bracketed = match self.side {
            Side::Long => self.sl_price < self.entry_price && self.entry_price < self.tp_price,
            Side::Short => self.tp_price < self.entry_price && self.entry_price < self.sl_price,
        };
        if !bracketed {
            return Err(invalid(
                instrument,
                "sl_price",
                format!(
                    "stop {} and target {} do not bracket entry {} for a {} position",
                    self.sl_price, self.tp_price, self.entry_price, self.side
                ),
            ));
        }
        Ok(())
    }

    /// Rebuild the live position.
    pub fn into_position(self, instrument: &str) -> Result<Position, SnapshotError> {
        self.validate(instrument)?;
        Ok(Position {
            instrument: instrument.to_string(),
            side: self.side,
            size: self.volume,
            entry_price: self.entry_price,
            stop_price: self.sl_price,
            target_price: self.tp_price,
            entry_time: self.entry_time,
        })
    }
}

fn invalid(instrument: &str, field: &'static str, reason: impl Into<String>) -> SnapshotError {
    SnapshotError::InvalidField {
        instrument: instrument.to_string(),
        field,
        reason: reason.into(),
    }
}

/// Attribute a failed record deserialization to a single field.
fn field_error(instrument: &str, obj: &Map<String, Value>, err: serde_json::Error) -> SnapshotError {
    if let Some(key) = obj
        .keys()
        .find(|k| !PositionRecord::FIELDS.contains(&k.as_str()))
    {
        return SnapshotError::UnknownField {
            instrument: instrument.to_string(),
            field: key.clone(),
        };
    }
    if let Some(field) = PositionRecord::FIELDS
        .into_iter()
        .find(|f| !obj.contains_key(*f))
    {
        return SnapshotError::MissingField {
            instrument: instrument.to_string(),
            field,
        };
    }
    for field in PositionRecord::FIELDS {
        let Some(value) = obj.get(field) else {
            continue;
        };
        let rejected = match field {
            "entry_time" => DateTime::<Utc>::deserialize(value).err(),
            "side" => Side::deserialize(value).err(),
            _ => f64::deserialize(value).err(),
        };
        if let Some(e) = rejected {
            return invalid(instrument, field, e.to_string());
        }
    }
    SnapshotError::Malformed(format!("entry '{instrument}': {err}"))
}

/// Open positions per instrument at a point in time.
///
/// Deserializing runs the same per-record validation as [`StateSnapshot::from_json`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StateSnapshot {
    pub positions: BTreeMap<String, Option<PositionRecord>>,
}

impl StateSnapshot {
    pub fn from_positions<'a, I>(positions: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Option<&'a Position>)>,
    {
        let positions = positions
            .into_iter()
            .map(|(instrument, pos)| (instrument.to_string(), pos.map(PositionRecord::from_position)))
            .collect();
        Self { positions }
    }

    fn from_entries(entries: BTreeMap<String, Value>) -> Result<Self, SnapshotError> {
        let positions = entries
            .into_iter()
            .map(|(instrument, entry)| {
                let record = match entry {
                    Value::Null => None,
                    value => Some(PositionRecord::from_value(&instrument, value)?),
                };
                Ok::<_, SnapshotError>((instrument, record))
            })
            .collect::<Result<_, SnapshotError>>()?;
        Ok(Self { positions })
    }

    /// Position for `instrument`, or `None` when flat or not tracked.
    pub fn restore(&self, instrument: &str) -> Result<Option<Position>, SnapshotError> {
        match self.positions.get(instrument) {
            Some(Some(record)) => record.clone().into_position(instrument).map(Some),
            _ => Ok(None),
        }
    }

    pub fn open_count(&self) -> usize {
        self.positions.values().filter(|p| p.is_some()).count()
    }

    /// Parse and validate snapshot JSON text.
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        let entries: BTreeMap<String, Value> =
            serde_json::from_str(text).map_err(|e| SnapshotError::Malformed(e.to_string()))?;
        Self::from_entries(entries)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self).map_err(|e| SnapshotError::Malformed(e.to_string()))
    }
}

impl<'de> Deserialize<'de> for StateSnapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = BTreeMap::<String, Value>::deserialize(deserializer)?;
        Self::from_entries(entries).map_err(de::Error::custom)
    }
}

/// Read a snapshot. A missing file is `Ok(None)`.
pub fn load_snapshot(path: &Path) -> Result<Option<StateSnapshot>, SnapshotError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SnapshotError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    StateSnapshot::from_json(&text).map(Some)
}

/// Write a snapshot through a temporary sibling file and a rename.
pub fn save_snapshot(path: &Path, snapshot: &StateSnapshot) -> Result<(), SnapshotError> {
    let io_err = |p: &Path| {
        let p = p.to_path_buf();
        move |source| SnapshotError::Io { path: p, source }
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, snapshot.to_json()?).map_err(io_err(&tmp))?;
    fs::rename(&tmp, path).map_err(io_err(path))?;
    Ok(())
}
