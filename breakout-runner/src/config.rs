//! Serializable backtest configuration and its validation into engine parameters.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use breakout_core::engine::EngineParams;
use breakout_core::execution::FillModel;
use breakout_core::session::{parse_session_time, parse_timezone, SessionWindow};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config field '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Everything needed to reproduce a backtest.
///
/// Percentages, costs, the session window and the data timezone are required;
/// only the timeframe label, initial equity and CSV directory have defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BacktestConfig {
    // ── Universe ──
    pub symbols: Vec<String>,
    /// Bar period label, e.g. `H1`. Informational; bars are used as loaded.
    #[serde(default = "default_timeframe")]
    pub timeframe: String,

    // ── Account ──
    #[serde(default = "default_initial_equity")]
    pub initial_equity: f64,
    pub equity_pct_per_trade: f64,

    // ── Strategy ──
    pub sl_pct: f64,
    pub tp_pct: f64,
    pub session: SessionConfig,

    // ── Costs / data ──
    pub costs: CostsConfig,
    pub data: DataConfig,
}

/// Local trading window, `HH:MM` strings in the data timezone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    pub start: String,
    pub end: String,
}

/// Costs in price units, commission per unit of size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CostsConfig {
    /// Full quoted spread; half is charged on each fill.
    pub spread: f64,
    pub slippage: f64,
    pub commission_per_lot: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    #[serde(default = "default_csv_dir")]
    pub csv_dir: PathBuf,
    /// IANA name; also the timezone naive CSV timestamps are read in.
    pub timezone: String,
}

fn default_timeframe() -> String {
    "H1".into()
}

fn default_initial_equity() -> f64 {
    100_000.0
}

fn default_csv_dir() -> PathBuf {
    PathBuf::from("data")
}

impl BacktestConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Computes a deterministic hash ID for this configuration.
    ///
    /// Hashes the canonical JSON form (object keys sorted), so two configs that
    /// differ only in TOML layout share a run id.
    pub fn run_id(&self) -> RunId {
        let canonical = serde_json::to_value(self)
            .map(|v| v.to_string())
            .unwrap_or_else(|_| format!("{self:?}"));
        blake3::hash(canonical.as_bytes()).to_hex().to_string()
    }

    /// Data timezone, validated.
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        parse_timezone(&self.data.timezone)
            .map_err(|e| ConfigError::invalid("data.timezone", e.to_string()))
    }

    /// Check every field and convert into the engine's typed parameters.
    pub fn validate(&self) -> Result<EngineParams, ConfigError> {
        if self.symbols.is_empty() {
            return Err(ConfigError::invalid("symbols", "at least one symbol is required"));
        }
        let mut seen = HashSet::new();
        for symbol in &self.symbols {
            if symbol.trim().is_empty() {
                return Err(ConfigError::invalid("symbols", "symbol names must not be empty"));
            }
            if !seen.insert(symbol.as_str()) {
                return Err(ConfigError::invalid("symbols", format!("duplicate symbol '{symbol}'")));
            }
        }

        open_unit("sl_pct", self.sl_pct)?;
        open_unit("tp_pct", self.tp_pct)?;
        if !(self.equity_pct_per_trade.is_finite()
            && self.equity_pct_per_trade > 0.0
            && self.equity_pct_per_trade <= 1.0)
        {
            return Err(ConfigError::invalid(
                "equity_pct_per_trade",
                format!("must be in (0, 1], got {}", self.equity_pct_per_trade),
            ));
        }
        if !(self.initial_equity.is_finite() && self.initial_equity > 0.0) {
            return Err(ConfigError::invalid(
                "initial_equity",
                format!("must be positive, got {}", self.initial_equity),
            ));
        }

        non_negative("costs.spread", self.costs.spread)?;
        non_negative("costs.slippage", self.costs.slippage)?;
        non_negative("costs.commission_per_lot", self.costs.commission_per_lot)?;

        let start = parse_session_time(&self.session.start)
            .map_err(|e| ConfigError::invalid("session.start", e.to_string()))?;
        let end = parse_session_time(&self.session.end)
            .map_err(|e| ConfigError::invalid("session.end", e.to_string()))?;
        let timezone = self.timezone()?;
        let session = SessionWindow::new(start, end, timezone)
            .map_err(|e| ConfigError::invalid("session", e.to_string()))?;

        Ok(EngineParams {
            session,
            sl_pct: self.sl_pct,
            tp_pct: self.tp_pct,
            initial_equity: self.initial_equity,
            equity_pct_per_trade: self.equity_pct_per_trade,
            fill: FillModel::from_spread(self.costs.spread, self.costs.slippage),
            commission_per_lot: self.costs.commission_per_lot,
        })
    }
}

fn open_unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be in (0, 1), got {value}")))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be a non-negative number, got {value}")))
    }
}
