//! Logging initialisation.

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides `--log-level` with a full filter directive.
pub const LOG_ENV: &str = "BREAKOUT_LOG";

pub fn init_tracing(log_level: &str, log_format: &str) -> Result<()> {
    let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| log_level.to_string());
    let env_filter = EnvFilter::try_new(&filter)
        .with_context(|| format!("invalid log filter '{filter}'"))?;

    match log_format.trim().to_lowercase().as_str() {
        "json" => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .init(),
        "text" => tracing_subscriber::fmt().with_env_filter(env_filter).init(),
        other => bail!("unknown --log-format '{other}' (expected text or json)"),
    }
    Ok(())
}
