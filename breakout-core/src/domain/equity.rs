use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account equity recorded at a trade close.
///
/// The curve only moves when a trade is realised; there is no bar-by-bar
/// mark-to-market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
}
