//! Session clock: trading-window membership and local calendar in a target timezone.
//!
//! The window is `[start, end)` on the local time-of-day: a bar stamped exactly
//! at `end` is outside. Windows that wrap midnight are not representable.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid session time '{0}' (expected HH:MM)")]
    InvalidTime(String),

    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("session start {start} must be before session end {end}")]
    EmptyWindow { start: NaiveTime, end: NaiveTime },
}

/// Parse a 24-hour `HH:MM` string.
pub fn parse_session_time(raw: &str) -> Result<NaiveTime, SessionError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| SessionError::InvalidTime(raw.to_string()))
}

/// Resolve an IANA timezone name such as `Europe/Brussels`.
pub fn parse_timezone(name: &str) -> Result<Tz, SessionError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| SessionError::UnknownTimezone(name.to_string()))
}

/// Convert any timezone-aware instant into the target timezone.
pub fn to_local<T: TimeZone>(ts: &DateTime<T>, tz: Tz) -> DateTime<Tz> {
    ts.with_timezone(&tz)
}

/// Interpret a naive timestamp as UTC, then convert into the target timezone.
pub fn naive_to_local(ts: NaiveDateTime, tz: Tz) -> DateTime<Tz> {
    Utc.from_utc_datetime(&ts).with_timezone(&tz)
}

/// True iff the local time-of-day of `ts` lies in `[start, end)`.
pub fn in_session<T: TimeZone>(ts: &DateTime<T>, start: NaiveTime, end: NaiveTime, tz: Tz) -> bool {
    let local = to_local(ts, tz).time();
    start <= local && local < end
}

/// Same as [`in_session`] for a naive timestamp, which is taken to be UTC.
pub fn in_session_naive(ts: NaiveDateTime, start: NaiveTime, end: NaiveTime, tz: Tz) -> bool {
    let local = naive_to_local(ts, tz).time();
    start <= local && local < end
}

/// A configured trading window bound to its timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    start: NaiveTime,
    end: NaiveTime,
    timezone: Tz,
}

impl SessionWindow {
    pub fn new(start: NaiveTime, end: NaiveTime, timezone: Tz) -> Result<Self, SessionError> {
        if start >= end {
            return Err(SessionError::EmptyWindow { start, end });
        }
        Ok(Self {
            start,
            end,
            timezone,
        })
    }

    /// Build a window from `HH:MM` strings and an IANA timezone name.
    pub fn parse(start: &str, end: &str, timezone: &str) -> Result<Self, SessionError> {
        Self::new(
            parse_session_time(start)?,
            parse_session_time(end)?,
            parse_timezone(timezone)?,
        )
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn contains<T: TimeZone>(&self, ts: &DateTime<T>) -> bool {
        in_session(ts, self.start, self.end, self.timezone)
    }

    /// Calendar date of `ts` in the session timezone.
    pub fn local_date<T: TimeZone>(&self, ts: &DateTime<T>) -> NaiveDate {
        to_local(ts, self.timezone).date_naive()
    }
}
