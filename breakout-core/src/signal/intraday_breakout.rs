//! Intraday breakout: bar high/low exceeding the running extremes of the local day.
//!
//! Per bar, in order:
//! 1. Reset the running levels when the bar's local date differs from `current_day`.
//! 2. Test the breakout against the levels as they stood *before* this bar.
//! 3. Resolve: one trigger → that side; both or neither → no signal.
//! 4. Widen the running levels with this bar's high/low.
//! 5. Suppress the signal outside the session window.
//!
//! Levels keep updating outside session hours; only the signal is gated.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Signal;
use crate::domain::Bar;
use crate::session::SessionWindow;

/// Running intraday extremes for one instrument.
///
/// Passed by value into [`IntradayBreakout::evaluate`] and returned updated, so
/// the step is a pure function that can be replayed from any snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IntradayState {
    pub running_high: Option<f64>,
    pub running_low: Option<f64>,
    pub current_day: Option<NaiveDate>,
}

impl IntradayState {
    /// State seeded with known levels for a given local day.
    pub fn seeded(high: f64, low: f64, day: NaiveDate) -> Self {
        Self {
            running_high: Some(high),
            running_low: Some(low),
            current_day: Some(day),
        }
    }
}

/// Intraday breakout signal generator with a session filter.
#[derive(Debug, Clone)]
pub struct IntradayBreakout {
    session: SessionWindow,
}

impl IntradayBreakout {
    pub fn new(session: SessionWindow) -> Self {
        Self { session }
    }

    pub fn name(&self) -> &str {
        "intraday_breakout"
    }

    pub fn session(&self) -> &SessionWindow {
        &self.session
    }

    /// Evaluate one bar against the threaded state.
    pub fn evaluate(&self, bar: &Bar, state: IntradayState) -> (Signal, IntradayState) {
        let mut next = state;

        let local_day = self.session.local_date(&bar.timestamp);
        if next.current_day != Some(local_day) {
            next = IntradayState {
                running_high: None,
                running_low: None,
                current_day: Some(local_day),
            };
        }

        let long_trigger = next.running_high.is_some_and(|high| bar.high > high);
        let short_trigger = next.running_low.is_some_and(|low| bar.low < low);
        let mut signal = Signal::from_triggers(long_trigger, short_trigger);

        next.running_high = Some(next.running_high.map_or(bar.high, |h| h.max(bar.high)));
        next.running_low = Some(next.running_low.map_or(bar.low, |l| l.min(bar.low)));

        if !self.session.contains(&bar.timestamp) {
            signal = Signal::None;
        }

        (signal, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Brussels;

    fn strategy() -> IntradayBreakout {
        IntradayBreakout::new(SessionWindow::parse("06:00", "20:00", "Europe/Brussels").unwrap())
    }

    fn bar_at(day: u32, hour: u32, high: f64, low: f64) -> Bar {
        let ts = Brussels
            .with_ymd_and_hms(2024, 1, day, hour, 0, 0)
            .unwrap()
            .with_timezone(&chrono::Utc);
        Bar::new(ts, (high + low) / 2.0, high, low, (high + low) / 2.0)
    }

    fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn first_bar_seeds_levels_without_signal() {
        let (signal, state) = strategy().evaluate(&bar_at(1, 9, 2.0, 0.5), IntradayState::default());
        assert_eq!(signal, Signal::None);
        assert_eq!(state.running_high, Some(2.0));
        assert_eq!(state.running_low, Some(0.5));
        assert_eq!(state.current_day, Some(jan(1)));
    }

    #[test]
    fn levels_reset_at_local_midnight() {
        let s = strategy();
        let (_, state) = s.evaluate(&bar_at(1, 5, 2.0, 0.5), IntradayState::default());
        assert_eq!((state.running_high, state.running_low), (Some(2.0), Some(0.5)));

        let (signal, state) = s.evaluate(&bar_at(2, 5, 1.5, 0.6), state);
        assert_eq!(signal, Signal::None);
        assert_eq!(state.running_high, Some(1.5));
        assert_eq!(state.running_low, Some(0.6));
        assert_eq!(state.current_day, Some(jan(2)));
    }

    #[test]
    fn new_day_cannot_break_stale_levels() {
        // Yesterday's range was tiny; today's first bar is far outside it.
        let prior = IntradayState::seeded(1.0, 0.99, jan(1));
        let (signal, _) = strategy().evaluate(&bar_at(2, 10, 5.0, 1.01), prior);
        assert_eq!(signal, Signal::None);
    }

    #[test]
    fn long_breakout_inside_session() {
        let state = IntradayState::seeded(1.0, 0.9, jan(1));
        let (signal, next) = strategy().evaluate(&bar_at(1, 10, 1.2, 0.95), state);
        assert_eq!(signal, Signal::Long);
        assert_eq!(next.running_high, Some(1.2));
        assert_eq!(next.running_low, Some(0.9));
    }

    #[test]
    fn short_breakout_inside_session() {
        let state = IntradayState::seeded(1.0, 0.9, jan(1));
        let (signal, next) = strategy().evaluate(&bar_at(1, 10, 0.95, 0.8), state);
        assert_eq!(signal, Signal::Short);
        assert_eq!(next.running_high, Some(1.0));
        assert_eq!(next.running_low, Some(0.8));
    }

    #[test]
    fn equal_extreme_is_not_a_breakout() {
        let state = IntradayState::seeded(1.0, 0.9, jan(1));
        let (signal, _) = strategy().evaluate(&bar_at(1, 10, 1.0, 0.9), state);
        assert_eq!(signal, Signal::None);
    }

    #[test]
    fn both_triggers_skip_the_bar() {
        let state = IntradayState::seeded(1.0, 1.0, jan(1));
        let (signal, next) = strategy().evaluate(&bar_at(1, 10, 1.5, 0.5), state);
        assert_eq!(signal, Signal::None);
        // Levels still widen.
        assert_eq!(next.running_high, Some(1.5));
        assert_eq!(next.running_low, Some(0.5));
    }

    #[test]
    fn outside_session_suppresses_signal_but_updates_levels() {
        let state = IntradayState::seeded(1.0, 0.9, jan(1));
        let (signal, next) = strategy().evaluate(&bar_at(1, 22, 1.5, 0.95), state);
        assert_eq!(signal, Signal::None);
        assert_eq!(next.running_high, Some(1.5));
    }

    #[test]
    fn session_end_boundary_is_outside() {
        let state = IntradayState::seeded(1.0, 0.9, jan(1));
        let (signal, _) = strategy().evaluate(&bar_at(1, 20, 1.5, 0.95), state);
        assert_eq!(signal, Signal::None);
        let (signal, _) = strategy().evaluate(&bar_at(1, 6, 1.5, 0.95), state);
        assert_eq!(signal, Signal::Long);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let s = strategy();
        let state = IntradayState::seeded(1.0, 0.9, jan(1));
        let bar = bar_at(1, 11, 1.3, 0.92);
        assert_eq!(s.evaluate(&bar, state), s.evaluate(&bar, state));
    }
}
