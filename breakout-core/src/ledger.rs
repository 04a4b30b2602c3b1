//! Position/trade ledger: exit evaluation and equity accounting.
//!
//! The stop is always checked first. When a single bar's range crosses both
//! the stop and the target, the exit is recorded as a stop: the ledger never
//! assumes the favourable level was reached first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Bar, EquityPoint, ExitReason, Position, Side, Trade};
use crate::execution::FillModel;

/// A protective level crossed by a bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breach {
    pub reason: ExitReason,
    /// The breached level itself; fills happen here, not at the bar extreme.
    pub level: f64,
}

/// Check whether `bar` crosses the stop or target of `position`.
pub fn check_exit(position: &Position, bar: &Bar) -> Option<Breach> {
    let (stop_hit, target_hit) = match position.side {
        Side::Long => (
            bar.low <= position.stop_price,
            bar.high >= position.target_price,
        ),
        Side::Short => (
            bar.high >= position.stop_price,
            bar.low <= position.target_price,
        ),
    };

    if stop_hit {
        Some(Breach {
            reason: ExitReason::Stop,
            level: position.stop_price,
        })
    } else if target_hit {
        Some(Breach {
            reason: ExitReason::Target,
            level: position.target_price,
        })
    } else {
        None
    }
}

/// Commission for a given size.
pub fn compute_fees(commission_per_lot: f64, size: f64) -> f64 {
    commission_per_lot * size
}

/// Realise a position into a trade at the breached level.
pub fn close_position(
    position: Position,
    breach: Breach,
    exit_time: DateTime<Utc>,
    fill_model: &FillModel,
    commission_per_lot: f64,
) -> Trade {
    let exit_price = fill_model.exit_price(breach.level, position.side);
    let realized_pnl = match position.side {
        Side::Long => (exit_price - position.entry_price) * position.size,
        Side::Short => (position.entry_price - exit_price) * position.size,
    };
    let fees = compute_fees(commission_per_lot, position.size);

    Trade {
        instrument: position.instrument,
        side: position.side,
        size: position.size,
        entry_price: position.entry_price,
        entry_time: position.entry_time,
        exit_price,
        exit_time,
        exit_reason: breach.reason,
        realized_pnl,
        fees,
    }
}

/// Running equity plus the ordered trade list and equity curve.
///
/// Owned by value and threaded through the instrument fold; there is no
/// shared equity anywhere else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    equity: f64,
    trades: Vec<Trade>,
    equity_curve: Vec<EquityPoint>,
}

impl Ledger {
    pub fn new(initial_equity: f64) -> Self {
        Self {
            equity: initial_equity,
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    /// Book a closed trade: equity moves by `pnl - fees`, one curve point is appended.
    pub fn record(&mut self, trade: Trade) -> EquityPoint {
        self.equity += trade.realized_pnl - trade.fees;
        let point = EquityPoint {
            timestamp: trade.exit_time,
            equity: self.equity,
        };
        self.equity_curve.push(point);
        self.trades.push(trade);
        point
    }

    pub fn equity(&self) -> f64 {
        self.equity
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    pub fn into_parts(self) -> (f64, Vec<Trade>, Vec<EquityPoint>) {
        (self.equity, self.trades, self.equity_curve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, hour, 0, 0).unwrap()
    }

    fn long_position() -> Position {
        // stop 90, target 110
        Position::open("EURUSD", Side::Long, 100.0, 10.0, 0.1, 0.1, ts(9))
    }

    fn short_position() -> Position {
        // stop 110, target 90
        Position::open("EURUSD", Side::Short, 100.0, 10.0, 0.1, 0.1, ts(9))
    }

    fn bar(high: f64, low: f64) -> Bar {
        Bar::new(ts(10), 100.0, high, low, 100.0)
    }

    #[test]
    fn no_breach_inside_range() {
        assert_eq!(check_exit(&long_position(), &bar(105.0, 95.0)), None);
        assert_eq!(check_exit(&short_position(), &bar(105.0, 95.0)), None);
    }

    #[test]
    fn long_stop_and_target() {
        let stop = check_exit(&long_position(), &bar(101.0, 89.0)).unwrap();
        assert_eq!(stop.reason, ExitReason::Stop);
        assert!((stop.level - 90.0).abs() < 1e-10);

        let target = check_exit(&long_position(), &bar(111.0, 99.0)).unwrap();
        assert_eq!(target.reason, ExitReason::Target);
        assert!((target.level - 110.0).abs() < 1e-10);
    }

    #[test]
    fn short_stop_and_target() {
        let stop = check_exit(&short_position(), &bar(111.0, 99.0)).unwrap();
        assert_eq!(stop.reason, ExitReason::Stop);

        let target = check_exit(&short_position(), &bar(101.0, 89.0)).unwrap();
        assert_eq!(target.reason, ExitReason::Target);
    }

    #[test]
    fn touching_a_level_counts_as_breach() {
        let pos = long_position();
        let b = bar(pos.target_price, pos.stop_price + 1.0);
        assert_eq!(check_exit(&pos, &b).unwrap().reason, ExitReason::Target);
    }

    #[test]
    fn stop_wins_when_both_levels_cross() {
        assert_eq!(
            check_exit(&long_position(), &bar(120.0, 80.0)).unwrap().reason,
            ExitReason::Stop
        );
        assert_eq!(
            check_exit(&short_position(), &bar(120.0, 80.0)).unwrap().reason,
            ExitReason::Stop
        );
    }

    #[test]
    fn close_long_at_level_with_costs() {
        let fill = FillModel::new(0.5, 0.5);
        let pos = long_position();
        let breach = Breach {
            reason: ExitReason::Target,
            level: 110.0,
        };
        let trade = close_position(pos, breach, ts(12), &fill, 2.0);
        // Sell side: 110 - 0.5 - 0.5
        assert_eq!(trade.exit_price, 109.0);
        assert_eq!(trade.realized_pnl, (109.0 - 100.0) * 10.0);
        assert_eq!(trade.fees, 20.0);
        assert_eq!(trade.exit_time, ts(12));
        assert_eq!(trade.entry_time, ts(9));
    }

    #[test]
    fn close_short_at_level_with_costs() {
        let fill = FillModel::new(0.5, 0.5);
        let breach = Breach {
            reason: ExitReason::Stop,
            level: 110.0,
        };
        let trade = close_position(short_position(), breach, ts(12), &fill, 0.0);
        // Buy side: 110 + 0.5 + 0.5
        assert_eq!(trade.exit_price, 111.0);
        assert_eq!(trade.realized_pnl, (100.0 - 111.0) * 10.0);
        assert_eq!(trade.exit_reason, ExitReason::Stop);
        assert_eq!(trade.fees, 0.0);
    }

    #[test]
    fn ledger_books_net_pnl_and_one_point_per_trade() {
        let mut ledger = Ledger::new(10_000.0);
        let fill = FillModel::frictionless();
        let win = close_position(
            long_position(),
            Breach {
                reason: ExitReason::Target,
                level: 110.0,
            },
            ts(12),
            &fill,
            1.0,
        );
        let point = ledger.record(win);
        assert_eq!(point.timestamp, ts(12));
        assert_eq!(ledger.equity_curve().len(), 1);
        assert_eq!(ledger.trades().len(), 1);

        let expected = 10_000.0 + (ledger.trades()[0].realized_pnl - 10.0);
        assert_eq!(ledger.equity(), expected);
        assert_eq!(ledger.trades()[0].fees, 10.0);
    }

    #[test]
    fn ledger_starts_flat() {
        let ledger = Ledger::new(100_000.0);
        assert_eq!(ledger.equity(), 100_000.0);
        assert!(ledger.trades().is_empty());
        assert!(ledger.equity_curve().is_empty());
    }
}
