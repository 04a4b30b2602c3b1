//! Typed parameter set the engine runs with.

use crate::execution::FillModel;
use crate::session::SessionWindow;
use crate::signal::IntradayBreakout;

/// Everything the bar loop needs, already validated.
///
/// Built by the runner's config layer; the engine never sees raw strings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineParams {
    // ── Strategy ──
    pub session: SessionWindow,
    /// Stop offset as a fraction of the entry fill.
    pub sl_pct: f64,
    /// Target offset as a fraction of the entry fill.
    pub tp_pct: f64,

    // ── Sizing ──
    pub initial_equity: f64,
    /// Fraction of current equity committed per entry. Units are not rounded to any lot step.
    pub equity_pct_per_trade: f64,

    // ── Costs ──
    pub fill: FillModel,
    pub commission_per_lot: f64,
}

impl EngineParams {
    /// Frictionless parameters around a session window.
    pub fn new(session: SessionWindow, initial_equity: f64, sl_pct: f64, tp_pct: f64) -> Self {
        Self {
            session,
            sl_pct,
            tp_pct,
            initial_equity,
            equity_pct_per_trade: 1.0,
            fill: FillModel::frictionless(),
            commission_per_lot: 0.0,
        }
    }

    pub fn with_fill(mut self, fill: FillModel) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_commission(mut self, commission_per_lot: f64) -> Self {
        self.commission_per_lot = commission_per_lot;
        self
    }

    pub fn with_equity_pct(mut self, equity_pct_per_trade: f64) -> Self {
        self.equity_pct_per_trade = equity_pct_per_trade;
        self
    }

    pub fn strategy(&self) -> IntradayBreakout {
        IntradayBreakout::new(self.session)
    }

    /// Units for a new entry: `equity * equity_pct_per_trade / open_price`.
    ///
    /// `None` when the open price or the resulting size is not a usable positive number.
    pub fn position_size(&self, equity: f64, open_price: f64) -> Option<f64> {
        if !open_price.is_finite() || open_price <= 0.0 {
            return None;
        }
        let size = equity * self.equity_pct_per_trade / open_price;
        (size.is_finite() && size > 0.0).then_some(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> EngineParams {
        let session = SessionWindow::parse("06:00", "20:00", "UTC").unwrap();
        EngineParams::new(session, 100_000.0, 0.01, 0.02).with_equity_pct(0.5)
    }

    #[test]
    fn sizing_uses_raw_open() {
        assert_eq!(params().position_size(100_000.0, 2.0), Some(25_000.0));
    }

    #[test]
    fn sizing_rejects_degenerate_prices() {
        let p = params();
        assert_eq!(p.position_size(100_000.0, 0.0), None);
        assert_eq!(p.position_size(100_000.0, -1.0), None);
        assert_eq!(p.position_size(100_000.0, f64::NAN), None);
    }

    #[test]
    fn sizing_rejects_exhausted_equity() {
        assert_eq!(params().position_size(0.0, 1.0), None);
        assert_eq!(params().position_size(-10.0, 1.0), None);
    }

    #[test]
    fn builders_set_costs() {
        let p = params()
            .with_fill(FillModel::from_spread(0.0002, 0.0001))
            .with_commission(3.5);
        assert_eq!(p.commission_per_lot, 3.5);
        assert_eq!(p.fill.slippage, 0.0001);
        assert_eq!(p.strategy().name(), "intraday_breakout");
    }
}
