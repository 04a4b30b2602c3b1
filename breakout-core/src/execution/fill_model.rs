//! Fill model: half-spread plus slippage applied against the trader.

use serde::{Deserialize, Serialize};

use crate::domain::Side;

/// Which side of the book a fill takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillSide {
    Buy,
    Sell,
}

impl FillSide {
    /// Side that opens a position.
    pub fn entry(side: Side) -> Self {
        match side {
            Side::Long => FillSide::Buy,
            Side::Short => FillSide::Sell,
        }
    }

    /// Side that closes a position.
    pub fn exit(side: Side) -> Self {
        match side {
            Side::Long => FillSide::Sell,
            Side::Short => FillSide::Buy,
        }
    }
}

/// Fixed-cost fill model in price units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FillModel {
    pub half_spread: f64,
    pub slippage: f64,
}

impl FillModel {
    pub fn new(half_spread: f64, slippage: f64) -> Self {
        Self {
            half_spread,
            slippage,
        }
    }

    /// Build from a quoted full spread.
    pub fn from_spread(spread: f64, slippage: f64) -> Self {
        Self::new(spread / 2.0, slippage)
    }

    pub fn frictionless() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Executable price for a raw trigger price.
    ///
    /// Buy: `price + half_spread + slippage`. Sell: `price - half_spread - slippage`.
    pub fn fill_price(&self, raw_price: f64, side: FillSide) -> f64 {
        match side {
            FillSide::Buy => raw_price + self.half_spread + self.slippage,
            FillSide::Sell => raw_price - self.half_spread - self.slippage,
        }
    }

    /// Entry fill for a position of the given direction.
    pub fn entry_price(&self, raw_price: f64, side: Side) -> f64 {
        self.fill_price(raw_price, FillSide::entry(side))
    }

    /// Exit fill for a position of the given direction.
    pub fn exit_price(&self, raw_price: f64, side: Side) -> f64 {
        self.fill_price(raw_price, FillSide::exit(side))
    }
}

impl Default for FillModel {
    fn default() -> Self {
        Self::frictionless()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frictionless_returns_raw_price() {
        let fill = FillModel::frictionless();
        assert_eq!(fill.fill_price(1.2345, FillSide::Buy), 1.2345);
        assert_eq!(fill.fill_price(1.2345, FillSide::Sell), 1.2345);
    }

    #[test]
    fn buy_pays_more() {
        let fill = FillModel::new(0.0001, 0.00005);
        let price = fill.fill_price(1.1000, FillSide::Buy);
        assert_eq!(price, 1.1000 + 0.0001 + 0.00005);
        assert!(price > 1.1000);
    }

    #[test]
    fn sell_receives_less() {
        let fill = FillModel::new(0.0001, 0.00005);
        let price = fill.fill_price(1.1000, FillSide::Sell);
        assert_eq!(price, 1.1000 - 0.0001 - 0.00005);
        assert!(price < 1.1000);
    }

    #[test]
    fn from_spread_halves_the_quote() {
        let fill = FillModel::from_spread(0.0002, 0.0);
        assert_eq!(fill.half_spread, 0.0001);
    }

    #[test]
    fn entry_and_exit_sides_oppose() {
        assert_eq!(FillSide::entry(Side::Long), FillSide::Buy);
        assert_eq!(FillSide::exit(Side::Long), FillSide::Sell);
        assert_eq!(FillSide::entry(Side::Short), FillSide::Sell);
        assert_eq!(FillSide::exit(Side::Short), FillSide::Buy);

        let fill = FillModel::new(0.5, 0.25);
        assert_eq!(fill.entry_price(10.0, Side::Long), 10.75);
        assert_eq!(fill.exit_price(10.0, Side::Long), 9.25);
        assert_eq!(fill.entry_price(10.0, Side::Short), 9.25);
        assert_eq!(fill.exit_price(10.0, Side::Short), 10.75);
    }
}
