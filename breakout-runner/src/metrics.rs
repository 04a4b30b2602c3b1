//! Performance metrics: pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: trade list and/or equity curve in, scalar out.
//! Degenerate inputs (no trades, zero baseline, zero variance) return 0.0
//! rather than dividing by zero.

use breakout_core::domain::{EquityPoint, ExitReason, Side, Trade};
use serde::{Deserialize, Serialize};

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    /// Largest peak-to-trough decline as a positive fraction.
    pub max_drawdown: f64,
    /// Per-trade Sharpe: `mean / std * sqrt(n)` over trade returns.
    pub sharpe: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_trade: f64,
    pub num_trades: usize,
    pub total_fees: f64,
    pub long_trades: usize,
    pub short_trades: usize,
    pub stop_exits: usize,
    pub target_exits: usize,
    /// Fraction of time in the market. Not computed: the engine records no
    /// bar-level position state to derive it from, so this is always `None`.
    pub exposure_time: Option<f64>,
}

impl PerformanceMetrics {
    /// Compute all metrics from the trade list and trade-close equity curve.
    pub fn compute(trades: &[Trade], equity_curve: &[EquityPoint], initial_equity: f64) -> Self {
        let count = |pred: &dyn Fn(&Trade) -> bool| trades.iter().filter(|t| pred(t)).count();
        Self {
            total_return: total_return(equity_curve, initial_equity),
            max_drawdown: max_drawdown(equity_curve, initial_equity),
            sharpe: trade_sharpe(trades),
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            avg_trade: avg_trade(trades),
            num_trades: trades.len(),
            total_fees: trades.iter().map(|t| t.fees).sum(),
            long_trades: count(&|t| t.side == Side::Long),
            short_trades: count(&|t| t.side == Side::Short),
            stop_exits: count(&|t| t.exit_reason == ExitReason::Stop),
            target_exits: count(&|t| t.exit_reason == ExitReason::Target),
            exposure_time: None,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(equity_curve: &[EquityPoint], initial_equity: f64) -> f64 {
    let Some(last) = equity_curve.last() else {
        return 0.0;
    };
    if initial_equity <= 0.0 {
        return 0.0;
    }
    (last.equity - initial_equity) / initial_equity
}

/// Maximum drawdown as a positive fraction over `[initial] ++ curve`.
pub fn max_drawdown(equity_curve: &[EquityPoint], initial_equity: f64) -> f64 {
    let mut peak = initial_equity;
    let mut max_dd = 0.0_f64;
    for equity in std::iter::once(initial_equity).chain(equity_curve.iter().map(|p| p.equity)) {
        peak = peak.max(equity);
        if peak > 0.0 {
            max_dd = max_dd.max((peak - equity) / peak);
        }
    }
    max_dd
}

/// Return of each trade on its entry notional. Zero-notional trades are skipped.
pub fn trade_returns(trades: &[Trade]) -> Vec<f64> {
    trades.iter().filter_map(Trade::return_pct).collect()
}

/// Per-trade Sharpe ratio with population standard deviation.
pub fn trade_sharpe(trades: &[Trade]) -> f64 {
    let returns = trade_returns(trades);
    if returns.is_empty() {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    if std == 0.0 {
        return 0.0;
    }
    mean / std * n.sqrt()
}

/// Fraction of trades with positive realized P&L.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Gross profit / gross loss. Returns 0.0 when there are no losing trades.
pub fn profit_factor(trades: &[Trade]) -> f64 {
    let gross_profit: f64 = trades
        .iter()
        .map(|t| t.realized_pnl)
        .filter(|p| *p > 0.0)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .map(|t| t.realized_pnl)
        .filter(|p| *p < 0.0)
        .map(f64::abs)
        .sum();
    if gross_loss == 0.0 {
        return 0.0;
    }
    gross_profit / gross_loss
}

/// Mean realized P&L per trade.
pub fn avg_trade(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.realized_pnl).sum::<f64>() / trades.len() as f64
}
