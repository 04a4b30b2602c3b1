//! Bar-by-bar loop: one instrument at a time, equity threaded as a fold.
//!
//! Per bar:
//! 1. Exit check: if a position is open and the bar crosses its stop or
//!    target, realise it into a trade and book it to the ledger.
//! 2. Signal: only while flat (including a position closed on step 1), run
//!    the breakout step. A signal opens a position at the *next* bar's open,
//!    cost-adjusted, sized from current equity.
//!
//! The final bar still gets the exit check and the signal bookkeeping but can
//! never open a position, since there is no following open to price it.

use tracing::{debug, debug_span, warn};

use crate::domain::{Bar, Position};
use crate::ledger::{check_exit, close_position, Ledger};
use crate::signal::{IntradayBreakout, IntradayState};

use super::params::EngineParams;
use super::state::{InstrumentOutcome, OutcomeStatus, RunResult, MIN_BARS};

/// Run the loop over one instrument's bars, consuming and returning the ledger.
pub fn run_instrument(
    params: &EngineParams,
    strategy: &IntradayBreakout,
    instrument: &str,
    bars: &[Bar],
    mut ledger: Ledger,
) -> (Ledger, InstrumentOutcome) {
    let equity_before = ledger.equity();

    if bars.len() < MIN_BARS {
        warn!(
            instrument = %instrument,
            bars = bars.len(),
            "skipping instrument: fewer than {MIN_BARS} bars"
        );
        let outcome = InstrumentOutcome::skipped(
            instrument,
            bars.len(),
            equity_before,
            format!("fewer than {MIN_BARS} bars"),
        );
        return (ledger, outcome);
    }

    let _span = debug_span!("instrument", instrument = %instrument, bars = bars.len()).entered();
    let trades_before = ledger.trades().len();
    let mut state = IntradayState::default();
    let mut position: Option<Position> = None;

    for (i, bar) in bars.iter().enumerate() {
        // Step 1: exit check
        if let Some(open) = position.take() {
            match check_exit(&open, bar) {
                Some(breach) => {
                    let trade = close_position(
                        open,
                        breach,
                        bar.timestamp,
                        &params.fill,
                        params.commission_per_lot,
                    );
                    debug!(
                        side = %trade.side,
                        reason = %trade.exit_reason,
                        entry = trade.entry_price,
                        exit = trade.exit_price,
                        pnl = trade.realized_pnl,
                        fees = trade.fees,
                        "trade closed"
                    );
                    ledger.record(trade);
                }
                None => position = Some(open),
            }
        }

        if position.is_some() {
            continue;
        }

        // Step 2: signal while flat
        let (signal, next_state) = strategy.evaluate(bar, state);
        state = next_state;

        let Some(side) = signal.side() else {
            continue;
        };
        let Some(next_bar) = bars.get(i + 1) else {
            continue;
        };

        let Some(size) = params.position_size(ledger.equity(), next_bar.open) else {
            warn!(
                instrument = %instrument,
                %side,
                next_open = next_bar.open,
                equity = ledger.equity(),
                "entry skipped: unusable size"
            );
            continue;
        };

        let entry_price = params.fill.entry_price(next_bar.open, side);
        let opened = Position::open(
            instrument,
            side,
            entry_price,
            size,
            params.sl_pct,
            params.tp_pct,
            next_bar.timestamp,
        );
        debug!(
            %side,
            entry = opened.entry_price,
            stop = opened.stop_price,
            target = opened.target_price,
            size = size,
            "position opened"
        );
        position = Some(opened);
    }

    if let Some(open) = &position {
        debug!(side = %open.side, entry = open.entry_price, "position still open at end of data");
    }

    let outcome = InstrumentOutcome {
        instrument: instrument.to_string(),
        bars: bars.len(),
        trades: ledger.trades().len() - trades_before,
        equity_before,
        final_equity: ledger.equity(),
        status: OutcomeStatus::Completed,
        open_position: position,
    };
    (ledger, outcome)
}

/// Run every instrument in order, carrying equity from one to the next.
pub fn run_backtest<'a, I>(params: &EngineParams, series: I) -> RunResult
where
    I: IntoIterator<Item = (&'a str, &'a [Bar])>,
{
    let strategy = params.strategy();

    let (ledger, outcomes) = series.into_iter().fold(
        (Ledger::new(params.initial_equity), Vec::new()),
        |(ledger, mut outcomes), (instrument, bars)| {
            let (ledger, outcome) = run_instrument(params, &strategy, instrument, bars, ledger);
            outcomes.push(outcome);
            (ledger, outcomes)
        },
    );

    let (final_equity, trades, equity_curve) = ledger.into_parts();
    RunResult {
        initial_equity: params.initial_equity,
        final_equity,
        trades,
        equity_curve,
        outcomes,
    }
}
