//! Integration tests for the runner: config in, engine result and metrics out.
//!
//! The scenario is hand-traced: a UTC 06:00-20:00 session, 10% stop and
//! target, half of equity per trade, 1.0 commission per lot, no spread.

use breakout_core::data::{DataError, MemoryBarSource};
use breakout_core::domain::{Bar, ExitReason, Side};
use breakout_runner::config::{BacktestConfig, ConfigError};
use breakout_runner::data_loader::LoadOptions;
use breakout_runner::runner::{run_single_backtest, run_with_source, RunError};
use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
}

fn bar(day: u32, hour: u32, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar::new(at(day, hour), open, high, low, close)
}

/// Day 2 breaks above day 2's first high; entry at 11:00 open 100, target 110 hit at 12:00.
fn winning_long() -> Vec<Bar> {
    vec![
        bar(1, 9, 100.0, 105.0, 95.0, 100.0),
        bar(1, 10, 100.0, 104.0, 96.0, 100.0),
        bar(2, 9, 100.0, 105.0, 95.0, 100.0),
        bar(2, 10, 100.0, 106.0, 97.0, 105.0),
        bar(2, 11, 100.0, 108.0, 99.0, 104.0),
        bar(2, 12, 105.0, 111.0, 104.0, 110.0),
    ]
}

fn config_text(symbols: &[&str], csv_dir: &Path) -> String {
    let symbols = symbols
        .iter()
        .map(|s| format!("\"{s}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"
symbols = [{symbols}]
initial_equity = 100000.0
sl_pct = 0.1
tp_pct = 0.1
equity_pct_per_trade = 0.5

[session]
start = "06:00"
end = "20:00"

[costs]
spread = 0.0
slippage = 0.0
commission_per_lot = 1.0

[data]
csv_dir = "{}"
timezone = "UTC"
"#,
        csv_dir.display()
    )
}

fn config(symbols: &[&str]) -> BacktestConfig {
    BacktestConfig::from_toml_str(&config_text(symbols, Path::new("data"))).unwrap()
}

#[test]
fn runs_memory_source_end_to_end() {
    let source = MemoryBarSource::new().with_series("EURUSD", winning_long());
    let result = run_with_source(&config(&["EURUSD"]), &source, &LoadOptions::default()).unwrap();

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.side, Side::Long);
    assert_eq!(trade.exit_reason, ExitReason::Target);
    assert_eq!(trade.size, 500.0);

    assert_eq!(result.initial_equity, 100_000.0);
    assert_eq!(result.final_equity, 104_500.0);
    assert_eq!(result.equity_curve.len(), 1);
    assert!(result.skipped.is_empty());
    assert!(result.open_positions.is_empty());
    assert!(!result.has_synthetic);
    assert_eq!(result.bar_count, 6);
    assert_eq!(result.run_id, result.config.run_id());

    assert_eq!(result.metrics.num_trades, 1);
    assert_eq!(result.metrics.total_return, 0.045);
    assert_eq!(result.metrics.total_fees, 500.0);
    assert_eq!(result.metrics.win_rate, 1.0);
    assert_eq!(result.metrics.max_drawdown, 0.0);
    assert_eq!(result.metrics.exposure_time, None);
}

#[test]
fn missing_instrument_is_skipped_not_fatal() {
    let source = MemoryBarSource::new().with_series("EURUSD", winning_long());
    let result = run_with_source(
        &config(&["GBPUSD", "EURUSD"]),
        &source,
        &LoadOptions::default(),
    )
    .unwrap();

    assert_eq!(result.trades.len(), 1);
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].instrument, "GBPUSD");
    assert_eq!(result.outcomes.len(), 1);
}

#[test]
fn short_series_is_reported_as_skipped() {
    let source = MemoryBarSource::new()
        .with_series("EURUSD", winning_long())
        .with_series("USDJPY", vec![bar(1, 9, 150.0, 151.0, 149.0, 150.0)]);
    let result = run_with_source(
        &config(&["EURUSD", "USDJPY"]),
        &source,
        &LoadOptions::default(),
    )
    .unwrap();

    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].instrument, "USDJPY");
    assert_eq!(result.skipped[0].reason, "fewer than 2 bars");
    assert_eq!(result.final_equity, 104_500.0);
}

#[test]
fn all_instruments_missing_is_a_data_error() {
    let source = MemoryBarSource::new();
    match run_with_source(&config(&["EURUSD", "GBPUSD"]), &source, &LoadOptions::default()) {
        Err(RunError::Data(DataError::NoData { instrument })) => assert_eq!(instrument, "EURUSD"),
        other => panic!("expected RunError::Data, got {other:?}"),
    }
}

#[test]
fn invalid_config_fails_before_loading() {
    let mut cfg = config(&["EURUSD"]);
    cfg.sl_pct = 1.5;
    let source = MemoryBarSource::new();
    assert!(matches!(
        run_with_source(&cfg, &source, &LoadOptions::default()),
        Err(RunError::Config(ConfigError::Invalid { field: "sl_pct", .. }))
    ));
}

#[test]
fn synthetic_fallback_tags_the_result() {
    let source = MemoryBarSource::new();
    let opts = LoadOptions {
        synthetic: true,
        synthetic_bars: Some(24 * 5),
    };
    let result = run_with_source(&config(&["EURUSD"]), &source, &opts).unwrap();
    assert!(result.has_synthetic);
    assert!(result.skipped.is_empty());
    assert_eq!(result.bar_count, 24 * 5);
}

#[test]
fn csv_directory_run_matches_memory_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut text = String::from("time,open,high,low,close\n");
    for b in winning_long() {
        text.push_str(&format!(
            "{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d %H:%M:%S"),
            b.open,
            b.high,
            b.low,
            b.close
        ));
    }
    std::fs::write(dir.path().join("EURUSD.csv"), text).unwrap();

    let cfg = BacktestConfig::from_toml_str(&config_text(&["EURUSD"], dir.path())).unwrap();
    let from_csv = run_single_backtest(&cfg, &LoadOptions::default()).unwrap();

    let source = MemoryBarSource::new().with_series("EURUSD", winning_long());
    let from_memory = run_with_source(&cfg, &source, &LoadOptions::default()).unwrap();

    assert_eq!(from_csv.trades, from_memory.trades);
    assert_eq!(from_csv.final_equity, 104_500.0);
    assert_eq!(from_csv.dataset_hash, from_memory.dataset_hash);
}

#[test]
fn inconsistent_csv_row_skips_only_that_instrument() {
    let dir = tempfile::tempdir().unwrap();
    let mut text = String::from("time,open,high,low,close\n");
    for b in winning_long() {
        text.push_str(&format!(
            "{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d %H:%M:%S"),
            b.open,
            b.high,
            b.low,
            b.close
        ));
    }
    std::fs::write(dir.path().join("EURUSD.csv"), text).unwrap();
    std::fs::write(
        dir.path().join("GBPUSD.csv"),
        "time,open,high,low,close\n2024-01-01 09:00:00,1.27,1.26,1.28,1.27\n",
    )
    .unwrap();

    let cfg = BacktestConfig::from_toml_str(&config_text(&["GBPUSD", "EURUSD"], dir.path())).unwrap();
    let result = run_single_backtest(&cfg, &LoadOptions::default()).unwrap();
    assert_eq!(result.final_equity, 104_500.0);
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].instrument, "GBPUSD");
    assert!(result.skipped[0].reason.contains("line 2"), "{}", result.skipped[0].reason);

    let cfg = BacktestConfig::from_toml_str(&config_text(&["GBPUSD"], dir.path())).unwrap();
    assert!(matches!(
        run_single_backtest(&cfg, &LoadOptions::default()),
        Err(RunError::Data(DataError::Unparseable { line: 2, .. }))
    ));
}
