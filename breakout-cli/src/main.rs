//! Breakout CLI: backtest, validate, and state inspection commands.
//!
//! Commands:
//! - `backtest`: run a backtest from a TOML config and write artifacts
//! - `validate`: check a config and print the derived engine parameters
//! - `state show`: validate and print a persisted position snapshot

mod obs;

use anyhow::{Context, Result};
use breakout_core::persistence::load_snapshot;
use breakout_runner::runner::run_single_backtest;
use breakout_runner::{ArtifactManager, BacktestConfig, BacktestResult, LoadOptions};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "breakout", about = "Intraday breakout backtesting engine")]
struct Cli {
    /// Log level or filter directive (overridden by BREAKOUT_LOG).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Shorthand for --log-level debug.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Log output format: text or json.
    #[arg(long, default_value = "text", global = true)]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Backtest {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for run artifacts.
        #[arg(long, default_value = "results")]
        out_dir: PathBuf,

        /// Generate synthetic bars for instruments without data.
        #[arg(long, default_value_t = false)]
        synthetic: bool,
    },
    /// Validate a config without reading any bars.
    Validate {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
    /// Position snapshot commands.
    State {
        #[command(subcommand)]
        action: StateAction,
    },
}

#[derive(Subcommand)]
enum StateAction {
    /// Validate and print a snapshot file.
    Show {
        /// Snapshot path.
        #[arg(long, default_value = "state.json")]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { cli.log_level.as_str() };
    obs::init_tracing(level, &cli.log_format)?;

    match cli.command {
        Commands::Backtest {
            config,
            out_dir,
            synthetic,
        } => run_backtest_cmd(&config, &out_dir, synthetic),
        Commands::Validate { config } => run_validate(&config),
        Commands::State {
            action: StateAction::Show { path },
        } => run_state_show(&path),
    }
}

fn load_config(path: &Path) -> Result<BacktestConfig> {
    BacktestConfig::load(path).with_context(|| format!("failed to load config {}", path.display()))
}

fn run_backtest_cmd(config_path: &Path, out_dir: &Path, synthetic: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let opts = LoadOptions {
        synthetic,
        ..LoadOptions::default()
    };

    let result = run_single_backtest(&config, &opts).context("backtest failed")?;
    print_summary(&result);

    let manager = ArtifactManager::new(out_dir)?;
    let paths = manager.save_run(&result)?;
    info!(dir = %paths.run_dir.display(), "run complete");
    println!("Artifacts saved to: {}", paths.run_dir.display());
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let params = config.validate().context("config is invalid")?;

    println!("Config OK: {}", config_path.display());
    println!("Run ID:         {}", config.run_id());
    println!("Symbols:        {}", config.symbols.join(", "));
    println!(
        "Session:        {}-{} {}",
        params.session.start().format("%H:%M"),
        params.session.end().format("%H:%M"),
        params.session.timezone()
    );
    println!("Stop / Target:  {} / {}", params.sl_pct, params.tp_pct);
    println!("Equity:         {}", params.initial_equity);
    println!("Per Trade:      {:.2}%", params.equity_pct_per_trade * 100.0);
    println!(
        "Costs:          half-spread {}, slippage {}, commission {}",
        params.fill.half_spread, params.fill.slippage, params.commission_per_lot
    );
    Ok(())
}

fn run_state_show(path: &Path) -> Result<()> {
    let Some(snapshot) =
        load_snapshot(path).with_context(|| format!("invalid snapshot {}", path.display()))?
    else {
        println!("No snapshot at {}", path.display());
        return Ok(());
    };

    println!(
        "{} instrument(s), {} open position(s)",
        snapshot.positions.len(),
        snapshot.open_count()
    );
    for instrument in snapshot.positions.keys() {
        match snapshot.restore(instrument)? {
            Some(pos) => println!(
                "{instrument:<10} {:<5} size {} entry {} @ {} stop {} target {}",
                pos.side.as_str(),
                pos.size,
                pos.entry_price,
                pos.entry_time.to_rfc3339(),
                pos.stop_price,
                pos.target_price
            ),
            None => println!("{instrument:<10} flat"),
        }
    }
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    println!();
    println!("=== Backtest Result ===");
    println!("Run ID:         {}", result.run_id);
    println!("Instruments:    {}", result.outcomes.len());
    println!("Bars:           {}", result.bar_count);
    println!("Trades:         {} ({} long, {} short)", m.num_trades, m.long_trades, m.short_trades);
    println!("Exits:          {} stop, {} target", m.stop_exits, m.target_exits);
    println!();
    println!("--- Performance ---");
    println!("Initial Equity: {:.2}", result.initial_equity);
    println!("Final Equity:   {:.2}", result.final_equity);
    println!("Total Return:   {:.2}%", m.total_return * 100.0);
    println!("Sharpe:         {:.3}", m.sharpe);
    println!("Max Drawdown:   {:.2}%", m.max_drawdown * 100.0);
    println!("Win Rate:       {:.1}%", m.win_rate * 100.0);
    println!("Profit Factor:  {:.2}", m.profit_factor);
    println!("Avg Trade:      {:.2}", m.avg_trade);
    println!("Fees:           {:.2}", m.total_fees);
    if !result.open_positions.is_empty() {
        println!("Open at end:    {}", result.open_positions.len());
    }
    for skip in &result.skipped {
        println!("SKIPPED: {} ({})", skip.instrument, skip.reason);
    }
    if result.has_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
}
