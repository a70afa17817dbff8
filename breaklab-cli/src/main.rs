//! Breaklab CLI — run a single backtest or a parameter sweep from TOML.
//!
//! Commands:
//! - `run <config.toml>` — one backtest; prints a JSON summary, optionally
//!   writes the trade ledger as CSV
//! - `sweep <config.toml>` — grid or random search; prints the leaders and
//!   sensitivity ranges, optionally writes the full table as CSV

mod config;

use anyhow::{Context, Result};
use breaklab_core::engine::{BacktestEngine, EngineConfig};
use breaklab_core::strategy::{AtrBreakoutConfig, AtrBreakoutStrategy, Strategy};
use breaklab_runner::{
    export, sensitivity, Objective, ParameterSpace, SweepRunner,
};
use clap::{Parser, Subcommand};
use config::CliConfig;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "breaklab", about = "ATR breakout backtests and parameter sweeps")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one backtest from a config file.
    Run {
        config: PathBuf,
        /// Write the trade ledger to this CSV path.
        #[arg(long)]
        trades_out: Option<PathBuf>,
    },
    /// Run a parameter sweep from a config file.
    Sweep {
        config: PathBuf,
        /// Override the configured worker count.
        #[arg(long)]
        workers: Option<usize>,
        /// Override random-search iterations (0 = full grid).
        #[arg(long)]
        iterations: Option<usize>,
        /// Override the objective (sharpe, sortino, total_return, calmar,
        /// profit_factor).
        #[arg(long)]
        objective: Option<String>,
        /// Write the full sweep table to this CSV path.
        #[arg(long)]
        table_out: Option<PathBuf>,
        /// How many leaders to print.
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Run { config, trades_out } => run_single(&config, trades_out.as_deref()),
        Command::Sweep {
            config,
            workers,
            iterations,
            objective,
            table_out,
            top,
        } => run_sweep(
            &config,
            workers,
            iterations,
            objective.as_deref(),
            table_out.as_deref(),
            top,
        ),
    }
}

fn build_strategy(params: &BTreeMap<String, f64>) -> Result<AtrBreakoutStrategy> {
    let mut strategy = AtrBreakoutStrategy::new(AtrBreakoutConfig::default())?;
    strategy.set_params(params)?;
    Ok(strategy)
}

fn run_single(config_path: &std::path::Path, trades_out: Option<&std::path::Path>) -> Result<()> {
    let config = CliConfig::load(config_path)?;
    let series = config.load_bars()?;
    info!(bars = series.len(), symbols = ?series.symbols(), "data loaded");

    let mut strategy = build_strategy(&config.strategy)?;
    let mut engine_config = EngineConfig::new(config.backtest.initial_cash);
    engine_config.long_only = config.backtest.long_only;
    let mut engine = BacktestEngine::new(engine_config)
        .with_execution(config.execution_engine())
        .with_kill_switches(config.kill_switch_manager());

    let report = engine.run(&mut strategy, &series)?;

    if let Some(path) = trades_out {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        export::write_trades_csv(file, &report.trade_ledger)?;
        info!(path = %path.display(), trades = report.trade_ledger.len(), "trade ledger written");
    }

    let summary = serde_json::json!({
        "bars_processed": report.bars_processed,
        "halted": report.halted,
        "final_equity": report.final_equity(),
        "cash": report.portfolio.cash,
        "open_positions": report.portfolio.positions.len(),
        "trades": report.trade_ledger.len(),
        "metrics": report.metrics,
        "kill_switch": report.kill_switch,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run_sweep(
    config_path: &std::path::Path,
    workers: Option<usize>,
    iterations: Option<usize>,
    objective: Option<&str>,
    table_out: Option<&std::path::Path>,
    top: usize,
) -> Result<()> {
    let config = CliConfig::load(config_path)?;
    let series = config.load_bars()?;

    let mut space = ParameterSpace::new();
    for (name, values) in &config.sweep.parameters {
        space.add(name.clone(), values.clone())?;
    }

    let objective_name = objective
        .map(str::to_string)
        .or_else(|| {
            (!config.sweep.objective.is_empty()).then(|| config.sweep.objective.clone())
        })
        .unwrap_or_else(|| "sharpe".into());
    let objective: Objective = objective_name.parse()?;

    let base_params = config.strategy.clone();
    let initial_cash = config.backtest.initial_cash;
    let long_only = config.backtest.long_only;
    let configured_workers = config.sweep.workers;
    let configured_iterations = config.sweep.iterations;
    let seed = config.sweep.seed;

    let mut runner = SweepRunner::new(objective, move |point| {
        // Base strategy params from config, overridden by the sweep point.
        let mut params = base_params.clone();
        params.extend(point.iter().map(|(k, &v)| (k.clone(), v)));

        let mut strategy = AtrBreakoutStrategy::new(AtrBreakoutConfig::default())?;
        strategy.set_params(&params)?;

        let mut engine_config = EngineConfig::new(initial_cash);
        engine_config.long_only = long_only;
        let mut engine = BacktestEngine::new(engine_config)
            .with_execution(config.execution_engine())
            .with_kill_switches(config.kill_switch_manager());
        Ok(engine.run(&mut strategy, &series)?.metrics)
    });
    if let Some(workers) = workers.or(configured_workers) {
        runner = runner.with_workers(workers);
    }

    let iterations = iterations.unwrap_or(configured_iterations);
    let results = if iterations > 0 {
        runner.run_random(&space, iterations, seed)?
    } else {
        runner.run_grid(&space)?
    };

    if let Some(path) = table_out {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        export::write_sweep_csv(file, &results)?;
        info!(path = %path.display(), rows = results.len(), "sweep table written");
    }

    let leaders: Vec<_> = results
        .top_n(top)
        .into_iter()
        .map(|o| {
            serde_json::json!({
                "fingerprint": o.fingerprint,
                "parameters": o.parameters,
                "objective": o.objective,
            })
        })
        .collect();
    let ranges: BTreeMap<String, f64> = sensitivity(&results)
        .into_iter()
        .map(|t| (t.parameter, t.range))
        .collect();

    let summary = serde_json::json!({
        "objective": objective_name,
        "points": results.len(),
        "failures": results.failures().count(),
        "leaders": leaders,
        "sensitivity_range": ranges,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
