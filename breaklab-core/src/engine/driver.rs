//! The bar-by-bar backtest loop.
//!
//! Strictly causal: within a bar the order is kill-switch check → pending
//! order execution → equity recording → strategy callback → pipeline
//! dispatch. Orders emitted by the strategy callback are pending until the
//! next eligible bar, so no trade ever observes its own bar's future, and
//! the strategy never sees post-callback equity of the same bar.

use crate::data::BarSeries;
use crate::domain::{Bar, Order, Portfolio};
use crate::error::{EngineError, InvariantError};
use crate::execution::ExecutionEngine;
use crate::killswitch::KillSwitchManager;
use crate::metrics::{derive_summary, MetricsPipeline, TradeObservation};
use crate::strategy::{Strategy, StrategyContext};
use std::collections::HashMap;
use tracing::{debug, info};

use super::report::BacktestReport;
use super::trigger::fill_reference;

/// Static configuration of one engine instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub initial_cash: f64,
    /// Reject sells that would open a short position.
    pub long_only: bool,
}

impl EngineConfig {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            initial_cash,
            long_only: false,
        }
    }
}

/// The backtest driver. Owns the execution engine, kill switches, and the
/// metrics pipeline; each `run` builds a fresh portfolio, so one engine can
/// evaluate many series or strategies in sequence.
pub struct BacktestEngine {
    config: EngineConfig,
    execution: ExecutionEngine,
    kill_switches: KillSwitchManager,
    pipeline: MetricsPipeline,
}

impl BacktestEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            execution: ExecutionEngine::frictionless(),
            kill_switches: KillSwitchManager::new(),
            pipeline: MetricsPipeline::standard(),
        }
    }

    pub fn with_execution(mut self, execution: ExecutionEngine) -> Self {
        self.execution = execution;
        self
    }

    pub fn with_kill_switches(mut self, kill_switches: KillSwitchManager) -> Self {
        self.kill_switches = kill_switches;
        self
    }

    pub fn with_pipeline(mut self, pipeline: MetricsPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run a strategy over a validated bar series.
    pub fn run(
        &mut self,
        strategy: &mut dyn Strategy,
        series: &BarSeries,
    ) -> Result<BacktestReport, EngineError> {
        let mut portfolio = if self.config.long_only {
            Portfolio::new(self.config.initial_cash).long_only()
        } else {
            Portfolio::new(self.config.initial_cash)
        };

        self.kill_switches.reset_all();
        self.pipeline.reset();
        self.pipeline.initialize(self.config.initial_cash);
        strategy.on_start(self.config.initial_cash);

        info!(
            strategy = strategy.name(),
            bars = series.len(),
            initial_cash = self.config.initial_cash,
            "backtest starting"
        );

        let mut last_close: HashMap<String, f64> = HashMap::new();
        let mut prev_by_symbol: HashMap<&str, &Bar> = HashMap::new();
        let mut halted = false;
        let mut bars_processed = 0usize;

        for (bar_index, bar) in series.bars().iter().enumerate() {
            // Mark reference: this bar's close plus last-known closes of
            // every other symbol seen so far.
            last_close.insert(bar.symbol.clone(), bar.close);
            let current_prices = last_close.clone();

            if self
                .kill_switches
                .check_all(&portfolio, &current_prices, bar.timestamp)
            {
                halted = true;
                debug!(bar_index, "kill switch active; run halted");
                break;
            }

            self.execute_pending(&mut portfolio, bar)?;

            portfolio.record_equity_point(bar.timestamp, &current_prices);

            let result = {
                let mut ctx = StrategyContext {
                    bar,
                    prev_bar: prev_by_symbol.get(bar.symbol.as_str()).copied(),
                    bar_index,
                    portfolio: &mut portfolio,
                };
                strategy.on_bar(&mut ctx)?
            };

            let equity = portfolio.total_value(&current_prices);
            self.pipeline.on_bar(bar.timestamp, equity, bar);
            if let Some(exit) = &result.exit_result {
                self.pipeline.on_trade(&TradeObservation {
                    timestamp: bar.timestamp,
                    symbol: bar.symbol.clone(),
                    pnl: exit.pnl,
                    commission: exit.commission,
                });
            }

            prev_by_symbol.insert(bar.symbol.as_str(), bar);
            bars_processed += 1;
        }

        strategy.on_finish();

        let metrics = derive_summary(self.pipeline.snapshot(), bars_processed);
        info!(bars_processed, halted, "backtest finished");

        Ok(BacktestReport {
            portfolio: portfolio.snapshot(),
            equity_curve: portfolio.equity_curve().to_vec(),
            trade_ledger: portfolio.trades().to_vec(),
            metrics,
            kill_switch: self.kill_switches.report(),
            bars_processed,
            halted,
        })
    }

    /// Execute matchable pending orders against this bar, in creation order.
    fn execute_pending(
        &self,
        portfolio: &mut Portfolio,
        bar: &Bar,
    ) -> Result<(), InvariantError> {
        let pending: Vec<Order> = portfolio
            .pending_orders()
            .filter(|o| o.symbol == bar.symbol)
            .cloned()
            .collect();

        for order in pending {
            if order.created_at > bar.timestamp {
                return Err(InvariantError::OrderFromFuture {
                    order: order.id,
                    timestamp: bar.timestamp,
                });
            }
            // Same-bar orders wait: execution is next-bar at the earliest.
            if order.created_at == bar.timestamp {
                continue;
            }
            if let Some(reference) = fill_reference(&order, bar) {
                let fill = self.execution.execute_order(&order, reference, bar.volume);
                portfolio.apply_fill(order.id, &fill, bar.timestamp)?;
            }
        }
        Ok(())
    }
}
