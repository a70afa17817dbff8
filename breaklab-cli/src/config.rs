//! TOML configuration for the CLI.

use anyhow::{bail, Context, Result};
use breaklab_core::data::BarSeries;
use breaklab_core::domain::Bar;
use breaklab_core::execution::{
    ExecutionEngine, LinearImpact, PercentageCommission, PercentageSlippage,
};
use breaklab_core::killswitch::{
    DrawdownTrigger, KillSwitchManager, LossTrigger, VaRTrigger, VolatilityTrigger,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct CliConfig {
    pub backtest: BacktestSection,
    pub data: DataSection,
    #[serde(default)]
    pub strategy: BTreeMap<String, f64>,
    #[serde(default)]
    pub execution: ExecutionSection,
    #[serde(default)]
    pub kill_switches: KillSwitchSection,
    #[serde(default)]
    pub sweep: SweepSection,
}

#[derive(Debug, Deserialize)]
pub struct BacktestSection {
    pub initial_cash: f64,
    #[serde(default)]
    pub long_only: bool,
}

#[derive(Debug, Deserialize)]
pub struct DataSection {
    /// CSV with columns: timestamp, symbol, open, high, low, close, volume.
    pub csv: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExecutionSection {
    #[serde(default)]
    pub spread_bps: f64,
    #[serde(default)]
    pub slippage_bps: f64,
    #[serde(default)]
    pub commission_rate: f64,
    #[serde(default)]
    pub commission_minimum: f64,
    #[serde(default)]
    pub impact_rate: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct KillSwitchSection {
    pub max_drawdown: Option<f64>,
    pub max_loss: Option<f64>,
    pub max_volatility: Option<f64>,
    #[serde(default = "default_lookback_bars")]
    pub volatility_lookback_bars: usize,
    pub var_limit: Option<f64>,
    #[serde(default = "default_var_confidence")]
    pub var_confidence: f64,
    #[serde(default = "default_lookback_bars")]
    pub var_lookback_bars: usize,
}

#[derive(Debug, Deserialize)]
pub struct SweepSection {
    #[serde(default)]
    pub objective: String,
    pub workers: Option<usize>,
    /// 0 means full grid; otherwise random search with this many points.
    #[serde(default)]
    pub iterations: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub parameters: BTreeMap<String, Vec<f64>>,
}

impl Default for SweepSection {
    fn default() -> Self {
        Self {
            objective: String::new(),
            workers: None,
            iterations: 0,
            seed: default_seed(),
            parameters: BTreeMap::new(),
        }
    }
}

fn default_lookback_bars() -> usize {
    30
}

fn default_var_confidence() -> f64 {
    0.95
}

fn default_seed() -> u64 {
    42
}

impl CliConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: CliConfig = toml::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        if config.backtest.initial_cash <= 0.0 {
            bail!("backtest.initial_cash must be positive");
        }
        Ok(config)
    }

    pub fn execution_engine(&self) -> ExecutionEngine {
        let mut engine = ExecutionEngine::frictionless().with_spread_bps(self.execution.spread_bps);
        if self.execution.slippage_bps > 0.0 {
            engine = engine.with_slippage(Box::new(PercentageSlippage::new(
                self.execution.slippage_bps,
            )));
        }
        if self.execution.commission_rate > 0.0 {
            engine = engine.with_commission(Box::new(PercentageCommission::new(
                self.execution.commission_rate,
                self.execution.commission_minimum,
            )));
        }
        if self.execution.impact_rate > 0.0 {
            engine = engine.with_impact(Box::new(LinearImpact::new(self.execution.impact_rate)));
        }
        engine
    }

    pub fn kill_switch_manager(&self) -> KillSwitchManager {
        let section = &self.kill_switches;
        let mut manager = KillSwitchManager::new();
        if let Some(max_drawdown) = section.max_drawdown {
            manager.add_trigger(Box::new(DrawdownTrigger::new(max_drawdown)));
        }
        if let Some(max_loss) = section.max_loss {
            manager.add_trigger(Box::new(LossTrigger::new(max_loss)));
        }
        if let Some(max_volatility) = section.max_volatility {
            manager.add_trigger(Box::new(VolatilityTrigger::new(
                max_volatility,
                section.volatility_lookback_bars,
            )));
        }
        if let Some(var_limit) = section.var_limit {
            manager.add_trigger(Box::new(VaRTrigger::new(
                var_limit,
                section.var_confidence,
                section.var_lookback_bars,
            )));
        }
        manager
    }

    pub fn load_bars(&self) -> Result<BarSeries> {
        let mut reader = csv::Reader::from_path(&self.data.csv)
            .with_context(|| format!("opening bar csv {}", self.data.csv.display()))?;
        let mut bars: Vec<Bar> = Vec::new();
        for record in reader.deserialize() {
            let bar: Bar = record.context("parsing bar row")?;
            bars.push(bar);
        }
        let series = BarSeries::new(bars).context("validating bar series")?;
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_parses() {
        let config: CliConfig = toml::from_str(
            r#"
            [backtest]
            initial_cash = 100000.0

            [data]
            csv = "bars.csv"
            "#,
        )
        .unwrap();
        assert_eq!(config.backtest.initial_cash, 100_000.0);
        assert!(!config.backtest.long_only);
        assert!(config.strategy.is_empty());
        assert_eq!(config.sweep.iterations, 0);
    }

    #[test]
    fn full_config_parses() {
        let config: CliConfig = toml::from_str(
            r#"
            [backtest]
            initial_cash = 250000.0
            long_only = true

            [data]
            csv = "spy.csv"

            [strategy]
            atr_period = 10
            breakout_multiplier = 2.5

            [execution]
            spread_bps = 10.0
            slippage_bps = 5.0
            commission_rate = 0.001
            commission_minimum = 1.0

            [kill_switches]
            max_drawdown = 0.2
            max_loss = 50000.0

            [sweep]
            objective = "calmar"
            workers = 4
            iterations = 16
            seed = 7

            [sweep.parameters]
            atr_period = [10.0, 14.0, 20.0]
            breakout_multiplier = [1.5, 2.0]
            "#,
        )
        .unwrap();

        assert_eq!(config.strategy["atr_period"], 10.0);
        assert_eq!(config.sweep.parameters["atr_period"].len(), 3);
        assert_eq!(config.sweep.workers, Some(4));
        assert_eq!(config.kill_switch_manager().trigger_count(), 2);
    }
}
