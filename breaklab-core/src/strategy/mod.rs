//! Strategy contract and the ATR breakout reference implementation.

pub mod atr_breakout;
pub mod config;
pub mod position;
pub mod results;

pub use atr_breakout::AtrBreakoutStrategy;
pub use config::{AtrBreakoutConfig, BreakoutConfig, BreakoutDirection, TrailingConfig, TrailingKind};
pub use position::TradePosition;
pub use results::{BarProcessResult, ExitReason, ExitResult};

use crate::domain::{Bar, OrderId, Portfolio};
use crate::error::{ConfigError, InvariantError};
use std::collections::BTreeMap;

/// Per-bar view handed to a strategy: the current and prior bars, the
/// portfolio, and an order submission sink. The strategy never observes
/// post-callback equity of the same bar.
pub struct StrategyContext<'a> {
    pub bar: &'a Bar,
    pub prev_bar: Option<&'a Bar>,
    pub bar_index: usize,
    pub portfolio: &'a mut Portfolio,
}

impl StrategyContext<'_> {
    /// Submit a buy order for the current bar's symbol. Market when `limit`
    /// is None. Executes no earlier than the next bar.
    pub fn submit_buy(&mut self, quantity: u64, limit: Option<f64>) -> OrderId {
        self.portfolio
            .place_buy(self.bar.symbol.clone(), quantity, limit, self.bar.timestamp)
    }

    /// Submit a sell order for the current bar's symbol.
    pub fn submit_sell(&mut self, quantity: u64, limit: Option<f64>) -> OrderId {
        self.portfolio
            .place_sell(self.bar.symbol.clone(), quantity, limit, self.bar.timestamp)
    }
}

/// Pluggable strategy driven by the backtest engine.
///
/// Lifecycle: `set_params` (optional) → `on_start` → `on_bar` per bar →
/// `on_finish`. Entry/exit violations surface as `InvariantError` values,
/// which are fatal for the current run.
pub trait Strategy: Send {
    fn name(&self) -> &'static str;

    /// Apply a flat parameter map (used by the sweep layer). Unknown keys
    /// are ignored so one parameter space can drive several strategies.
    fn set_params(&mut self, params: &BTreeMap<String, f64>) -> Result<(), ConfigError> {
        let _ = params;
        Ok(())
    }

    fn on_start(&mut self, initial_cash: f64) {
        let _ = initial_cash;
    }

    fn on_bar(&mut self, ctx: &mut StrategyContext<'_>) -> Result<BarProcessResult, InvariantError>;

    fn on_finish(&mut self) {}
}
