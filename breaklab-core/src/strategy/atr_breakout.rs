//! ATR breakout reference strategy.
//!
//! Per bar: update the ATR, look for a breakout beyond the recent extremum
//! plus an ATR-scaled margin (against history that excludes the current bar),
//! then append the bar to the price buffer. Open positions are managed by the
//! trailing-stop engine; a stop hit exits at the stop price. Entries and
//! exits both go through the execution engine so costs are applied uniformly
//! on every position change.
//!
//! At most one position is open at a time. Entering over an open position or
//! exiting without one is an `InvariantError`, fatal to the run.

use crate::domain::{Bar, IdGen, Order, OrderSide};
use crate::error::{ConfigError, InvariantError};
use crate::execution::ExecutionEngine;
use crate::indicators::{Atr, PriceBuffer};
use crate::risk::TrailingStopEngine;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::config::{AtrBreakoutConfig, BreakoutDirection};
use super::position::TradePosition;
use super::results::{BarProcessResult, ExitReason, ExitResult};
use super::{Strategy, StrategyContext};

/// Extra history kept beyond the breakout lookback.
const BUFFER_SLACK: usize = 10;

pub struct AtrBreakoutStrategy {
    config: AtrBreakoutConfig,
    execution: ExecutionEngine,
    atr: Atr,
    buffer: PriceBuffer,
    trailing: TrailingStopEngine,
    position: Option<TradePosition>,
    realized_pnl: f64,
    bar_count: usize,
    id_gen: IdGen,
}

impl AtrBreakoutStrategy {
    pub fn new(config: AtrBreakoutConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let atr = Atr::new(config.atr_period)?;
        let buffer = PriceBuffer::new(config.breakout.lookback + BUFFER_SLACK)?;
        let trailing = TrailingStopEngine::new(config.trailing.clone());
        Ok(Self {
            config,
            execution: ExecutionEngine::frictionless(),
            atr,
            buffer,
            trailing,
            position: None,
            realized_pnl: 0.0,
            bar_count: 0,
            id_gen: IdGen::default(),
        })
    }

    /// Route entry and exit fills through the given execution engine.
    pub fn with_execution(mut self, execution: ExecutionEngine) -> Self {
        self.execution = execution;
        self
    }

    pub fn config(&self) -> &AtrBreakoutConfig {
        &self.config
    }

    /// Read-only view of the ATR state.
    pub fn atr(&self) -> &Atr {
        &self.atr
    }

    /// Read-only view of the price history buffer.
    pub fn price_buffer(&self) -> &PriceBuffer {
        &self.buffer
    }

    pub fn position(&self) -> Option<&TradePosition> {
        self.position.as_ref()
    }

    /// Cumulative realized P&L, net of commissions.
    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    /// Feed one bar through the strategy.
    pub fn process_bar(&mut self, bar: &Bar, prev_close: f64) -> Result<BarProcessResult, InvariantError> {
        self.bar_count += 1;

        let current_atr = self.atr.update(bar.high, bar.low, prev_close);

        // Breakout detection consults history only: the current bar is not
        // in the buffer yet, so the last lookback-1 entries are prior bars.
        let signal = if self.position.is_none() && self.should_check_breakouts() {
            self.detect_breakout(bar.high, bar.low, current_atr)
        } else {
            None
        };

        self.buffer.push(bar.high, bar.low, bar.close);

        let mut stop_hit = false;
        let mut exit_result = None;
        let mut stop_price = None;

        if self.position.is_some() {
            stop_price = self.update_trailing(bar.close);
            if let Some(stop) = self.check_stop(bar.high, bar.low) {
                stop_hit = true;
                exit_result = Some(self.exit_position(bar, stop, ExitReason::StopLoss)?);
            }
        }

        if let Some((is_long, entry_price)) = signal {
            if self.position.is_none() {
                let size = self.position_size(current_atr);
                if size >= 1.0 {
                    self.enter_position(bar, entry_price, size, is_long)?;
                    info!(
                        direction = if is_long { "long" } else { "short" },
                        entry_price,
                        size,
                        atr = current_atr,
                        "breakout entry"
                    );
                } else {
                    debug!(size, "breakout skipped: size below one unit");
                }
            }
        }

        if let Some(position) = &self.position {
            if !stop_hit {
                stop_price = position.stop_price;
            }
        }

        Ok(BarProcessResult {
            atr: current_atr,
            stop_hit,
            exit_result,
            stop_price,
        })
    }

    fn should_check_breakouts(&self) -> bool {
        self.config.breakout.enabled
            && self.buffer.has_enough_data(self.config.breakout.lookback)
            && self.atr.has_enough_samples(self.config.atr_period)
            && self.atr.value() >= self.config.breakout.min_atr_threshold
    }

    /// Returns `(is_long, entry_price)` when the bar crosses a threshold.
    fn detect_breakout(&self, high: f64, low: f64, atr: f64) -> Option<(bool, f64)> {
        let lookback = self.config.breakout.lookback;
        let multiplier = self.config.breakout.multiplier;
        let direction = self.config.breakout.direction;

        let recent_high = self.buffer.highest_high(lookback - 1);
        let recent_low = self.buffer.lowest_low(lookback - 1);

        let long_threshold = recent_high + atr * multiplier;
        let short_threshold = recent_low - atr * multiplier;

        if matches!(direction, BreakoutDirection::Long | BreakoutDirection::Both)
            && high > long_threshold
        {
            return Some((true, long_threshold));
        }
        if matches!(direction, BreakoutDirection::Short | BreakoutDirection::Both)
            && low < short_threshold
        {
            return Some((false, short_threshold));
        }
        None
    }

    /// Risk-budgeted size, capped at the default size, floored to whole units.
    fn position_size(&self, atr: f64) -> f64 {
        let stop_distance = atr * self.config.stop_loss_atr_multiplier;
        let max_risk = self.config.position_size * self.config.max_risk_per_trade;
        let risk_based = if stop_distance > 0.0 {
            max_risk / stop_distance
        } else {
            self.config.position_size
        };
        self.config.position_size.min(risk_based).floor()
    }

    /// Open a position at the given reference price via the execution engine.
    pub fn enter_position(
        &mut self,
        bar: &Bar,
        price: f64,
        size: f64,
        is_long: bool,
    ) -> Result<(), InvariantError> {
        if self.position.is_some() {
            return Err(InvariantError::PositionExists);
        }

        let side = if is_long { OrderSide::Buy } else { OrderSide::Sell };
        let order = Order::market(
            self.id_gen.next_order_id(),
            bar.symbol.clone(),
            side,
            size as u64,
            bar.timestamp,
        );
        let fill = self.execution.execute_order(&order, price, bar.volume);

        let entry_atr = self.atr.value();
        let stop_distance = entry_atr * self.config.stop_loss_atr_multiplier;
        let stop_price = if is_long {
            fill.price - stop_distance
        } else {
            fill.price + stop_distance
        };

        self.realized_pnl -= fill.commission;
        self.position = Some(TradePosition {
            entry_price: fill.price,
            size,
            entry_atr,
            is_long,
            entry_bar: self.bar_count,
            stop_price: Some(stop_price),
        });

        Ok(())
    }

    /// Close the open position at the given reference price.
    pub fn exit_position(
        &mut self,
        bar: &Bar,
        price: f64,
        reason: ExitReason,
    ) -> Result<ExitResult, InvariantError> {
        let position = self.position.take().ok_or(InvariantError::NoPosition)?;

        let side = if position.is_long {
            OrderSide::Sell
        } else {
            OrderSide::Buy
        };
        let order = Order::market(
            self.id_gen.next_order_id(),
            bar.symbol.clone(),
            side,
            position.size as u64,
            bar.timestamp,
        );
        let fill = self.execution.execute_order(&order, price, bar.volume);

        let pnl = if position.is_long {
            position.size * (fill.price - position.entry_price)
        } else {
            position.size * (position.entry_price - fill.price)
        };
        let r_multiple = Self::r_multiple(pnl, &position, self.config.stop_loss_atr_multiplier);
        self.realized_pnl += pnl - fill.commission;

        info!(
            exit_price = fill.price,
            pnl,
            r_multiple,
            ?reason,
            bars_held = self.bar_count - position.entry_bar,
            "position exited"
        );

        Ok(ExitResult {
            pnl,
            r_multiple,
            total_pnl: self.realized_pnl,
            commission: fill.commission,
            reason,
        })
    }

    /// P&L in units of the initial risk `size * entry_atr * stop_multiplier`;
    /// 0.0 when the denominator is degenerate.
    fn r_multiple(pnl: f64, position: &TradePosition, stop_multiplier: f64) -> f64 {
        let initial_risk = position.size * position.entry_atr * stop_multiplier;
        if initial_risk <= 0.0 {
            return 0.0;
        }
        pnl / initial_risk
    }

    fn update_trailing(&mut self, close: f64) -> Option<f64> {
        let position = self.position.as_mut()?;
        self.trailing.update_stop(position, close, &self.atr)
    }

    fn check_stop(&self, high: f64, low: f64) -> Option<f64> {
        let position = self.position.as_ref()?;
        TrailingStopEngine::stop_hit(position, high, low)
    }

    fn reset_state(&mut self) -> Result<(), ConfigError> {
        self.atr = Atr::new(self.config.atr_period)?;
        self.buffer = PriceBuffer::new(self.config.breakout.lookback + BUFFER_SLACK)?;
        self.trailing = TrailingStopEngine::new(self.config.trailing.clone());
        self.position = None;
        self.realized_pnl = 0.0;
        self.bar_count = 0;
        Ok(())
    }
}

impl Strategy for AtrBreakoutStrategy {
    fn name(&self) -> &'static str {
        "atr_breakout"
    }

    /// Recognized keys: `atr_period`, `breakout_multiplier`,
    /// `breakout_lookback`, `min_atr_threshold`, `position_size`,
    /// `max_risk_per_trade`, `stop_loss_atr_multiplier`, `use_dynamic_trailing`
    /// (0/1), `trailing_min_samples`. Unknown keys are ignored.
    fn set_params(&mut self, params: &BTreeMap<String, f64>) -> Result<(), ConfigError> {
        for (key, &value) in params {
            match key.as_str() {
                "atr_period" => self.config.atr_period = value as usize,
                "breakout_multiplier" => self.config.breakout.multiplier = value,
                "breakout_lookback" => self.config.breakout.lookback = value as usize,
                "min_atr_threshold" => self.config.breakout.min_atr_threshold = value,
                "position_size" => self.config.position_size = value,
                "max_risk_per_trade" => self.config.max_risk_per_trade = value,
                "stop_loss_atr_multiplier" => self.config.stop_loss_atr_multiplier = value,
                "use_dynamic_trailing" => self.config.trailing.use_dynamic = value != 0.0,
                "trailing_min_samples" => self.config.trailing.min_samples = value as usize,
                _ => {}
            }
        }
        self.config.validate()?;
        self.reset_state()
    }

    fn on_start(&mut self, initial_cash: f64) {
        debug!(
            strategy = self.name(),
            initial_cash,
            atr_period = self.config.atr_period,
            lookback = self.config.breakout.lookback,
            multiplier = self.config.breakout.multiplier,
            "strategy starting"
        );
    }

    fn on_bar(&mut self, ctx: &mut StrategyContext<'_>) -> Result<BarProcessResult, InvariantError> {
        let prev_close = ctx.prev_bar.map(|b| b.close).unwrap_or(ctx.bar.close);
        self.process_bar(ctx.bar, prev_close)
    }

    fn on_finish(&mut self) {
        info!(
            strategy = self.name(),
            bars = self.bar_count,
            realized_pnl = self.realized_pnl,
            open_position = self.position.is_some(),
            "strategy finished"
        );
    }
}
