//! Strategy configuration with construction-time validation.
//!
//! Every config validates on `validate()`; the ATR breakout strategy calls it
//! at construction and again after `set_params`, so a sweep point with a bad
//! combination fails fast as a `ConfigError` instead of corrupting a run.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Which side(s) the breakout detector may signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakoutDirection {
    Long,
    Short,
    Both,
}

/// Trailing-stop distance source. Only ATR-based trailing exists today; the
/// enum keeps the wire format open for percent or stepped trails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingKind {
    Atr,
}

/// Trailing-stop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailingConfig {
    pub enabled: bool,
    pub kind: TrailingKind,
    /// Use the live ATR once it has `min_samples`; otherwise the entry ATR.
    pub use_dynamic: bool,
    pub min_samples: usize,
    /// Reserved: fixed-percent distance for a future trailing kind.
    pub fixed_percent: Option<f64>,
}

impl Default for TrailingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            kind: TrailingKind::Atr,
            use_dynamic: false,
            min_samples: 1,
            fixed_percent: None,
        }
    }
}

impl TrailingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_samples == 0 {
            return Err(ConfigError::NonPositive {
                field: "trailing.min_samples",
                value: 0.0,
            });
        }
        if let Some(pct) = self.fixed_percent {
            if pct <= 0.0 {
                return Err(ConfigError::NonPositive {
                    field: "trailing.fixed_percent",
                    value: pct,
                });
            }
        }
        Ok(())
    }
}

/// Breakout detection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakoutConfig {
    pub enabled: bool,
    /// ATR multiplier added beyond the recent extremum.
    pub multiplier: f64,
    /// Bars of history consulted for the recent high/low.
    pub lookback: usize,
    pub direction: BreakoutDirection,
    /// Minimum ATR for a breakout to count; filters dead tape.
    pub min_atr_threshold: f64,
}

impl Default for BreakoutConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            multiplier: 2.0,
            lookback: 20,
            direction: BreakoutDirection::Both,
            min_atr_threshold: 0.01,
        }
    }
}

impl BreakoutConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.multiplier <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "breakout.multiplier",
                value: self.multiplier,
            });
        }
        if self.lookback < 2 {
            return Err(ConfigError::NonPositive {
                field: "breakout.lookback",
                value: self.lookback as f64,
            });
        }
        if self.min_atr_threshold < 0.0 {
            return Err(ConfigError::NonPositive {
                field: "breakout.min_atr_threshold",
                value: self.min_atr_threshold,
            });
        }
        Ok(())
    }
}

/// Full configuration of the ATR breakout reference strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtrBreakoutConfig {
    pub atr_period: usize,
    pub breakout: BreakoutConfig,
    pub trailing: TrailingConfig,
    /// Default position size in units.
    pub position_size: f64,
    /// Risk budget per trade as a fraction of `position_size` notional.
    pub max_risk_per_trade: f64,
    /// Initial stop distance in ATRs; also the R-multiple risk unit.
    pub stop_loss_atr_multiplier: f64,
}

impl Default for AtrBreakoutConfig {
    fn default() -> Self {
        Self {
            atr_period: 14,
            breakout: BreakoutConfig::default(),
            trailing: TrailingConfig::default(),
            position_size: 1_000.0,
            max_risk_per_trade: 0.01,
            stop_loss_atr_multiplier: 2.0,
        }
    }
}

impl AtrBreakoutConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.atr_period == 0 {
            return Err(ConfigError::NonPositive {
                field: "atr_period",
                value: 0.0,
            });
        }
        self.breakout.validate()?;
        self.trailing.validate()?;
        if self.position_size <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "position_size",
                value: self.position_size,
            });
        }
        if self.max_risk_per_trade <= 0.0 || self.max_risk_per_trade > 1.0 {
            return Err(ConfigError::Contradiction(format!(
                "max_risk_per_trade must be in (0, 1], got {}",
                self.max_risk_per_trade
            )));
        }
        if self.stop_loss_atr_multiplier <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "stop_loss_atr_multiplier",
                value: self.stop_loss_atr_multiplier,
            });
        }
        if self.trailing.use_dynamic && self.trailing.min_samples > self.atr_period {
            return Err(ConfigError::Contradiction(format!(
                "trailing.min_samples ({}) exceeds atr_period ({}); the dynamic \
                 ATR window can never satisfy it",
                self.trailing.min_samples, self.atr_period
            )));
        }
        Ok(())
    }
}
