//! Commission models. Commissions are always non-negative cash outflow,
//! regardless of side.

use crate::domain::Order;
use crate::error::ConfigError;

pub trait CommissionModel: Send + Sync {
    /// Commission in dollars for filling `order` at `fill_price`.
    fn commission(&self, order: &Order, fill_price: f64) -> f64;

    fn name(&self) -> &'static str;
}

/// Identity model: zero commission.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCommission;

impl CommissionModel for NoCommission {
    fn commission(&self, _order: &Order, _fill_price: f64) -> f64 {
        0.0
    }

    fn name(&self) -> &'static str {
        "no_commission"
    }
}

/// Per-share commission with a minimum per order.
#[derive(Debug, Clone, Copy)]
pub struct PerShareCommission {
    pub per_share: f64,
    pub minimum: f64,
}

impl PerShareCommission {
    pub fn new(per_share: f64, minimum: f64) -> Self {
        Self { per_share, minimum }
    }
}

impl CommissionModel for PerShareCommission {
    fn commission(&self, order: &Order, _fill_price: f64) -> f64 {
        (order.quantity as f64 * self.per_share).max(self.minimum)
    }

    fn name(&self) -> &'static str {
        "per_share_commission"
    }
}

/// Commission as a fraction of traded notional, with a minimum.
#[derive(Debug, Clone, Copy)]
pub struct PercentageCommission {
    pub rate: f64,
    pub minimum: f64,
}

impl PercentageCommission {
    pub fn new(rate: f64, minimum: f64) -> Self {
        Self { rate, minimum }
    }
}

impl CommissionModel for PercentageCommission {
    fn commission(&self, order: &Order, fill_price: f64) -> f64 {
        (order.quantity as f64 * fill_price * self.rate).max(self.minimum)
    }

    fn name(&self) -> &'static str {
        "percentage_commission"
    }
}

/// One tier of a notional-based commission schedule.
#[derive(Debug, Clone, Copy)]
pub struct CommissionTier {
    /// Trade notional at or above which this tier applies.
    pub notional_threshold: f64,
    pub rate: f64,
}

/// Tiered commission by trade notional; the highest qualifying tier wins.
#[derive(Debug, Clone)]
pub struct TieredCommission {
    tiers: Vec<CommissionTier>,
}

impl TieredCommission {
    pub fn new(mut tiers: Vec<CommissionTier>) -> Result<Self, ConfigError> {
        if tiers.is_empty() {
            return Err(ConfigError::EmptyParameter("commission_tiers".into()));
        }
        tiers.sort_by(|a, b| {
            a.notional_threshold
                .partial_cmp(&b.notional_threshold)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(Self { tiers })
    }
}

impl CommissionModel for TieredCommission {
    fn commission(&self, order: &Order, fill_price: f64) -> f64 {
        let notional = order.quantity as f64 * fill_price;
        let mut rate = self.tiers[0].rate;
        for tier in &self.tiers {
            if notional >= tier.notional_threshold {
                rate = tier.rate;
            }
        }
        notional * rate
    }

    fn name(&self) -> &'static str {
        "tiered_commission"
    }
}
