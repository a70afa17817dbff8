//! Market impact models: price pressure from the order's own size relative
//! to the bar's traded volume. Signed like slippage: buys push the price up,
//! sells push it down. Zero or missing volume means no impact estimate.

use crate::domain::Order;

pub trait MarketImpactModel: Send + Sync {
    /// Signed price impact in dollars.
    fn price_impact(&self, order: &Order, market_price: f64, volume: f64) -> f64;

    fn name(&self) -> &'static str;
}

/// Identity model: zero impact.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImpact;

impl MarketImpactModel for NoImpact {
    fn price_impact(&self, _order: &Order, _market_price: f64, _volume: f64) -> f64 {
        0.0
    }

    fn name(&self) -> &'static str {
        "no_impact"
    }
}

/// Linear impact: `market_price * (order_notional / volume_notional) * rate`.
#[derive(Debug, Clone, Copy)]
pub struct LinearImpact {
    pub rate: f64,
}

impl LinearImpact {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }
}

impl MarketImpactModel for LinearImpact {
    fn price_impact(&self, order: &Order, market_price: f64, volume: f64) -> f64 {
        if volume <= 0.0 {
            return 0.0;
        }
        // Notional ratio reduces to quantity ratio at a shared reference price.
        let participation = order.quantity as f64 / volume;
        order.side.sign() * market_price * participation * self.rate
    }

    fn name(&self) -> &'static str {
        "linear_impact"
    }
}

/// Square-root impact: `market_price * coefficient * sqrt(qty / volume)`.
#[derive(Debug, Clone, Copy)]
pub struct SquareRootImpact {
    pub coefficient: f64,
}

impl SquareRootImpact {
    pub fn new(coefficient: f64) -> Self {
        Self { coefficient }
    }
}

impl MarketImpactModel for SquareRootImpact {
    fn price_impact(&self, order: &Order, market_price: f64, volume: f64) -> f64 {
        if volume <= 0.0 {
            return 0.0;
        }
        let participation = order.quantity as f64 / volume;
        order.side.sign() * market_price * self.coefficient * participation.sqrt()
    }

    fn name(&self) -> &'static str {
        "square_root_impact"
    }
}
