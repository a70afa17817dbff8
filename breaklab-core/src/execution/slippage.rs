//! Slippage models: price adjustment between reference price and fill.
//!
//! `price_adjustment` returns a signed dollar amount: positive for buys
//! (worse price), negative for sells. Models see the order, the reference
//! price, and the bar's traded volume.

use crate::domain::Order;
use crate::error::ConfigError;

pub trait SlippageModel: Send + Sync {
    /// Signed price adjustment in dollars; buys pay more, sells receive less.
    fn price_adjustment(&self, order: &Order, market_price: f64, volume: f64) -> f64;

    fn name(&self) -> &'static str;
}

/// Identity model: zero slippage.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSlippage;

impl SlippageModel for NoSlippage {
    fn price_adjustment(&self, _order: &Order, _market_price: f64, _volume: f64) -> f64 {
        0.0
    }

    fn name(&self) -> &'static str {
        "no_slippage"
    }
}

/// Fixed dollar slippage per unit.
#[derive(Debug, Clone, Copy)]
pub struct FixedSlippage {
    pub amount: f64,
}

impl FixedSlippage {
    pub fn new(amount: f64) -> Self {
        Self { amount }
    }
}

impl SlippageModel for FixedSlippage {
    fn price_adjustment(&self, order: &Order, _market_price: f64, _volume: f64) -> f64 {
        order.side.sign() * self.amount
    }

    fn name(&self) -> &'static str {
        "fixed_slippage"
    }
}

/// Slippage as basis points of the reference price.
#[derive(Debug, Clone, Copy)]
pub struct PercentageSlippage {
    pub bps: f64,
}

impl PercentageSlippage {
    pub fn new(bps: f64) -> Self {
        Self { bps }
    }
}

impl SlippageModel for PercentageSlippage {
    fn price_adjustment(&self, order: &Order, market_price: f64, _volume: f64) -> f64 {
        order.side.sign() * market_price * (self.bps / 10_000.0)
    }

    fn name(&self) -> &'static str {
        "percentage_slippage"
    }
}

/// One tier of a volume-dependent slippage schedule.
#[derive(Debug, Clone, Copy)]
pub struct SlippageTier {
    /// Bar volume at or above which this tier applies.
    pub volume_threshold: f64,
    pub bps: f64,
}

/// Volume-tiered slippage: the tier with the highest threshold not exceeding
/// the bar's volume wins.
#[derive(Debug, Clone)]
pub struct VolumeTieredSlippage {
    tiers: Vec<SlippageTier>,
}

impl VolumeTieredSlippage {
    pub fn new(mut tiers: Vec<SlippageTier>) -> Result<Self, ConfigError> {
        if tiers.is_empty() {
            return Err(ConfigError::EmptyParameter("slippage_tiers".into()));
        }
        tiers.sort_by(|a, b| {
            a.volume_threshold
                .partial_cmp(&b.volume_threshold)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(Self { tiers })
    }

    fn bps_for(&self, volume: f64) -> f64 {
        let mut bps = self.tiers[0].bps;
        for tier in &self.tiers {
            if volume >= tier.volume_threshold {
                bps = tier.bps;
            }
        }
        bps
    }
}

impl SlippageModel for VolumeTieredSlippage {
    fn price_adjustment(&self, order: &Order, market_price: f64, volume: f64) -> f64 {
        order.side.sign() * market_price * (self.bps_for(volume) / 10_000.0)
    }

    fn name(&self) -> &'static str {
        "volume_tiered_slippage"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderId, OrderSide};
    use chrono::{TimeZone, Utc};

    fn order(side: OrderSide) -> Order {
        Order::market(
            OrderId(0),
            "TEST",
            side,
            1_000,
            Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap(),
        )
    }

    #[test]
    fn no_slippage_is_identity() {
        let model = NoSlippage;
        assert_eq!(model.price_adjustment(&order(OrderSide::Buy), 100.0, 0.0), 0.0);
    }

    #[test]
    fn fixed_signs_by_side() {
        let model = FixedSlippage::new(0.05);
        assert_eq!(model.price_adjustment(&order(OrderSide::Buy), 100.0, 0.0), 0.05);
        assert_eq!(
            model.price_adjustment(&order(OrderSide::Sell), 100.0, 0.0),
            -0.05
        );
    }

    #[test]
    fn percentage_scales_with_price() {
        let model = PercentageSlippage::new(10.0); // 10 bps
        let adj = model.price_adjustment(&order(OrderSide::Buy), 100.0, 0.0);
        assert!((adj - 0.1).abs() < 1e-12);
    }

    #[test]
    fn tiered_picks_highest_qualifying_threshold() {
        let model = VolumeTieredSlippage::new(vec![
            SlippageTier {
                volume_threshold: 0.0,
                bps: 5.0,
            },
            SlippageTier {
                volume_threshold: 500_000.0,
                bps: 15.0,
            },
        ])
        .unwrap();

        // Below the second threshold: 5 bps of 100 = 0.05
        let low = model.price_adjustment(&order(OrderSide::Buy), 100.0, 400_000.0);
        assert!((low - 0.05).abs() < 1e-12);

        // Above: 15 bps of 100 = 0.15
        let high = model.price_adjustment(&order(OrderSide::Buy), 100.0, 1_000_000.0);
        assert!((high - 0.15).abs() < 1e-12);
    }

    #[test]
    fn tiered_sorts_unordered_input() {
        let model = VolumeTieredSlippage::new(vec![
            SlippageTier {
                volume_threshold: 1_000_000.0,
                bps: 30.0,
            },
            SlippageTier {
                volume_threshold: 0.0,
                bps: 5.0,
            },
        ])
        .unwrap();
        let adj = model.price_adjustment(&order(OrderSide::Buy), 100.0, 100.0);
        assert!((adj - 0.05).abs() < 1e-12);
    }

    #[test]
    fn tiered_rejects_empty() {
        assert!(VolumeTieredSlippage::new(vec![]).is_err());
    }
}
