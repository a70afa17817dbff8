//! Execution engine — composes spread, slippage, impact, and commission
//! into one fill.
//!
//! Fill price construction for `execute_order(order, market_price, volume)`:
//! 1. half-spread = market_price * spread_bps / 20_000
//! 2. base = market_price + half-spread (buy) or - half-spread (sell)
//! 3. fill = base + slippage + impact (both signed by side)
//! 4. commission = commission model at the fill price
//!
//! No partial fills: the fill quantity is the order quantity.

use crate::domain::{Fill, Order, OrderSide};
use tracing::debug;

use super::commission::{CommissionModel, NoCommission};
use super::impact::{MarketImpactModel, NoImpact};
use super::slippage::{NoSlippage, SlippageModel};

pub struct ExecutionEngine {
    slippage: Box<dyn SlippageModel>,
    commission: Box<dyn CommissionModel>,
    impact: Box<dyn MarketImpactModel>,
    spread_bps: f64,
}

impl ExecutionEngine {
    pub fn new(
        slippage: Box<dyn SlippageModel>,
        commission: Box<dyn CommissionModel>,
        impact: Box<dyn MarketImpactModel>,
        spread_bps: f64,
    ) -> Self {
        Self {
            slippage,
            commission,
            impact,
            spread_bps,
        }
    }

    /// All identity models, zero spread: fills exactly at the reference price.
    pub fn frictionless() -> Self {
        Self::new(
            Box::new(NoSlippage),
            Box::new(NoCommission),
            Box::new(NoImpact),
            0.0,
        )
    }

    pub fn with_slippage(mut self, slippage: Box<dyn SlippageModel>) -> Self {
        self.slippage = slippage;
        self
    }

    pub fn with_commission(mut self, commission: Box<dyn CommissionModel>) -> Self {
        self.commission = commission;
        self
    }

    pub fn with_impact(mut self, impact: Box<dyn MarketImpactModel>) -> Self {
        self.impact = impact;
        self
    }

    pub fn with_spread_bps(mut self, spread_bps: f64) -> Self {
        self.spread_bps = spread_bps;
        self
    }

    pub fn spread_bps(&self) -> f64 {
        self.spread_bps
    }

    /// Transform an order plus market conditions into a fill.
    pub fn execute_order(&self, order: &Order, market_price: f64, volume: f64) -> Fill {
        let half_spread = market_price * self.spread_bps / 20_000.0;
        let base = match order.side {
            OrderSide::Buy => market_price + half_spread,
            OrderSide::Sell => market_price - half_spread,
        };

        let slip = self.slippage.price_adjustment(order, market_price, volume);
        let impact = self.impact.price_impact(order, market_price, volume);
        let fill_price = base + slip + impact;
        let commission = self.commission.commission(order, fill_price);

        debug!(
            order = %order.id,
            market_price,
            half_spread,
            slip,
            impact,
            fill_price,
            commission,
            "order executed"
        );

        Fill {
            symbol: order.symbol.clone(),
            side: order.side,
            quantity: order.quantity,
            price: fill_price,
            commission,
        }
    }
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::frictionless()
    }
}
