//! Fill — an executed order, derived from an Order plus market conditions.

use super::order::OrderSide;
use serde::{Deserialize, Serialize};

/// Result of executing an order through the execution engine.
///
/// `price` already includes spread, slippage, and market impact; `commission`
/// is always a non-negative cash outflow on top of the notional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: u64,
    pub price: f64,
    pub commission: f64,
}

impl Fill {
    /// Traded notional: quantity × price.
    pub fn notional(&self) -> f64 {
        self.quantity as f64 * self.price
    }
}
