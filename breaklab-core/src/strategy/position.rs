//! TradePosition — the strategy-internal open position.
//!
//! Created on entry, mutated only by the trailing-stop engine, destroyed on
//! exit. Distinct from the portfolio's `Position`: this one carries the
//! volatility context (entry ATR) that risk sizing and R-multiples need.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradePosition {
    pub entry_price: f64,
    pub size: f64,
    pub entry_atr: f64,
    pub is_long: bool,
    /// Bar index at entry.
    pub entry_bar: usize,
    pub stop_price: Option<f64>,
}

impl TradePosition {
    pub fn unrealized_pnl(&self, mark_price: f64) -> f64 {
        if self.size == 0.0 {
            return 0.0;
        }
        if self.is_long {
            self.size * (mark_price - self.entry_price)
        } else {
            self.size * (self.entry_price - mark_price)
        }
    }
}
