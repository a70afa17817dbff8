//! Trade ledger and equity curve entries. Both are append-only.

use super::order::OrderSide;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One executed leg in the trade ledger.
///
/// `realized_pnl` is non-zero only for the closing portion of a round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeLedgerEntry {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: u64,
    pub price: f64,
    pub notional: f64,
    pub realized_pnl: f64,
}

/// One point on the equity curve: cash plus position marks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
}
