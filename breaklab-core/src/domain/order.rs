//! Order types and the order lifecycle state machine.
//!
//! Lifecycle: Pending → {Filled, Canceled, Rejected}. `PartiallyFilled` is
//! reserved; the core engine never emits it. Terminal statuses are immutable —
//! the portfolio refuses to transition a terminal order.

use super::ids::OrderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which way the order trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// +1.0 for buys, -1.0 for sells. Used for directional cost adjustments.
    pub fn sign(self) -> f64 {
        match self {
            OrderSide::Buy => 1.0,
            OrderSide::Sell => -1.0,
        }
    }
}

/// Order type and its trigger semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    /// Executes at the next bar's close as the reference price.
    Market,
    /// Fills at the limit price when the bar's range touches it.
    Limit,
    /// Becomes a market order when the stop level is touched.
    Stop,
    /// Triggers at the stop level, then fills only at the limit or better.
    StopLimit,
}

/// Order lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    /// Reserved; the core engine does not emit partial fills.
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
}

/// A single order. Quantity is a positive whole-unit count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: u64,
    pub limit_price: Option<f64>,
    pub stop_price: Option<f64>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub fill_price: Option<f64>,
    pub filled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// A market order with no price constraints.
    pub fn market(
        id: OrderId,
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            quantity,
            limit_price: None,
            stop_price: None,
            status: OrderStatus::Pending,
            created_at,
            fill_price: None,
            filled_at: None,
        }
    }

    /// A limit order at the given price.
    pub fn limit(
        id: OrderId,
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: u64,
        limit_price: f64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            order_type: OrderType::Limit,
            limit_price: Some(limit_price),
            ..Self::market(id, symbol, side, quantity, created_at)
        }
    }

    /// A stop order that goes market once touched.
    pub fn stop(
        id: OrderId,
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: u64,
        stop_price: f64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            order_type: OrderType::Stop,
            stop_price: Some(stop_price),
            ..Self::market(id, symbol, side, quantity, created_at)
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::Pending | OrderStatus::PartiallyFilled
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::Filled | OrderStatus::Canceled | OrderStatus::Rejected
        )
    }
}
