//! Broker interface contract.
//!
//! The core backtester never calls a broker; this is the seam a live
//! adapter implements. Every operation is failable with a typed error. The
//! in-memory `PaperBroker` exercises the contract without any network code.

pub mod paper;

pub use paper::PaperBroker;

use crate::domain::{Bar, Order, OrderId, OrderStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BrokerError {
    #[error("broker is not connected")]
    NotConnected,

    #[error("unknown order {0}")]
    UnknownOrder(OrderId),

    #[error("unknown symbol '{0}'")]
    UnknownSymbol(String),

    #[error("order rejected: {0}")]
    Rejected(String),

    #[error("transport failure: {0}")]
    Transport(String),
}

/// Account-level state reported by the broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    pub account_id: String,
    pub cash: f64,
    pub equity: f64,
    pub buying_power: f64,
}

/// A position as the broker reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerPosition {
    pub symbol: String,
    pub quantity: i64,
    pub avg_price: f64,
}

/// A two-sided quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
    pub timestamp: DateTime<Utc>,
}

/// Live trading venue contract, consumed by a live adapter.
pub trait Broker {
    fn connect(&mut self) -> Result<(), BrokerError>;

    fn disconnect(&mut self) -> Result<(), BrokerError>;

    fn get_account_info(&self) -> Result<AccountInfo, BrokerError>;

    fn get_positions(&self) -> Result<Vec<BrokerPosition>, BrokerError>;

    fn place_order(&mut self, order: Order) -> Result<OrderId, BrokerError>;

    fn cancel_order(&mut self, id: OrderId) -> Result<(), BrokerError>;

    fn get_order_status(&self, id: OrderId) -> Result<OrderStatus, BrokerError>;

    fn get_orders(&self) -> Result<Vec<Order>, BrokerError>;

    fn get_quote(&self, symbol: &str) -> Result<Quote, BrokerError>;

    fn get_historical_data(&self, symbol: &str, lookback: usize) -> Result<Vec<Bar>, BrokerError>;
}
