//! Error taxonomy for the engine core.
//!
//! Three fatal kinds surface to the caller: `ConfigError` at construction,
//! `DataError` on a bad bar stream, `InvariantError` when simulation state is
//! violated mid-run. Trigger failures are isolated by the kill-switch manager
//! and never fail a run. The sweep layer converts per-point failures into
//! captured rows instead of propagating them.

use crate::domain::OrderId;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Construction-time validation failure. Fatal before the run starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("unknown {field}: '{value}'")]
    UnknownVariant { field: &'static str, value: String },

    #[error("{0}")]
    Contradiction(String),

    #[error("duplicate metric processor name: '{0}'")]
    DuplicateProcessor(String),

    #[error("parameter '{0}' has an empty value list")]
    EmptyParameter(String),

    #[error("duplicate parameter name: '{0}'")]
    DuplicateParameter(String),
}

/// Bar-stream violation. Fatal for the current run; carries the offending
/// timestamp where one exists.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("empty bar series")]
    Empty,

    #[error("bar timestamps go backwards at {timestamp} ({symbol})")]
    NonMonotonicTimestamp {
        symbol: String,
        timestamp: DateTime<Utc>,
    },

    #[error("duplicate bar for {symbol} at {timestamp}")]
    DuplicateBar {
        symbol: String,
        timestamp: DateTime<Utc>,
    },

    #[error("non-finite {field} at {timestamp} ({symbol})")]
    NonFinite {
        symbol: String,
        field: &'static str,
        timestamp: DateTime<Utc>,
    },

    #[error("negative {field} ({value}) at {timestamp} ({symbol})")]
    Negative {
        symbol: String,
        field: &'static str,
        value: f64,
        timestamp: DateTime<Utc>,
    },

    #[error("inconsistent ohlc range at {timestamp} ({symbol})")]
    InsaneOhlc {
        symbol: String,
        timestamp: DateTime<Utc>,
    },
}

/// Simulation-state violation. Fatal for the current run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantError {
    #[error("a position is already open; exit before entering a new one")]
    PositionExists,

    #[error("no position to exit")]
    NoPosition,

    #[error("cash went negative after fill: {cash:.2}")]
    NegativeCash { cash: f64 },

    #[error("order {order} is terminal and cannot transition")]
    TerminalOrder { order: OrderId },

    #[error("unknown order {order}")]
    UnknownOrder { order: OrderId },

    #[error("pending order {order} was created after the executing bar at {timestamp}")]
    OrderFromFuture {
        order: OrderId,
        timestamp: DateTime<Utc>,
    },
}

/// A kill-switch trigger's `check` failed. Caught by the manager, logged,
/// and treated as non-tripping.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("trigger '{name}' failed: {message}")]
pub struct TriggerError {
    pub name: String,
    pub message: String,
}

/// Umbrella error returned by the backtest driver.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantError),
}
