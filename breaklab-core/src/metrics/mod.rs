//! Streaming metrics: ordered processors consuming per-bar and per-trade
//! events, each maintaining O(1) or O(window) state and snapshotting a named
//! metric map on demand.

pub mod pipeline;
pub mod processors;
pub mod summary;

pub use pipeline::{MetricsPipeline, MetricsSnapshot};
pub use processors::{
    DrawdownProcessor, EquityCurveProcessor, MetricProcessor, RatioProcessor, TradeListProcessor,
};
pub use summary::derive_summary;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One completed trade event fed into the pipeline. The reference engine
/// emits one per exit leg, classified by round-trip P&L sign downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeObservation {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    /// Round-trip P&L, before commission.
    pub pnl: f64,
    pub commission: f64,
}
