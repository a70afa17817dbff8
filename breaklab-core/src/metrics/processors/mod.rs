//! Reference metric processors.

pub mod drawdown;
pub mod equity;
pub mod ratios;
pub mod trades;

pub use drawdown::DrawdownProcessor;
pub use equity::EquityCurveProcessor;
pub use ratios::RatioProcessor;
pub use trades::TradeListProcessor;

use super::TradeObservation;
use crate::domain::Bar;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A stream processor in the metrics pipeline.
///
/// `initialize` precedes all other calls; beyond that, processors tolerate
/// any interleaving of bar and trade events. Processors own their state and
/// never touch each other's.
pub trait MetricProcessor: Send {
    fn name(&self) -> &'static str;

    fn initialize(&mut self, initial_cash: f64);

    fn on_bar(&mut self, timestamp: DateTime<Utc>, equity: f64, bar: &Bar);

    fn on_trade(&mut self, trade: &TradeObservation);

    /// Current metrics as a lowercase_snake named map.
    fn snapshot(&self) -> BTreeMap<String, f64>;

    fn reset(&mut self);
}
