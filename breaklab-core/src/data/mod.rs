//! Validated market data containers.

pub mod series;

pub use series::BarSeries;
