//! The metrics pipeline: an ordered set of processors dispatched in
//! insertion order. Duplicate names are rejected at add time.

use super::processors::{
    DrawdownProcessor, EquityCurveProcessor, MetricProcessor, RatioProcessor, TradeListProcessor,
};
use super::TradeObservation;
use crate::domain::Bar;
use crate::error::ConfigError;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Named metric map produced by snapshots.
pub type MetricsSnapshot = BTreeMap<String, f64>;

pub struct MetricsPipeline {
    processors: Vec<Box<dyn MetricProcessor>>,
}

impl MetricsPipeline {
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    /// The reference set: equity curve, drawdown, trade list, Sharpe/Sortino.
    pub fn standard() -> Self {
        let mut pipeline = Self::new();
        // Names are distinct by construction; add cannot fail here.
        let _ = pipeline.add(Box::new(EquityCurveProcessor::new()));
        let _ = pipeline.add(Box::new(DrawdownProcessor::new()));
        let _ = pipeline.add(Box::new(TradeListProcessor::new()));
        let _ = pipeline.add(Box::new(RatioProcessor::new()));
        pipeline
    }

    /// Append a processor; rejects duplicate names.
    pub fn add(&mut self, processor: Box<dyn MetricProcessor>) -> Result<(), ConfigError> {
        if self.processors.iter().any(|p| p.name() == processor.name()) {
            return Err(ConfigError::DuplicateProcessor(processor.name().into()));
        }
        self.processors.push(processor);
        Ok(())
    }

    /// Remove a processor by name; returns whether one was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.processors.len();
        self.processors.retain(|p| p.name() != name);
        self.processors.len() != before
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    pub fn initialize(&mut self, initial_cash: f64) {
        for processor in &mut self.processors {
            processor.initialize(initial_cash);
        }
    }

    pub fn on_bar(&mut self, timestamp: DateTime<Utc>, equity: f64, bar: &Bar) {
        for processor in &mut self.processors {
            processor.on_bar(timestamp, equity, bar);
        }
    }

    pub fn on_trade(&mut self, trade: &TradeObservation) {
        for processor in &mut self.processors {
            processor.on_trade(trade);
        }
    }

    /// Union of all processor snapshots, in dispatch order. Later processors
    /// cannot collide with earlier ones in practice because names are unique
    /// and keys are prefixless by convention.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut out = MetricsSnapshot::new();
        for processor in &self.processors {
            out.extend(processor.snapshot());
        }
        out
    }

    pub fn reset(&mut self) {
        for processor in &mut self.processors {
            processor.reset();
        }
    }
}

impl Default for MetricsPipeline {
    fn default() -> Self {
        Self::standard()
    }
}
