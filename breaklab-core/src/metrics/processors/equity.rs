//! Equity curve processor: records `(timestamp, equity)` per bar and
//! reports total return.

use super::MetricProcessor;
use crate::domain::{Bar, EquityPoint};
use crate::metrics::TradeObservation;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct EquityCurveProcessor {
    initial_cash: f64,
    points: Vec<EquityPoint>,
}

impl EquityCurveProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[EquityPoint] {
        &self.points
    }
}

impl MetricProcessor for EquityCurveProcessor {
    fn name(&self) -> &'static str {
        "equity_curve"
    }

    fn initialize(&mut self, initial_cash: f64) {
        self.initial_cash = initial_cash;
        self.points.clear();
    }

    fn on_bar(&mut self, timestamp: DateTime<Utc>, equity: f64, _bar: &Bar) {
        self.points.push(EquityPoint { timestamp, equity });
    }

    fn on_trade(&mut self, _trade: &TradeObservation) {}

    fn snapshot(&self) -> BTreeMap<String, f64> {
        let mut out = BTreeMap::new();
        let first = self
            .points
            .first()
            .map(|p| p.equity)
            .unwrap_or(self.initial_cash);
        let last = self
            .points
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.initial_cash);
        let total_return = if first != 0.0 { last / first - 1.0 } else { 0.0 };
        out.insert("total_return".into(), total_return);
        out.insert("initial_equity".into(), first);
        out.insert("final_equity".into(), last);
        out
    }

    fn reset(&mut self) {
        self.points.clear();
        self.initial_cash = 0.0;
    }
}
