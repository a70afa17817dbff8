//! Drawdown processor: running peak, current and maximum drawdown, and
//! drawdown duration in bars. A drawdown period ends when a new peak is set.

use super::MetricProcessor;
use crate::domain::Bar;
use crate::metrics::TradeObservation;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct DrawdownProcessor {
    peak: f64,
    last_equity: f64,
    /// Most negative drawdown seen, as a fraction (e.g. -0.18).
    max_drawdown: f64,
    max_drawdown_duration: usize,
    current_duration: usize,
    seen_bar: bool,
}

impl DrawdownProcessor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetricProcessor for DrawdownProcessor {
    fn name(&self) -> &'static str {
        "drawdown"
    }

    fn initialize(&mut self, initial_cash: f64) {
        self.peak = initial_cash;
        self.last_equity = initial_cash;
        self.max_drawdown = 0.0;
        self.max_drawdown_duration = 0;
        self.current_duration = 0;
        self.seen_bar = false;
    }

    fn on_bar(&mut self, _timestamp: DateTime<Utc>, equity: f64, _bar: &Bar) {
        self.seen_bar = true;
        self.last_equity = equity;

        if equity > self.peak {
            self.peak = equity;
            self.max_drawdown_duration = self.max_drawdown_duration.max(self.current_duration);
            self.current_duration = 0;
            return;
        }

        if self.peak > 0.0 {
            let drawdown = (equity - self.peak) / self.peak;
            if drawdown < self.max_drawdown {
                self.max_drawdown = drawdown;
            }
            self.current_duration += 1;
        }
    }

    fn on_trade(&mut self, _trade: &TradeObservation) {}

    fn snapshot(&self) -> BTreeMap<String, f64> {
        let current = if self.peak > 0.0 && self.seen_bar {
            (self.last_equity - self.peak) / self.peak
        } else {
            0.0
        };
        let mut out = BTreeMap::new();
        out.insert("max_drawdown".into(), self.max_drawdown);
        out.insert(
            "max_drawdown_duration".into(),
            self.max_drawdown_duration.max(self.current_duration) as f64,
        );
        out.insert("current_drawdown".into(), current);
        out
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}
