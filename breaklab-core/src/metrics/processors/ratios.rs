//! Sharpe/Sortino processor: streams per-bar returns off the equity feed.
//!
//! Sharpe = mean(excess) / std(excess) * sqrt(252).
//! Sortino divides by downside deviation only (std of returns below the
//! target, with the full return count in the denominator).
//! Annualization assumes daily bars; degenerate denominators yield 0.

use super::MetricProcessor;
use crate::domain::Bar;
use crate::metrics::TradeObservation;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

const BARS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Default)]
pub struct RatioProcessor {
    risk_free_rate: f64,
    prev_equity: Option<f64>,
    returns: Vec<f64>,
}

impl RatioProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Annual risk-free rate used for excess returns.
    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = rate;
        self
    }

    fn excess_returns(&self) -> Vec<f64> {
        let per_bar_rf = self.risk_free_rate / BARS_PER_YEAR;
        self.returns.iter().map(|r| r - per_bar_rf).collect()
    }
}

impl MetricProcessor for RatioProcessor {
    fn name(&self) -> &'static str {
        "ratios"
    }

    fn initialize(&mut self, initial_cash: f64) {
        self.prev_equity = Some(initial_cash);
        self.returns.clear();
    }

    fn on_bar(&mut self, _timestamp: DateTime<Utc>, equity: f64, _bar: &Bar) {
        if let Some(prev) = self.prev_equity {
            if prev > 0.0 {
                self.returns.push(equity / prev - 1.0);
            }
        }
        self.prev_equity = Some(equity);
    }

    fn on_trade(&mut self, _trade: &TradeObservation) {}

    fn snapshot(&self) -> BTreeMap<String, f64> {
        let excess = self.excess_returns();
        let mut out = BTreeMap::new();
        out.insert("sharpe".into(), sharpe(&excess));
        out.insert("sortino".into(), sortino(&excess));
        out
    }

    fn reset(&mut self) {
        self.prev_equity = None;
        self.returns.clear();
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn sharpe(excess: &[f64]) -> f64 {
    if excess.len() < 2 {
        return 0.0;
    }
    let std = std_dev(excess);
    if std < 1e-15 {
        return 0.0;
    }
    mean(excess) / std * BARS_PER_YEAR.sqrt()
}

fn sortino(excess: &[f64]) -> f64 {
    if excess.len() < 2 {
        return 0.0;
    }
    let downside_sq: f64 = excess.iter().filter(|&&r| r < 0.0).map(|r| r * r).sum();
    if downside_sq == 0.0 {
        return 0.0;
    }
    let downside_dev = (downside_sq / excess.len() as f64).sqrt();
    if downside_dev < 1e-15 {
        return 0.0;
    }
    mean(excess) / downside_dev * BARS_PER_YEAR.sqrt()
}
