//! Average True Range (ATR), streaming form.
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! ATR is the arithmetic mean of the last `period` true ranges (simple
//! rolling window, not Wilder smoothing — the trailing-stop selection rule
//! and the N-identical-bars identity both assume the SMA form).

use crate::error::ConfigError;
use std::collections::VecDeque;

/// Compute one bar's true range.
pub fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
    (high - low)
        .max((high - prev_close).abs())
        .max((low - prev_close).abs())
}

/// Streaming ATR over a fixed window of true ranges.
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    window: VecDeque<f64>,
    sum: f64,
}

impl Atr {
    pub fn new(period: usize) -> Result<Self, ConfigError> {
        if period == 0 {
            return Err(ConfigError::NonPositive {
                field: "atr_period",
                value: 0.0,
            });
        }
        Ok(Self {
            period,
            window: VecDeque::with_capacity(period),
            sum: 0.0,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Feed one bar and return the updated ATR.
    pub fn update(&mut self, high: f64, low: f64, prev_close: f64) -> f64 {
        let tr = true_range(high, low, prev_close);
        self.window.push_back(tr);
        self.sum += tr;
        if self.window.len() > self.period {
            if let Some(evicted) = self.window.pop_front() {
                self.sum -= evicted;
            }
        }
        self.value()
    }

    /// Current ATR; 0.0 with no samples.
    pub fn value(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.sum / self.window.len() as f64
    }

    pub fn sample_count(&self) -> usize {
        self.window.len()
    }

    pub fn has_enough_samples(&self, min_samples: usize) -> bool {
        self.window.len() >= min_samples
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.sum = 0.0;
    }
}
