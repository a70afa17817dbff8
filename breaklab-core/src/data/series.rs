//! BarSeries — a finite, restartable, timestamp-sorted bar sequence.
//!
//! Heterogeneous symbols may interleave at the same timestamp; within one
//! symbol timestamps must strictly increase. Validation happens once at
//! construction so the engine loop never has to re-check bars.

use crate::domain::Bar;
use crate::error::DataError;
use std::collections::HashMap;

/// Validated bar sequence handed to the backtest driver.
#[derive(Debug, Clone)]
pub struct BarSeries {
    bars: Vec<Bar>,
    symbols: Vec<String>,
}

impl BarSeries {
    /// Validate and wrap a bar vector.
    ///
    /// Rules: non-empty; every bar passes `Bar::validate`; global timestamps
    /// non-decreasing; per-symbol timestamps strictly increasing (no
    /// duplicate (symbol, timestamp) pairs).
    pub fn new(bars: Vec<Bar>) -> Result<Self, DataError> {
        if bars.is_empty() {
            return Err(DataError::Empty);
        }

        let mut last_per_symbol: HashMap<&str, chrono::DateTime<chrono::Utc>> = HashMap::new();
        let mut symbols: Vec<String> = Vec::new();
        let mut prev_ts = None;

        for bar in &bars {
            bar.validate()?;

            if let Some(prev) = prev_ts {
                if bar.timestamp < prev {
                    return Err(DataError::NonMonotonicTimestamp {
                        symbol: bar.symbol.clone(),
                        timestamp: bar.timestamp,
                    });
                }
            }
            prev_ts = Some(bar.timestamp);

            match last_per_symbol.get(bar.symbol.as_str()) {
                Some(&last) if bar.timestamp == last => {
                    return Err(DataError::DuplicateBar {
                        symbol: bar.symbol.clone(),
                        timestamp: bar.timestamp,
                    });
                }
                Some(&last) if bar.timestamp < last => {
                    return Err(DataError::NonMonotonicTimestamp {
                        symbol: bar.symbol.clone(),
                        timestamp: bar.timestamp,
                    });
                }
                _ => {}
            }
            if !last_per_symbol.contains_key(bar.symbol.as_str()) {
                symbols.push(bar.symbol.clone());
            }
            last_per_symbol.insert(bar.symbol.as_str(), bar.timestamp);
        }

        Ok(Self { bars, symbols })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Restartable iteration — call as many times as needed.
    pub fn iter(&self) -> std::slice::Iter<'_, Bar> {
        self.bars.iter()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Symbols in first-appearance order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }
}
