//! Bar — one OHLCV observation for a symbol at a timestamp.

use crate::error::DataError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single symbol at a single timestamp. Immutable once
/// produced by the data source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Basic OHLCV sanity: finite fields, non-negative prices and volume,
    /// high/low bracketing open and close.
    pub fn validate(&self) -> Result<(), DataError> {
        for (field, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ] {
            if !value.is_finite() {
                return Err(DataError::NonFinite {
                    symbol: self.symbol.clone(),
                    field,
                    timestamp: self.timestamp,
                });
            }
            if value < 0.0 {
                return Err(DataError::Negative {
                    symbol: self.symbol.clone(),
                    field,
                    value,
                    timestamp: self.timestamp,
                });
            }
        }

        let range_ok = self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close;
        if !range_ok {
            return Err(DataError::InsaneOhlc {
                symbol: self.symbol.clone(),
                timestamp: self.timestamp,
            });
        }

        Ok(())
    }

    /// Intrabar traded range.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_bar() -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap(),
            symbol: "SPY".into(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000.0,
        }
    }

    #[test]
    fn valid_bar_passes() {
        assert!(sample_bar().validate().is_ok());
    }

    #[test]
    fn nan_field_rejected() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        assert!(matches!(
            bar.validate(),
            Err(DataError::NonFinite { field: "close", .. })
        ));
    }

    #[test]
    fn negative_price_rejected() {
        let mut bar = sample_bar();
        bar.low = -1.0;
        assert!(matches!(
            bar.validate(),
            Err(DataError::Negative { field: "low", .. })
        ));
    }

    #[test]
    fn high_below_low_rejected() {
        let mut bar = sample_bar();
        bar.high = 97.0;
        assert!(matches!(bar.validate(), Err(DataError::InsaneOhlc { .. })));
    }

    #[test]
    fn serialization_roundtrip() {
        let bar = sample_bar();
        let json = serde_json::to_string(&bar).unwrap();
        let deser: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar.symbol, deser.symbol);
        assert_eq!(bar.timestamp, deser.timestamp);
        assert_eq!(bar.close, deser.close);
    }
}
