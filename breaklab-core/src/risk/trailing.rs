//! ATR trailing-stop engine.
//!
//! Distance selection: disabled → 0; dynamic mode uses the live ATR once it
//! has `min_samples`, else the ATR recorded at entry. The caller applies its
//! multiplier when setting the initial stop — this engine returns the raw
//! distance.
//!
//! Stop updates ratchet: a long stop may only rise, a short stop may only
//! fall, even when ATR expansion proposes a looser level. This blocks the
//! volatility trap where a favorable move is followed by a widened stop.

use crate::indicators::Atr;
use crate::strategy::config::{TrailingConfig, TrailingKind};
use crate::strategy::position::TradePosition;

#[derive(Debug, Clone)]
pub struct TrailingStopEngine {
    config: TrailingConfig,
}

impl TrailingStopEngine {
    pub fn new(config: TrailingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrailingConfig {
        &self.config
    }

    /// Raw trailing distance for the position, before any multiplier.
    pub fn distance(&self, position: &TradePosition, atr: &Atr) -> f64 {
        if !self.config.enabled {
            return 0.0;
        }
        match self.config.kind {
            TrailingKind::Atr => {
                if self.config.use_dynamic && atr.has_enough_samples(self.config.min_samples) {
                    atr.value()
                } else {
                    position.entry_atr
                }
            }
        }
    }

    /// Ratchet the stop toward the close. Returns the stop after the update,
    /// or None when trailing contributes no distance.
    pub fn update_stop(
        &self,
        position: &mut TradePosition,
        close: f64,
        atr: &Atr,
    ) -> Option<f64> {
        let distance = self.distance(position, atr);
        if distance <= 0.0 {
            return None;
        }
        if position.is_long {
            let proposed = close - distance;
            match position.stop_price {
                Some(current) if proposed <= current => {}
                _ => position.stop_price = Some(proposed),
            }
        } else {
            let proposed = close + distance;
            match position.stop_price {
                Some(current) if proposed >= current => {}
                _ => position.stop_price = Some(proposed),
            }
        }
        position.stop_price
    }

    /// Intrabar hit check. Returns the stop price when the bar's range
    /// touched it: long stops hit on the low, short stops on the high.
    pub fn stop_hit(position: &TradePosition, bar_high: f64, bar_low: f64) -> Option<f64> {
        let stop = position.stop_price?;
        let hit = if position.is_long {
            bar_low <= stop
        } else {
            bar_high >= stop
        };
        hit.then_some(stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_position(entry_atr: f64) -> TradePosition {
        TradePosition {
            entry_price: 100.0,
            size: 10.0,
            entry_atr,
            is_long: true,
            entry_bar: 0,
            stop_price: None,
        }
    }

    fn short_position(entry_atr: f64) -> TradePosition {
        TradePosition {
            is_long: false,
            ..long_position(entry_atr)
        }
    }

    fn static_engine() -> TrailingStopEngine {
        TrailingStopEngine::new(TrailingConfig::default())
    }

    fn dynamic_engine(min_samples: usize) -> TrailingStopEngine {
        TrailingStopEngine::new(TrailingConfig {
            use_dynamic: true,
            min_samples,
            ..TrailingConfig::default()
        })
    }

    #[test]
    fn disabled_gives_zero_distance() {
        let engine = TrailingStopEngine::new(TrailingConfig {
            enabled: false,
            ..TrailingConfig::default()
        });
        let atr = Atr::new(5).unwrap();
        assert_eq!(engine.distance(&long_position(2.0), &atr), 0.0);
    }

    #[test]
    fn static_mode_uses_entry_atr() {
        let engine = static_engine();
        let mut atr = Atr::new(2).unwrap();
        atr.update(110.0, 100.0, 105.0); // live ATR = 10
        assert_eq!(engine.distance(&long_position(2.0), &atr), 2.0);
    }

    #[test]
    fn dynamic_mode_needs_min_samples() {
        let engine = dynamic_engine(2);
        let mut atr = Atr::new(4).unwrap();
        atr.update(104.0, 100.0, 102.0); // 1 sample, live ATR = 4
        assert_eq!(engine.distance(&long_position(2.0), &atr), 2.0);
        atr.update(104.0, 100.0, 102.0); // 2 samples
        assert_eq!(engine.distance(&long_position(2.0), &atr), 4.0);
    }

    #[test]
    fn long_stop_ratchets_up_only() {
        let engine = static_engine();
        let mut pos = long_position(2.0);
        let atr = Atr::new(2).unwrap();

        assert_eq!(engine.update_stop(&mut pos, 100.0, &atr), Some(98.0));
        assert_eq!(engine.update_stop(&mut pos, 105.0, &atr), Some(103.0));
        // Lower close proposes a looser stop; ratchet blocks it.
        assert_eq!(engine.update_stop(&mut pos, 101.0, &atr), Some(103.0));
    }

    #[test]
    fn short_stop_ratchets_down_only() {
        let engine = static_engine();
        let mut pos = short_position(2.0);
        let atr = Atr::new(2).unwrap();

        assert_eq!(engine.update_stop(&mut pos, 100.0, &atr), Some(102.0));
        assert_eq!(engine.update_stop(&mut pos, 95.0, &atr), Some(97.0));
        assert_eq!(engine.update_stop(&mut pos, 99.0, &atr), Some(97.0));
    }

    #[test]
    fn atr_expansion_cannot_loosen_stop() {
        let engine = dynamic_engine(1);
        let mut pos = long_position(2.0);
        let mut atr = Atr::new(1).unwrap();

        atr.update(101.0, 99.0, 100.0); // ATR = 2
        assert_eq!(engine.update_stop(&mut pos, 110.0, &atr), Some(108.0));

        atr.update(115.0, 105.0, 110.0); // ATR = 10, proposes 100
        assert_eq!(engine.update_stop(&mut pos, 110.0, &atr), Some(108.0));
    }

    #[test]
    fn long_hit_on_low() {
        let mut pos = long_position(2.0);
        pos.stop_price = Some(98.0);
        assert_eq!(TrailingStopEngine::stop_hit(&pos, 103.0, 97.5), Some(98.0));
        assert_eq!(TrailingStopEngine::stop_hit(&pos, 103.0, 98.5), None);
    }

    #[test]
    fn short_hit_on_high() {
        let mut pos = short_position(2.0);
        pos.stop_price = Some(102.0);
        assert_eq!(TrailingStopEngine::stop_hit(&pos, 102.5, 99.0), Some(102.0));
        assert_eq!(TrailingStopEngine::stop_hit(&pos, 101.5, 99.0), None);
    }

    #[test]
    fn no_stop_means_no_hit() {
        let pos = long_position(2.0);
        assert_eq!(TrailingStopEngine::stop_hit(&pos, 103.0, 90.0), None);
    }
}
