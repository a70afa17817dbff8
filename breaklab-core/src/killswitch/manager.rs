//! Kill-switch manager: evaluates every unactivated trigger per bar,
//! latches on first trip, and fires activation callbacks once per trigger.
//!
//! A trigger whose `check` fails is isolated: the error is logged at warn
//! and treated as non-tripping. One broken trigger never fails a run.

use super::triggers::{KillSwitchTrigger, TriggerActivation};
use crate::domain::Portfolio;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

type ActivationCallback = Box<dyn FnMut(&TriggerActivation) + Send>;

/// Activation report embedded in the results artifact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KillSwitchReport {
    pub active: bool,
    pub activations: Vec<TriggerActivation>,
}

#[derive(Default)]
pub struct KillSwitchManager {
    triggers: Vec<Box<dyn KillSwitchTrigger>>,
    callbacks: Vec<ActivationCallback>,
    active: bool,
}

impl KillSwitchManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_trigger(&mut self, trigger: Box<dyn KillSwitchTrigger>) {
        self.triggers.push(trigger);
    }

    /// Register a callback fired once per trigger activation.
    pub fn on_activation(&mut self, callback: ActivationCallback) {
        self.callbacks.push(callback);
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn trigger_count(&self) -> usize {
        self.triggers.len()
    }

    /// Evaluate all triggers against the current state.
    ///
    /// Once active, stays active without re-evaluation. Otherwise every
    /// unactivated trigger is checked, so multiple triggers tripping on the
    /// same bar are all collected.
    pub fn check_all(
        &mut self,
        portfolio: &Portfolio,
        prices: &HashMap<String, f64>,
        timestamp: DateTime<Utc>,
    ) -> bool {
        if self.active {
            return true;
        }

        for trigger in &mut self.triggers {
            let was_activated = trigger.is_activated();
            let tripped = match trigger.check(portfolio, prices, timestamp) {
                Ok(tripped) => tripped,
                Err(err) => {
                    warn!(error = %err, "kill-switch trigger failed; treated as non-tripping");
                    false
                }
            };

            if tripped && !was_activated {
                if let Some(activation) = trigger.activation() {
                    info!(
                        trigger = activation.name.as_str(),
                        reason = activation.reason.as_str(),
                        "kill switch activated"
                    );
                    let activation = activation.clone();
                    for callback in &mut self.callbacks {
                        callback(&activation);
                    }
                }
            }
        }

        self.active = self.triggers.iter().any(|t| t.is_activated());
        self.active
    }

    /// All activation records, in trigger insertion order.
    pub fn report(&self) -> KillSwitchReport {
        KillSwitchReport {
            active: self.active,
            activations: self
                .triggers
                .iter()
                .filter_map(|t| t.activation().cloned())
                .collect(),
        }
    }

    pub fn reset_all(&mut self) {
        for trigger in &mut self.triggers {
            trigger.reset();
        }
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TriggerError;
    use crate::killswitch::triggers::{DrawdownTrigger, LossTrigger};
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 21, 0, 0).unwrap()
    }

    /// Trigger whose check always errors; must never trip a run.
    struct BrokenTrigger;

    impl KillSwitchTrigger for BrokenTrigger {
        fn name(&self) -> &'static str {
            "broken"
        }
        fn activation(&self) -> Option<&TriggerActivation> {
            None
        }
        fn check(
            &mut self,
            _portfolio: &Portfolio,
            _prices: &HashMap<String, f64>,
            _timestamp: DateTime<Utc>,
        ) -> Result<bool, TriggerError> {
            Err(TriggerError {
                name: "broken".into(),
                message: "synthetic failure".into(),
            })
        }
        fn reset(&mut self) {}
    }

    #[test]
    fn inactive_with_no_triggers() {
        let mut manager = KillSwitchManager::new();
        let portfolio = Portfolio::new(100_000.0);
        assert!(!manager.check_all(&portfolio, &HashMap::new(), ts(1)));
        assert!(!manager.report().active);
    }

    #[test]
    fn drawdown_activation_halts_and_reports() {
        let mut manager = KillSwitchManager::new();
        manager.add_trigger(Box::new(DrawdownTrigger::new(0.05)));

        let prices = HashMap::new();
        assert!(!manager.check_all(&Portfolio::new(100_000.0), &prices, ts(1)));
        assert!(manager.check_all(&Portfolio::new(94_000.0), &prices, ts(2)));

        let report = manager.report();
        assert!(report.active);
        assert_eq!(report.activations.len(), 1);
        assert_eq!(report.activations[0].name, "drawdown");
    }

    #[test]
    fn active_manager_short_circuits() {
        let mut manager = KillSwitchManager::new();
        manager.add_trigger(Box::new(DrawdownTrigger::new(0.05)));
        let prices = HashMap::new();
        manager.check_all(&Portfolio::new(100_000.0), &prices, ts(1));
        manager.check_all(&Portfolio::new(90_000.0), &prices, ts(2));
        assert!(manager.is_active());
        // Recovery cannot clear an active kill switch.
        assert!(manager.check_all(&Portfolio::new(150_000.0), &prices, ts(3)));
    }

    #[test]
    fn callbacks_fire_once_per_trigger() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();

        let mut manager = KillSwitchManager::new();
        manager.add_trigger(Box::new(DrawdownTrigger::new(0.05)));
        manager.on_activation(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let prices = HashMap::new();
        manager.check_all(&Portfolio::new(100_000.0), &prices, ts(1));
        manager.check_all(&Portfolio::new(90_000.0), &prices, ts(2));
        manager.check_all(&Portfolio::new(80_000.0), &prices, ts(3));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn broken_trigger_is_isolated() {
        let mut manager = KillSwitchManager::new();
        manager.add_trigger(Box::new(BrokenTrigger));
        let prices = HashMap::new();
        assert!(!manager.check_all(&Portfolio::new(100_000.0), &prices, ts(1)));
    }

    #[test]
    fn multiple_triggers_collected_same_bar() {
        let mut manager = KillSwitchManager::new();
        manager.add_trigger(Box::new(DrawdownTrigger::new(0.05)));
        manager.add_trigger(Box::new(LossTrigger::new(5_000.0)));

        let prices = HashMap::new();
        manager.check_all(&Portfolio::new(100_000.0), &prices, ts(1));
        // Both conditions violated on the same bar.
        // LossTrigger measures against its own portfolio's initial cash, so
        // feed a portfolio that lost cash through a commission.
        let mut burned = Portfolio::new(100_000.0);
        let id = burned.place_buy("SPY", 1, None, ts(1));
        burned
            .apply_fill(
                id,
                &crate::domain::Fill {
                    symbol: "SPY".into(),
                    side: crate::domain::OrderSide::Buy,
                    quantity: 1,
                    price: 0.0,
                    commission: 10_000.0,
                },
                ts(2),
            )
            .unwrap();
        assert!(manager.check_all(&burned, &prices, ts(2)));
        assert_eq!(manager.report().activations.len(), 2);
    }

    #[test]
    fn reset_clears_latches() {
        let mut manager = KillSwitchManager::new();
        manager.add_trigger(Box::new(DrawdownTrigger::new(0.05)));
        let prices = HashMap::new();
        manager.check_all(&Portfolio::new(100_000.0), &prices, ts(1));
        manager.check_all(&Portfolio::new(90_000.0), &prices, ts(2));
        assert!(manager.is_active());

        manager.reset_all();
        assert!(!manager.is_active());
        assert!(manager.report().activations.is_empty());
    }
}
