//! Latching risk predicates that halt a run on first trip.

pub mod manager;
pub mod triggers;

pub use manager::{KillSwitchManager, KillSwitchReport};
pub use triggers::{
    DrawdownTrigger, KillSwitchTrigger, LossTrigger, TimeWindowTrigger, TriggerActivation,
    VaRTrigger, VolatilityTrigger,
};
