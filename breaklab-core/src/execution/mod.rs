//! Realistic execution: slippage + spread + market impact + commission
//! composed into a single deterministic fill.
//!
//! Sign conventions are uniform across models: BUY raises the fill price,
//! SELL lowers it, commissions are always non-negative cash outflow. Every
//! model has an identity no-op so each cost component can be disabled
//! independently.

pub mod commission;
pub mod engine;
pub mod impact;
pub mod slippage;

pub use commission::{
    CommissionModel, CommissionTier, NoCommission, PerShareCommission, PercentageCommission,
    TieredCommission,
};
pub use engine::ExecutionEngine;
pub use impact::{LinearImpact, MarketImpactModel, NoImpact, SquareRootImpact};
pub use slippage::{
    FixedSlippage, NoSlippage, PercentageSlippage, SlippageModel, SlippageTier,
    VolumeTieredSlippage,
};
