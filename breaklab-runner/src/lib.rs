//! # Breaklab Runner
//!
//! Batch execution layer over the core engine.
//!
//! ## Components
//!
//! - `ParameterSpace`: ordered name → values lists with a deterministic
//!   Cartesian product and without-replacement random sampling
//! - `Objective`: which metric a sweep optimizes (Sharpe by default)
//! - `SweepRunner`: parallel grid/random evaluation over a rayon pool
//! - `SweepResults`: ranked outcomes with best/worst/top-N selection
//! - `analysis`: per-parameter sensitivity tables and correlation matrices
//! - `export`: CSV writers for sweep tables and trade ledgers

pub mod analysis;
pub mod export;
pub mod fingerprint;
pub mod objective;
pub mod space;
pub mod sweep;

pub use analysis::{correlation_matrix, sensitivity, CorrelationMatrix, ParameterSensitivity};
pub use fingerprint::point_fingerprint;
pub use objective::Objective;
pub use space::{ParamPoint, ParameterSpace};
pub use sweep::{PointOutcome, SweepError, SweepResults, SweepRunner};
