//! Risk management primitives.

pub mod trailing;

pub use trailing::TrailingStopEngine;
