//! Streaming indicators fed bar-by-bar inside the engine loop.
//!
//! Both structures are bounded rings: memory stays O(window) regardless of
//! run length.

pub mod atr;
pub mod price_buffer;

pub use atr::Atr;
pub use price_buffer::PriceBuffer;

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
