//! Stable fingerprints for sweep points.
//!
//! A point's fingerprint is the BLAKE3 hash of its canonical `name=value`
//! form (BTreeMap order is already canonical), truncated to 16 hex chars —
//! enough to key result rows and cache entries without collisions at sweep
//! scale.

use crate::space::ParamPoint;
use std::fmt::Write as _;

pub fn point_fingerprint(point: &ParamPoint) -> String {
    let mut canonical = String::new();
    for (name, value) in point {
        // Bit-exact encoding so 0.1 + 0.2 style drift can't alias points.
        let _ = write!(canonical, "{name}={:016x};", value.to_bits());
    }
    let hash = blake3::hash(canonical.as_bytes());
    hash.to_hex()[..16].to_string()
}
