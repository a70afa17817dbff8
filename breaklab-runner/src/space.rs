//! Parameter space: ordered `name -> values` lists.
//!
//! Enumeration order is deterministic and follows parameter insertion order,
//! with the last-added parameter varying fastest. Random search samples
//! without replacement and degrades to the full grid when asked for at least
//! as many points as exist.

use breaklab_core::error::ConfigError;
use rand::seq::index::sample;
use rand::Rng;
use std::collections::BTreeMap;

/// One point of the product space, as a flat name → value map.
pub type ParamPoint = BTreeMap<String, f64>;

#[derive(Debug, Clone, Default)]
pub struct ParameterSpace {
    params: Vec<(String, Vec<f64>)>,
}

impl ParameterSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter with its candidate values. Rejects empty value lists
    /// and duplicate names.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<&mut Self, ConfigError> {
        let name = name.into();
        if values.is_empty() {
            return Err(ConfigError::EmptyParameter(name));
        }
        if self.params.iter().any(|(n, _)| *n == name) {
            return Err(ConfigError::DuplicateParameter(name));
        }
        self.params.push((name, values));
        Ok(self)
    }

    pub fn names(&self) -> Vec<&str> {
        self.params.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Total number of combinations (1 for an empty space).
    pub fn size(&self) -> usize {
        self.params.iter().map(|(_, v)| v.len()).product()
    }

    /// The full Cartesian product in deterministic order.
    pub fn combinations(&self) -> Vec<ParamPoint> {
        let mut out = vec![ParamPoint::new()];
        for (name, values) in &self.params {
            let mut next = Vec::with_capacity(out.len() * values.len());
            for partial in &out {
                for &value in values {
                    let mut point = partial.clone();
                    point.insert(name.clone(), value);
                    next.push(point);
                }
            }
            out = next;
        }
        out
    }

    /// Sample `n` points without replacement; the full product when
    /// `n >= size()`.
    pub fn sample_points<R: Rng>(&self, n: usize, rng: &mut R) -> Vec<ParamPoint> {
        let all = self.combinations();
        if n >= all.len() {
            return all;
        }
        let mut picked: Vec<usize> = sample(rng, all.len(), n).into_vec();
        picked.sort_unstable();
        picked.into_iter().map(|i| all[i].clone()).collect()
    }
}
