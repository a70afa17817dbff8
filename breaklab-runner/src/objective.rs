//! Objective functions: which snapshot metric a sweep maximizes.

use breaklab_core::error::ConfigError;
use breaklab_core::metrics::MetricsSnapshot;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    #[default]
    Sharpe,
    Sortino,
    TotalReturn,
    Calmar,
    ProfitFactor,
}

impl Objective {
    /// The snapshot key this objective reads.
    pub fn key(&self) -> &'static str {
        match self {
            Objective::Sharpe => "sharpe",
            Objective::Sortino => "sortino",
            Objective::TotalReturn => "total_return",
            Objective::Calmar => "calmar",
            Objective::ProfitFactor => "profit_factor",
        }
    }

    /// Extract the objective value; a missing key scores negative infinity
    /// so the point ranks last rather than poisoning the sort.
    pub fn extract(&self, metrics: &MetricsSnapshot) -> f64 {
        metrics
            .get(self.key())
            .copied()
            .filter(|v| !v.is_nan())
            .unwrap_or(f64::NEG_INFINITY)
    }
}

impl FromStr for Objective {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sharpe" => Ok(Objective::Sharpe),
            "sortino" => Ok(Objective::Sortino),
            "total_return" => Ok(Objective::TotalReturn),
            "calmar" => Ok(Objective::Calmar),
            "profit_factor" => Ok(Objective::ProfitFactor),
            other => Err(ConfigError::UnknownVariant {
                field: "objective",
                value: other.into(),
            }),
        }
    }
}
