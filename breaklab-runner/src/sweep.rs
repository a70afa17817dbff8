//! Grid and random search over a parameter space.
//!
//! Each point is evaluated by a caller-supplied function that builds a fresh
//! engine + strategy and runs one backtest — the evaluator is `Sync` and the
//! engine share-nothing, so points fan out over a rayon pool with no shared
//! mutable state. A failing point is captured as an unsuccessful row scoring
//! negative infinity; it never aborts the sweep.

use crate::fingerprint::point_fingerprint;
use crate::objective::Objective;
use crate::space::{ParamPoint, ParameterSpace};
use breaklab_core::error::{ConfigError, EngineError};
use breaklab_core::metrics::MetricsSnapshot;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("worker pool: {0}")]
    Pool(String),
}

/// Captured result of one parameter point.
#[derive(Debug, Clone, Serialize)]
pub struct PointOutcome {
    pub fingerprint: String,
    pub parameters: ParamPoint,
    pub metrics: MetricsSnapshot,
    pub objective: f64,
    pub success: bool,
    pub error: Option<String>,
}

/// Sweep driver. `evaluate` maps a parameter point to the metrics snapshot
/// of a completed backtest.
pub struct SweepRunner<F>
where
    F: Fn(&ParamPoint) -> Result<MetricsSnapshot, EngineError> + Sync,
{
    evaluate: F,
    objective: Objective,
    workers: Option<usize>,
}

impl<F> SweepRunner<F>
where
    F: Fn(&ParamPoint) -> Result<MetricsSnapshot, EngineError> + Sync,
{
    pub fn new(objective: Objective, evaluate: F) -> Self {
        Self {
            evaluate,
            objective,
            workers: None,
        }
    }

    /// Cap the rayon pool at `workers` threads (default: rayon's global pool).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Evaluate the full Cartesian product.
    pub fn run_grid(&self, space: &ParameterSpace) -> Result<SweepResults, SweepError> {
        let points = space.combinations();
        info!(points = points.len(), "grid sweep starting");
        self.run_points(points)
    }

    /// Evaluate a without-replacement random sample of `n_iterations`
    /// points; the full product when the sample would cover it anyway.
    pub fn run_random(
        &self,
        space: &ParameterSpace,
        n_iterations: usize,
        seed: u64,
    ) -> Result<SweepResults, SweepError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let points = space.sample_points(n_iterations, &mut rng);
        info!(
            points = points.len(),
            total = space.size(),
            "random sweep starting"
        );
        self.run_points(points)
    }

    fn run_points(&self, points: Vec<ParamPoint>) -> Result<SweepResults, SweepError> {
        let evaluate_all = || {
            points
                .par_iter()
                .map(|point| self.evaluate_point(point))
                .collect::<Vec<_>>()
        };

        let outcomes = match self.workers {
            Some(workers) => rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| SweepError::Pool(e.to_string()))?
                .install(evaluate_all),
            None => evaluate_all(),
        };

        let failures = outcomes.iter().filter(|o| !o.success).count();
        if failures > 0 {
            warn!(failures, total = outcomes.len(), "sweep had failing points");
        }

        Ok(SweepResults {
            objective: self.objective,
            outcomes,
        })
    }

    fn evaluate_point(&self, point: &ParamPoint) -> PointOutcome {
        let fingerprint = point_fingerprint(point);
        match (self.evaluate)(point) {
            Ok(metrics) => {
                let objective = self.objective.extract(&metrics);
                PointOutcome {
                    fingerprint,
                    parameters: point.clone(),
                    metrics,
                    objective,
                    success: true,
                    error: None,
                }
            }
            Err(err) => PointOutcome {
                fingerprint,
                parameters: point.clone(),
                metrics: MetricsSnapshot::new(),
                objective: f64::NEG_INFINITY,
                success: false,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Outcomes of a sweep, sortable by objective.
#[derive(Debug, Clone, Serialize)]
pub struct SweepResults {
    objective: Objective,
    outcomes: Vec<PointOutcome>,
}

impl SweepResults {
    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// All outcomes in completion order.
    pub fn all(&self) -> &[PointOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn successes(&self) -> impl Iterator<Item = &PointOutcome> {
        self.outcomes.iter().filter(|o| o.success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &PointOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }

    /// Successful outcomes, best objective first.
    pub fn ranked(&self) -> Vec<&PointOutcome> {
        let mut sorted: Vec<&PointOutcome> = self.successes().collect();
        sorted.sort_by(|a, b| {
            b.objective
                .partial_cmp(&a.objective)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted
    }

    pub fn best(&self) -> Option<&PointOutcome> {
        self.ranked().into_iter().next()
    }

    pub fn worst(&self) -> Option<&PointOutcome> {
        self.ranked().into_iter().last()
    }

    pub fn top_n(&self, n: usize) -> Vec<&PointOutcome> {
        self.ranked().into_iter().take(n).collect()
    }
}
