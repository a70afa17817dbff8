//! Post-sweep analysis: per-parameter sensitivity and correlation.
//!
//! Only successful outcomes feed the tables; failed points carry no metrics
//! and would skew every aggregate toward negative infinity.

use crate::sweep::{PointOutcome, SweepResults};
use serde::Serialize;
use std::collections::BTreeMap;

/// Aggregate objective statistics for one value of one parameter.
#[derive(Debug, Clone, Serialize)]
pub struct SensitivityRow {
    pub value: f64,
    pub mean: f64,
    pub std: f64,
    pub count: usize,
}

/// Sensitivity of the objective to one parameter: grouped statistics plus
/// the spread of group means ("range").
#[derive(Debug, Clone, Serialize)]
pub struct ParameterSensitivity {
    pub parameter: String,
    pub rows: Vec<SensitivityRow>,
    /// max(group mean) - min(group mean); 0 with a single group.
    pub range: f64,
}

/// Pearson correlation over numeric columns (parameters + the objective).
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major, `columns.len()` square.
    pub values: Vec<Vec<f64>>,
}

/// Group successful outcomes by each parameter's value and aggregate the
/// objective per group.
pub fn sensitivity(results: &SweepResults) -> Vec<ParameterSensitivity> {
    let successes: Vec<&PointOutcome> = results.successes().collect();
    if successes.is_empty() {
        return Vec::new();
    }

    let mut parameters: Vec<String> = Vec::new();
    for outcome in &successes {
        for name in outcome.parameters.keys() {
            if !parameters.iter().any(|p| p == name) {
                parameters.push(name.clone());
            }
        }
    }

    parameters
        .into_iter()
        .map(|parameter| {
            // Group by bit pattern: grid values are exact, so no epsilon
            // bucketing is needed.
            let mut groups: BTreeMap<u64, Vec<f64>> = BTreeMap::new();
            for outcome in &successes {
                if let Some(&value) = outcome.parameters.get(&parameter) {
                    groups.entry(value.to_bits()).or_default().push(outcome.objective);
                }
            }

            let mut rows: Vec<SensitivityRow> = groups
                .into_iter()
                .map(|(bits, objectives)| SensitivityRow {
                    value: f64::from_bits(bits),
                    mean: mean(&objectives),
                    std: sample_std(&objectives),
                    count: objectives.len(),
                })
                .collect();
            rows.sort_by(|a, b| {
                a.value
                    .partial_cmp(&b.value)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let range = match (
                rows.iter().map(|r| r.mean).fold(f64::INFINITY, f64::min),
                rows.iter().map(|r| r.mean).fold(f64::NEG_INFINITY, f64::max),
            ) {
                (min, max) if min.is_finite() && max.is_finite() => max - min,
                _ => 0.0,
            };

            ParameterSensitivity {
                parameter,
                rows,
                range,
            }
        })
        .collect()
}

/// Pearson correlation matrix over parameter columns plus the objective.
pub fn correlation_matrix(results: &SweepResults) -> CorrelationMatrix {
    let successes: Vec<&PointOutcome> = results.successes().collect();
    if successes.is_empty() {
        return CorrelationMatrix {
            columns: Vec::new(),
            values: Vec::new(),
        };
    }

    let mut columns: Vec<String> = successes[0].parameters.keys().cloned().collect();
    columns.push("objective".into());

    let series: Vec<Vec<f64>> = columns
        .iter()
        .map(|column| {
            successes
                .iter()
                .map(|o| {
                    if column == "objective" {
                        o.objective
                    } else {
                        o.parameters.get(column).copied().unwrap_or(f64::NAN)
                    }
                })
                .collect()
        })
        .collect();

    let n = columns.len();
    let mut values = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            values[i][j] = pearson(&series[i], &series[j]);
        }
    }

    CorrelationMatrix { columns, values }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Pearson correlation; 0.0 for degenerate (constant) series.
fn pearson(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.len() < 2 {
        return 0.0;
    }
    let ma = mean(a);
    let mb = mean(b);
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        cov += (x - ma) * (y - mb);
        var_a += (x - ma).powi(2);
        var_b += (y - mb).powi(2);
    }
    let denom = (var_a * var_b).sqrt();
    if denom < 1e-15 {
        return 0.0;
    }
    cov / denom
}
