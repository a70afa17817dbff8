//! Derived summary metrics layered over the pipeline snapshot.
//!
//! Calmar = annualized_return / |max_drawdown|, with the annualization
//! assuming 252 daily bars per year.

use super::pipeline::MetricsSnapshot;

const BARS_PER_YEAR: f64 = 252.0;

/// Extend a pipeline snapshot with `annualized_return` and `calmar`.
///
/// `bars_processed` is the number of bars behind the equity curve; fewer
/// than two bars yields zero for both derived values.
pub fn derive_summary(mut snapshot: MetricsSnapshot, bars_processed: usize) -> MetricsSnapshot {
    let total_return = snapshot.get("total_return").copied().unwrap_or(0.0);
    let max_drawdown = snapshot.get("max_drawdown").copied().unwrap_or(0.0);

    let annualized = if bars_processed >= 2 && total_return > -1.0 {
        let years = bars_processed as f64 / BARS_PER_YEAR;
        (1.0 + total_return).powf(1.0 / years) - 1.0
    } else {
        0.0
    };

    let calmar = if max_drawdown < 0.0 {
        annualized / max_drawdown.abs()
    } else {
        0.0
    };

    snapshot.insert("annualized_return".into(), annualized);
    snapshot.insert("calmar".into(), calmar);
    snapshot
}
