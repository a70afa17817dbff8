//! Per-bar and per-exit result types produced by strategies.

use serde::{Deserialize, Serialize};

/// Why a position was exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    ProfitTarget,
    Manual,
}

/// Result of closing a position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitResult {
    /// Realized P&L of this trade, before commission.
    pub pnl: f64,
    /// P&L in units of the initial risk; 0.0 when the risk denominator is
    /// degenerate.
    pub r_multiple: f64,
    /// Cumulative realized P&L including this exit, net of commissions.
    pub total_pnl: f64,
    pub commission: f64,
    pub reason: ExitReason,
}

/// Result of feeding one bar through a strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarProcessResult {
    pub atr: f64,
    pub stop_hit: bool,
    pub exit_result: Option<ExitResult>,
    pub stop_price: Option<f64>,
}

impl BarProcessResult {
    /// A bar with no position activity.
    pub fn quiet(atr: f64) -> Self {
        Self {
            atr,
            stop_hit: false,
            exit_result: None,
            stop_price: None,
        }
    }
}
