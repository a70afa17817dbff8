//! The results artifact of one backtest run.

use crate::domain::portfolio::PortfolioSnapshot;
use crate::domain::{EquityPoint, TradeLedgerEntry};
use crate::killswitch::KillSwitchReport;
use crate::metrics::MetricsSnapshot;
use serde::Serialize;

/// Everything a caller needs from a completed run: the final portfolio
/// snapshot, the full equity curve, the trade ledger, the metrics snapshot,
/// and the kill-switch activation report. Field names in the metrics map are
/// stable lowercase_snake.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub portfolio: PortfolioSnapshot,
    pub equity_curve: Vec<EquityPoint>,
    pub trade_ledger: Vec<TradeLedgerEntry>,
    pub metrics: MetricsSnapshot,
    pub kill_switch: KillSwitchReport,
    pub bars_processed: usize,
    /// True when a kill switch ended the run before the data did.
    pub halted: bool,
}

impl BacktestReport {
    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.portfolio.initial_cash)
    }
}
