//! Trade list processor: appends trade events and aggregates win/loss
//! statistics. Wins and losses are classified strictly by round-trip P&L
//! sign, never by which side the leg traded.

use super::MetricProcessor;
use crate::domain::Bar;
use crate::metrics::TradeObservation;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct TradeListProcessor {
    trades: Vec<TradeObservation>,
    winning: usize,
    losing: usize,
    gross_wins: f64,
    gross_losses: f64,
}

impl TradeListProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trades(&self) -> &[TradeObservation] {
        &self.trades
    }
}

impl MetricProcessor for TradeListProcessor {
    fn name(&self) -> &'static str {
        "trade_list"
    }

    fn initialize(&mut self, _initial_cash: f64) {
        self.reset();
    }

    fn on_bar(&mut self, _timestamp: DateTime<Utc>, _equity: f64, _bar: &Bar) {}

    fn on_trade(&mut self, trade: &TradeObservation) {
        if trade.pnl > 0.0 {
            self.winning += 1;
            self.gross_wins += trade.pnl;
        } else if trade.pnl < 0.0 {
            self.losing += 1;
            self.gross_losses += trade.pnl.abs();
        }
        self.trades.push(trade.clone());
    }

    fn snapshot(&self) -> BTreeMap<String, f64> {
        let total = self.trades.len();
        let win_rate = if total > 0 {
            self.winning as f64 / total as f64
        } else {
            0.0
        };
        let profit_factor = if self.gross_losses > 0.0 {
            self.gross_wins / self.gross_losses
        } else if self.gross_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };
        let avg_win = if self.winning > 0 {
            self.gross_wins / self.winning as f64
        } else {
            0.0
        };
        let avg_loss = if self.losing > 0 {
            -self.gross_losses / self.losing as f64
        } else {
            0.0
        };
        let expectancy = if total > 0 {
            (self.gross_wins - self.gross_losses) / total as f64
        } else {
            0.0
        };

        let mut out = BTreeMap::new();
        out.insert("total_trades".into(), total as f64);
        out.insert("winning_trades".into(), self.winning as f64);
        out.insert("losing_trades".into(), self.losing as f64);
        out.insert("gross_wins".into(), self.gross_wins);
        out.insert("gross_losses".into(), self.gross_losses);
        out.insert("win_rate".into(), win_rate);
        out.insert("profit_factor".into(), profit_factor);
        out.insert("avg_win".into(), avg_win);
        out.insert("avg_loss".into(), avg_loss);
        out.insert("expectancy".into(), expectancy);
        out
    }

    fn reset(&mut self) {
        self.trades.clear();
        self.winning = 0;
        self.losing = 0;
        self.gross_wins = 0.0;
        self.gross_losses = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn trade(pnl: f64) -> TradeObservation {
        TradeObservation {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap(),
            symbol: "SPY".into(),
            pnl,
            commission: 0.0,
        }
    }

    fn feed(pnls: &[f64]) -> TradeListProcessor {
        let mut proc = TradeListProcessor::new();
        proc.initialize(100_000.0);
        for &pnl in pnls {
            proc.on_trade(&trade(pnl));
        }
        proc
    }

    #[test]
    fn counts_and_rates() {
        let proc = feed(&[500.0, -200.0, 1_000.0]);
        let snap = proc.snapshot();
        assert_eq!(snap["total_trades"], 3.0);
        assert_eq!(snap["winning_trades"], 2.0);
        assert_eq!(snap["losing_trades"], 1.0);
        assert!((snap["win_rate"] - 2.0 / 3.0).abs() < 1e-12);
        // 1500 / 200 = 7.5
        assert!((snap["profit_factor"] - 7.5).abs() < 1e-12);
        assert!((snap["avg_win"] - 750.0).abs() < 1e-12);
        assert!((snap["avg_loss"] + 200.0).abs() < 1e-12);
    }

    #[test]
    fn profit_factor_infinite_without_losses() {
        let proc = feed(&[500.0, 300.0]);
        assert!(proc.snapshot()["profit_factor"].is_infinite());
    }

    #[test]
    fn zero_pnl_trades_are_neither_win_nor_loss() {
        let proc = feed(&[0.0, 100.0]);
        let snap = proc.snapshot();
        assert_eq!(snap["total_trades"], 2.0);
        assert_eq!(snap["winning_trades"], 1.0);
        assert_eq!(snap["losing_trades"], 0.0);
    }

    #[test]
    fn empty_snapshot_is_zeroed() {
        let proc = feed(&[]);
        let snap = proc.snapshot();
        assert_eq!(snap["total_trades"], 0.0);
        assert_eq!(snap["win_rate"], 0.0);
        assert_eq!(snap["profit_factor"], 0.0);
    }
}
