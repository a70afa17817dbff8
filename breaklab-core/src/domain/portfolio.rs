//! Portfolio — cash, positions, orders, trade ledger, equity curve.
//!
//! The accounting identity `equity == cash + sum(position marks)` must hold
//! at every bar. All cash mutation goes through `apply_fill`; rejected orders
//! have no side effects on cash or positions.

use super::bar::Bar;
use super::fill::Fill;
use super::ids::{IdGen, OrderId};
use super::order::{Order, OrderSide, OrderStatus};
use super::position::Position;
use super::trade::{EquityPoint, TradeLedgerEntry};
use crate::error::InvariantError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Aggregate portfolio state for one run.
#[derive(Debug, Clone)]
pub struct Portfolio {
    cash: f64,
    initial_cash: f64,
    /// Whether sells beyond the held quantity open a short.
    allow_short: bool,
    positions: HashMap<String, Position>,
    orders: Vec<Order>,
    trades: Vec<TradeLedgerEntry>,
    equity_curve: Vec<EquityPoint>,
    id_gen: IdGen,
}

/// Read-only portfolio state embedded in the results artifact.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioSnapshot {
    pub cash: f64,
    pub initial_cash: f64,
    pub positions: Vec<Position>,
}

impl Portfolio {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash,
            initial_cash,
            allow_short: true,
            positions: HashMap::new(),
            orders: Vec::new(),
            trades: Vec::new(),
            equity_curve: Vec::new(),
            id_gen: IdGen::default(),
        }
    }

    /// Disallow sells that would exceed the held quantity.
    pub fn long_only(mut self) -> Self {
        self.allow_short = false;
        self
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol).filter(|p| !p.is_flat())
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn pending_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(|o| o.is_pending())
    }

    pub fn trades(&self) -> &[TradeLedgerEntry] {
        &self.trades
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    /// Append a pending buy order. Market when `limit` is None.
    pub fn place_buy(
        &mut self,
        symbol: impl Into<String>,
        quantity: u64,
        limit: Option<f64>,
        created_at: DateTime<Utc>,
    ) -> OrderId {
        self.place_order(symbol, OrderSide::Buy, quantity, limit, created_at)
    }

    /// Append a pending sell order. Market when `limit` is None.
    pub fn place_sell(
        &mut self,
        symbol: impl Into<String>,
        quantity: u64,
        limit: Option<f64>,
        created_at: DateTime<Utc>,
    ) -> OrderId {
        self.place_order(symbol, OrderSide::Sell, quantity, limit, created_at)
    }

    fn place_order(
        &mut self,
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: u64,
        limit: Option<f64>,
        created_at: DateTime<Utc>,
    ) -> OrderId {
        let id = self.id_gen.next_order_id();
        let order = match limit {
            Some(price) => Order::limit(id, symbol, side, quantity, price, created_at),
            None => Order::market(id, symbol, side, quantity, created_at),
        };
        debug!(order = %id, ?side, quantity, "order placed");
        self.orders.push(order);
        id
    }

    /// Cancel a pending order.
    pub fn cancel_order(&mut self, id: OrderId) -> Result<(), InvariantError> {
        let order = self
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(InvariantError::UnknownOrder { order: id })?;
        if order.is_terminal() {
            return Err(InvariantError::TerminalOrder { order: id });
        }
        order.status = OrderStatus::Canceled;
        Ok(())
    }

    /// Transition a pending order to filled (or rejected) and book the fill.
    ///
    /// A buy with insufficient cash or a short-opening sell on a long-only
    /// portfolio rejects the order with no side effects.
    pub fn apply_fill(
        &mut self,
        id: OrderId,
        fill: &Fill,
        timestamp: DateTime<Utc>,
    ) -> Result<(), InvariantError> {
        let idx = self
            .orders
            .iter()
            .position(|o| o.id == id)
            .ok_or(InvariantError::UnknownOrder { order: id })?;
        if self.orders[idx].is_terminal() {
            return Err(InvariantError::TerminalOrder { order: id });
        }

        let notional = fill.notional();
        let rejected = match fill.side {
            OrderSide::Buy => self.cash < notional + fill.commission,
            OrderSide::Sell => {
                let held = self
                    .positions
                    .get(&fill.symbol)
                    .map(|p| p.quantity)
                    .unwrap_or(0);
                !self.allow_short && held < fill.quantity as i64
            }
        };
        if rejected {
            warn!(order = %id, symbol = %fill.symbol, "order rejected");
            self.orders[idx].status = OrderStatus::Rejected;
            return Ok(());
        }

        match fill.side {
            OrderSide::Buy => self.cash -= notional,
            OrderSide::Sell => self.cash += notional,
        }
        self.cash -= fill.commission;
        if self.cash < 0.0 {
            return Err(InvariantError::NegativeCash { cash: self.cash });
        }

        let realized_pnl = self
            .positions
            .entry(fill.symbol.clone())
            .or_insert_with(|| Position::new(fill.symbol.clone()))
            .apply(fill.side, fill.quantity, fill.price);

        let order = &mut self.orders[idx];
        order.status = OrderStatus::Filled;
        order.fill_price = Some(fill.price);
        order.filled_at = Some(timestamp);

        self.trades.push(TradeLedgerEntry {
            timestamp,
            symbol: fill.symbol.clone(),
            side: fill.side,
            quantity: fill.quantity,
            price: fill.price,
            notional,
            realized_pnl,
        });

        Ok(())
    }

    /// Total equity: cash plus mark-to-market of every open position.
    ///
    /// A position whose symbol is absent from `prices` is excluded from the
    /// mark with a warning (stale data).
    pub fn total_value(&self, prices: &HashMap<String, f64>) -> f64 {
        let mut total = self.cash;
        for (symbol, position) in &self.positions {
            if position.is_flat() {
                continue;
            }
            match prices.get(symbol) {
                Some(&price) => total += position.market_value(price),
                None => warn!(%symbol, "no mark price; position excluded from equity"),
            }
        }
        total
    }

    /// Append `(timestamp, total_value)` to the equity curve.
    ///
    /// Timestamps stay strictly increasing: a repeated timestamp (several
    /// symbols' bars interleaved at the same instant) updates the last point
    /// in place instead of appending.
    pub fn record_equity_point(
        &mut self,
        timestamp: DateTime<Utc>,
        prices: &HashMap<String, f64>,
    ) {
        debug_assert!(
            self.equity_curve
                .last()
                .map(|p| p.timestamp <= timestamp)
                .unwrap_or(true),
            "equity curve timestamps must not go backwards"
        );
        let equity = self.total_value(prices);
        match self.equity_curve.last_mut() {
            Some(last) if last.timestamp == timestamp => last.equity = equity,
            _ => self.equity_curve.push(EquityPoint { timestamp, equity }),
        }
    }

    /// Mark prices for a single bar: its symbol at its close.
    pub fn mark_prices_for(bar: &Bar) -> HashMap<String, f64> {
        let mut prices = HashMap::new();
        prices.insert(bar.symbol.clone(), bar.close);
        prices
    }

    pub fn snapshot(&self) -> PortfolioSnapshot {
        let mut positions: Vec<Position> = self
            .positions
            .values()
            .filter(|p| !p.is_flat())
            .cloned()
            .collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        PortfolioSnapshot {
            cash: self.cash,
            initial_cash: self.initial_cash,
            positions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 21, 0, 0).unwrap()
    }

    fn fill(side: OrderSide, quantity: u64, price: f64) -> Fill {
        Fill {
            symbol: "SPY".into(),
            side,
            quantity,
            price,
            commission: 0.0,
        }
    }

    #[test]
    fn buy_moves_cash_into_position() {
        let mut portfolio = Portfolio::new(100_000.0);
        let id = portfolio.place_buy("SPY", 100, None, ts(1));
        portfolio
            .apply_fill(id, &fill(OrderSide::Buy, 100, 100.0), ts(2))
            .unwrap();

        assert_eq!(portfolio.cash(), 90_000.0);
        let pos = portfolio.position("SPY").unwrap();
        assert_eq!(pos.quantity, 100);
        assert_eq!(pos.avg_entry_price, 100.0);
        assert_eq!(portfolio.order(id).unwrap().status, OrderStatus::Filled);
        assert_eq!(portfolio.trades().len(), 1);
        assert_eq!(portfolio.trades()[0].realized_pnl, 0.0);
    }

    #[test]
    fn round_trip_restores_cash_plus_pnl() {
        let mut portfolio = Portfolio::new(100_000.0);
        let buy = portfolio.place_buy("SPY", 100, None, ts(1));
        portfolio
            .apply_fill(buy, &fill(OrderSide::Buy, 100, 100.0), ts(2))
            .unwrap();
        let sell = portfolio.place_sell("SPY", 100, None, ts(2));
        portfolio
            .apply_fill(sell, &fill(OrderSide::Sell, 100, 105.0), ts(3))
            .unwrap();

        assert_eq!(portfolio.cash(), 100_500.0);
        assert!(portfolio.position("SPY").is_none());
        assert_eq!(portfolio.trades()[1].realized_pnl, 500.0);
    }

    #[test]
    fn insufficient_cash_rejects_without_side_effects() {
        let mut portfolio = Portfolio::new(1_000.0);
        let id = portfolio.place_buy("SPY", 100, None, ts(1));
        portfolio
            .apply_fill(id, &fill(OrderSide::Buy, 100, 100.0), ts(2))
            .unwrap();

        assert_eq!(portfolio.order(id).unwrap().status, OrderStatus::Rejected);
        assert_eq!(portfolio.cash(), 1_000.0);
        assert!(portfolio.position("SPY").is_none());
        assert!(portfolio.trades().is_empty());
    }

    #[test]
    fn long_only_rejects_short_opening_sell() {
        let mut portfolio = Portfolio::new(100_000.0).long_only();
        let id = portfolio.place_sell("SPY", 100, None, ts(1));
        portfolio
            .apply_fill(id, &fill(OrderSide::Sell, 100, 100.0), ts(2))
            .unwrap();

        assert_eq!(portfolio.order(id).unwrap().status, OrderStatus::Rejected);
        assert_eq!(portfolio.cash(), 100_000.0);
    }

    #[test]
    fn short_allowed_by_default() {
        let mut portfolio = Portfolio::new(100_000.0);
        let id = portfolio.place_sell("SPY", 100, None, ts(1));
        portfolio
            .apply_fill(id, &fill(OrderSide::Sell, 100, 100.0), ts(2))
            .unwrap();

        assert_eq!(portfolio.cash(), 110_000.0);
        assert_eq!(portfolio.position("SPY").unwrap().quantity, -100);
    }

    #[test]
    fn terminal_order_cannot_transition() {
        let mut portfolio = Portfolio::new(100_000.0);
        let id = portfolio.place_buy("SPY", 10, None, ts(1));
        portfolio
            .apply_fill(id, &fill(OrderSide::Buy, 10, 100.0), ts(2))
            .unwrap();

        let err = portfolio
            .apply_fill(id, &fill(OrderSide::Buy, 10, 100.0), ts(3))
            .unwrap_err();
        assert_eq!(err, InvariantError::TerminalOrder { order: id });
    }

    #[test]
    fn commission_reduces_cash() {
        let mut portfolio = Portfolio::new(100_000.0);
        let id = portfolio.place_buy("SPY", 100, None, ts(1));
        let mut f = fill(OrderSide::Buy, 100, 100.0);
        f.commission = 5.0;
        portfolio.apply_fill(id, &f, ts(2)).unwrap();
        assert_eq!(portfolio.cash(), 89_995.0);
    }

    #[test]
    fn total_value_marks_positions() {
        let mut portfolio = Portfolio::new(100_000.0);
        let id = portfolio.place_buy("SPY", 100, None, ts(1));
        portfolio
            .apply_fill(id, &fill(OrderSide::Buy, 100, 100.0), ts(2))
            .unwrap();

        let mut prices = HashMap::new();
        prices.insert("SPY".to_string(), 110.0);
        assert_eq!(portfolio.total_value(&prices), 101_000.0);
    }

    #[test]
    fn missing_price_excludes_position() {
        let mut portfolio = Portfolio::new(100_000.0);
        let id = portfolio.place_buy("SPY", 100, None, ts(1));
        portfolio
            .apply_fill(id, &fill(OrderSide::Buy, 100, 100.0), ts(2))
            .unwrap();

        let prices = HashMap::new();
        assert_eq!(portfolio.total_value(&prices), 90_000.0);
    }

    #[test]
    fn equity_curve_appends() {
        let mut portfolio = Portfolio::new(100_000.0);
        let prices = HashMap::new();
        portfolio.record_equity_point(ts(1), &prices);
        portfolio.record_equity_point(ts(2), &prices);
        assert_eq!(portfolio.equity_curve().len(), 2);
        assert_eq!(portfolio.equity_curve()[1].equity, 100_000.0);
    }

    #[test]
    fn pending_orders_filters_terminal() {
        let mut portfolio = Portfolio::new(100_000.0);
        let a = portfolio.place_buy("SPY", 10, None, ts(1));
        let _b = portfolio.place_buy("SPY", 10, None, ts(1));
        portfolio.cancel_order(a).unwrap();
        assert_eq!(portfolio.pending_orders().count(), 1);
    }
}
