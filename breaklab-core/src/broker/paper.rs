//! In-memory paper broker.
//!
//! Fills market orders immediately at the posted quote (ask for buys, bid
//! for sells); limit orders fill only when the quote already satisfies the
//! limit, otherwise they rest as pending. All operations require a prior
//! `connect`.

use super::{AccountInfo, Broker, BrokerError, BrokerPosition, Quote};
use crate::domain::{Bar, Order, OrderId, OrderSide, OrderStatus, OrderType, Position};
use std::collections::HashMap;
use tracing::debug;

pub struct PaperBroker {
    connected: bool,
    account_id: String,
    cash: f64,
    positions: HashMap<String, Position>,
    orders: Vec<Order>,
    quotes: HashMap<String, Quote>,
    history: HashMap<String, Vec<Bar>>,
}

impl PaperBroker {
    pub fn new(account_id: impl Into<String>, starting_cash: f64) -> Self {
        Self {
            connected: false,
            account_id: account_id.into(),
            cash: starting_cash,
            positions: HashMap::new(),
            orders: Vec::new(),
            quotes: HashMap::new(),
            history: HashMap::new(),
        }
    }

    /// Post a quote, making the symbol tradable.
    pub fn set_quote(&mut self, quote: Quote) {
        self.quotes.insert(quote.symbol.clone(), quote);
    }

    /// Seed historical bars served by `get_historical_data`.
    pub fn set_history(&mut self, symbol: impl Into<String>, bars: Vec<Bar>) {
        self.history.insert(symbol.into(), bars);
    }

    fn require_connected(&self) -> Result<(), BrokerError> {
        if self.connected {
            Ok(())
        } else {
            Err(BrokerError::NotConnected)
        }
    }

    fn try_fill(&mut self, mut order: Order) -> Order {
        let quote = match self.quotes.get(&order.symbol) {
            Some(q) => q.clone(),
            None => return order,
        };

        let market_price = match order.side {
            OrderSide::Buy => quote.ask,
            OrderSide::Sell => quote.bid,
        };

        let price = match order.order_type {
            OrderType::Market => Some(market_price),
            OrderType::Limit => order.limit_price.filter(|&limit| match order.side {
                OrderSide::Buy => market_price <= limit,
                OrderSide::Sell => market_price >= limit,
            }),
            // Stop flavors rest until a later quote update; the paper broker
            // keeps them pending.
            OrderType::Stop | OrderType::StopLimit => None,
        };

        if let Some(price) = price {
            let notional = order.quantity as f64 * price;
            if order.side == OrderSide::Buy && self.cash < notional {
                order.status = OrderStatus::Rejected;
                return order;
            }
            match order.side {
                OrderSide::Buy => self.cash -= notional,
                OrderSide::Sell => self.cash += notional,
            }
            self.positions
                .entry(order.symbol.clone())
                .or_insert_with(|| Position::new(order.symbol.clone()))
                .apply(order.side, order.quantity, price);
            order.status = OrderStatus::Filled;
            order.fill_price = Some(price);
            order.filled_at = Some(quote.timestamp);
            debug!(order = %order.id, price, "paper fill");
        }
        order
    }

    fn equity(&self) -> f64 {
        let marks: f64 = self
            .positions
            .values()
            .filter(|p| !p.is_flat())
            .map(|p| {
                let price = self
                    .quotes
                    .get(&p.symbol)
                    .map(|q| q.last)
                    .unwrap_or(p.avg_entry_price);
                p.market_value(price)
            })
            .sum();
        self.cash + marks
    }
}

impl Broker for PaperBroker {
    fn connect(&mut self) -> Result<(), BrokerError> {
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), BrokerError> {
        self.connected = false;
        Ok(())
    }

    fn get_account_info(&self) -> Result<AccountInfo, BrokerError> {
        self.require_connected()?;
        Ok(AccountInfo {
            account_id: self.account_id.clone(),
            cash: self.cash,
            equity: self.equity(),
            buying_power: self.cash,
        })
    }

    fn get_positions(&self) -> Result<Vec<BrokerPosition>, BrokerError> {
        self.require_connected()?;
        Ok(self
            .positions
            .values()
            .filter(|p| !p.is_flat())
            .map(|p| BrokerPosition {
                symbol: p.symbol.clone(),
                quantity: p.quantity,
                avg_price: p.avg_entry_price,
            })
            .collect())
    }

    fn place_order(&mut self, order: Order) -> Result<OrderId, BrokerError> {
        self.require_connected()?;
        if !self.quotes.contains_key(&order.symbol) {
            return Err(BrokerError::UnknownSymbol(order.symbol));
        }
        let id = order.id;
        let settled = self.try_fill(order);
        self.orders.push(settled);
        Ok(id)
    }

    fn cancel_order(&mut self, id: OrderId) -> Result<(), BrokerError> {
        self.require_connected()?;
        let order = self
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(BrokerError::UnknownOrder(id))?;
        if order.is_terminal() {
            return Err(BrokerError::Rejected(format!(
                "order {id} is already terminal"
            )));
        }
        order.status = OrderStatus::Canceled;
        Ok(())
    }

    fn get_order_status(&self, id: OrderId) -> Result<OrderStatus, BrokerError> {
        self.require_connected()?;
        self.orders
            .iter()
            .find(|o| o.id == id)
            .map(|o| o.status)
            .ok_or(BrokerError::UnknownOrder(id))
    }

    fn get_orders(&self) -> Result<Vec<Order>, BrokerError> {
        self.require_connected()?;
        Ok(self.orders.clone())
    }

    fn get_quote(&self, symbol: &str) -> Result<Quote, BrokerError> {
        self.require_connected()?;
        self.quotes
            .get(symbol)
            .cloned()
            .ok_or_else(|| BrokerError::UnknownSymbol(symbol.into()))
    }

    fn get_historical_data(&self, symbol: &str, lookback: usize) -> Result<Vec<Bar>, BrokerError> {
        self.require_connected()?;
        let bars = self
            .history
            .get(symbol)
            .ok_or_else(|| BrokerError::UnknownSymbol(symbol.into()))?;
        let start = bars.len().saturating_sub(lookback);
        Ok(bars[start..].to_vec())
    }
}
