//! Per-bar order trigger rules.
//!
//! Given a pending order and the bar under execution, decide whether the
//! order is matchable and at what reference price:
//!
//! - Market: the bar's close (the driver only presents bars strictly after
//!   the order's creation, so this is next-bar execution).
//! - Limit: fills at the limit when the bar's range touches it — buy when
//!   `low <= limit`, sell when `high >= limit`.
//! - Stop: triggers on touch (buy when `high >= stop`, sell when
//!   `low <= stop`) and executes at the worse of the stop and the open:
//!   `max(stop, open)` for buy-stops, `min(stop, open)` for sell-stops.
//! - StopLimit: the stop trigger above, then the limit touch rule; fills at
//!   the limit price.
//!
//! The reference price feeds the execution engine, which layers spread,
//! slippage, impact, and commission on top.

use crate::domain::{Bar, Order, OrderSide, OrderType};

/// Reference price at which `order` is matchable on `bar`, or None.
pub fn fill_reference(order: &Order, bar: &Bar) -> Option<f64> {
    match order.order_type {
        OrderType::Market => Some(bar.close),
        OrderType::Limit => {
            let limit = order.limit_price?;
            let touched = match order.side {
                OrderSide::Buy => bar.low <= limit,
                OrderSide::Sell => bar.high >= limit,
            };
            touched.then_some(limit)
        }
        OrderType::Stop => {
            let stop = order.stop_price?;
            match order.side {
                OrderSide::Buy => (bar.high >= stop).then(|| stop.max(bar.open)),
                OrderSide::Sell => (bar.low <= stop).then(|| stop.min(bar.open)),
            }
        }
        OrderType::StopLimit => {
            let stop = order.stop_price?;
            let limit = order.limit_price?;
            let triggered = match order.side {
                OrderSide::Buy => bar.high >= stop,
                OrderSide::Sell => bar.low <= stop,
            };
            if !triggered {
                return None;
            }
            let touched = match order.side {
                OrderSide::Buy => bar.low <= limit,
                OrderSide::Sell => bar.high >= limit,
            };
            touched.then_some(limit)
        }
    }
}
