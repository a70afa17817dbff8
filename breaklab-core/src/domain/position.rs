//! Position — a signed holding in a single symbol.
//!
//! Quantity is positive for longs, negative for shorts. The cost-basis
//! invariant `cost_basis == |quantity| * avg_entry_price` holds after every
//! application; closes zero the position, and opposite-side trades larger
//! than the remaining size reverse direction with a new basis at the
//! crossing price.

use super::order::OrderSide;
use serde::{Deserialize, Serialize};

/// An open (or flat) position in one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    /// Signed quantity: positive = long, negative = short.
    pub quantity: i64,
    pub avg_entry_price: f64,
    pub cost_basis: f64,
}

impl Position {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            quantity: 0,
            avg_entry_price: 0.0,
            cost_basis: 0.0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.quantity == 0
    }

    pub fn is_long(&self) -> bool {
        self.quantity > 0
    }

    pub fn is_short(&self) -> bool {
        self.quantity < 0
    }

    /// Signed market value at the given price.
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }

    /// Unrealized P&L at the given mark.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.quantity as f64 * (price - self.avg_entry_price)
    }

    /// Apply a fill to the position and return the realized P&L of the
    /// closing portion (0.0 for pure scale-ins).
    ///
    /// Realized P&L is `closed_qty * (exit - entry)` for longs and the
    /// reverse for shorts.
    pub fn apply(&mut self, side: OrderSide, quantity: u64, price: f64) -> f64 {
        let qty = quantity as i64;
        let signed = match side {
            OrderSide::Buy => qty,
            OrderSide::Sell => -qty,
        };

        // Same direction (or flat): weighted-average scale-in.
        if self.quantity == 0 || self.quantity.signum() == signed.signum() {
            let old_abs = self.quantity.unsigned_abs() as f64;
            let add_abs = qty as f64;
            let total = old_abs + add_abs;
            self.avg_entry_price = (old_abs * self.avg_entry_price + add_abs * price) / total;
            self.quantity += signed;
            self.cost_basis = self.quantity.unsigned_abs() as f64 * self.avg_entry_price;
            return 0.0;
        }

        // Opposite direction: close up to the remaining size.
        let closing = qty.min(self.quantity.abs());
        let realized = if self.quantity > 0 {
            closing as f64 * (price - self.avg_entry_price)
        } else {
            closing as f64 * (self.avg_entry_price - price)
        };

        let remaining = qty - closing;
        if remaining > 0 {
            // Reversal: new basis at the crossing price.
            self.quantity = remaining * signed.signum();
            self.avg_entry_price = price;
        } else {
            // Partial or full close: average unchanged, size reduced.
            self.quantity += signed;
            if self.quantity == 0 {
                self.avg_entry_price = 0.0;
            }
        }
        self.cost_basis = self.quantity.unsigned_abs() as f64 * self.avg_entry_price;

        realized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_long_sets_basis() {
        let mut pos = Position::new("SPY");
        let realized = pos.apply(OrderSide::Buy, 100, 50.0);
        assert_eq!(realized, 0.0);
        assert_eq!(pos.quantity, 100);
        assert_eq!(pos.avg_entry_price, 50.0);
        assert_eq!(pos.cost_basis, 5_000.0);
    }

    #[test]
    fn scale_in_weights_average() {
        let mut pos = Position::new("SPY");
        pos.apply(OrderSide::Buy, 100, 50.0);
        pos.apply(OrderSide::Buy, 100, 60.0);
        assert_eq!(pos.quantity, 200);
        assert_eq!(pos.avg_entry_price, 55.0);
        assert_eq!(pos.cost_basis, 11_000.0);
    }

    #[test]
    fn partial_close_keeps_average() {
        let mut pos = Position::new("SPY");
        pos.apply(OrderSide::Buy, 100, 50.0);
        let realized = pos.apply(OrderSide::Sell, 40, 55.0);
        // 40 * (55 - 50) = 200
        assert_eq!(realized, 200.0);
        assert_eq!(pos.quantity, 60);
        assert_eq!(pos.avg_entry_price, 50.0);
        assert_eq!(pos.cost_basis, 3_000.0);
    }

    #[test]
    fn full_close_resets() {
        let mut pos = Position::new("SPY");
        pos.apply(OrderSide::Buy, 100, 50.0);
        let realized = pos.apply(OrderSide::Sell, 100, 45.0);
        assert_eq!(realized, -500.0);
        assert!(pos.is_flat());
        assert_eq!(pos.avg_entry_price, 0.0);
        assert_eq!(pos.cost_basis, 0.0);
    }

    #[test]
    fn reversal_rebases_at_crossing_price() {
        let mut pos = Position::new("SPY");
        pos.apply(OrderSide::Buy, 100, 50.0);
        // Sell 150 @ 55: closes 100 (+500), opens 50 short @ 55.
        let realized = pos.apply(OrderSide::Sell, 150, 55.0);
        assert_eq!(realized, 500.0);
        assert_eq!(pos.quantity, -50);
        assert_eq!(pos.avg_entry_price, 55.0);
        assert_eq!(pos.cost_basis, 2_750.0);
    }

    #[test]
    fn short_close_realizes_inverse() {
        let mut pos = Position::new("SPY");
        pos.apply(OrderSide::Sell, 100, 50.0);
        let realized = pos.apply(OrderSide::Buy, 100, 45.0);
        // Short from 50 covered at 45: +5/share.
        assert_eq!(realized, 500.0);
        assert!(pos.is_flat());
    }

    #[test]
    fn cost_basis_invariant_holds() {
        let mut pos = Position::new("SPY");
        for (side, qty, price) in [
            (OrderSide::Buy, 100, 50.0),
            (OrderSide::Buy, 50, 52.0),
            (OrderSide::Sell, 120, 53.0),
            (OrderSide::Sell, 80, 51.0),
            (OrderSide::Buy, 200, 49.0),
        ] {
            pos.apply(side, qty, price);
            let expected = pos.quantity.unsigned_abs() as f64 * pos.avg_entry_price;
            assert!((pos.cost_basis - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn unrealized_pnl_signed() {
        let mut pos = Position::new("SPY");
        pos.apply(OrderSide::Sell, 100, 50.0);
        assert_eq!(pos.unrealized_pnl(45.0), 500.0);
        assert_eq!(pos.unrealized_pnl(55.0), -500.0);
    }
}
