//! LIFO lot stacks for cost-basis tracking.

use serde::{Deserialize, Serialize};

/// A single open lot: units acquired (or sold short) at one price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    /// Units remaining in this lot
    pub quantity: f64,
    /// Per-unit price at which the lot was opened
    pub price: f64,
}

/// Raised when a reduction asks for more units than the stack holds.
///
/// Carries the numbers needed to report the offending transaction; the
/// ledger wraps it with the investor and symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shortfall {
    pub requested: f64,
    pub available: f64,
}

/// Open lots for one symbol, most recently opened last.
///
/// `reduce` consumes from the most recently opened lot first (LIFO). This
/// is the cost-basis policy of the whole engine; it decides which
/// historical price backs each sale and must not be changed to FIFO or
/// average-cost without changing every downstream total.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LotStack {
    lots: Vec<Lot>,
}

impl LotStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a newly opened lot as the most recent.
    pub fn push(&mut self, quantity: f64, price: f64) {
        self.lots.push(Lot { quantity, price });
    }

    /// Total units across all open lots.
    pub fn available(&self) -> f64 {
        self.lots.iter().map(|l| l.quantity).sum()
    }

    /// Whether the stack holds no lots at all.
    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    /// Consume `quantity` units starting from the most recently opened lot,
    /// partially consuming a lot when it is larger than what remains to be
    /// satisfied. Returns the blended cost basis of the consumed units.
    ///
    /// Fails before touching any lot when the stack holds fewer than
    /// `quantity` units, so a failed reduce leaves the stack unchanged.
    pub fn reduce(&mut self, quantity: f64) -> Result<f64, Shortfall> {
        let available = self.available();
        if quantity > available {
            return Err(Shortfall {
                requested: quantity,
                available,
            });
        }

        let mut remaining = quantity;
        let mut basis = 0.0;
        while remaining > 0.0 {
            let Some(lot) = self.lots.last_mut() else {
                break;
            };
            if remaining > lot.quantity {
                basis += lot.quantity * lot.price;
                remaining -= lot.quantity;
                self.lots.pop();
            } else {
                // Partial consumption; an exactly drained lot stays at zero
                // quantity until a later reduce pops it.
                basis += remaining * lot.price;
                lot.quantity -= remaining;
                remaining = 0.0;
            }
        }
        Ok(basis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_available() {
        let mut stack = LotStack::new();
        assert!(stack.is_empty());
        assert_eq!(stack.available(), 0.0);

        stack.push(10.0, 5.0);
        stack.push(4.0, 8.0);
        assert_eq!(stack.available(), 14.0);
    }

    #[test]
    fn test_reduce_lifo_basis() {
        let mut stack = LotStack::new();
        stack.push(10.0, 5.0);
        stack.push(10.0, 8.0);

        // Most recent lot first: all 10 come from the $8 lot.
        let basis = stack.reduce(10.0).unwrap();
        assert_eq!(basis, 80.0);
        assert_eq!(stack.available(), 10.0);
    }

    #[test]
    fn test_reduce_spans_lots() {
        let mut stack = LotStack::new();
        stack.push(10.0, 5.0);
        stack.push(4.0, 8.0);

        // 4 @ $8 + 6 @ $5 = 62
        let basis = stack.reduce(10.0).unwrap();
        assert_eq!(basis, 62.0);
        assert_eq!(stack.available(), 4.0);
    }

    #[test]
    fn test_reduce_partial_lot() {
        let mut stack = LotStack::new();
        stack.push(10.0, 5.0);

        let basis = stack.reduce(3.0).unwrap();
        assert_eq!(basis, 15.0);
        assert_eq!(stack.available(), 7.0);
    }

    #[test]
    fn test_reduce_shortfall() {
        let mut stack = LotStack::new();
        stack.push(5.0, 10.0);

        let err = stack.reduce(10.0).unwrap_err();
        assert_eq!(err.requested, 10.0);
        assert_eq!(err.available, 5.0);

        // The failed reduce must leave the stack untouched.
        assert_eq!(stack.available(), 5.0);
        assert_eq!(stack.reduce(5.0).unwrap(), 50.0);
    }

    #[test]
    fn test_reduce_empty_stack() {
        let mut stack = LotStack::new();
        let err = stack.reduce(1.0).unwrap_err();
        assert_eq!(err.available, 0.0);
    }

    #[test]
    fn test_exact_drain_leaves_zero_lot() {
        let mut stack = LotStack::new();
        stack.push(5.0, 10.0);
        stack.push(3.0, 12.0);

        assert_eq!(stack.reduce(3.0).unwrap(), 36.0);
        assert_eq!(stack.available(), 5.0);
        // The zero-quantity lot contributes nothing to the next reduce.
        assert_eq!(stack.reduce(5.0).unwrap(), 50.0);
        assert_eq!(stack.available(), 0.0);
    }
}
