//! # Cart Module
//!
//! Line items and the structural cart validation that gates every ledger
//! operation.
//!
//! ## Where This Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Validation Pipeline                             │
//! │                                                                         │
//! │  Presentation collects CartLines + user identity                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_cart(&lines) ← THIS MODULE (pure, before any write)          │
//! │       │                                                                 │
//! │       ├── empty?                → CoreError::EmptyCart                 │
//! │       ├── quantity <= 0 or      → CoreError::InvalidQuantity           │
//! │       │   above the line cap?                                          │
//! │       ├── total != qty × price? → CoreError::InconsistentLineTotal     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Ok(total_amount) → ledger opens its transaction                       │
//! │                                                                         │
//! │  Stock sufficiency and medicine existence are NOT checked here:        │
//! │  those need current table state and run inside the ledger's            │
//! │  transaction, in the same unit as the stock decrement.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::validation::validate_quantity;
use crate::MAX_CART_LINES;

// =============================================================================
// Cart Line
// =============================================================================

/// One medicine-quantity-price entry within a sale or purchase cart.
///
/// For sales the unit price is the selling price; for purchases it is
/// the cost price. The ledger treats both identically: the structural
/// invariants are the same.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub medicine_id: i64,

    /// Units sold or received. Must be positive.
    pub quantity: i64,

    /// Unit price in cents at the time of the transaction.
    pub unit_price_cents: i64,

    /// Caller-supplied line total. Must equal quantity × unit price
    /// exactly; carts assembled with float math get rejected here.
    pub line_total_cents: i64,
}

impl CartLine {
    /// Creates a line with a consistent total derived from the inputs.
    ///
    /// The total saturates at the i64 bounds; a saturated line can never
    /// pass the exact-total check in [`validate_cart`].
    pub fn new(medicine_id: i64, quantity: i64, unit_price: Money) -> Self {
        CartLine {
            medicine_id,
            quantity,
            unit_price_cents: unit_price.cents(),
            line_total_cents: unit_price.cents().saturating_mul(quantity),
        }
    }

    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the caller-supplied line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Cart Validation
// =============================================================================

/// Validates the structure of a cart and returns its total amount.
///
/// ## Check Order
/// Evaluated in this order; the first failure short-circuits:
/// 1. cart non-empty (and within [`MAX_CART_LINES`])
/// 2. every line has `quantity > 0` and within
///    [`crate::MAX_LINE_QUANTITY`]
/// 3. every line has `line_total == quantity × unit_price`, exactly
///
/// All arithmetic is checked: a line whose product overflows i64 fails
/// the total check, and a cart whose summed total overflows fails with
/// `TotalOverflow`. No input can panic this function.
///
/// ## Returns
/// The computed total amount (sum of line totals) for the transaction
/// header.
///
/// ## Example
/// ```rust
/// use remedia_core::cart::{validate_cart, CartLine};
/// use remedia_core::Money;
///
/// let lines = vec![
///     CartLine::new(1, 3, Money::from_cents(500)),
///     CartLine::new(2, 1, Money::from_cents(1250)),
/// ];
/// assert_eq!(validate_cart(&lines).unwrap().cents(), 2750);
/// ```
pub fn validate_cart(lines: &[CartLine]) -> CoreResult<Money> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    if lines.len() > MAX_CART_LINES {
        return Err(CoreError::CartTooLarge {
            max: MAX_CART_LINES,
        });
    }

    for line in lines {
        if validate_quantity(line.quantity).is_err() {
            return Err(CoreError::InvalidQuantity {
                medicine_id: line.medicine_id,
                quantity: line.quantity,
            });
        }
    }

    for line in lines {
        let expected = line.unit_price().checked_multiply_quantity(line.quantity);
        if expected != Some(line.line_total()) {
            return Err(CoreError::InconsistentLineTotal {
                medicine_id: line.medicine_id,
                // Saturated for the message when the product overflows
                expected: line.unit_price_cents.saturating_mul(line.quantity),
                actual: line.line_total_cents,
            });
        }
    }

    let mut total = Money::zero();
    for line in lines {
        total = total
            .checked_add(line.line_total())
            .ok_or(CoreError::TotalOverflow)?;
    }

    Ok(total)
}

// =============================================================================
// Unit Tests
// =============================================================================
