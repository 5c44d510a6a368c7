//! # Error Types
//!
//! Domain-specific error types for remedia-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  remedia-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  remedia-db errors (separate crate)                                    │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── LedgerError      - Core ⊕ Db union surfaced by ledger ops        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (medicine id, quantities, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages by the
/// embedding application.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Cart has no line items.
    ///
    /// ## When This Occurs
    /// - `record_sale`/`record_purchase` called with an empty cart
    #[error("Cart is empty")]
    EmptyCart,

    /// A cart line has a zero or negative quantity, or one above the
    /// per-line cap.
    #[error("Invalid quantity {quantity} for medicine {medicine_id}")]
    InvalidQuantity { medicine_id: i64, quantity: i64 },

    /// A cart line's total does not equal quantity × unit price.
    ///
    /// ## When This Occurs
    /// - Caller computed the line total with floats, or passed a stale
    ///   value after editing the quantity
    ///
    /// Checked exactly, before any database write.
    #[error("Inconsistent line total for medicine {medicine_id}: expected {expected}, got {actual}")]
    InconsistentLineTotal {
        medicine_id: i64,
        expected: i64,
        actual: i64,
    },

    /// Medicine cannot be found.
    ///
    /// ## When This Occurs
    /// - A cart line references a medicine id that does not exist
    /// - The medicine was deleted between cart assembly and checkout
    #[error("Medicine not found: {0}")]
    MedicineNotFound(i64),

    /// Insufficient stock to complete a sale.
    ///
    /// ## User Workflow
    /// ```text
    /// Add to Cart (qty: 5)
    ///      │
    ///      ▼
    /// record_sale → in-transaction stock check: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { medicine_id, available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 in stock"   (whole sale rolled back)
    /// ```
    #[error("Insufficient stock for medicine {medicine_id}: available {available}, requested {requested}")]
    InsufficientStock {
        medicine_id: i64,
        available: i64,
        requested: i64,
    },

    /// Reversing a purchase would drive stock negative.
    ///
    /// ## When This Occurs
    /// - Deleting a purchase after some of its received stock was sold
    /// - Checked across the whole batch before any mutation
    #[error("Insufficient stock to reverse purchase for medicine {medicine_id}: available {available}, required {required}")]
    InsufficientStockForReversal {
        medicine_id: i64,
        available: i64,
        required: i64,
    },

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(i64),

    /// Purchase not found.
    #[error("Purchase not found: {0}")]
    PurchaseNotFound(i64),

    /// Unknown role name.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Cart has exceeded maximum allowed line items.
    #[error("Cart cannot have more than {max} line items")]
    CartTooLarge { max: usize },

    /// Summed cart total does not fit in integer cents.
    ///
    /// ## When This Occurs
    /// - Line totals individually fit in i64 but their sum overflows;
    ///   checked before any database write
    #[error("Cart total exceeds the representable amount")]
    TotalOverflow,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            medicine_id: 7,
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for medicine 7: available 3, requested 5"
        );

        let err = CoreError::InconsistentLineTotal {
            medicine_id: 2,
            expected: 1500,
            actual: 1400,
        };
        assert_eq!(
            err.to_string(),
            "Inconsistent line total for medicine 2: expected 1500, got 1400"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "username".to_string(),
        };
        assert_eq!(err.to_string(), "username is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
