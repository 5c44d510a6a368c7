//! # Domain Types
//!
//! Core domain types used throughout Remedia.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Medicine     │   │      Sale       │   │    StockLog     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  medicine_id    │   │  sale_id        │   │  log_id         │       │
//! │  │  name (unique)  │   │  customer_id?   │   │  medicine_id    │       │
//! │  │  quantity       │   │  user_id        │   │  change_type    │       │
//! │  │  price_cents    │   │  total_amount   │   │  quantity_change│       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      User       │   │      Role       │   │ StockChangeType │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  user_id        │   │  Owner          │   │  Sale           │       │
//! │  │  username       │   │  Worker         │   │  Purchase       │       │
//! │  │  role_id        │   └─────────────────┘   │  SaleDeletion   │       │
//! │  └─────────────────┘                         │  PurchaseDeletion│      │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every entity is a named record type; repositories never surface
//! positional tuples.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::money::Money;

// =============================================================================
// Role
// =============================================================================

/// Fixed role enumeration, resolved by name↔id mapping against the
/// seeded `roles` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access: user management, deletions.
    Owner,
    /// Day-to-day operation: sales, purchases.
    Worker,
}

impl Role {
    /// The role name as stored in `roles.role_name`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Worker => "worker",
        }
    }

    /// Resolves a role from its stored name.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "owner" => Ok(Role::Owner),
            "worker" => Ok(Role::Worker),
            other => Err(CoreError::UnknownRole(other.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Medicine
// =============================================================================

/// A medicine tracked in inventory.
///
/// `quantity` is mutated only by ledger operations (sales, purchases and
/// their reversals); CRUD updates may set it directly for corrections,
/// but never below zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Medicine {
    pub medicine_id: i64,

    /// Display name, unique across the catalog.
    pub name: String,

    /// Current stock on hand. Never negative.
    pub quantity: i64,

    /// Unit selling price in cents.
    pub price_cents: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Medicine {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// User
// =============================================================================

/// A login-capable user.
///
/// The password is an opaque credential compared by exact match; this is
/// not a security design and the field never leaves the database layer
/// in read queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub password: String,
    pub role_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Read-side view of a user with the role name joined in.
///
/// Returned by `login` and `get_details`; never carries the credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserDetails {
    pub user_id: i64,
    pub username: String,
    pub role_name: String,
}

impl UserDetails {
    /// Resolves the joined role name into the fixed enumeration.
    pub fn role(&self) -> Result<Role, CoreError> {
        Role::from_name(&self.role_name)
    }
}

/// One row of the user management listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserListing {
    pub user_id: i64,
    pub username: String,
    pub role_name: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale / Purchase Headers
// =============================================================================

/// A recorded sale (transaction header).
///
/// Headers and their detail rows are created atomically by
/// `record_sale` and never modified afterwards. The only way to undo a
/// sale is a reversal (`delete_sale`), which restores stock and removes
/// the rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub sale_id: i64,

    /// Optional counterparty. Walk-in sales have no customer reference.
    pub customer_id: Option<i64>,

    /// Issuing user.
    pub user_id: i64,

    /// Derived: equals the sum of this sale's detail line totals.
    pub total_amount_cents: i64,

    pub sale_date: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }
}

/// A recorded purchase (transaction header).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Purchase {
    pub purchase_id: i64,
    pub user_id: i64,
    pub total_amount_cents: i64,
    pub purchase_date: DateTime<Utc>,
}

impl Purchase {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }
}

// =============================================================================
// Detail Rows (line items)
// =============================================================================

/// One line item of a sale, with the selling price frozen at the time of
/// the transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleDetail {
    pub sale_id: i64,
    pub medicine_id: i64,
    pub quantity: i64,
    pub selling_price_cents: i64,
}

impl SaleDetail {
    /// Line total: quantity × frozen unit price.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.selling_price_cents).multiply_quantity(self.quantity)
    }
}

/// One line item of a purchase, with the cost price frozen at the time
/// of the transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseDetail {
    pub purchase_id: i64,
    pub medicine_id: i64,
    pub quantity: i64,
    pub cost_price_cents: i64,
}

impl PurchaseDetail {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.cost_price_cents).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Stock Log
// =============================================================================

/// The cause of a stock quantity change.
///
/// Reversals are tagged distinctly from the operations they compensate,
/// so the audit trail always tells the two apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum StockChangeType {
    /// Stock decremented by a sale.
    Sale,
    /// Stock incremented by a purchase.
    Purchase,
    /// Compensating entry: sale reversed, stock restored.
    SaleDeletion,
    /// Compensating entry: purchase reversed, stock removed.
    PurchaseDeletion,
}

/// An append-only audit entry.
///
/// Every stock mutation is paired with exactly one StockLog row carrying
/// the same signed delta that was applied to `medicines.quantity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockLog {
    pub log_id: i64,
    pub medicine_id: i64,
    pub change_type: StockChangeType,
    /// Signed delta: negative for sales and purchase reversals,
    /// positive for purchases and sale reversals.
    pub quantity_change: i64,
    pub logged_at: DateTime<Utc>,
}

// =============================================================================
// Listing Rows (read queries)
// =============================================================================

/// One row of the sales listing, joined to the issuing user's name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleListing {
    pub sale_id: i64,
    pub user_id: i64,
    pub username: String,
    pub total_amount_cents: i64,
    pub sale_date: DateTime<Utc>,
}

/// One row of the purchases listing, joined to the issuing user's name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseListing {
    pub purchase_id: i64,
    pub user_id: i64,
    pub username: String,
    pub total_amount_cents: i64,
    pub purchase_date: DateTime<Utc>,
}

/// One row of a sale's detail listing, joined to the medicine name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleDetailListing {
    pub sale_id: i64,
    pub medicine_id: i64,
    pub medicine_name: String,
    pub quantity: i64,
    pub selling_price_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!(Role::from_name("owner").unwrap(), Role::Owner);
        assert_eq!(Role::from_name("worker").unwrap(), Role::Worker);
        assert_eq!(Role::Owner.as_str(), "owner");
        assert!(matches!(
            Role::from_name("admin"),
            Err(CoreError::UnknownRole(_))
        ));
    }

    #[test]
    fn test_medicine_price() {
        let medicine = Medicine {
            medicine_id: 1,
            name: "Paracetamol 500mg".to_string(),
            quantity: 10,
            price_cents: 500,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(medicine.price().cents(), 500);
    }

    #[test]
    fn test_detail_line_total() {
        let detail = SaleDetail {
            sale_id: 1,
            medicine_id: 2,
            quantity: 3,
            selling_price_cents: 500,
        };
        assert_eq!(detail.line_total().cents(), 1500);
    }

    #[test]
    fn test_stock_change_type_serde() {
        let json = serde_json::to_string(&StockChangeType::SaleDeletion).unwrap();
        assert_eq!(json, "\"sale_deletion\"");
    }
}
