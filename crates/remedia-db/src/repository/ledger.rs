//! # Ledger Repository
//!
//! The transactional inventory ledger: sale/purchase recording and
//! reversal. This is the one place in the system where stock quantities
//! change, and every change commits together with its audit entry or not
//! at all.
//!
//! ## Ledger Operation Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  record_sale (record_purchase mirrors it)               │
//! │                                                                         │
//! │  validate_cart(lines)            ← pure, BEFORE any write              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN TRANSACTION                                                     │
//! │  ├── INSERT sales header (total = Σ line totals) → sale_id             │
//! │  ├── per line, in input order:                                         │
//! │  │     ├── SELECT quantity FROM medicines   → MedicineNotFound? abort  │
//! │  │     ├── stock >= requested?              → InsufficientStock? abort │
//! │  │     ├── INSERT sales_details row                                    │
//! │  │     ├── UPDATE medicines SET quantity = quantity - n                │
//! │  │     └── INSERT stock_logs ('sale', -n)                              │
//! │  └── COMMIT                                                            │
//! │                                                                         │
//! │  Any failure at any step: the transaction handle is dropped on the     │
//! │  early return and sqlx rolls back - no partial sale, no partial        │
//! │  stock adjustment, no orphan audit row.                                │
//! │                                                                         │
//! │  Terminal states: Committed | Aborted. Nothing in between persists.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why check stock inside the transaction?
//! The non-negative-stock invariant under concurrent sales relies on the
//! stock re-check happening in the same transaction as the decrement;
//! SQLite serializes writers, so two competing sales cannot both pass
//! the check against the same stale value. No extra locking is added
//! and no retries are attempted - every failure surfaces once.

use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{debug, info};

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::error::{DbResult, LedgerResult};
use remedia_core::cart::validate_cart;
use remedia_core::{
    CartLine, CoreError, Purchase, PurchaseListing, Sale, SaleDetailListing, SaleListing,
    StockChangeType, StockLog, ValidationError,
};

/// Repository for the atomic ledger operations and their read side.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    // =========================================================================
    // Recording
    // =========================================================================

    /// Records a sale: header + detail rows + stock decrements + audit
    /// entries, all-or-nothing.
    ///
    /// ## Arguments
    /// * `customer_id` - Optional counterparty (walk-in sales pass None)
    /// * `user_id` - Issuing user
    /// * `lines` - Cart line items, processed in input order
    ///
    /// ## Returns
    /// The new `sale_id` on commit.
    ///
    /// ## Errors
    /// - `CoreError::{EmptyCart, InvalidQuantity, InconsistentLineTotal}`
    ///   before any write
    /// - `CoreError::MedicineNotFound` / `CoreError::InsufficientStock`
    ///   abort the whole transaction
    pub async fn record_sale(
        &self,
        customer_id: Option<i64>,
        user_id: i64,
        lines: &[CartLine],
    ) -> LedgerResult<i64> {
        let total = validate_cart(lines)?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO sales (customer_id, user_id, total_amount_cents, sale_date)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(customer_id)
        .bind(user_id)
        .bind(total.cents())
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let sale_id = result.last_insert_rowid();

        for line in lines {
            let stock = fetch_stock(&mut tx, line.medicine_id).await?;

            if stock < line.quantity {
                debug!(
                    medicine_id = line.medicine_id,
                    available = stock,
                    requested = line.quantity,
                    "Sale rejected: insufficient stock"
                );
                // Early return drops the transaction -> rollback
                return Err(CoreError::InsufficientStock {
                    medicine_id: line.medicine_id,
                    available: stock,
                    requested: line.quantity,
                }
                .into());
            }

            sqlx::query(
                r#"
                INSERT INTO sales_details (sale_id, medicine_id, quantity, selling_price_cents)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(sale_id)
            .bind(line.medicine_id)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .execute(&mut *tx)
            .await?;

            apply_stock_delta(&mut tx, line.medicine_id, -line.quantity).await?;
            append_stock_log(&mut tx, line.medicine_id, StockChangeType::Sale, -line.quantity)
                .await?;
        }

        tx.commit().await?;

        info!(sale_id, total = %total, lines = lines.len(), "Sale recorded");
        Ok(sale_id)
    }

    /// Records a purchase: the mirror image of [`Self::record_sale`].
    ///
    /// Stock moves in the opposite direction, so there is no sufficiency
    /// check - receiving stock cannot be blocked by the current level.
    /// The medicine-existence check still applies per line, and line
    /// totals are validated against the cost price.
    pub async fn record_purchase(&self, user_id: i64, lines: &[CartLine]) -> LedgerResult<i64> {
        let total = validate_cart(lines)?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO purchases (user_id, total_amount_cents, purchase_date)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(user_id)
        .bind(total.cents())
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let purchase_id = result.last_insert_rowid();

        for line in lines {
            // Existence check only; the fetched level is unused.
            fetch_stock(&mut tx, line.medicine_id).await?;

            sqlx::query(
                r#"
                INSERT INTO purchase_details (purchase_id, medicine_id, quantity, cost_price_cents)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(purchase_id)
            .bind(line.medicine_id)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .execute(&mut *tx)
            .await?;

            apply_stock_delta(&mut tx, line.medicine_id, line.quantity).await?;
            append_stock_log(
                &mut tx,
                line.medicine_id,
                StockChangeType::Purchase,
                line.quantity,
            )
            .await?;
        }

        tx.commit().await?;

        info!(purchase_id, total = %total, lines = lines.len(), "Purchase recorded");
        Ok(purchase_id)
    }

    // =========================================================================
    // Reversal
    // =========================================================================

    /// Deletes a single sale, reversing its stock effect.
    pub async fn delete_sale(&self, sale_id: i64) -> LedgerResult<()> {
        self.delete_sales(&[sale_id]).await
    }

    /// Deletes a batch of sales inside one transaction.
    ///
    /// For each detail row: stock is restored and a compensating
    /// `sale_deletion` audit entry is appended (the original `sale`
    /// entries are retained - the trail records both the movement and
    /// its reversal). Then detail rows and headers are removed.
    ///
    /// ## Errors
    /// - `ValidationError::Required` on an empty id set
    /// - `CoreError::SaleNotFound` when none of the ids exist; the whole
    ///   batch rolls back
    pub async fn delete_sales(&self, sale_ids: &[i64]) -> LedgerResult<()> {
        if sale_ids.is_empty() {
            return Err(ValidationError::Required {
                field: "sale_ids".to_string(),
            }
            .into());
        }

        let mut tx = self.pool.begin().await?;

        let details = fetch_details(&mut tx, "sales_details", "sale_id", sale_ids).await?;
        if details.is_empty() {
            return Err(CoreError::SaleNotFound(sale_ids[0]).into());
        }

        for &(_, medicine_id, quantity) in &details {
            apply_stock_delta(&mut tx, medicine_id, quantity).await?;
            append_stock_log(&mut tx, medicine_id, StockChangeType::SaleDeletion, quantity)
                .await?;
        }

        delete_by_ids(&mut tx, "sales_details", "sale_id", sale_ids).await?;
        let headers = delete_by_ids(&mut tx, "sales", "sale_id", sale_ids).await?;
        if headers == 0 {
            return Err(CoreError::SaleNotFound(sale_ids[0]).into());
        }

        tx.commit().await?;

        info!(?sale_ids, details = details.len(), "Sales deleted and reversed");
        Ok(())
    }

    /// Deletes a single purchase, reversing its stock effect.
    pub async fn delete_purchase(&self, purchase_id: i64) -> LedgerResult<()> {
        self.delete_purchases(&[purchase_id]).await
    }

    /// Deletes a batch of purchases inside one transaction.
    ///
    /// Reversing a purchase removes stock, so before any mutation the
    /// reversal quantities are aggregated per medicine across the whole
    /// batch and checked against current stock. A medicine whose
    /// received units have since been sold fails the batch with
    /// `InsufficientStockForReversal` and nothing changes.
    pub async fn delete_purchases(&self, purchase_ids: &[i64]) -> LedgerResult<()> {
        if purchase_ids.is_empty() {
            return Err(ValidationError::Required {
                field: "purchase_ids".to_string(),
            }
            .into());
        }

        let mut tx = self.pool.begin().await?;

        let details =
            fetch_details(&mut tx, "purchase_details", "purchase_id", purchase_ids).await?;
        if details.is_empty() {
            return Err(CoreError::PurchaseNotFound(purchase_ids[0]).into());
        }

        // Aggregate reversal quantities per medicine before touching
        // anything; the per-detail decrements below are covered by this
        // check as a whole.
        let mut required: BTreeMap<i64, i64> = BTreeMap::new();
        for &(_, medicine_id, quantity) in &details {
            *required.entry(medicine_id).or_insert(0) += quantity;
        }

        for (&medicine_id, &needed) in &required {
            let stock = fetch_stock(&mut tx, medicine_id).await?;
            if stock < needed {
                debug!(
                    medicine_id,
                    available = stock,
                    required = needed,
                    "Purchase reversal rejected: insufficient stock"
                );
                return Err(CoreError::InsufficientStockForReversal {
                    medicine_id,
                    available: stock,
                    required: needed,
                }
                .into());
            }
        }

        for &(_, medicine_id, quantity) in &details {
            apply_stock_delta(&mut tx, medicine_id, -quantity).await?;
            append_stock_log(
                &mut tx,
                medicine_id,
                StockChangeType::PurchaseDeletion,
                -quantity,
            )
            .await?;
        }

        delete_by_ids(&mut tx, "purchase_details", "purchase_id", purchase_ids).await?;
        let headers = delete_by_ids(&mut tx, "purchases", "purchase_id", purchase_ids).await?;
        if headers == 0 {
            return Err(CoreError::PurchaseNotFound(purchase_ids[0]).into());
        }

        tx.commit().await?;

        info!(?purchase_ids, details = details.len(), "Purchases deleted and reversed");
        Ok(())
    }

    // =========================================================================
    // Read Side
    // =========================================================================

    /// Gets a sale header by id.
    pub async fn get_sale(&self, sale_id: i64) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT sale_id, customer_id, user_id, total_amount_cents, sale_date
            FROM sales
            WHERE sale_id = ?1
            "#,
        )
        .bind(sale_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets a purchase header by id.
    pub async fn get_purchase(&self, purchase_id: i64) -> DbResult<Option<Purchase>> {
        let purchase = sqlx::query_as::<_, Purchase>(
            r#"
            SELECT purchase_id, user_id, total_amount_cents, purchase_date
            FROM purchases
            WHERE purchase_id = ?1
            "#,
        )
        .bind(purchase_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(purchase)
    }

    /// Lists all sales joined to the issuing user's name, newest first.
    pub async fn list_sales(&self) -> DbResult<Vec<SaleListing>> {
        let sales = sqlx::query_as::<_, SaleListing>(
            r#"
            SELECT s.sale_id, s.user_id, u.username, s.total_amount_cents, s.sale_date
            FROM sales s
            JOIN users u ON s.user_id = u.user_id
            ORDER BY s.sale_date DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Lists all purchases joined to the issuing user's name, newest first.
    pub async fn list_purchases(&self) -> DbResult<Vec<PurchaseListing>> {
        let purchases = sqlx::query_as::<_, PurchaseListing>(
            r#"
            SELECT p.purchase_id, p.user_id, u.username, p.total_amount_cents, p.purchase_date
            FROM purchases p
            JOIN users u ON p.user_id = u.user_id
            ORDER BY p.purchase_date DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(purchases)
    }

    /// Lists a sale's line items joined to the medicine name.
    pub async fn sale_details(&self, sale_id: i64) -> DbResult<Vec<SaleDetailListing>> {
        let details = sqlx::query_as::<_, SaleDetailListing>(
            r#"
            SELECT sd.sale_id, sd.medicine_id, m.name AS medicine_name,
                   sd.quantity, sd.selling_price_cents
            FROM sales_details sd
            JOIN medicines m ON sd.medicine_id = m.medicine_id
            WHERE sd.sale_id = ?1
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }

    /// Returns a medicine's audit trail, newest entries first.
    pub async fn stock_history(&self, medicine_id: i64) -> DbResult<Vec<StockLog>> {
        let logs = sqlx::query_as::<_, StockLog>(
            r#"
            SELECT log_id, medicine_id, change_type, quantity_change, logged_at
            FROM stock_logs
            WHERE medicine_id = ?1
            ORDER BY log_id DESC
            "#,
        )
        .bind(medicine_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Fetches a medicine's current stock inside the transaction.
///
/// This read participates in the same transaction as the mutation that
/// follows it; that pairing is what upholds the non-negative invariant.
async fn fetch_stock(tx: &mut Transaction<'_, Sqlite>, medicine_id: i64) -> LedgerResult<i64> {
    let stock: Option<i64> =
        sqlx::query_scalar("SELECT quantity FROM medicines WHERE medicine_id = ?1")
            .bind(medicine_id)
            .fetch_optional(&mut **tx)
            .await?;

    stock.ok_or_else(|| CoreError::MedicineNotFound(medicine_id).into())
}

/// Applies a signed delta to a medicine's stock.
async fn apply_stock_delta(
    tx: &mut Transaction<'_, Sqlite>,
    medicine_id: i64,
    delta: i64,
) -> LedgerResult<()> {
    sqlx::query(
        r#"
        UPDATE medicines
        SET quantity = quantity + ?2, updated_at = ?3
        WHERE medicine_id = ?1
        "#,
    )
    .bind(medicine_id)
    .bind(delta)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Appends one audit row carrying the same signed delta that was applied
/// to the stock.
async fn append_stock_log(
    tx: &mut Transaction<'_, Sqlite>,
    medicine_id: i64,
    change_type: StockChangeType,
    quantity_change: i64,
) -> LedgerResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_logs (medicine_id, change_type, quantity_change, logged_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(medicine_id)
    .bind(change_type)
    .bind(quantity_change)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Fetches `(parent_id, medicine_id, quantity)` detail rows for a set of
/// parent transaction ids.
///
/// SQLite cannot bind an array, so the IN list is built from `?`
/// placeholders; `table`/`id_column` are compile-time literals from this
/// module, never caller input.
async fn fetch_details(
    tx: &mut Transaction<'_, Sqlite>,
    table: &str,
    id_column: &str,
    ids: &[i64],
) -> LedgerResult<Vec<(i64, i64, i64)>> {
    let sql = format!(
        "SELECT {id}, medicine_id, quantity FROM {table} WHERE {id} IN ({placeholders})",
        id = id_column,
        table = table,
        placeholders = placeholders(ids.len()),
    );

    let mut query = sqlx::query_as::<_, (i64, i64, i64)>(&sql);
    for id in ids {
        query = query.bind(id);
    }

    Ok(query.fetch_all(&mut **tx).await?)
}

/// Deletes rows matching a set of parent ids; returns rows affected.
async fn delete_by_ids(
    tx: &mut Transaction<'_, Sqlite>,
    table: &str,
    id_column: &str,
    ids: &[i64],
) -> LedgerResult<u64> {
    let sql = format!(
        "DELETE FROM {table} WHERE {id} IN ({placeholders})",
        table = table,
        id = id_column,
        placeholders = placeholders(ids.len()),
    );

    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(id);
    }

    Ok(query.execute(&mut **tx).await?.rows_affected())
}

/// Builds `?, ?, ?` for an IN clause of `n` entries.
fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::pool::{Database, DbConfig};
    use remedia_core::{Money, Role};

    /// Creates an in-memory database with one user and two medicines:
    /// medicine A (stock 10, $5.00) and medicine B (stock 2, $3.00).
    async fn test_db() -> (Database, i64, i64, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let user = db.users().insert("amira", "pw", Role::Owner).await.unwrap();
        let a = db.medicines().insert("Medicine A", 10, 500).await.unwrap();
        let b = db.medicines().insert("Medicine B", 2, 300).await.unwrap();

        (db, user.user_id, a.medicine_id, b.medicine_id)
    }

    async fn stock_of(db: &Database, medicine_id: i64) -> i64 {
        db.medicines()
            .get_by_id(medicine_id)
            .await
            .unwrap()
            .unwrap()
            .quantity
    }

    // -------------------------------------------------------------------------
    // Sale recording
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_record_sale_adjusts_stock_and_logs() {
        let (db, user_id, a, _) = test_db().await;

        // Medicine A: stock 10, price $5.00. Sell 3 units.
        let lines = vec![CartLine::new(a, 3, Money::from_cents(500))];
        let sale_id = db.ledger().record_sale(None, user_id, &lines).await.unwrap();

        assert_eq!(stock_of(&db, a).await, 7);

        let sale = db.ledger().get_sale(sale_id).await.unwrap().unwrap();
        assert_eq!(sale.total_amount_cents, 1500);
        assert_eq!(sale.user_id, user_id);
        assert_eq!(sale.customer_id, None);

        // Exactly one matching audit row per line item
        let logs = db.ledger().stock_history(a).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].change_type, StockChangeType::Sale);
        assert_eq!(logs[0].quantity_change, -3);
    }

    #[tokio::test]
    async fn test_record_sale_multiple_lines() {
        let (db, user_id, a, b) = test_db().await;

        let lines = vec![
            CartLine::new(a, 2, Money::from_cents(500)),
            CartLine::new(b, 1, Money::from_cents(300)),
        ];
        let sale_id = db
            .ledger()
            .record_sale(Some(42), user_id, &lines)
            .await
            .unwrap();

        assert_eq!(stock_of(&db, a).await, 8);
        assert_eq!(stock_of(&db, b).await, 1);

        let sale = db.ledger().get_sale(sale_id).await.unwrap().unwrap();
        assert_eq!(sale.total_amount_cents, 1300);
        assert_eq!(sale.customer_id, Some(42));

        let details = db.ledger().sale_details(sale_id).await.unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].medicine_name, "Medicine A");
        assert_eq!(details[1].medicine_name, "Medicine B");
    }

    #[tokio::test]
    async fn test_oversell_rejected_and_nothing_changes() {
        let (db, user_id, _, b) = test_db().await;

        // Medicine B has stock 2; ask for 5.
        let lines = vec![CartLine::new(b, 5, Money::from_cents(300))];
        let err = db
            .ledger()
            .record_sale(None, user_id, &lines)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::Core(CoreError::InsufficientStock {
                available: 2,
                requested: 5,
                ..
            })
        ));

        // Stock, headers and logs completely unchanged
        assert_eq!(stock_of(&db, b).await, 2);
        assert!(db.ledger().list_sales().await.unwrap().is_empty());
        assert!(db.ledger().stock_history(b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversell_mid_cart_rolls_back_earlier_lines() {
        let (db, user_id, a, b) = test_db().await;

        // First line would succeed; second line oversells. The whole
        // sale must roll back, including the first line's decrement.
        let lines = vec![
            CartLine::new(a, 3, Money::from_cents(500)),
            CartLine::new(b, 5, Money::from_cents(300)),
        ];
        let err = db
            .ledger()
            .record_sale(None, user_id, &lines)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::InsufficientStock { .. })
        ));

        assert_eq!(stock_of(&db, a).await, 10);
        assert_eq!(stock_of(&db, b).await, 2);
        assert!(db.ledger().stock_history(a).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_medicine_aborts_whole_sale() {
        let (db, user_id, a, _) = test_db().await;

        let lines = vec![
            CartLine::new(a, 1, Money::from_cents(500)),
            CartLine::new(9999, 1, Money::from_cents(100)),
        ];
        let err = db
            .ledger()
            .record_sale(None, user_id, &lines)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::Core(CoreError::MedicineNotFound(9999))
        ));
        assert_eq!(stock_of(&db, a).await, 10);
        assert!(db.ledger().list_sales().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_structural_validation_precedes_writes() {
        let (db, user_id, a, _) = test_db().await;

        // Empty cart
        let err = db.ledger().record_sale(None, user_id, &[]).await.unwrap_err();
        assert!(matches!(err, LedgerError::Core(CoreError::EmptyCart)));

        // Inconsistent line total
        let mut bad = CartLine::new(a, 3, Money::from_cents(500));
        bad.line_total_cents = 1400;
        let err = db
            .ledger()
            .record_sale(None, user_id, &[bad])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::InconsistentLineTotal { .. })
        ));

        // Rejected before any row was written
        assert!(db.ledger().list_sales().await.unwrap().is_empty());
        assert!(db.ledger().stock_history(a).await.unwrap().is_empty());
        assert_eq!(stock_of(&db, a).await, 10);
    }

    // -------------------------------------------------------------------------
    // Purchase recording
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_record_purchase_increments_stock_and_logs() {
        let (db, user_id, a, _) = test_db().await;

        let lines = vec![CartLine::new(a, 20, Money::from_cents(350))];
        let purchase_id = db.ledger().record_purchase(user_id, &lines).await.unwrap();

        assert_eq!(stock_of(&db, a).await, 30);

        let purchase = db.ledger().get_purchase(purchase_id).await.unwrap().unwrap();
        assert_eq!(purchase.total_amount_cents, 7000);

        let logs = db.ledger().stock_history(a).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].change_type, StockChangeType::Purchase);
        assert_eq!(logs[0].quantity_change, 20);
    }

    #[tokio::test]
    async fn test_purchase_unknown_medicine_rejected() {
        let (db, user_id, _, _) = test_db().await;

        let lines = vec![CartLine::new(9999, 5, Money::from_cents(100))];
        let err = db
            .ledger()
            .record_purchase(user_id, &lines)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::Core(CoreError::MedicineNotFound(9999))
        ));
        assert!(db.ledger().list_purchases().await.unwrap().is_empty());
    }

    // -------------------------------------------------------------------------
    // Reversal
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_delete_sale_restores_stock_with_compensating_log() {
        let (db, user_id, a, _) = test_db().await;

        let lines = vec![CartLine::new(a, 3, Money::from_cents(500))];
        let sale_id = db.ledger().record_sale(None, user_id, &lines).await.unwrap();
        assert_eq!(stock_of(&db, a).await, 7);

        db.ledger().delete_sale(sale_id).await.unwrap();

        // Stock back to its original pre-sale value
        assert_eq!(stock_of(&db, a).await, 10);
        assert!(db.ledger().get_sale(sale_id).await.unwrap().is_none());
        assert!(db.ledger().sale_details(sale_id).await.unwrap().is_empty());

        // Original entry retained, compensating entry appended
        let logs = db.ledger().stock_history(a).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].change_type, StockChangeType::SaleDeletion);
        assert_eq!(logs[0].quantity_change, 3);
        assert_eq!(logs[1].change_type, StockChangeType::Sale);
        assert_eq!(logs[1].quantity_change, -3);
    }

    #[tokio::test]
    async fn test_delete_sales_batch() {
        let (db, user_id, a, b) = test_db().await;

        let first = db
            .ledger()
            .record_sale(None, user_id, &[CartLine::new(a, 2, Money::from_cents(500))])
            .await
            .unwrap();
        let second = db
            .ledger()
            .record_sale(None, user_id, &[CartLine::new(b, 1, Money::from_cents(300))])
            .await
            .unwrap();

        db.ledger().delete_sales(&[first, second]).await.unwrap();

        assert_eq!(stock_of(&db, a).await, 10);
        assert_eq!(stock_of(&db, b).await, 2);
        assert!(db.ledger().list_sales().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_sale_is_not_found() {
        let (db, _, a, _) = test_db().await;

        let err = db.ledger().delete_sale(777).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::SaleNotFound(777))
        ));

        // No rows changed
        assert_eq!(stock_of(&db, a).await, 10);
        assert!(db.ledger().stock_history(a).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_sales_empty_ids_rejected() {
        let (db, _, _, _) = test_db().await;

        let err = db.ledger().delete_sales(&[]).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::Validation(ValidationError::Required { .. }))
        ));
    }

    #[tokio::test]
    async fn test_delete_purchase_restores_stock() {
        let (db, user_id, a, _) = test_db().await;

        let lines = vec![CartLine::new(a, 15, Money::from_cents(350))];
        let purchase_id = db.ledger().record_purchase(user_id, &lines).await.unwrap();
        assert_eq!(stock_of(&db, a).await, 25);

        db.ledger().delete_purchase(purchase_id).await.unwrap();

        assert_eq!(stock_of(&db, a).await, 10);
        assert!(db.ledger().get_purchase(purchase_id).await.unwrap().is_none());

        let logs = db.ledger().stock_history(a).await.unwrap();
        assert_eq!(logs[0].change_type, StockChangeType::PurchaseDeletion);
        assert_eq!(logs[0].quantity_change, -15);
    }

    #[tokio::test]
    async fn test_delete_purchase_blocked_when_stock_already_sold() {
        let (db, user_id, a, _) = test_db().await;

        // Receive 10 (stock 20), then sell 15 (stock 5). Reversing the
        // purchase would need 10 but only 5 remain.
        let purchase_id = db
            .ledger()
            .record_purchase(user_id, &[CartLine::new(a, 10, Money::from_cents(350))])
            .await
            .unwrap();
        db.ledger()
            .record_sale(None, user_id, &[CartLine::new(a, 15, Money::from_cents(500))])
            .await
            .unwrap();
        assert_eq!(stock_of(&db, a).await, 5);

        let err = db.ledger().delete_purchase(purchase_id).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::InsufficientStockForReversal {
                available: 5,
                required: 10,
                ..
            })
        ));

        // Aborted before any mutation: stock, headers, logs untouched
        assert_eq!(stock_of(&db, a).await, 5);
        assert!(db.ledger().get_purchase(purchase_id).await.unwrap().is_some());
        assert_eq!(db.ledger().stock_history(a).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_purchases_aggregates_across_batch() {
        let (db, user_id, a, _) = test_db().await;

        // Two purchases of 10 each (stock 30), then sell 15 (stock 15).
        // Each reversal alone fits the remaining stock, but the batch
        // needs 20 and must be rejected as a whole.
        let p1 = db
            .ledger()
            .record_purchase(user_id, &[CartLine::new(a, 10, Money::from_cents(350))])
            .await
            .unwrap();
        let p2 = db
            .ledger()
            .record_purchase(user_id, &[CartLine::new(a, 10, Money::from_cents(350))])
            .await
            .unwrap();
        db.ledger()
            .record_sale(None, user_id, &[CartLine::new(a, 15, Money::from_cents(500))])
            .await
            .unwrap();

        let err = db.ledger().delete_purchases(&[p1, p2]).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::InsufficientStockForReversal {
                available: 15,
                required: 20,
                ..
            })
        ));
        assert_eq!(stock_of(&db, a).await, 15);
    }

    // -------------------------------------------------------------------------
    // Read side
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_listings_join_username() {
        let (db, user_id, a, _) = test_db().await;

        db.ledger()
            .record_sale(None, user_id, &[CartLine::new(a, 1, Money::from_cents(500))])
            .await
            .unwrap();
        db.ledger()
            .record_purchase(user_id, &[CartLine::new(a, 5, Money::from_cents(350))])
            .await
            .unwrap();

        let sales = db.ledger().list_sales().await.unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].username, "amira");
        assert_eq!(sales[0].total_amount_cents, 500);

        let purchases = db.ledger().list_purchases().await.unwrap();
        assert_eq!(purchases.len(), 1);
        assert_eq!(purchases[0].username, "amira");
    }

    #[tokio::test]
    async fn test_referenced_medicine_cannot_be_deleted() {
        let (db, user_id, a, _) = test_db().await;

        db.ledger()
            .record_sale(None, user_id, &[CartLine::new(a, 1, Money::from_cents(500))])
            .await
            .unwrap();

        let err = db.medicines().delete(a).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::DbError::ForeignKeyViolation { .. }
        ));

        // Still present
        assert!(db.medicines().get_by_id(a).await.unwrap().is_some());
    }
}
