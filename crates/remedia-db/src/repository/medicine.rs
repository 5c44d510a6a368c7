//! # Medicine Repository
//!
//! CRUD and stock reads for the medicine catalog.
//!
//! ## Stock Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  medicines.quantity is owned by the LEDGER                              │
//! │                                                                         │
//! │  record_sale      → quantity - n   (inside the sale's transaction)     │
//! │  record_purchase  → quantity + n                                        │
//! │  delete_sale      → quantity + n   (reversal)                           │
//! │  delete_purchase  → quantity - n   (reversal, sufficiency-checked)      │
//! │                                                                         │
//! │  This repository only sets quantity on insert (opening stock) and      │
//! │  update (manual correction). Both paths validate non-negative.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Deleting a medicine that is still referenced by any sale or purchase
//! detail row is blocked by the foreign key constraints and surfaces as
//! `DbError::ForeignKeyViolation`.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult, LedgerResult};
use remedia_core::validation::{validate_medicine_name, validate_price_cents, validate_stock_level};
use remedia_core::Medicine;

/// Repository for medicine database operations.
#[derive(Debug, Clone)]
pub struct MedicineRepository {
    pool: SqlitePool,
}

impl MedicineRepository {
    /// Creates a new MedicineRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MedicineRepository { pool }
    }

    /// Lists the whole catalog, ordered by id.
    pub async fn list(&self) -> DbResult<Vec<Medicine>> {
        let medicines = sqlx::query_as::<_, Medicine>(
            r#"
            SELECT medicine_id, name, quantity, price_cents, created_at, updated_at
            FROM medicines
            ORDER BY medicine_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(medicines)
    }

    /// Gets a medicine by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Medicine))` - Medicine found
    /// * `Ok(None)` - Medicine not found
    pub async fn get_by_id(&self, medicine_id: i64) -> DbResult<Option<Medicine>> {
        let medicine = sqlx::query_as::<_, Medicine>(
            r#"
            SELECT medicine_id, name, quantity, price_cents, created_at, updated_at
            FROM medicines
            WHERE medicine_id = ?1
            "#,
        )
        .bind(medicine_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(medicine)
    }

    /// Inserts a new medicine with its opening stock.
    ///
    /// ## Errors
    /// - Validation failure (empty name, negative stock or price)
    /// - `DbError::UniqueViolation` on a duplicate name
    pub async fn insert(
        &self,
        name: &str,
        quantity: i64,
        price_cents: i64,
    ) -> LedgerResult<Medicine> {
        validate_medicine_name(name)?;
        validate_stock_level(quantity)?;
        validate_price_cents(price_cents)?;

        let name = name.trim();
        let now = Utc::now();

        debug!(name = %name, quantity, "Inserting medicine");

        let result = sqlx::query(
            r#"
            INSERT INTO medicines (name, quantity, price_cents, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(name)
        .bind(quantity)
        .bind(price_cents)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Medicine {
            medicine_id: result.last_insert_rowid(),
            name: name.to_string(),
            quantity,
            price_cents,
            created_at: now,
            updated_at: now,
        })
    }

    /// Updates a medicine's name, stock level and price.
    ///
    /// A direct quantity write here is a manual correction; routine stock
    /// movement goes through the ledger so the audit trail stays paired
    /// with the mutation.
    pub async fn update(
        &self,
        medicine_id: i64,
        name: &str,
        quantity: i64,
        price_cents: i64,
    ) -> LedgerResult<()> {
        validate_medicine_name(name)?;
        validate_stock_level(quantity)?;
        validate_price_cents(price_cents)?;

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE medicines
            SET name = ?2, quantity = ?3, price_cents = ?4, updated_at = ?5
            WHERE medicine_id = ?1
            "#,
        )
        .bind(medicine_id)
        .bind(name.trim())
        .bind(quantity)
        .bind(price_cents)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Medicine", medicine_id).into());
        }

        Ok(())
    }

    /// Deletes a medicine.
    ///
    /// ## Errors
    /// - `DbError::ForeignKeyViolation` while any sale/purchase detail
    ///   still references the medicine
    /// - `DbError::NotFound` when the id doesn't exist
    pub async fn delete(&self, medicine_id: i64) -> DbResult<()> {
        debug!(medicine_id, "Deleting medicine");

        let result = sqlx::query("DELETE FROM medicines WHERE medicine_id = ?1")
            .bind(medicine_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Medicine", medicine_id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::error::{DbError, LedgerError};
    use crate::pool::{Database, DbConfig};
    use remedia_core::CoreError;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_list_ordered_by_id() {
        let db = test_db().await;
        let repo = db.medicines();

        repo.insert("Ibuprofen 200mg", 50, 799).await.unwrap();
        repo.insert("Amoxicillin 250mg", 20, 1250).await.unwrap();

        let medicines = repo.list().await.unwrap();
        assert_eq!(medicines.len(), 2);
        // Ordered by id, not name
        assert_eq!(medicines[0].name, "Ibuprofen 200mg");
        assert_eq!(medicines[1].name, "Amoxicillin 250mg");
        assert!(medicines[0].medicine_id < medicines[1].medicine_id);
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let db = test_db().await;
        let repo = db.medicines();

        let inserted = repo.insert("Cetirizine 10mg", 30, 450).await.unwrap();

        let found = repo.get_by_id(inserted.medicine_id).await.unwrap().unwrap();
        assert_eq!(found.name, "Cetirizine 10mg");
        assert_eq!(found.quantity, 30);
        assert_eq!(found.price_cents, 450);

        assert!(repo.get_by_id(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = test_db().await;
        let repo = db.medicines();

        repo.insert("Paracetamol 500mg", 10, 500).await.unwrap();
        let err = repo.insert("Paracetamol 500mg", 5, 600).await.unwrap_err();

        assert!(matches!(
            err,
            LedgerError::Db(DbError::UniqueViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_fields_rejected_before_insert() {
        let db = test_db().await;
        let repo = db.medicines();

        assert!(matches!(
            repo.insert("", 10, 500).await.unwrap_err(),
            LedgerError::Core(CoreError::Validation(_))
        ));
        assert!(matches!(
            repo.insert("Aspirin", -1, 500).await.unwrap_err(),
            LedgerError::Core(CoreError::Validation(_))
        ));
        assert!(matches!(
            repo.insert("Aspirin", 10, -500).await.unwrap_err(),
            LedgerError::Core(CoreError::Validation(_))
        ));

        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update() {
        let db = test_db().await;
        let repo = db.medicines();

        let medicine = repo.insert("Loratadine 10mg", 15, 650).await.unwrap();
        repo.update(medicine.medicine_id, "Loratadine 10mg", 25, 700)
            .await
            .unwrap();

        let updated = repo.get_by_id(medicine.medicine_id).await.unwrap().unwrap();
        assert_eq!(updated.quantity, 25);
        assert_eq!(updated.price_cents, 700);

        let err = repo.update(9999, "Ghost", 1, 1).await.unwrap_err();
        assert!(matches!(err, LedgerError::Db(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_unreferenced() {
        let db = test_db().await;
        let repo = db.medicines();

        let medicine = repo.insert("Vitamin C 1000mg", 40, 899).await.unwrap();
        repo.delete(medicine.medicine_id).await.unwrap();

        assert!(repo.get_by_id(medicine.medicine_id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(medicine.medicine_id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
