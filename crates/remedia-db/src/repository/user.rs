//! # User Repository
//!
//! Login, user management and role mapping.
//!
//! ## Login Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Login Flow                                      │
//! │                                                                         │
//! │  login(username, password)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT ... FROM users JOIN roles                                      │
//! │  WHERE username = ? AND password = ?                                   │
//! │       │                                                                 │
//! │       ├── row       → Some(UserDetails { id, username, role_name })    │
//! │       └── no row    → None  (unknown user OR wrong password -          │
//! │                              deliberately indistinguishable)           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The credential is compared by exact match. That mirrors the system
//! this replaces and is explicitly not a security design; swapping in a
//! hash comparison stays local to this file.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult, LedgerResult};
use remedia_core::validation::{validate_password, validate_username};
use remedia_core::{Role, User, UserDetails, UserListing};

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Authenticates a user by exact credential match.
    ///
    /// ## Returns
    /// * `Ok(Some(UserDetails))` - Credentials matched
    /// * `Ok(None)` - Unknown username or wrong password
    pub async fn login(&self, username: &str, password: &str) -> DbResult<Option<UserDetails>> {
        debug!(username = %username, "Login attempt");

        let details = sqlx::query_as::<_, UserDetails>(
            r#"
            SELECT u.user_id, u.username, r.role_name
            FROM users u
            JOIN roles r ON u.role_id = r.role_id
            WHERE u.username = ?1 AND u.password = ?2
            "#,
        )
        .bind(username)
        .bind(password)
        .fetch_optional(&self.pool)
        .await?;

        if details.is_none() {
            warn!(username = %username, "Login rejected");
        }

        Ok(details)
    }

    /// Gets a user's details (with joined role name) by username.
    pub async fn get_details(&self, username: &str) -> DbResult<Option<UserDetails>> {
        let details = sqlx::query_as::<_, UserDetails>(
            r#"
            SELECT u.user_id, u.username, r.role_name
            FROM users u
            JOIN roles r ON u.role_id = r.role_id
            WHERE u.username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(details)
    }

    /// Lists all users with their role names, ordered by id.
    pub async fn list(&self) -> DbResult<Vec<UserListing>> {
        let users = sqlx::query_as::<_, UserListing>(
            r#"
            SELECT u.user_id, u.username, r.role_name, u.created_at
            FROM users u
            JOIN roles r ON u.role_id = r.role_id
            ORDER BY u.user_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Resolves a role to its seeded `role_id`.
    pub async fn role_id(&self, role: Role) -> DbResult<i64> {
        let id: Option<i64> = sqlx::query_scalar("SELECT role_id FROM roles WHERE role_name = ?1")
            .bind(role.as_str())
            .fetch_optional(&self.pool)
            .await?;

        // Roles are seeded by the initial migration; a miss means the
        // database was created without migrations.
        id.ok_or_else(|| DbError::not_found("Role", role.as_str()))
    }

    /// Inserts a new user with the given role.
    ///
    /// ## Errors
    /// - Validation failure (empty username/password)
    /// - `DbError::UniqueViolation` on a duplicate username
    pub async fn insert(&self, username: &str, password: &str, role: Role) -> LedgerResult<User> {
        validate_username(username)?;
        validate_password(password)?;

        let username = username.trim();
        let role_id = self.role_id(role).await?;
        let now = Utc::now();

        debug!(username = %username, role = %role, "Inserting user");

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password, role_id, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(username)
        .bind(password)
        .bind(role_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(User {
            user_id: result.last_insert_rowid(),
            username: username.to_string(),
            password: password.to_string(),
            role_id,
            created_at: now,
        })
    }

    /// Updates a user's credential and role.
    ///
    /// The username is identity and cannot be changed; a rename is a
    /// delete-and-recreate.
    pub async fn update(&self, user_id: i64, password: &str, role: Role) -> LedgerResult<()> {
        validate_password(password)?;

        let role_id = self.role_id(role).await?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET password = ?2, role_id = ?3
            WHERE user_id = ?1
            "#,
        )
        .bind(user_id)
        .bind(password)
        .bind(role_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", user_id).into());
        }

        Ok(())
    }

    /// Deletes a user.
    ///
    /// ## Errors
    /// - `DbError::NotFound` when the id doesn't exist
    /// - `DbError::ForeignKeyViolation` while sales/purchases still
    ///   reference the user
    pub async fn delete(&self, user_id: i64) -> DbResult<()> {
        debug!(user_id, "Deleting user");

        let result = sqlx::query("DELETE FROM users WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", user_id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::pool::{Database, DbConfig};
    use remedia_core::CoreError;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_login() {
        let db = test_db().await;
        let repo = db.users();

        let user = repo.insert("amira", "secret", Role::Owner).await.unwrap();
        assert!(user.user_id > 0);

        let session = repo.login("amira", "secret").await.unwrap().unwrap();
        assert_eq!(session.username, "amira");
        assert_eq!(session.role_name, "owner");
        assert_eq!(session.role().unwrap(), Role::Owner);
    }

    #[tokio::test]
    async fn test_login_wrong_password_returns_none() {
        let db = test_db().await;
        let repo = db.users();

        repo.insert("amira", "secret", Role::Worker).await.unwrap();

        assert!(repo.login("amira", "wrong").await.unwrap().is_none());
        assert!(repo.login("nobody", "secret").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_details() {
        let db = test_db().await;
        let repo = db.users();

        repo.insert("jon", "pw", Role::Worker).await.unwrap();

        let details = repo.get_details("jon").await.unwrap().unwrap();
        assert_eq!(details.role_name, "worker");
        assert!(repo.get_details("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = test_db().await;
        let repo = db.users();

        repo.insert("amira", "a", Role::Owner).await.unwrap();
        let err = repo.insert("amira", "b", Role::Worker).await.unwrap_err();

        assert!(matches!(
            err,
            LedgerError::Db(DbError::UniqueViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_blank_credentials_rejected() {
        let db = test_db().await;
        let repo = db.users();

        assert!(matches!(
            repo.insert("", "pw", Role::Worker).await.unwrap_err(),
            LedgerError::Core(CoreError::Validation(_))
        ));
        assert!(matches!(
            repo.insert("amira", "", Role::Worker).await.unwrap_err(),
            LedgerError::Core(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_list_ordered_by_id() {
        let db = test_db().await;
        let repo = db.users();

        repo.insert("zoe", "a", Role::Owner).await.unwrap();
        repo.insert("ali", "b", Role::Worker).await.unwrap();

        let users = repo.list().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].username, "zoe");
        assert_eq!(users[1].username, "ali");
    }

    #[tokio::test]
    async fn test_update_password_and_role() {
        let db = test_db().await;
        let repo = db.users();

        let user = repo.insert("jon", "old", Role::Worker).await.unwrap();
        repo.update(user.user_id, "new", Role::Owner).await.unwrap();

        assert!(repo.login("jon", "old").await.unwrap().is_none());
        let session = repo.login("jon", "new").await.unwrap().unwrap();
        assert_eq!(session.role().unwrap(), Role::Owner);

        let err = repo.update(9999, "pw", Role::Worker).await.unwrap_err();
        assert!(matches!(err, LedgerError::Db(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete() {
        let db = test_db().await;
        let repo = db.users();

        let user = repo.insert("temp", "pw", Role::Worker).await.unwrap();
        repo.delete(user.user_id).await.unwrap();

        assert!(matches!(
            repo.delete(user.user_id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
