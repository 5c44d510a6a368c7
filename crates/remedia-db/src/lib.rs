//! # remedia-db: Database Layer for Remedia
//!
//! This crate provides database access for the Remedia pharmacy system.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Remedia Data Flow                                │
//! │                                                                         │
//! │  Embedding application (record a sale)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     remedia-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (ledger.rs)   │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ LedgerRepo    │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │ MedicineRepo  │    │ ...          │  │   │
//! │  │   │ Management    │    │ UserRepo      │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (single file, WAL mode, FK enforced)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - Environment-driven settings loader
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and ledger error types
//! - [`repository`] - Repository implementations (medicine, user, ledger)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use remedia_db::{Database, DbConfig};
//! use remedia_core::{CartLine, Money};
//!
//! // Create database with default config (runs migrations)
//! let db = Database::new(DbConfig::new("path/to/remedia.db")).await?;
//!
//! // Record an atomic sale: header + details + stock + audit log
//! let lines = vec![CartLine::new(medicine_id, 3, Money::from_cents(500))];
//! let sale_id = db.ledger().record_sale(None, user_id, &lines).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, DbSettings};
pub use error::{DbError, LedgerError};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::ledger::LedgerRepository;
pub use repository::medicine::MedicineRepository;
pub use repository::user::UserRepository;
