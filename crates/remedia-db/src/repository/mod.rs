//! # Repository Module
//!
//! Database repository implementations for Remedia.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Caller                                                                │
//! │       │                                                                 │
//! │       │  db.ledger().record_sale(None, user_id, &lines)                │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  LedgerRepository                                                      │
//! │  ├── record_sale(&self, customer, user, lines)                         │
//! │  ├── record_purchase(&self, user, lines)                               │
//! │  ├── delete_sales(&self, ids)                                          │
//! │  └── list_sales(&self)                                                 │
//! │       │                                                                 │
//! │       │  SQL inside one transaction                                    │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • SQL is isolated in one place                                        │
//! │  • Transactions never leak out of the repository                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`medicine::MedicineRepository`] - Medicine CRUD and stock reads
//! - [`user::UserRepository`] - Login, user management, role mapping
//! - [`ledger::LedgerRepository`] - Atomic sales/purchases/reversals and listings

pub mod ledger;
pub mod medicine;
pub mod user;
