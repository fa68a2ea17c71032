//! # catalog-db: Storage Layer for the Product Catalog
//!
//! Owns the SQLite file: its schema, the migrations that build it, and the
//! only code allowed to read or write `product` rows.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Catalog Data Flow                                │
//! │                                                                         │
//! │  catalog-cli command (list "Widget")                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    catalog-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repository   │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (product.rs)  │    │  + schema    │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepo   │    │ 1 create     │  │   │
//! │  │   │ Migration     │    │ list/insert/  │    │ 2 index name │  │   │
//! │  │   │ state (watch) │    │ get/delete    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database File                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`schema`] - Declared shape of the `product` table
//! - [`migrations`] - Versioned schema steps and the runner that applies them
//! - [`pool`] - Connection pool and the `Database` handle
//! - [`repository`] - The catalog store
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use catalog_db::{Database, DbConfig};
//!
//! // Opens the file and runs the built-in migrations
//! let db = Database::new(DbConfig::new("catalog.db")).await?;
//!
//! let products = db.products()?;
//! let id = products.insert("Widget A").await?;
//! let matches = products.list("Widget").await?;
//!
//! db.close().await;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod schema;

pub use error::{DbError, DbResult};
pub use migrations::{Migration, MigrationReport, MigrationRunner, MigrationState, MIGRATIONS};
pub use pool::{Database, DbConfig};

pub use repository::product::ProductRepository;
