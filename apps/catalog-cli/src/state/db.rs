//! # Database State
//!
//! Wraps the `Database` handle the commands run against.
//!
//! ## Usage in Commands
//! ```rust,ignore
//! pub async fn list_products(db: &DbState, search: &str) -> Result<Vec<ProductDto>, ApiError> {
//!     let products = db.products()?.list(search).await?;
//!     Ok(products.into_iter().map(ProductDto::from).collect())
//! }
//! ```

use catalog_db::{Database, DbConfig, DbResult, ProductRepository};

/// Wrapper around `Database` owned by the controller for one process run.
#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    /// Creates a new DbState wrapping the database connection.
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Opens (and migrates) the database described by `config`.
    pub async fn open(config: DbConfig) -> DbResult<Self> {
        Ok(DbState::new(Database::new(config).await?))
    }

    /// Returns a reference to the inner Database.
    pub fn inner(&self) -> &Database {
        &self.db
    }

    /// Catalog store; refused until migrations are Ready.
    pub fn products(&self) -> DbResult<ProductRepository> {
        self.db.products()
    }

    /// Closes the pool on shutdown.
    pub async fn close(&self) {
        self.db.close().await;
    }

    /// Fresh in-memory catalog for unit tests.
    #[cfg(test)]
    pub async fn in_memory() -> Self {
        DbState::open(DbConfig::in_memory())
            .await
            .expect("in-memory database")
    }
}
