//! # Product Repository
//!
//! Query and mutation contract over the `product` table.
//!
//! ## Search Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How list(filter) Matches                             │
//! │                                                                         │
//! │  filter: "Widget"                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  instr(name, filter) > 0   (plain substring, exact characters)         │
//! │       │                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │ 1 | Widget A        │ ← match           │                           │
//! │  │ 2 | Widget B        │ ← match           │                           │
//! │  │ 3 | widget, small   │   (case differs)  │                           │
//! │  │ 4 | Gadget          │                   │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ORDER BY name, id  → [Widget A, Widget B]                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `instr` compares characters exactly and ignores collation, so matching is
//! always case-sensitive and `%` and `_` in the filter are literal.
//!
//! ## Readiness
//! Every call checks the migration state first and fails with
//! `DbError::NotReady` unless it is `Ready`. A repository obtained earlier
//! stops working as soon as a later migration run starts or fails.

use sqlx::SqlitePool;
use tokio::sync::watch;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::migrations::MigrationState;
use crate::schema::PRODUCT;
use catalog_core::{Product, ProductId};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products()?;
///
/// let id = repo.insert("Widget A").await?;
/// let found = repo.get_by_id(id).await?;      // Some(product)
/// let widgets = repo.list("Widget").await?;   // ordered by name
/// repo.delete_by_id(id).await?;               // true, then false
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    migrations: watch::Receiver<MigrationState>,
}

impl ProductRepository {
    /// Creates a new ProductRepository bound to a migration state channel.
    ///
    /// Obtained through `Database::products()`.
    pub(crate) fn new(pool: SqlitePool, migrations: watch::Receiver<MigrationState>) -> Self {
        ProductRepository { pool, migrations }
    }

    fn ensure_ready(&self) -> DbResult<()> {
        let state = self.migrations.borrow();
        if state.is_ready() {
            Ok(())
        } else {
            Err(DbError::NotReady(state.clone()))
        }
    }

    /// Lists products whose name contains `filter`, ascending by name.
    ///
    /// ## Arguments
    /// * `filter` - Substring to look for; empty matches every product
    ///
    /// ## Returns
    /// A snapshot of matching rows. Empty when nothing matches. Ties on name
    /// are broken by id so the order is stable.
    pub async fn list(&self, filter: &str) -> DbResult<Vec<Product>> {
        self.ensure_ready()?;
        debug!(filter = %filter, "Listing products");

        let sql = format!(
            "SELECT {} FROM {} WHERE ?1 = '' OR instr(name, ?1) > 0 ORDER BY name ASC, id ASC",
            PRODUCT.column_list(),
            PRODUCT.name
        );
        let products: Vec<Product> = sqlx::query_as(&sql)
            .bind(filter)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "List returned products");
        Ok(products)
    }

    /// Inserts a product and returns its newly assigned id.
    ///
    /// ## Arguments
    /// * `name` - Stored as given; the store does not validate content
    pub async fn insert(&self, name: &str) -> DbResult<ProductId> {
        self.ensure_ready()?;
        debug!(name = %name, "Inserting product");

        let result = sqlx::query("INSERT INTO product (name) VALUES (?1)")
            .bind(name)
            .execute(&self.pool)
            .await?;

        let id = ProductId::new(result.last_insert_rowid());
        debug!(id = %id, "Product inserted");
        Ok(id)
    }

    /// Gets a product by its id.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - No such id (not an error)
    pub async fn get_by_id(&self, id: ProductId) -> DbResult<Option<Product>> {
        self.ensure_ready()?;

        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?1",
            PRODUCT.column_list(),
            PRODUCT.name
        );
        let product: Option<Product> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Deletes a product by its id.
    ///
    /// ## Returns
    /// * `Ok(true)` - A row was removed
    /// * `Ok(false)` - No such id; nothing changed
    pub async fn delete_by_id(&self, id: ProductId) -> DbResult<bool> {
        self.ensure_ready()?;
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM product WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        self.ensure_ready()?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig, Migration, MIGRATIONS};

    async fn repo() -> ProductRepository {
        Database::new(DbConfig::in_memory())
            .await
            .unwrap()
            .products()
            .unwrap()
    }

    fn names(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_widget_scenario() {
        let repo = repo().await;

        let a = repo.insert("Widget A").await.unwrap();
        let b = repo.insert("Widget B").await.unwrap();
        assert_eq!(a, ProductId::new(1));
        assert_eq!(b, ProductId::new(2));

        assert_eq!(
            repo.list("Widget").await.unwrap(),
            vec![Product::new(1, "Widget A"), Product::new(2, "Widget B")]
        );

        assert!(repo.delete_by_id(a).await.unwrap());

        assert_eq!(
            repo.list("Widget").await.unwrap(),
            vec![Product::new(2, "Widget B")]
        );
        assert_eq!(repo.get_by_id(a).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_insert_then_read_back() {
        let repo = repo().await;

        for name in ["Widget A", "", "  padded  ", "Ünïcødé ✓", "O'Reilly; DROP TABLE product"] {
            let id = repo.insert(name).await.unwrap();

            let fetched = repo.get_by_id(id).await.unwrap().unwrap();
            assert_eq!(fetched.name, name);

            let listed = repo.list("").await.unwrap();
            assert_eq!(listed.iter().filter(|p| p.id == id).count(), 1);
        }
    }

    #[tokio::test]
    async fn test_empty_filter_lists_all_sorted() {
        let repo = repo().await;
        for name in ["pear", "Apple", "banana", "apple"] {
            repo.insert(name).await.unwrap();
        }

        let all = repo.list("").await.unwrap();

        // BINARY collation: uppercase sorts before lowercase
        assert_eq!(names(&all), vec!["Apple", "apple", "banana", "pear"]);
    }

    #[tokio::test]
    async fn test_filter_is_case_sensitive_substring() {
        let repo = repo().await;
        for name in ["Widget A", "widget, small", "Gadget", "Big Widget"] {
            repo.insert(name).await.unwrap();
        }

        assert_eq!(
            names(&repo.list("Widget").await.unwrap()),
            vec!["Big Widget", "Widget A"]
        );
        assert_eq!(
            names(&repo.list("dget").await.unwrap()),
            vec!["Big Widget", "Gadget", "Widget A", "widget, small"]
        );
        assert!(repo.list("Sprocket").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filter_treats_wildcards_literally() {
        let repo = repo().await;
        for name in ["50% off", "5_0 pack", "500 pack"] {
            repo.insert(name).await.unwrap();
        }

        assert_eq!(names(&repo.list("%").await.unwrap()), vec!["50% off"]);
        assert_eq!(names(&repo.list("_").await.unwrap()), vec!["5_0 pack"]);
    }

    #[tokio::test]
    async fn test_equal_names_ordered_by_id() {
        let repo = repo().await;
        let first = repo.insert("Same").await.unwrap();
        let second = repo.insert("Same").await.unwrap();

        let listed = repo.list("Same").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first);
        assert_eq!(listed[1].id, second);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let repo = repo().await;
        let id = repo.insert("Widget A").await.unwrap();
        repo.insert("Widget B").await.unwrap();

        assert!(repo.delete_by_id(id).await.unwrap());
        let after_once = repo.list("").await.unwrap();

        assert!(!repo.delete_by_id(id).await.unwrap());
        assert_eq!(repo.list("").await.unwrap(), after_once);
        assert_eq!(repo.get_by_id(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_an_error() {
        let repo = repo().await;

        assert_eq!(repo.get_by_id(ProductId::new(999)).await.unwrap(), None);
        assert!(!repo.delete_by_id(ProductId::new(999)).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let repo = repo().await;
        repo.insert("first").await.unwrap();
        let last = repo.insert("second").await.unwrap();

        repo.delete_by_id(last).await.unwrap();
        let next = repo.insert("third").await.unwrap();

        assert!(next > last);
        assert_eq!(next, ProductId::new(3));
    }

    #[tokio::test]
    async fn test_held_repository_refused_after_failed_run() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products().unwrap();
        repo.insert("Widget A").await.unwrap();

        let mut upgraded: Vec<Migration> = MIGRATIONS.to_vec();
        upgraded.push(Migration::new(3, "broken", "NOT SQL"));
        assert!(db.run_migrations_with(&upgraded).await.is_err());

        assert!(matches!(
            repo.insert("Widget B").await,
            Err(DbError::NotReady(MigrationState::Failed(_)))
        ));
        assert!(matches!(
            repo.list("").await,
            Err(DbError::NotReady(MigrationState::Failed(_)))
        ));
        assert!(matches!(
            repo.get_by_id(ProductId::new(1)).await,
            Err(DbError::NotReady(_))
        ));
        assert!(matches!(
            repo.delete_by_id(ProductId::new(1)).await,
            Err(DbError::NotReady(_))
        ));
        assert!(matches!(repo.count().await, Err(DbError::NotReady(_))));

        // A successful run reopens the same handle.
        db.run_migrations().await.unwrap();
        assert_eq!(repo.list("").await.unwrap(), vec![Product::new(1, "Widget A")]);
    }
}
