//! # Database Pool Management
//!
//! Connection pool creation and the `Database` handle the controller owns.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Lifecycle                                 │
//! │                                                                         │
//! │  Process start                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(path) ← Configure pool settings                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Open pool + run migrations              │
//! │       │                                                                 │
//! │       ├── migrations Failed → Err(DbError::MigrationFailed)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  db.products()? ← refused with NotReady unless migrations are Ready    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  db.close().await ← on shutdown                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! File databases use WAL journaling with NORMAL synchronous: committed
//! writes survive a process crash and readers never block the writer.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::SqlitePool;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations::{
    self, Migration, MigrationReport, MigrationRunner, MigrationState, MIGRATIONS,
};
use crate::repository::product::ProductRepository;
use crate::schema;

/// Path value that selects a private in-memory database.
const IN_MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/catalog.db")
///     .max_connections(2)
///     .run_migrations(false);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// How long to wait for a free connection.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether `Database::new` runs the built-in migrations.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a configuration for the file at `path` (created if missing).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// The database lives as long as its single pooled connection, so the
    /// pool never retires it.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY_PATH),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }

    /// True for [`DbConfig::in_memory`] configurations.
    pub fn is_in_memory(&self) -> bool {
        self.database_path == Path::new(IN_MEMORY_PATH)
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
        };

        Ok(options
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to one open catalog database.
///
/// Cheap to clone: clones share the pool and the migration state. Create one
/// per process, hand it to the controller, and `close()` it on shutdown.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    migrations: Arc<MigrationRunner>,
}

impl Database {
    /// Opens the database and, if configured, migrates it.
    ///
    /// ## Returns
    /// * `Ok(Database)` - pool open; `Ready` if migrations ran
    /// * `Err(DbError::ConnectionFailed)` - file could not be opened
    /// * `Err(DbError::MigrationFailed)` - schema could not be brought up to date
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let connect_options = config.connect_options()?;
        debug!("Connection options configured");

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout);

        pool_options = if config.is_in_memory() {
            pool_options
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            pool_options.idle_timeout(Some(config.idle_timeout))
        };

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database {
            pool,
            migrations: Arc::new(MigrationRunner::new()),
        };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies the built-in migrations and verifies the `product` table.
    ///
    /// Idempotent: a second call applies nothing and stays `Ready`.
    pub async fn run_migrations(&self) -> DbResult<MigrationReport> {
        self.migrations
            .apply_and_verify(&self.pool, MIGRATIONS, &[&schema::PRODUCT])
            .await
    }

    /// Applies a caller-supplied migration list.
    pub async fn run_migrations_with(&self, migrations: &[Migration]) -> DbResult<MigrationReport> {
        self.migrations.apply(&self.pool, migrations).await
    }

    /// Current migration state.
    pub fn migration_state(&self) -> MigrationState {
        self.migrations.state()
    }

    /// Receiver notified on each migration state change.
    pub fn subscribe_migrations(&self) -> watch::Receiver<MigrationState> {
        self.migrations.subscribe()
    }

    /// Waits for the in-flight (or next) migration run to finish.
    pub async fn wait_until_ready(&self) -> DbResult<()> {
        self.migrations.wait_for_outcome().await
    }

    /// Returns (declared, applied) migration counts.
    pub async fn migration_status(&self) -> DbResult<(usize, usize)> {
        migrations::migration_status(&self.pool).await
    }

    /// Returns the catalog store.
    ///
    /// The returned repository re-checks the migration state on every call.
    ///
    /// ## Errors
    /// `DbError::NotReady` while migrations are Pending, Running or Failed.
    pub fn products(&self) -> DbResult<ProductRepository> {
        match self.migrations.state() {
            MigrationState::Ready => Ok(ProductRepository::new(
                self.pool.clone(),
                self.migrations.subscribe(),
            )),
            other => Err(DbError::NotReady(other)),
        }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes the pool. Later store calls fail with `ConnectionFailed`.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);
        assert_eq!(db.migration_state(), MigrationState::Ready);
        assert_eq!(db.migration_status().await.unwrap(), (2, 2));
    }

    #[tokio::test]
    async fn test_config_builder() {
        let config = DbConfig::new("/tmp/catalog.db")
            .max_connections(10)
            .min_connections(2)
            .run_migrations(false);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert!(!config.run_migrations);
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }

    #[tokio::test]
    async fn test_store_blocked_until_ready() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();

        assert!(matches!(
            db.products(),
            Err(DbError::NotReady(MigrationState::Pending))
        ));

        db.run_migrations().await.unwrap();
        assert!(db.products().is_ok());
    }

    #[tokio::test]
    async fn test_store_blocked_after_failure() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();
        let broken = [Migration::new(1, "broken", "NOT SQL AT ALL")];

        assert!(db.run_migrations_with(&broken).await.is_err());

        assert!(matches!(
            db.products(),
            Err(DbError::NotReady(MigrationState::Failed(_)))
        ));
    }

    #[tokio::test]
    async fn test_wait_until_ready_resolves_after_run() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();

        let waiter = {
            let db = db.clone();
            tokio::spawn(async move { db.wait_until_ready().await })
        };

        db.run_migrations().await.unwrap();

        waiter.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_run_does_not_stay_running() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();

        // Hold the only connection so the run blocks on `begin`.
        let conn = db.pool().acquire().await.unwrap();
        let timed_out = tokio::time::timeout(Duration::from_millis(100), db.run_migrations())
            .await
            .is_err();
        assert!(timed_out);

        assert_eq!(
            db.migration_state(),
            MigrationState::Failed(migrations::CANCELLED_REASON.to_string())
        );
        assert!(matches!(
            db.wait_until_ready().await,
            Err(DbError::NotReady(MigrationState::Failed(_)))
        ));

        drop(conn);
        db.run_migrations().await.unwrap();
        assert!(db.products().is_ok());
    }

    #[tokio::test]
    async fn test_closed_pool_surfaces_error() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let products = db.products().unwrap();
        db.close().await;

        let err = products.list("").await.unwrap_err();
        assert!(matches!(err, DbError::ConnectionFailed(_)));
    }
}
