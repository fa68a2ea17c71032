//! # Database Migrations
//!
//! Versioned schema steps and the runner that applies them.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Process start                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Pending ──► Running        (BEGIN)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Read _catalog_migrations                                              │
//! │       │                                                                 │
//! │       ├── recorded version unknown to this build?   → Failed           │
//! │       ├── recorded checksum differs from the step?  → Failed           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1 create_product       ✓ (already applied, skipped)                   │
//! │  2 index_product_name   ⬜ (pending → execute + record)                │
//! │       │                                                                 │
//! │       ├── any step errors?  → ROLLBACK → Failed                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ──► Ready                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All pending steps share one transaction, so a failure leaves the file at
//! its last fully applied version with no partial schema.
//!
//! ## Adding New Migrations
//!
//! 1. Add the DDL to [`crate::schema`] and a new entry at the end of
//!    [`MIGRATIONS`] with the next version number
//! 2. **NEVER** modify a shipped migration - the runner rejects checksum drift
//! 3. Update the [`crate::schema::TableDef`] declarations to match

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::{DbError, DbResult};
use crate::schema::{self, TableDef};

/// Table recording which versions have been applied.
const MIGRATIONS_TABLE_DDL: &str = "
CREATE TABLE IF NOT EXISTS _catalog_migrations (
    version INTEGER PRIMARY KEY,
    description TEXT NOT NULL,
    checksum BLOB NOT NULL,
    applied_at TEXT NOT NULL
);
";

// =============================================================================
// Migration Steps
// =============================================================================

/// One versioned schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    /// Strictly increasing, positive.
    pub version: i64,
    pub description: &'static str,
    /// May contain several statements.
    pub sql: &'static str,
}

impl Migration {
    pub const fn new(version: i64, description: &'static str, sql: &'static str) -> Self {
        Migration {
            version,
            description,
            sql,
        }
    }

    /// BLAKE3 digest of the step's SQL.
    pub fn checksum(&self) -> Vec<u8> {
        blake3::hash(self.sql.as_bytes()).as_bytes().to_vec()
    }
}

/// The catalog's built-in schema history.
pub const MIGRATIONS: &[Migration] = &[
    Migration::new(1, "create_product", schema::PRODUCT_TABLE_DDL),
    Migration::new(2, "index_product_name", schema::PRODUCT_NAME_INDEX_DDL),
];

/// A row of `_catalog_migrations`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AppliedMigration {
    pub version: i64,
    pub description: String,
    pub checksum: Vec<u8>,
    pub applied_at: DateTime<Utc>,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Versions executed by this run, in order.
    pub applied: Vec<i64>,
    /// Steps that were already recorded and therefore skipped.
    pub skipped: usize,
}

impl MigrationReport {
    /// True when the file was already at the latest version.
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

// =============================================================================
// Migration State
// =============================================================================

/// Lifecycle of a migration run.
///
/// ```text
/// Pending ──start──► Running ──all steps ok──► Ready
///                       │
///                       └────any step fails──► Failed(reason)
/// ```
///
/// `Ready` and `Failed` end a run; applying again starts a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationState {
    Pending,
    Running,
    Ready,
    Failed(String),
}

impl MigrationState {
    /// Ready or Failed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MigrationState::Ready | MigrationState::Failed(_))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, MigrationState::Ready)
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationState::Pending => write!(f, "pending"),
            MigrationState::Running => write!(f, "running"),
            MigrationState::Ready => write!(f, "ready"),
            MigrationState::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

// =============================================================================
// Runner
// =============================================================================

/// Applies migration lists and publishes its state.
///
/// The state lives in a `watch` channel so the controller can both poll it
/// ([`MigrationRunner::state`]) and wait on it ([`MigrationRunner::wait_for_outcome`]).
#[derive(Debug)]
pub struct MigrationRunner {
    state: watch::Sender<MigrationState>,
}

impl Default for MigrationRunner {
    fn default() -> Self {
        MigrationRunner::new()
    }
}

impl MigrationRunner {
    /// Creates a runner in the `Pending` state.
    pub fn new() -> Self {
        let (state, _) = watch::channel(MigrationState::Pending);
        MigrationRunner { state }
    }

    /// Current state.
    pub fn state(&self) -> MigrationState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every transition.
    pub fn subscribe(&self) -> watch::Receiver<MigrationState> {
        self.state.subscribe()
    }

    /// Waits until the current run ends.
    ///
    /// Returns `Ok(())` on `Ready` and `DbError::NotReady` carrying the
    /// failure otherwise.
    pub async fn wait_for_outcome(&self) -> DbResult<()> {
        let mut rx = self.state.subscribe();
        let outcome = rx
            .wait_for(MigrationState::is_terminal)
            .await
            .map_err(|_| DbError::Internal("migration state channel closed".to_string()))?
            .clone();

        match outcome {
            MigrationState::Ready => Ok(()),
            other => Err(DbError::NotReady(other)),
        }
    }

    /// Applies every step of `migrations` not yet recorded in the file.
    pub async fn apply(
        &self,
        pool: &SqlitePool,
        migrations: &[Migration],
    ) -> DbResult<MigrationReport> {
        self.apply_and_verify(pool, migrations, &[]).await
    }

    /// Like [`apply`](Self::apply), then checks `tables` against the migrated
    /// schema inside the same transaction. A mismatch rolls everything back.
    pub async fn apply_and_verify(
        &self,
        pool: &SqlitePool,
        migrations: &[Migration],
        tables: &[&TableDef],
    ) -> DbResult<MigrationReport> {
        let started = self.state.send_if_modified(|state| {
            if *state == MigrationState::Running {
                false
            } else {
                *state = MigrationState::Running;
                true
            }
        });
        if !started {
            return Err(DbError::migration("a migration run is already in progress"));
        }

        let guard = RunGuard {
            state: &self.state,
            finished: false,
        };

        info!(declared = migrations.len(), "Running database migrations");

        match run(pool, migrations, tables).await {
            Ok(report) => {
                info!(
                    applied = report.applied.len(),
                    skipped = report.skipped,
                    "All migrations applied successfully"
                );
                guard.finish(MigrationState::Ready);
                Ok(report)
            }
            Err(err) => {
                let err = match err {
                    DbError::MigrationFailed(_) => err,
                    other => DbError::migration(other.to_string()),
                };
                error!(error = %err, "Migrations failed");
                guard.finish(MigrationState::Failed(err.to_string()));
                Err(err)
            }
        }
    }
}

/// Reason recorded when a run's future is dropped before it finishes.
pub const CANCELLED_REASON: &str = "migration run cancelled";

/// Publishes the outcome of one run. Dropped unfinished (the caller's future
/// was cancelled), it moves the state from `Running` to `Failed`. The open
/// transaction rolls back when its connection returns to the pool.
struct RunGuard<'a> {
    state: &'a watch::Sender<MigrationState>,
    finished: bool,
}

impl RunGuard<'_> {
    fn finish(mut self, outcome: MigrationState) {
        self.finished = true;
        self.state.send_replace(outcome);
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!("Migration run dropped before completion");
            self.state
                .send_replace(MigrationState::Failed(CANCELLED_REASON.to_string()));
        }
    }
}

/// Runs `migrations` with a throwaway runner.
///
/// ## Example
/// ```rust,ignore
/// let report = run_migrations(&pool, MIGRATIONS).await?;
/// assert!(report.is_noop()); // second start
/// ```
pub async fn run_migrations(
    pool: &SqlitePool,
    migrations: &[Migration],
) -> DbResult<MigrationReport> {
    MigrationRunner::new().apply(pool, migrations).await
}

async fn run(
    pool: &SqlitePool,
    migrations: &[Migration],
    tables: &[&TableDef],
) -> DbResult<MigrationReport> {
    validate_order(migrations)?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| DbError::migration(format!("could not begin transaction: {}", e)))?;

    match run_in_transaction(&mut tx, migrations, tables).await {
        Ok(report) => {
            tx.commit()
                .await
                .map_err(|e| DbError::migration(format!("commit failed: {}", e)))?;
            Ok(report)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback after failed migration also failed");
            }
            Err(err)
        }
    }
}

async fn run_in_transaction(
    conn: &mut SqliteConnection,
    migrations: &[Migration],
    tables: &[&TableDef],
) -> DbResult<MigrationReport> {
    sqlx::raw_sql(MIGRATIONS_TABLE_DDL)
        .execute(&mut *conn)
        .await
        .map_err(|e| DbError::migration(format!("could not create migration table: {}", e)))?;

    let applied: Vec<AppliedMigration> = sqlx::query_as(
        "SELECT version, description, checksum, applied_at FROM _catalog_migrations ORDER BY version",
    )
    .fetch_all(&mut *conn)
    .await?;

    check_history(&applied, migrations)?;

    let recorded: HashSet<i64> = applied.iter().map(|m| m.version).collect();
    let mut report = MigrationReport::default();

    for migration in migrations {
        if recorded.contains(&migration.version) {
            debug!(version = migration.version, "Migration already applied");
            report.skipped += 1;
            continue;
        }

        info!(
            version = migration.version,
            description = migration.description,
            "Applying migration"
        );

        sqlx::raw_sql(migration.sql)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                DbError::migration(format!(
                    "{} ({}): {}",
                    migration.version, migration.description, e
                ))
            })?;

        sqlx::query(
            "INSERT INTO _catalog_migrations (version, description, checksum, applied_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(migration.version)
        .bind(migration.description)
        .bind(migration.checksum())
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        report.applied.push(migration.version);
    }

    for table in tables {
        schema::verify_table(&mut *conn, table).await?;
    }

    Ok(report)
}

/// Versions must be positive and strictly increasing.
fn validate_order(migrations: &[Migration]) -> DbResult<()> {
    let mut previous = 0;
    for migration in migrations {
        if migration.version <= previous {
            return Err(DbError::migration(format!(
                "migration {} ({}) is out of order: versions must be positive and strictly increasing",
                migration.version, migration.description
            )));
        }
        previous = migration.version;
    }
    Ok(())
}

/// Every recorded migration must still be declared, unchanged.
fn check_history(applied: &[AppliedMigration], migrations: &[Migration]) -> DbResult<()> {
    for record in applied {
        let declared = migrations
            .iter()
            .find(|m| m.version == record.version)
            .ok_or_else(|| {
                DbError::migration(format!(
                    "database has migration {} ({}) which this build does not know",
                    record.version, record.description
                ))
            })?;

        if declared.checksum() != record.checksum {
            return Err(DbError::migration(format!(
                "migration {} ({}) was modified after it was applied",
                record.version, record.description
            )));
        }
    }
    Ok(())
}

// =============================================================================
// Diagnostics
// =============================================================================

/// Returns (declared built-in migrations, applied migrations).
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied = applied_migrations(pool).await?;
    Ok((MIGRATIONS.len(), applied.len()))
}

/// Lists recorded migrations, oldest first. Empty for a fresh file.
pub async fn applied_migrations(pool: &SqlitePool) -> DbResult<Vec<AppliedMigration>> {
    let exists: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_catalog_migrations'",
    )
    .fetch_one(pool)
    .await?;

    if exists == 0 {
        return Ok(Vec::new());
    }

    let applied: Vec<AppliedMigration> = sqlx::query_as(
        "SELECT version, description, checksum, applied_at FROM _catalog_migrations ORDER BY version",
    )
    .fetch_all(pool)
    .await?;

    Ok(applied)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    async fn table_exists(pool: &SqlitePool, name: &str) -> bool {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        )
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap();
        count > 0
    }

    const BROKEN: Migration = Migration::new(2, "broken", "CREATE TABLE oops (");

    #[tokio::test]
    async fn test_fresh_database_applies_everything() {
        let pool = memory_pool().await;
        let runner = MigrationRunner::new();
        assert_eq!(runner.state(), MigrationState::Pending);

        let report = runner.apply(&pool, MIGRATIONS).await.unwrap();

        assert_eq!(report.applied, vec![1, 2]);
        assert_eq!(report.skipped, 0);
        assert_eq!(runner.state(), MigrationState::Ready);
        assert!(table_exists(&pool, "product").await);
    }

    #[tokio::test]
    async fn test_second_run_is_noop() {
        let pool = memory_pool().await;
        let runner = MigrationRunner::new();

        runner.apply(&pool, MIGRATIONS).await.unwrap();
        let report = runner.apply(&pool, MIGRATIONS).await.unwrap();

        assert!(report.is_noop());
        assert_eq!(report.skipped, 2);
        assert_eq!(runner.state(), MigrationState::Ready);
        assert_eq!(applied_migrations(&pool).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_only_new_steps_run() {
        let pool = memory_pool().await;

        run_migrations(&pool, &MIGRATIONS[..1]).await.unwrap();
        let report = run_migrations(&pool, MIGRATIONS).await.unwrap();

        assert_eq!(report.applied, vec![2]);
        assert_eq!(report.skipped, 1);
    }

    #[tokio::test]
    async fn test_failed_step_leaves_no_partial_schema() {
        let pool = memory_pool().await;
        let runner = MigrationRunner::new();

        let err = runner
            .apply(&pool, &[MIGRATIONS[0], BROKEN])
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::MigrationFailed(_)));
        assert!(matches!(runner.state(), MigrationState::Failed(_)));
        // step 1 succeeded inside the transaction but was rolled back with it
        assert!(!table_exists(&pool, "product").await);
        assert!(applied_migrations(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_last_applied_version() {
        let pool = memory_pool().await;
        run_migrations(&pool, &MIGRATIONS[..1]).await.unwrap();

        let result = run_migrations(&pool, &[MIGRATIONS[0], BROKEN]).await;

        assert!(result.is_err());
        assert!(table_exists(&pool, "product").await);
        let applied = applied_migrations(&pool).await.unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].version, 1);
        assert_eq!(applied[0].description, "create_product");
    }

    #[tokio::test]
    async fn test_rejects_modified_migration() {
        let pool = memory_pool().await;
        run_migrations(&pool, &MIGRATIONS[..1]).await.unwrap();

        let edited = Migration::new(1, "create_product", "CREATE TABLE product (id INTEGER)");
        let err = run_migrations(&pool, &[edited]).await.unwrap_err();

        assert!(err.to_string().contains("modified"));
    }

    #[tokio::test]
    async fn test_rejects_unknown_applied_version() {
        let pool = memory_pool().await;
        run_migrations(&pool, MIGRATIONS).await.unwrap();

        let err = run_migrations(&pool, &MIGRATIONS[..1]).await.unwrap_err();

        assert!(err.to_string().contains("does not know"));
    }

    #[tokio::test]
    async fn test_rejects_unordered_list() {
        let pool = memory_pool().await;
        let runner = MigrationRunner::new();

        let err = runner
            .apply(&pool, &[MIGRATIONS[1], MIGRATIONS[0]])
            .await
            .unwrap_err();

        assert!(err.to_string().contains("out of order"));
        assert!(matches!(runner.state(), MigrationState::Failed(_)));
        assert!(!table_exists(&pool, "_catalog_migrations").await);
    }

    #[tokio::test]
    async fn test_verification_failure_rolls_back() {
        let pool = memory_pool().await;
        let wrong = Migration::new(1, "create_product", "CREATE TABLE product (id INTEGER PRIMARY KEY)");

        let err = MigrationRunner::new()
            .apply_and_verify(&pool, &[wrong], &[&schema::PRODUCT])
            .await
            .unwrap_err();

        assert!(err.to_string().contains("product.name"));
        assert!(!table_exists(&pool, "product").await);
    }

    #[tokio::test]
    async fn test_wait_for_outcome_reports_failure() {
        let pool = memory_pool().await;
        let runner = MigrationRunner::new();

        let _ = runner.apply(&pool, &[BROKEN]).await;

        let err = runner.wait_for_outcome().await.unwrap_err();
        assert!(matches!(err, DbError::NotReady(MigrationState::Failed(_))));
    }

    #[tokio::test]
    async fn test_migration_status_counts() {
        let pool = memory_pool().await;
        assert_eq!(migration_status(&pool).await.unwrap(), (2, 0));

        run_migrations(&pool, MIGRATIONS).await.unwrap();
        assert_eq!(migration_status(&pool).await.unwrap(), (2, 2));
    }

    #[test]
    fn test_checksum_depends_on_sql() {
        let a = Migration::new(1, "a", "CREATE TABLE a (x)");
        let b = Migration::new(1, "a", "CREATE TABLE a (y)");
        assert_ne!(a.checksum(), b.checksum());
        assert_eq!(a.checksum(), a.checksum());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(MigrationState::Ready.to_string(), "ready");
        assert_eq!(
            MigrationState::Failed("boom".to_string()).to_string(),
            "failed: boom"
        );
        assert!(!MigrationState::Running.is_terminal());
    }
}
