//! # Database Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (in catalog-cli) ← code + message                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  User sees a message, process exit code reflects the category          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An absent product is NOT an error at this layer. `get_by_id` returns
//! `Option` and `delete_by_id` returns whether a row was removed.

use thiserror::Error;

use crate::migrations::MigrationState;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created or opened
    /// - File permissions issue
    /// - Pool already closed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A schema step could not be applied, or the recorded history does not
    /// match the supplied migration list. Fatal for the session.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// The catalog store was requested before migrations reached `Ready`.
    #[error("Catalog store is not ready (migrations {0})")]
    NotReady(MigrationState),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a MigrationFailed error.
    pub fn migration(reason: impl Into<String>) -> Self {
        DbError::MigrationFailed(reason.into())
    }

    /// True for failures of the schema lifecycle (the session cannot proceed).
    pub fn is_migration_failure(&self) -> bool {
        matches!(self, DbError::MigrationFailed(_) | DbError::NotReady(_))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database       → DbError::QueryFailed
/// sqlx::Error::RowNotFound    → DbError::QueryFailed (fetch_one misuse)
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed     → DbError::ConnectionFailed
/// sqlx::Error::Io             → DbError::ConnectionFailed
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => DbError::QueryFailed(db_err.message().to_string()),

            sqlx::Error::RowNotFound => {
                DbError::QueryFailed("query returned no rows".to_string())
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            sqlx::Error::Io(io_err) => DbError::ConnectionFailed(io_err.to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_map_to_store_failures() {
        assert!(matches!(
            DbError::from(sqlx::Error::PoolTimedOut),
            DbError::PoolExhausted
        ));
        assert!(matches!(
            DbError::from(sqlx::Error::PoolClosed),
            DbError::ConnectionFailed(_)
        ));
    }

    #[test]
    fn test_row_not_found_is_not_masked_as_absence() {
        let err = DbError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::QueryFailed(_)));
        assert!(!err.is_migration_failure());
    }

    #[test]
    fn test_not_ready_message() {
        let err = DbError::NotReady(MigrationState::Pending);
        assert_eq!(err.to_string(), "Catalog store is not ready (migrations pending)");
        assert!(err.is_migration_failure());
    }
}
