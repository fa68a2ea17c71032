//! # API Error Type
//!
//! Unified error type for CLI commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Catalog CLI                        │
//! │                                                                         │
//! │  Command Function → Result<T, ApiError>                                │
//! │         │                                                               │
//! │         ├── DbError::MigrationFailed ─► MIGRATION_ERROR   (exit 3)     │
//! │         ├── DbError::QueryFailed ─────► DATABASE_ERROR    (exit 1)     │
//! │         ├── CoreError::ProductNotFound ► NOT_FOUND        (exit 4)     │
//! │         ├── ValidationError ──────────► VALIDATION_ERROR  (exit 5)     │
//! │         └── ConfigError ──────────────► CONFIG_ERROR      (exit 6)     │
//! │                                                                         │
//! │  stderr: "error: <message>"       stdout stays clean for --json        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is swallowed here: the detailed reason is logged and also kept in
//! the message the user sees.

use std::process::ExitCode;

use serde::Serialize;

use crate::state::ConfigError;
use catalog_core::{CoreError, ValidationError};
use catalog_db::DbError;

/// Error returned from CLI commands.
///
/// ## Serialization
/// With `--json` this is what gets printed on failure:
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Product not found: 7"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for command failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Database operation failed
    DatabaseError,

    /// Schema could not be brought up to date; nothing else can run
    MigrationError,

    /// Environment configuration is invalid
    ConfigError,

    /// Anything else (I/O on the terminal, serialization)
    Internal,
}

impl ErrorCode {
    /// Process exit status for this category.
    pub fn exit_status(&self) -> u8 {
        match self {
            ErrorCode::DatabaseError | ErrorCode::Internal => 1,
            ErrorCode::MigrationError => 3,
            ErrorCode::NotFound => 4,
            ErrorCode::ValidationError => 5,
            ErrorCode::ConfigError => 6,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// Exit code for the process.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code.exit_status())
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::MigrationFailed(reason) => {
                tracing::error!(%reason, "Database migration failed");
                ApiError::new(
                    ErrorCode::MigrationError,
                    format!("Database migration failed: {}", reason),
                )
            }
            DbError::NotReady(state) => ApiError::new(
                ErrorCode::MigrationError,
                format!("Catalog is not available (migrations {})", state),
            ),
            DbError::ConnectionFailed(reason) => {
                tracing::error!(%reason, "Database connection failed");
                ApiError::new(
                    ErrorCode::DatabaseError,
                    format!("Database connection failed: {}", reason),
                )
            }
            DbError::QueryFailed(reason) => {
                tracing::error!(%reason, "Database query failed");
                ApiError::new(
                    ErrorCode::DatabaseError,
                    format!("Database operation failed: {}", reason),
                )
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(reason) => {
                tracing::error!(%reason, "Internal database error");
                ApiError::new(
                    ErrorCode::DatabaseError,
                    format!("Database operation failed: {}", reason),
                )
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", id),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
