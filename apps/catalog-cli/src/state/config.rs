//! # Configuration State
//!
//! Controller configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Command-line flags (`--db`)
//! 2. Environment variables (`CATALOG_*`)
//! 3. Defaults (platform data directory)
//!
//! Read-only after startup.

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Serialize;

use catalog_db::DbConfig;

/// File name of the catalog database inside the data directory.
pub const DATABASE_FILE_NAME: &str = "catalog.db";

/// Controller configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Explicit database file; `None` means the platform data directory.
    pub database_path: Option<PathBuf>,

    /// Pool size handed to `DbConfig`.
    /// Default: 5
    pub max_connections: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: None,
            max_connections: 5,
        }
    }
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// ## Environment Variables
    /// - `CATALOG_DB_PATH`: database file to open
    /// - `CATALOG_MAX_CONNECTIONS`: pool size (positive integer)
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();

        let max_connections = match var("CATALOG_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::InvalidValue("CATALOG_MAX_CONNECTIONS".to_string()))?,
            None => defaults.max_connections,
        };

        let database_path = var("CATALOG_DB_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(AppConfig {
            database_path,
            max_connections,
        })
    }

    /// Applies the `--db` flag, which wins over the environment.
    pub fn with_database_path(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.database_path = path;
        }
        self
    }

    /// Resolves the database file, creating the data directory for the default.
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/com.catalog.catalog/catalog.db`
    /// - **Windows**: `%APPDATA%\catalog\catalog\data\catalog.db`
    /// - **Linux**: `~/.local/share/catalog/catalog.db`
    pub fn resolve_database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }

        let dirs = ProjectDirs::from("com", "catalog", "catalog")
            .ok_or(ConfigError::NoDataDirectory)?;
        let data_dir = dirs.data_dir();

        std::fs::create_dir_all(data_dir).map_err(|source| ConfigError::DataDirectory {
            path: data_dir.display().to_string(),
            source,
        })?;

        Ok(data_dir.join(DATABASE_FILE_NAME))
    }

    /// Database settings for `Database::new`.
    pub fn db_config(&self) -> Result<DbConfig, ConfigError> {
        Ok(DbConfig::new(self.resolve_database_path()?).max_connections(self.max_connections))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Could not determine the app data directory")]
    NoDataDirectory,

    #[error("Could not create data directory {path}: {source}")]
    DataDirectory {
        path: String,
        source: std::io::Error,
    },
}
