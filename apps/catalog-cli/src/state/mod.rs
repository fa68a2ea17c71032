//! # State Module
//!
//! State the commands run against.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  AppConfig::load()  ──► --db override ──► DbConfig                     │
//! │                                              │                          │
//! │                                              ▼                          │
//! │                                   DbState::open(config)                 │
//! │                                   (pool + migrations)                   │
//! │                                              │                          │
//! │          ┌──────────────────┬────────────────┼──────────────┐           │
//! │          ▼                  ▼                ▼              ▼           │
//! │   commands::product  commands::status  commands::seed   browse loop    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;

pub use config::{AppConfig, ConfigError, DATABASE_FILE_NAME};
pub use db::DbState;
