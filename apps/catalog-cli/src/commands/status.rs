//! # Status Command
//!
//! Migration state and schema history for `catalog status`.

use serde::Serialize;

use crate::error::ApiError;
use crate::state::DbState;
use catalog_db::migrations::applied_migrations;

/// One recorded migration step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedMigrationDto {
    pub version: i64,
    pub description: String,
    /// RFC 3339 timestamp
    pub applied_at: String,
}

/// Snapshot of the database for `catalog status`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDto {
    /// "pending", "running", "ready" or "failed: ..."
    pub state: String,
    pub healthy: bool,
    pub declared_migrations: usize,
    pub applied_migrations: usize,
    pub history: Vec<AppliedMigrationDto>,
    /// `None` unless the store is open for business.
    pub product_count: Option<i64>,
}

/// Gathers the status snapshot.
pub async fn get_status(db: &DbState) -> Result<StatusDto, ApiError> {
    let database = db.inner();
    let (declared, applied) = database.migration_status().await?;

    let history = applied_migrations(database.pool())
        .await?
        .into_iter()
        .map(|m| AppliedMigrationDto {
            version: m.version,
            description: m.description,
            applied_at: m.applied_at.to_rfc3339(),
        })
        .collect();

    let product_count = match db.products() {
        Ok(products) => Some(products.count().await?),
        Err(_) => None,
    };

    Ok(StatusDto {
        state: database.migration_state().to_string(),
        healthy: database.health_check().await,
        declared_migrations: declared,
        applied_migrations: applied,
        history,
        product_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_db::{Database, DbConfig};

    #[tokio::test]
    async fn test_status_when_ready() {
        let db = DbState::in_memory().await;
        db.products().unwrap().insert("Widget A").await.unwrap();

        let status = get_status(&db).await.unwrap();

        assert_eq!(status.state, "ready");
        assert!(status.healthy);
        assert_eq!(status.declared_migrations, 2);
        assert_eq!(status.applied_migrations, 2);
        assert_eq!(status.history.len(), 2);
        assert_eq!(status.history[0].description, "create_product");
        assert_eq!(status.product_count, Some(1));
    }

    #[tokio::test]
    async fn test_status_before_migrations() {
        let database = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();
        let db = DbState::new(database);

        let status = get_status(&db).await.unwrap();

        assert_eq!(status.state, "pending");
        assert_eq!(status.applied_migrations, 0);
        assert!(status.history.is_empty());
        assert_eq!(status.product_count, None);
    }
}
