//! # Schema Definition
//!
//! Declares the durable shape of the catalog tables.
//!
//! ## product
//! ```text
//! ┌──────────┬─────────┬──────────────────────────────┐
//! │ column   │ type    │ constraints                  │
//! ├──────────┼─────────┼──────────────────────────────┤
//! │ id       │ INTEGER │ PRIMARY KEY AUTOINCREMENT    │
//! │ name     │ TEXT    │ NOT NULL                     │
//! └──────────┴─────────┴──────────────────────────────┘
//! ```
//!
//! The DDL constants below are what migrations execute; once a migration
//! has shipped its SQL must never change (the runner checksums it). The
//! [`TableDef`] declarations are what the runner checks the migrated file
//! against, and what the store selects.

use sqlx::SqliteConnection;

use crate::error::{DbError, DbResult};

// =============================================================================
// DDL
// =============================================================================

/// Creates the `product` table.
///
/// `AUTOINCREMENT` keeps ids from being recycled after the highest row is
/// deleted; a plain `INTEGER PRIMARY KEY` would hand out max(id)+1 again.
pub const PRODUCT_TABLE_DDL: &str = "
CREATE TABLE product (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
);
";

/// Index backing `ORDER BY name` in catalog listings.
pub const PRODUCT_NAME_INDEX_DDL: &str = "
CREATE INDEX idx_product_name ON product(name);
";

// =============================================================================
// Declarations
// =============================================================================

/// SQLite storage class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Text,
}

impl SqlType {
    /// Declared type name as SQLite reports it in `PRAGMA table_info`.
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Text => "TEXT",
        }
    }
}

/// One declared column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub primary_key: bool,
    pub not_null: bool,
}

/// One declared table.
#[derive(Debug, Clone, Copy)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableDef {
    /// Comma-separated column names, in declaration order.
    pub fn column_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// The `product` table.
pub const PRODUCT: TableDef = TableDef {
    name: "product",
    columns: &[
        ColumnDef {
            name: "id",
            sql_type: SqlType::Integer,
            primary_key: true,
            not_null: true,
        },
        ColumnDef {
            name: "name",
            sql_type: SqlType::Text,
            primary_key: false,
            not_null: true,
        },
    ],
};

// =============================================================================
// Verification
// =============================================================================

/// Row of `pragma_table_info`.
#[derive(Debug, sqlx::FromRow)]
struct ColumnInfo {
    name: String,
    #[sqlx(rename = "type")]
    sql_type: String,
    notnull: i64,
    pk: i64,
}

/// Checks that `table` exists on `conn` with every declared column.
///
/// Extra columns are tolerated (a later migration may add some before the
/// declaration catches up); missing columns, type changes and constraint
/// changes are not.
pub async fn verify_table(conn: &mut SqliteConnection, table: &TableDef) -> DbResult<()> {
    let actual: Vec<ColumnInfo> =
        sqlx::query_as(r#"SELECT name, type, "notnull", pk FROM pragma_table_info(?1)"#)
            .bind(table.name)
            .fetch_all(&mut *conn)
            .await?;

    if actual.is_empty() {
        return Err(DbError::migration(format!(
            "table '{}' does not exist after migrations",
            table.name
        )));
    }

    for declared in table.columns {
        let found = actual
            .iter()
            .find(|c| c.name == declared.name)
            .ok_or_else(|| {
                DbError::migration(format!(
                    "column '{}.{}' is missing",
                    table.name, declared.name
                ))
            })?;

        if !found.sql_type.eq_ignore_ascii_case(declared.sql_type.as_str()) {
            return Err(DbError::migration(format!(
                "column '{}.{}' has type {}, expected {}",
                table.name,
                declared.name,
                found.sql_type,
                declared.sql_type.as_str()
            )));
        }

        if (found.pk > 0) != declared.primary_key {
            return Err(DbError::migration(format!(
                "column '{}.{}' primary key mismatch",
                table.name, declared.name
            )));
        }

        // SQLite reports notnull = 0 for INTEGER PRIMARY KEY even though it
        // can never hold NULL, so only plain columns are checked.
        if !declared.primary_key && (found.notnull != 0) != declared.not_null {
            return Err(DbError::migration(format!(
                "column '{}.{}' NOT NULL mismatch",
                table.name, declared.name
            )));
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
