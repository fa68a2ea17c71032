//! # Domain Types
//!
//! The catalog persists exactly one entity.
//!
//! ```text
//! ┌─────────────────────────┐
//! │        Product          │
//! │  ─────────────────────  │
//! │  id   (ProductId, i64)  │  assigned by the store, never reused
//! │  name (String)          │  user-supplied, not unique
//! └─────────────────────────┘
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Product Id
// =============================================================================

/// Store-assigned product identifier.
///
/// Backed by SQLite's `INTEGER PRIMARY KEY AUTOINCREMENT`, so ids grow
/// monotonically and are not recycled after a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct ProductId(i64);

impl ProductId {
    /// Wraps a raw row id.
    #[inline]
    pub const fn new(raw: i64) -> Self {
        ProductId(raw)
    }

    /// Returns the raw row id.
    #[inline]
    pub const fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for ProductId {
    fn from(raw: i64) -> Self {
        ProductId(raw)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A named catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier, immutable once created.
    pub id: ProductId,

    /// Display name. May be empty as far as storage is concerned.
    pub name: String,
}

impl Product {
    /// Builds a product from its parts.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>) -> Self {
        Product {
            id: id.into(),
            name: name.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_id_display() {
        assert_eq!(ProductId::new(7).to_string(), "7");
    }

    #[test]
    fn test_product_id_ordering_follows_raw_value() {
        assert!(ProductId::new(1) < ProductId::new(2));
        assert_eq!(ProductId::from(3).get(), 3);
    }

    #[test]
    fn test_product_serializes_flat_id() {
        let product = Product::new(1, "Widget A");
        let json = serde_json::to_string(&product).unwrap();
        assert_eq!(json, r#"{"id":1,"name":"Widget A"}"#);
    }
}
