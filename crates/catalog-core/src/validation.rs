//! # Validation Module
//!
//! Input rules applied by the controller before it calls the store.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Controller (catalog-cli)                                     │
//! │  └── THIS MODULE: blank names, over-long names, malformed ids          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Catalog store (catalog-db)                                   │
//! │  └── No content validation: any string is a storable name              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  └── NOT NULL on product.name                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use catalog_core::validation::{parse_product_id, validate_product_name};
//!
//! validate_product_name("Widget A").unwrap();
//! let id = parse_product_id("3").unwrap();
//! assert_eq!(id.get(), 3);
//! ```

use crate::error::ValidationError;
use crate::types::ProductId;
use crate::MAX_PRODUCT_NAME_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a product name submitted by the user.
///
/// ## Rules
/// - Must contain something other than whitespace
/// - At most [`MAX_PRODUCT_NAME_LEN`] characters (counted as chars, not bytes)
///
/// ## Example
/// ```rust
/// use catalog_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Widget A").is_ok());
/// assert!(validate_product_name("   ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_PRODUCT_NAME_LEN,
        });
    }

    Ok(())
}

/// Parses a product id typed by the user.
///
/// Ids are assigned from 1 upwards, so zero and negative values are rejected
/// here rather than sent to the store as lookups that can never match.
pub fn parse_product_id(raw: &str) -> ValidationResult<ProductId> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    let value: i64 = raw.parse().map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: format!("'{}' is not an integer", raw),
    })?;

    if value <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "id".to_string(),
        });
    }

    Ok(ProductId::new(value))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Widget A").is_ok());
        assert!(validate_product_name("Café crème").is_ok());

        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(" \t ").is_err());
        assert!(validate_product_name(&"A".repeat(MAX_PRODUCT_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_product_name_counts_chars() {
        // 255 two-byte chars is 510 bytes but still within the limit
        let name = "é".repeat(MAX_PRODUCT_NAME_LEN);
        assert!(validate_product_name(&name).is_ok());
    }

    #[test]
    fn test_parse_product_id() {
        assert_eq!(parse_product_id("1").unwrap(), ProductId::new(1));
        assert_eq!(parse_product_id(" 42 ").unwrap(), ProductId::new(42));

        assert!(matches!(
            parse_product_id(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            parse_product_id("abc"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            parse_product_id("0"),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            parse_product_id("-5"),
            Err(ValidationError::MustBePositive { .. })
        ));
    }
}
