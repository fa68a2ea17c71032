//! # Product Commands
//!
//! List, add, show and delete against the catalog store.
//!
//! ## Search Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Product Search Flow                                  │
//! │                                                                         │
//! │  catalog list Widget          (or a line typed into `catalog browse`)  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  list_products(db, "Widget")                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductRepository::list("Widget")  ← substring, ordered by name       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Vec<ProductDto> → rendered as lines, "No data", or JSON               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::DbState;
use catalog_core::validation::validate_product_name;
use catalog_core::{CoreError, Product, ProductId};

/// Product as rendered by the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: i64,
    pub name: String,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        ProductDto {
            id: p.id.get(),
            name: p.name,
        }
    }
}

/// Outcome of `catalog delete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResultDto {
    pub id: i64,
    /// False when the id did not exist; nothing changed in that case.
    pub removed: bool,
}

/// Lists products whose name contains `search`.
///
/// ## Arguments
/// * `search` - Substring filter; empty lists every product
///
/// ## Returns
/// Matching products ordered by name (then id).
pub async fn list_products(db: &DbState, search: &str) -> Result<Vec<ProductDto>, ApiError> {
    let start = Instant::now();

    let products = db.products()?.list(search).await?;

    debug!(
        search = %search,
        count = products.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Product list completed"
    );

    Ok(products.into_iter().map(ProductDto::from).collect())
}

/// Validates `name` and inserts a new product.
///
/// The name is stored exactly as typed once it passes validation.
pub async fn create_product(db: &DbState, name: &str) -> Result<ProductDto, ApiError> {
    validate_product_name(name)?;

    let id = db.products()?.insert(name).await?;
    info!(id = %id, "Product created");

    Ok(ProductDto {
        id: id.get(),
        name: name.to_string(),
    })
}

/// Gets a product by id.
///
/// ## Errors
/// `NOT_FOUND` when no product has this id.
pub async fn get_product(db: &DbState, id: ProductId) -> Result<ProductDto, ApiError> {
    let product = db
        .products()?
        .get_by_id(id)
        .await?
        .ok_or(CoreError::ProductNotFound(id))?;

    Ok(ProductDto::from(product))
}

/// Deletes a product by id. Confirmation happens before this is called.
///
/// Deleting an unknown id is not an error; `removed` is false.
pub async fn delete_product(db: &DbState, id: ProductId) -> Result<DeleteResultDto, ApiError> {
    let removed = db.products()?.delete_by_id(id).await?;

    if removed {
        info!(id = %id, "Product removed");
    } else {
        debug!(id = %id, "Delete requested for unknown product");
    }

    Ok(DeleteResultDto {
        id: id.get(),
        removed,
    })
}
