//! # Seed Command
//!
//! Fills an empty catalog with development products.
//!
//! ```bash
//! catalog seed              # 20 products
//! catalog seed --count 500
//! ```
//!
//! Names are `{product} {size}`, walking every size of a product before
//! moving to the next one. A catalog that already has products is left
//! alone so repeated runs never duplicate data.

use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::DbState;

/// Product families by category.
const CATEGORIES: &[(&str, &[&str])] = &[
    ("beverages", &["Sparkling Water", "Cold Brew", "Lemonade", "Iced Tea"]),
    ("snacks", &["Sea Salt Chips", "Trail Mix", "Pretzel Twists", "Granola Bar"]),
    ("hardware", &["Widget", "Sprocket", "Hex Bolt", "Wing Nut"]),
    ("stationery", &["Notebook", "Gel Pen", "Sticky Notes", "Binder Clip"]),
];

/// Size variants appended to every name.
const SIZES: &[&str] = &["Small", "Medium", "Large", "Value Pack"];

/// Result of `catalog seed`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReportDto {
    pub inserted: usize,
    /// Products already present; seeding is skipped when non-zero.
    pub existing: i64,
}

/// Generates `count` product names, cycling through the families.
pub fn seed_names(count: usize) -> impl Iterator<Item = String> {
    CATEGORIES
        .iter()
        .flat_map(|(_, products)| products.iter())
        .flat_map(|product| SIZES.iter().map(move |size| format!("{} {}", product, size)))
        .cycle()
        .take(count)
}

/// Inserts `count` generated products into an empty catalog.
pub async fn seed_products(db: &DbState, count: usize) -> Result<SeedReportDto, ApiError> {
    let products = db.products()?;

    let existing = products.count().await?;
    if existing > 0 {
        warn!(existing, "Catalog already has products, skipping seed");
        return Ok(SeedReportDto {
            inserted: 0,
            existing,
        });
    }

    let start = Instant::now();
    let mut inserted = 0;

    for name in seed_names(count) {
        products.insert(&name).await?;
        inserted += 1;

        if inserted % 500 == 0 {
            info!(inserted, "Seeding in progress");
        }
    }

    info!(
        inserted,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Seed complete"
    );

    Ok(SeedReportDto {
        inserted,
        existing: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_names() {
        let names: Vec<String> = seed_names(5).collect();
        assert_eq!(names[0], "Sparkling Water Small");
        assert_eq!(names[3], "Sparkling Water Value Pack");
        assert_eq!(names[4], "Cold Brew Small");
    }

    #[test]
    fn test_seed_names_cycle_past_catalog() {
        let distinct = CATEGORIES.iter().map(|(_, p)| p.len()).sum::<usize>() * SIZES.len();
        let names: Vec<String> = seed_names(distinct + 1).collect();
        assert_eq!(names.len(), distinct + 1);
        assert_eq!(names[distinct], names[0]);
    }

    #[tokio::test]
    async fn test_seed_empty_catalog_once() {
        let db = DbState::in_memory().await;

        let first = seed_products(&db, 10).await.unwrap();
        assert_eq!(first.inserted, 10);

        let second = seed_products(&db, 10).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.existing, 10);

        assert_eq!(db.products().unwrap().count().await.unwrap(), 10);
    }
}
