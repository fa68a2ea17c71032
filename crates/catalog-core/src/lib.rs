//! # catalog-core: Domain Types for the Product Catalog
//!
//! The types every other crate speaks in, with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Catalog Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 catalog-cli (Controller)                        │   │
//! │  │    list [search] ── add NAME ── show ID ── delete ID            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ catalog-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌───────────┐                  │   │
//! │  │   │   types   │  │ validation │  │   error   │                  │   │
//! │  │   │  Product  │  │ name, id   │  │ CoreError │                  │   │
//! │  │   │ ProductId │  │   rules    │  │           │                  │   │
//! │  │   └───────────┘  └────────────┘  └───────────┘                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 catalog-db (Storage Layer)                      │   │
//! │  │         schema, migration runner, catalog store                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - `Product` and `ProductId`
//! - [`error`] - Domain error types
//! - [`validation`] - Controller-side input rules
//!
//! ## Example Usage
//!
//! ```rust
//! use catalog_core::validation::{parse_product_id, validate_product_name};
//!
//! assert!(validate_product_name("Widget A").is_ok());
//! assert_eq!(parse_product_id("42").unwrap().get(), 42);
//! ```

pub mod error;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use types::*;

/// Longest product name the controller accepts.
///
/// The store itself does not enforce this; it lives here so every front end
/// applies the same rule.
pub const MAX_PRODUCT_NAME_LEN: usize = 255;
