//! # Repository Module
//!
//! The catalog store: the only code that reads or writes `product` rows.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Controller                                                             │
//! │       │  db.products()?.list("Widget")                                  │
//! │       ▼                                                                 │
//! │  ProductRepository                                                      │
//! │  ├── list(&self, filter)        → Vec<Product>                          │
//! │  ├── insert(&self, name)        → ProductId                             │
//! │  ├── get_by_id(&self, id)       → Option<Product>                       │
//! │  └── delete_by_id(&self, id)    → bool                                  │
//! │       │  one statement per call                                         │
//! │       ▼                                                                 │
//! │  SQLite                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod product;
