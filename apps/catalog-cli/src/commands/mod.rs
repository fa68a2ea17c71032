//! # Commands Module
//!
//! One function per CLI subcommand. Each takes the `DbState` it needs and
//! returns a DTO or an `ApiError`; rendering happens in `render`.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (exports)
//! ├── product.rs  ◄─── list, add, show, delete
//! ├── browse.rs   ◄─── Interactive search loop
//! ├── status.rs   ◄─── Migration state and history
//! └── seed.rs     ◄─── Development data
//! ```

pub mod browse;
pub mod product;
pub mod seed;
pub mod status;
