//! # Catalog CLI Entry Point
//!
//! ```text
//! catalog [--db PATH] [--json] [--verbose] <COMMAND>
//!
//!   list [SEARCH]        add NAME        show ID        delete ID [--yes]
//!   browse               status          seed [--count N]
//! ```
//!
//! Setup, migrations and dispatch live in `lib.rs`.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    catalog_cli::run().await
}
