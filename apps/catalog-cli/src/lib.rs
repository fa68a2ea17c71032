//! # Catalog CLI Library
//!
//! Command-line controller for the product catalog. `main.rs` only calls
//! [`run`]; everything else lives here so it can be tested.
//!
//! ## Module Organization
//! ```text
//! catalog_cli/
//! ├── lib.rs          ◄─── You are here (argument parsing & dispatch)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   └── config.rs   ◄─── Environment configuration
//! ├── commands/
//! │   ├── product.rs  ◄─── list / add / show / delete
//! │   ├── browse.rs   ◄─── Interactive search loop
//! │   ├── status.rs   ◄─── Migration state
//! │   └── seed.rs     ◄─── Development data
//! ├── render.rs       ◄─── Text and JSON output
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod commands;
pub mod error;
pub mod render;
pub mod state;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use catalog_core::validation::parse_product_id;
use catalog_core::ProductId;
use catalog_db::DbConfig;
use commands::{browse, product, seed, status};
use error::ApiError;
use render::Format;
use state::{AppConfig, DbState};

/// Product catalog backed by a local SQLite file.
#[derive(Debug, Parser)]
#[command(name = "catalog", version, about)]
pub struct Cli {
    /// Database file (overrides CATALOG_DB_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging on stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List products whose name contains SEARCH (all when omitted)
    List {
        search: Option<String>,
    },

    /// Add a product
    Add {
        name: String,
    },

    /// Show one product
    Show {
        #[arg(value_parser = parse_id)]
        id: ProductId,
    },

    /// Remove a product after confirmation
    Delete {
        #[arg(value_parser = parse_id)]
        id: ProductId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Search interactively; each line typed is a new filter, `:q` quits
    Browse,

    /// Show migration state and history
    Status,

    /// Fill an empty catalog with development products
    Seed {
        #[arg(short, long, default_value_t = 20)]
        count: usize,
    },
}

fn parse_id(raw: &str) -> Result<ProductId, String> {
    parse_product_id(raw).map_err(|e| e.to_string())
}

/// Parses the command line, runs the command and maps the outcome to an
/// exit code.
pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let format = Format::from_flag(cli.json);

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let mut stderr = std::io::stderr();
            if render::write_error(&mut stderr, &err, format).is_err() {
                eprintln!("error: {}", err.message);
            }
            err.exit_code()
        }
    }
}

/// Opens the database (running migrations first) and dispatches.
///
/// ## Startup Sequence
/// ```text
/// AppConfig::load() ─► --db override ─► open_catalog ─► dispatch ─► close
///                                           │
///                                           └── MigrationFailed: exit 3,
///                                               the store is never touched
///                                               (`status` still reports it)
/// ```
pub async fn execute(cli: Cli) -> Result<(), ApiError> {
    let config = AppConfig::load()?.with_database_path(cli.db);
    let db_config = config.db_config()?;
    info!(path = %db_config.database_path.display(), "Opening catalog");

    let db = open_catalog(db_config, matches!(cli.command, Command::Status)).await?;
    debug!(state = %db.inner().migration_state(), "Catalog opened");

    let format = Format::from_flag(cli.json);
    let mut stdout = std::io::stdout();
    let stdin = BufReader::new(tokio::io::stdin());

    let result = dispatch(&db, cli.command, format, stdin, &mut stdout).await;

    db.close().await;
    result
}

/// Opens the database and runs the built-in migrations.
///
/// A migration failure is an error unless `report_failure` is set, in which
/// case the database stays open in the `Failed` state so `status` can show it.
pub async fn open_catalog(config: DbConfig, report_failure: bool) -> Result<DbState, ApiError> {
    if !report_failure {
        return Ok(DbState::open(config).await?);
    }

    let db = DbState::open(config.run_migrations(false)).await?;
    if let Err(err) = db.inner().run_migrations().await {
        warn!(error = %err, "Migrations failed; catalog is unavailable");
    }
    Ok(db)
}

/// Runs one command against an open catalog.
pub async fn dispatch<R, W>(
    db: &DbState,
    command: Command,
    format: Format,
    input: R,
    out: &mut W,
) -> Result<(), ApiError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    match command {
        Command::List { search } => {
            let products = product::list_products(db, search.as_deref().unwrap_or("")).await?;
            render::write_products(out, &products, format)
        }
        Command::Add { name } => {
            let created = product::create_product(db, &name).await?;
            render::write_created(out, &created, format)
        }
        Command::Show { id } => {
            let found = product::get_product(db, id).await?;
            render::write_product(out, &found, format)
        }
        Command::Delete { id, yes } => {
            if !yes && !confirm_delete(input, &mut std::io::stderr(), id).await? {
                info!(id = %id, "Delete cancelled");
                return Ok(());
            }
            let result = product::delete_product(db, id).await?;
            render::write_deleted(out, &result, format)
        }
        Command::Browse => {
            browse::browse(db, input, out, format).await?;
            Ok(())
        }
        Command::Status => {
            let snapshot = status::get_status(db).await?;
            render::write_status(out, &snapshot, format)
        }
        Command::Seed { count } => {
            let report = seed::seed_products(db, count).await?;
            render::write_seeded(out, &report, format)
        }
    }
}

/// Asks "Remove product N? [y/N]" and reads one answer line.
///
/// Only `y` or `yes` (any case) confirms; end of input declines.
pub async fn confirm_delete<R, W>(input: R, prompt: &mut W, id: ProductId) -> Result<bool, ApiError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    write!(prompt, "Remove product {}? [y/N] ", id)
        .and_then(|_| prompt.flush())
        .map_err(|e| ApiError::internal(format!("Terminal I/O failed: {}", e)))?;

    let answer = input
        .lines()
        .next_line()
        .await
        .map_err(|e| ApiError::internal(format!("Terminal I/O failed: {}", e)))?
        .unwrap_or_default();

    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - Default: WARN, so normal output is not interleaved with logs
/// - `--verbose`: INFO, DEBUG for the catalog crates
/// - `RUST_LOG` overrides both
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "info,catalog_db=debug,catalog_cli=debug,sqlx=warn"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
