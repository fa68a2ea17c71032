//! # Browse Command
//!
//! Interactive search: every line typed becomes the new filter and the list
//! is redrawn, the terminal version of a search box wired to a list view.
//!
//! ```text
//! search> Widget
//!   1  Widget A
//!   2  Widget B
//! search> Sprocket
//! No data
//! search> :q
//! ```

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::commands::product::list_products;
use crate::error::ApiError;
use crate::render::{write_products, Format};
use crate::state::DbState;

/// Line that leaves the loop.
pub const QUIT: &str = ":q";

const PROMPT: &str = "search> ";

/// Runs the search loop until `:q` or end of input.
///
/// Returns the number of searches performed.
pub async fn browse<R, W>(
    db: &DbState,
    input: R,
    out: &mut W,
    format: Format,
) -> Result<usize, ApiError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut searches = 0;

    loop {
        if format == Format::Text {
            write!(out, "{}", PROMPT).map_err(io_error)?;
            out.flush().map_err(io_error)?;
        }

        let Some(line) = lines.next_line().await.map_err(io_error)? else {
            break;
        };
        if line.trim() == QUIT {
            break;
        }

        let products = list_products(db, &line).await?;
        write_products(out, &products, format)?;
        searches += 1;
    }

    debug!(searches, "Browse session ended");
    Ok(searches)
}

fn io_error(e: std::io::Error) -> ApiError {
    ApiError::internal(format!("Terminal I/O failed: {}", e))
}
