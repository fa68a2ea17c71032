//! Output rendering: plain text for people, one JSON document per result
//! with `--json`.

use std::io::Write;

use serde::Serialize;

use crate::commands::product::{DeleteResultDto, ProductDto};
use crate::commands::seed::SeedReportDto;
use crate::commands::status::StatusDto;
use crate::error::ApiError;

/// Shown in place of an empty product list.
pub const NO_DATA: &str = "No data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

impl Format {
    pub fn from_flag(json: bool) -> Self {
        if json {
            Format::Json
        } else {
            Format::Text
        }
    }
}

fn io_error(e: std::io::Error) -> ApiError {
    ApiError::internal(format!("Failed to write output: {}", e))
}

/// Writes `value` as compact JSON followed by a newline.
pub fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<(), ApiError> {
    let json = serde_json::to_string(value)
        .map_err(|e| ApiError::internal(format!("Failed to serialize output: {}", e)))?;
    writeln!(out, "{}", json).map_err(io_error)
}

pub fn write_products<W: Write>(
    out: &mut W,
    products: &[ProductDto],
    format: Format,
) -> Result<(), ApiError> {
    if format == Format::Json {
        return write_json(out, products);
    }

    if products.is_empty() {
        return writeln!(out, "{}", NO_DATA).map_err(io_error);
    }

    for p in products {
        writeln!(out, "{:>3}  {}", p.id, p.name).map_err(io_error)?;
    }
    Ok(())
}

pub fn write_created<W: Write>(out: &mut W, product: &ProductDto, format: Format) -> Result<(), ApiError> {
    match format {
        Format::Json => write_json(out, product),
        Format::Text => writeln!(out, "Created with id {}", product.id).map_err(io_error),
    }
}

pub fn write_product<W: Write>(out: &mut W, product: &ProductDto, format: Format) -> Result<(), ApiError> {
    match format {
        Format::Json => write_json(out, product),
        Format::Text => {
            writeln!(out, "Product ID: {} - {}", product.id, product.name).map_err(io_error)
        }
    }
}

pub fn write_deleted<W: Write>(
    out: &mut W,
    result: &DeleteResultDto,
    format: Format,
) -> Result<(), ApiError> {
    match format {
        Format::Json => write_json(out, result),
        Format::Text if result.removed => {
            writeln!(out, "Removed product {}", result.id).map_err(io_error)
        }
        Format::Text => {
            writeln!(out, "Product {} not found; nothing removed", result.id).map_err(io_error)
        }
    }
}

pub fn write_status<W: Write>(out: &mut W, status: &StatusDto, format: Format) -> Result<(), ApiError> {
    if format == Format::Json {
        return write_json(out, status);
    }

    writeln!(out, "Migrations: {}", status.state).map_err(io_error)?;
    writeln!(
        out,
        "Applied:    {} of {}",
        status.applied_migrations, status.declared_migrations
    )
    .map_err(io_error)?;
    for m in &status.history {
        writeln!(out, "  {:>3}  {:<24} {}", m.version, m.description, m.applied_at)
            .map_err(io_error)?;
    }
    writeln!(out, "Healthy:    {}", if status.healthy { "yes" } else { "no" }).map_err(io_error)?;
    if let Some(count) = status.product_count {
        writeln!(out, "Products:   {}", count).map_err(io_error)?;
    }
    Ok(())
}

pub fn write_seeded<W: Write>(out: &mut W, report: &SeedReportDto, format: Format) -> Result<(), ApiError> {
    match format {
        Format::Json => write_json(out, report),
        Format::Text if report.existing > 0 => writeln!(
            out,
            "Catalog already has {} products; nothing seeded",
            report.existing
        )
        .map_err(io_error),
        Format::Text => writeln!(out, "Seeded {} products", report.inserted).map_err(io_error),
    }
}

/// Writes a command failure. Text goes to the caller's stderr stream.
pub fn write_error<W: Write>(out: &mut W, err: &ApiError, format: Format) -> Result<(), ApiError> {
    match format {
        Format::Json => write_json(out, err),
        Format::Text => writeln!(out, "error: {}", err.message).map_err(io_error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<(), ApiError>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn widget() -> ProductDto {
        ProductDto {
            id: 1,
            name: "Widget A".to_string(),
        }
    }

    #[test]
    fn test_empty_list_shows_no_data() {
        assert_eq!(render(|o| write_products(o, &[], Format::Text)), "No data\n");
        assert_eq!(render(|o| write_products(o, &[], Format::Json)), "[]\n");
    }

    #[test]
    fn test_product_lines() {
        assert_eq!(
            render(|o| write_products(o, &[widget()], Format::Text)),
            "  1  Widget A\n"
        );
        assert_eq!(
            render(|o| write_product(o, &widget(), Format::Text)),
            "Product ID: 1 - Widget A\n"
        );
        assert_eq!(
            render(|o| write_created(o, &widget(), Format::Text)),
            "Created with id 1\n"
        );
    }

    #[test]
    fn test_delete_messages() {
        let removed = DeleteResultDto { id: 4, removed: true };
        let missing = DeleteResultDto { id: 4, removed: false };

        assert_eq!(
            render(|o| write_deleted(o, &removed, Format::Text)),
            "Removed product 4\n"
        );
        assert_eq!(
            render(|o| write_deleted(o, &missing, Format::Text)),
            "Product 4 not found; nothing removed\n"
        );
        assert_eq!(
            render(|o| write_deleted(o, &missing, Format::Json)),
            "{\"id\":4,\"removed\":false}\n"
        );
    }

    #[test]
    fn test_error_text() {
        let err = ApiError::not_found("Product", 9);
        assert_eq!(
            render(|o| write_error(o, &err, Format::Text)),
            "error: Product not found: 9\n"
        );
    }
}
