//! Source definitions and loaders for the panel's tabular inputs
//!
//! This module contains one loader per raw source, each with a typed Arrow
//! schema validated against the file at read time. Loaders normalize
//! column names to lower_snake_case with no embedded units, hold no cache,
//! and fail fast with a `Load` error when an expected sheet or column is
//! absent.
//!
//! Available sources:
//! - Financial: authoritative municipal finances by (city, year)
//! - Geographic: GeoNames-style postal coordinates lookup
//! - Employment: per-year county labor-force files
//! - CPI: consumer price index by (year, period)
//! - Columns: column-name descriptions for the metadata resolver

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use std::path::Path;

use crate::error::Result;

/// Base trait for source loaders
pub trait SourceLoader {
    /// Name of the source (used in errors and the quality report)
    fn source_name(&self) -> &'static str;

    /// The declared schema for this source
    fn schema(&self) -> SchemaRef;

    /// Load the source into a single record batch
    fn load(&self, path: &Path) -> Result<RecordBatch>;
}

pub mod columns;
pub mod cpi;
pub mod employment;
pub mod financial;
pub mod geographic;
pub mod read;
pub mod schemas;

pub use columns::ColumnSource;
pub use cpi::CpiSource;
pub use employment::EmploymentSource;
pub use financial::FinancialSource;
pub use geographic::GeographicSource;
