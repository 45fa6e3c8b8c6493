//! Arrow schema definitions for the panel's sources
//!
//! Column names follow the crate-wide convention: lower_snake_case, no
//! embedded units. Every loader validates its file against the schema
//! declared here, so a drifted export fails at load instead of merging
//! garbage.

use arrow::datatypes::{DataType, Field, Schema};
use std::sync::Arc;

/// Schema for the authoritative municipal financial sheet.
///
/// Currency columns are nominal dollars as Float64; the inflation stage
/// rescales them in place. `city`, `year` form the panel key.
pub fn financial_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("city", DataType::Utf8, false),
        Field::new("year", DataType::Int64, false),
        Field::new("county_fips", DataType::Int64, true),
        Field::new("population", DataType::Int64, true),
        Field::new("total_revenue", DataType::Float64, true),
        Field::new("tax_revenue", DataType::Float64, true),
        Field::new("intergovernmental_revenue", DataType::Float64, true),
        Field::new("charges_revenue", DataType::Float64, true),
        Field::new("total_expenditure", DataType::Float64, true),
        Field::new("police_expenditure", DataType::Float64, true),
        Field::new("fire_expenditure", DataType::Float64, true),
        Field::new("highways_expenditure", DataType::Float64, true),
        Field::new("parks_expenditure", DataType::Float64, true),
        Field::new("sewerage_expenditure", DataType::Float64, true),
        Field::new("total_debt", DataType::Float64, true),
        Field::new("long_term_debt", DataType::Float64, true),
        Field::new("short_term_debt", DataType::Float64, true),
        Field::new("interest_on_debt", DataType::Float64, true),
        Field::new("total_crime", DataType::Float64, true),
        Field::new("violent_crime", DataType::Float64, true),
        Field::new("property_crime", DataType::Float64, true),
    ]))
}

/// Positional schema of the raw GeoNames postal file (tab-delimited, no
/// header, twelve fields)
pub fn geographic_file_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("country_code", DataType::Utf8, true),
        Field::new("postal_code", DataType::Utf8, true),
        Field::new("place_name", DataType::Utf8, true),
        Field::new("admin1_name", DataType::Utf8, true),
        Field::new("admin1_code", DataType::Utf8, true),
        Field::new("admin2_name", DataType::Utf8, true),
        Field::new("admin2_code", DataType::Utf8, true),
        Field::new("admin3_name", DataType::Utf8, true),
        Field::new("admin3_code", DataType::Utf8, true),
        Field::new("latitude", DataType::Float64, true),
        Field::new("longitude", DataType::Float64, true),
        Field::new("accuracy", DataType::Int64, true),
    ]))
}

/// Schema the geographic loader emits after key normalization
/// (ZIP truncated to five digits, county code parsed to an integer)
pub fn geographic_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("postal_code", DataType::Utf8, true),
        Field::new("city", DataType::Utf8, true),
        Field::new("state", DataType::Utf8, true),
        Field::new("county", DataType::Utf8, true),
        Field::new("county_fips", DataType::Int64, true),
        Field::new("latitude", DataType::Float64, true),
        Field::new("longitude", DataType::Float64, true),
        Field::new("accuracy", DataType::Int64, true),
    ]))
}

/// Schema for one per-year employment file (BLS LAUS county layout)
pub fn employment_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("county_fips", DataType::Int64, false),
        Field::new("state_fips", DataType::Int64, false),
        Field::new("year", DataType::Int64, false),
        Field::new("labor_force", DataType::Float64, true),
        Field::new("employed", DataType::Float64, true),
        Field::new("unemployed", DataType::Float64, true),
        Field::new("unemployment_rate", DataType::Float64, true),
    ]))
}

/// Schema for the CPI table (BLS SeriesReport layout; period is
/// `M01`..`M12` for months, `M13` for the annual average)
pub fn cpi_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("year", DataType::Int64, false),
        Field::new("period", DataType::Utf8, false),
        Field::new("value", DataType::Float64, false),
    ]))
}

/// Schema for the column-description table
pub fn columns_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("name", DataType::Utf8, false),
        Field::new("description", DataType::Utf8, true),
    ]))
}
