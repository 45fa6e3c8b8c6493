//! Shared helpers for the integration tests: synthetic source files and
//! in-memory batches small enough to check by hand.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;

/// Write a file under `dir`, creating parent directories as needed
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

/// Build a record batch from named columns, all nullable
pub fn batch(columns: Vec<(&str, ArrayRef)>) -> RecordBatch {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
        .collect();
    let arrays: Vec<ArrayRef> = columns.into_iter().map(|(_, array)| array).collect();
    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap()
}

/// Header row matching the financial source schema
pub const FINANCIAL_HEADER: &str = "city,year,county_fips,population,total_revenue,tax_revenue,intergovernmental_revenue,charges_revenue,total_expenditure,police_expenditure,fire_expenditure,highways_expenditure,parks_expenditure,sewerage_expenditure,total_debt,long_term_debt,short_term_debt,interest_on_debt,total_crime,violent_crime,property_crime";

/// One financial row with hand-checkable derived splits
#[derive(Debug, Clone)]
pub struct FinRow {
    pub city: &'static str,
    pub year: i64,
    pub county_fips: i64,
    pub population: i64,
    pub total_revenue: f64,
    pub total_expenditure: f64,
    pub total_debt: f64,
    pub total_crime: f64,
}

impl Default for FinRow {
    fn default() -> Self {
        Self {
            city: "BOISE",
            year: 2005,
            county_fips: 1,
            population: 200_000,
            total_revenue: 400_000.0,
            total_expenditure: 300_000.0,
            total_debt: 1_000_000.0,
            total_crime: 100.0,
        }
    }
}

impl FinRow {
    /// Render the row as a CSV line in `FINANCIAL_HEADER` order.
    ///
    /// Sub-category columns are fixed fractions of the totals so
    /// percent-of-total assertions stay simple: police is 20% of
    /// expenditure, tax is 50% of revenue, long-term is 80% of debt.
    pub fn csv(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            self.city,
            self.year,
            self.county_fips,
            self.population,
            self.total_revenue,
            self.total_revenue * 0.5,
            self.total_revenue * 0.3,
            self.total_revenue * 0.2,
            self.total_expenditure,
            self.total_expenditure * 0.2,
            self.total_expenditure * 0.1,
            self.total_expenditure * 0.1,
            self.total_expenditure * 0.05,
            self.total_expenditure * 0.05,
            self.total_debt,
            self.total_debt * 0.8,
            self.total_debt * 0.2,
            self.total_debt * 0.05,
            self.total_crime,
            self.total_crime * 0.2,
            self.total_crime * 0.8,
        )
    }
}

/// Render a financial sheet from rows
pub fn financial_csv(rows: &[FinRow]) -> String {
    let mut out = String::from(FINANCIAL_HEADER);
    for row in rows {
        out.push('\n');
        out.push_str(&row.csv());
    }
    out.push('\n');
    out
}

/// One GeoNames-style TSV line (twelve tab-separated fields, no header)
pub fn geo_line(
    postal: &str,
    place: &str,
    county_name: &str,
    county_code: &str,
    lat: f64,
    lon: f64,
) -> String {
    format!(
        "US\t{postal}\t{place}\tIdaho\tID\t{county_name}\t{county_code}\t\t\t{lat}\t{lon}\t4"
    )
}

/// Header row matching the employment source schema
pub const EMPLOYMENT_HEADER: &str =
    "county_fips,state_fips,year,labor_force,employed,unemployed,unemployment_rate";
