//! Geographic source loader
//!
//! Reads a GeoNames-style postal file: tab-delimited, no header row,
//! twelve positional fields. The loader normalizes the join-relevant
//! columns on the way in: ZIP+4 codes truncate to their five-digit
//! prefix and the admin2 code (county FIPS within the state) parses to
//! an integer.

use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use arrow::datatypes::SchemaRef;

use super::read::read_delimited_positional;
use super::schemas::{geographic_file_schema, geographic_schema};
use super::SourceLoader;
use crate::error::Result;
use crate::utils;

/// Columns kept from the raw file: postal code, place name, admin1 code,
/// admin2 name, admin2 code, latitude, longitude, accuracy
const PROJECTION: [usize; 8] = [1, 2, 4, 5, 6, 9, 10, 11];

/// Loader for the GeoNames postal-code reference file
#[derive(Debug, Clone)]
pub struct GeographicSource {
    schema: SchemaRef,
}

impl GeographicSource {
    /// Create a new geographic source loader
    #[must_use]
    pub fn new() -> Self {
        Self {
            schema: geographic_schema(),
        }
    }
}

impl Default for GeographicSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Five-digit prefix of a postal code; handles `83701-1234` and bare
/// `83701` alike
fn truncate_zip(raw: &str) -> String {
    let head = raw.split('-').next().unwrap_or(raw).trim();
    head.chars().take(5).collect()
}

impl SourceLoader for GeographicSource {
    fn source_name(&self) -> &'static str {
        "geographic"
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn load(&self, path: &Path) -> Result<RecordBatch> {
        let raw = read_delimited_positional(
            path,
            self.source_name(),
            geographic_file_schema(),
            PROJECTION.to_vec(),
            b'\t',
        )?;

        let postal = utils::column(&raw, "postal_code")?;
        let place = utils::column(&raw, "place_name")?;
        let admin1 = utils::column(&raw, "admin1_code")?;
        let county_name = utils::column(&raw, "admin2_name")?;
        let county_code = utils::column(&raw, "admin2_code")?;

        let rows = raw.num_rows();
        let mut zips: Vec<Option<String>> = Vec::with_capacity(rows);
        let mut fips: Vec<Option<i64>> = Vec::with_capacity(rows);
        for row in 0..rows {
            zips.push(utils::string_value(postal, row).map(|z| truncate_zip(&z)));
            fips.push(
                utils::string_value(county_code, row)
                    .and_then(|code| code.trim().parse::<i64>().ok()),
            );
        }

        let cities: Vec<Option<String>> =
            (0..rows).map(|row| utils::string_value(place, row)).collect();
        let states: Vec<Option<String>> =
            (0..rows).map(|row| utils::string_value(admin1, row)).collect();
        let counties: Vec<Option<String>> =
            (0..rows).map(|row| utils::string_value(county_name, row)).collect();

        let latitude = Arc::clone(utils::column(&raw, "latitude")?);
        let longitude = Arc::clone(utils::column(&raw, "longitude")?);
        let accuracy = Arc::clone(utils::column(&raw, "accuracy")?);

        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(zips)),
            Arc::new(StringArray::from(cities)),
            Arc::new(StringArray::from(states)),
            Arc::new(StringArray::from(counties)),
            Arc::new(Int64Array::from(fips)),
            latitude,
            longitude,
            accuracy,
        ];
        let batch = RecordBatch::try_new(self.schema.clone(), columns)?;
        log::info!(
            "geographic: {} postal rows from {}",
            batch.num_rows(),
            path.display()
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_plus_four_truncates_to_prefix() {
        assert_eq!(truncate_zip("83701-1234"), "83701");
        assert_eq!(truncate_zip("83701"), "83701");
        assert_eq!(truncate_zip(" 83701 "), "83701");
    }
}
