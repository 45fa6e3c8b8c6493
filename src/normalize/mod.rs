//! Derived-feature construction over the merged panel
//!
//! Adds per-capita and percent-of-total columns plus an ordinal city-size
//! bucket. Every derivation guards its denominator: a zero or missing
//! population/total yields a null cell, never a divide-by-zero artifact.
//! The input batch is never mutated; an augmented copy is returned.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use crate::error::{PanelError, Result};
use crate::report::QualityReport;
use crate::utils;

/// Population cutoffs separating the ordinal city-size buckets.
///
/// A configuration constant rather than per-row logic, so moving a boundary
/// never touches merge or derivation code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SizeThresholds {
    /// Populations strictly below this are `rural`
    pub rural_below: f64,
    /// Populations at or above this are `urban`; in between is `non-urban`
    pub urban_at_least: f64,
}

impl Default for SizeThresholds {
    fn default() -> Self {
        // Census-style community classification
        Self {
            rural_below: 2_500.0,
            urban_at_least: 50_000.0,
        }
    }
}

impl SizeThresholds {
    /// Bucket a population value; `None` for missing population
    #[must_use]
    pub fn classify(&self, population: Option<f64>) -> Option<&'static str> {
        let pop = population?;
        if pop < self.rural_below {
            Some("rural")
        } else if pop < self.urban_at_least {
            Some("non-urban")
        } else {
            Some("urban")
        }
    }
}

/// Which columns feed each family of derived features
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Denominator for per-capita features
    pub population_column: String,
    /// Denominator for expenditure shares
    pub total_expenditure_column: String,
    /// Denominator for revenue shares
    pub total_revenue_column: String,
    /// Columns expressed as a percentage of total expenditure (`*_pct_exp`)
    pub expenditure_columns: Vec<String>,
    /// Columns expressed as a percentage of total revenue (`*_pct_rev`)
    pub revenue_columns: Vec<String>,
    /// Columns expressed per resident (`*_per_capita`)
    pub per_capita_columns: Vec<String>,
}

/// Divide `values` by `denominator` cell-wise, scaling the quotient.
///
/// Cells where the denominator is zero or missing come out null and bump
/// the guarded-division counter.
fn ratio_column(
    batch: &RecordBatch,
    values_column: &str,
    denominator_column: &str,
    scale: f64,
    guarded: &mut usize,
) -> Result<Float64Array> {
    let values = utils::column(batch, values_column)?;
    let denominator = utils::column(batch, denominator_column)?;

    let out: Float64Array = (0..batch.num_rows())
        .map(|row| {
            let value = utils::f64_value(values, row)?;
            match utils::f64_value(denominator, row) {
                Some(d) if d > 0.0 => Some(value / d * scale),
                _ => {
                    *guarded += 1;
                    None
                }
            }
        })
        .collect();
    Ok(out)
}

/// Append derived per-capita and percent-of-total columns.
///
/// Derived names are `{col}_per_capita`, `{col}_pct_exp` and `{col}_pct_rev`.
/// Columns named in the config but absent from the batch are a `Schema`
/// error: the config is the contract, silence would hide a broken merge.
pub fn normalize(
    batch: &RecordBatch,
    config: &NormalizeConfig,
    report: &mut QualityReport,
) -> Result<RecordBatch> {
    let schema = batch.schema();
    for required in [&config.population_column, &config.total_expenditure_column, &config.total_revenue_column] {
        if schema.index_of(required).is_err() {
            return Err(PanelError::schema(
                "normalize",
                format!("denominator column '{required}' is not in the panel"),
            ));
        }
    }

    let mut fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|f| f.as_ref().clone())
        .collect();
    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();
    let mut guarded = 0usize;

    for (source_columns, denominator, suffix, scale) in [
        (&config.per_capita_columns, &config.population_column, "per_capita", 1.0),
        (&config.expenditure_columns, &config.total_expenditure_column, "pct_exp", 100.0),
        (&config.revenue_columns, &config.total_revenue_column, "pct_rev", 100.0),
    ] {
        for name in source_columns {
            let derived = ratio_column(batch, name, denominator, scale, &mut guarded)?;
            fields.push(Field::new(format!("{name}_{suffix}"), DataType::Float64, true));
            columns.push(Arc::new(derived));
        }
    }

    if guarded > 0 {
        log::debug!("{guarded} derived cells nulled by zero or missing denominators");
        report.guarded_divisions += guarded;
    }

    let out_schema = Arc::new(Schema::new(fields));
    Ok(RecordBatch::try_new(out_schema, columns)?)
}

/// Append the ordinal `size_class` column derived from population
pub fn categorize_size(
    batch: &RecordBatch,
    population_column: &str,
    thresholds: &SizeThresholds,
) -> Result<RecordBatch> {
    let population = utils::column(batch, population_column)?;

    let size_class: StringArray = (0..batch.num_rows())
        .map(|row| thresholds.classify(utils::f64_value(population, row)))
        .collect();

    let schema = batch.schema();
    let mut fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|f| f.as_ref().clone())
        .collect();
    fields.push(Field::new("size_class", DataType::Utf8, true));

    let mut columns = batch.columns().to_vec();
    columns.push(Arc::new(size_class) as ArrayRef);

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Drop the raw columns that have derived counterparts, keeping the derived
/// ones (and everything else).
///
/// Useful after [`normalize`] when the analysis should only see comparable
/// features.
pub fn drop_raw_columns(batch: &RecordBatch, config: &NormalizeConfig) -> Result<RecordBatch> {
    let drop: Vec<&String> = config
        .per_capita_columns
        .iter()
        .chain(&config.expenditure_columns)
        .chain(&config.revenue_columns)
        .collect();

    let schema = batch.schema();
    let mut fields = Vec::new();
    let mut columns = Vec::new();
    for (idx, field) in schema.fields().iter().enumerate() {
        if drop.iter().any(|d| *d == field.name()) {
            continue;
        }
        fields.push(field.as_ref().clone());
        columns.push(Arc::clone(batch.column(idx)));
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds_match_census_buckets() {
        let t = SizeThresholds::default();
        assert_eq!(t.classify(Some(0.0)), Some("rural"));
        assert_eq!(t.classify(Some(2_499.0)), Some("rural"));
        assert_eq!(t.classify(Some(2_500.0)), Some("non-urban"));
        assert_eq!(t.classify(Some(49_999.0)), Some("non-urban"));
        assert_eq!(t.classify(Some(50_000.0)), Some("urban"));
        assert_eq!(t.classify(None), None);
    }

    #[test]
    fn moving_a_threshold_moves_the_boundary() {
        let t = SizeThresholds {
            rural_below: 1_000.0,
            urban_at_least: 10_000.0,
        };
        assert_eq!(t.classify(Some(1_500.0)), Some("non-urban"));
        assert_eq!(t.classify(Some(10_000.0)), Some("urban"));
    }
}
