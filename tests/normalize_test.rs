//! Feature derivation: per-capita and percent-of-total guards, size
//! buckets, and raw-column dropping.

mod common;

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use common::batch;
use muni_panel::error::PanelError;
use muni_panel::normalize::{
    categorize_size, drop_raw_columns, normalize, NormalizeConfig, SizeThresholds,
};
use muni_panel::report::QualityReport;
use muni_panel::utils;

fn config() -> NormalizeConfig {
    NormalizeConfig {
        population_column: "population".to_string(),
        total_expenditure_column: "total_expenditure".to_string(),
        total_revenue_column: "total_revenue".to_string(),
        expenditure_columns: vec!["police_expenditure".to_string()],
        revenue_columns: vec!["tax_revenue".to_string()],
        per_capita_columns: vec!["total_expenditure".to_string(), "total_crime".to_string()],
    }
}

fn panel() -> arrow::record_batch::RecordBatch {
    batch(vec![
        (
            "city",
            Arc::new(StringArray::from(vec!["BOISE", "GHOST TOWN", "DRIGGS"])) as ArrayRef,
        ),
        (
            "population",
            Arc::new(Int64Array::from(vec![Some(200_000), Some(0), None])) as ArrayRef,
        ),
        (
            "total_expenditure",
            Arc::new(Float64Array::from(vec![300_000.0, 50_000.0, 9_000.0])) as ArrayRef,
        ),
        (
            "police_expenditure",
            Arc::new(Float64Array::from(vec![60_000.0, 5_000.0, 900.0])) as ArrayRef,
        ),
        (
            "total_revenue",
            Arc::new(Float64Array::from(vec![Some(400_000.0), Some(0.0), Some(10_000.0)]))
                as ArrayRef,
        ),
        (
            "tax_revenue",
            Arc::new(Float64Array::from(vec![200_000.0, 30_000.0, 5_000.0])) as ArrayRef,
        ),
        (
            "total_crime",
            Arc::new(Float64Array::from(vec![Some(100.0), Some(3.0), None])) as ArrayRef,
        ),
    ])
}

#[test]
fn per_capita_divides_by_positive_population() {
    let mut report = QualityReport::default();
    let out = normalize(&panel(), &config(), &mut report).unwrap();

    let per_capita = utils::column(&out, "total_expenditure_per_capita").unwrap();
    assert_eq!(utils::f64_value(per_capita, 0), Some(1.5));

    let crime = utils::column(&out, "total_crime_per_capita").unwrap();
    assert_eq!(utils::f64_value(crime, 0), Some(0.0005));
}

#[test]
fn zero_or_missing_population_yields_null_not_an_error() {
    let mut report = QualityReport::default();
    let out = normalize(&panel(), &config(), &mut report).unwrap();

    let per_capita = utils::column(&out, "total_expenditure_per_capita").unwrap();
    // The documented scenario: population 0 with expenditure 50,000
    assert_eq!(utils::f64_value(per_capita, 1), None);
    // Missing population too
    assert_eq!(utils::f64_value(per_capita, 2), None);
    assert!(report.guarded_divisions >= 2);
}

#[test]
fn percent_of_total_columns_scale_to_one_hundred() {
    let mut report = QualityReport::default();
    let out = normalize(&panel(), &config(), &mut report).unwrap();

    let pct_exp = utils::column(&out, "police_expenditure_pct_exp").unwrap();
    assert_eq!(utils::f64_value(pct_exp, 0), Some(20.0));

    let pct_rev = utils::column(&out, "tax_revenue_pct_rev").unwrap();
    assert_eq!(utils::f64_value(pct_rev, 0), Some(50.0));
    // Zero total revenue guards the division
    assert_eq!(utils::f64_value(pct_rev, 1), None);
}

#[test]
fn input_batch_is_not_mutated() {
    let input = panel();
    let columns_before = input.num_columns();
    let mut report = QualityReport::default();
    let out = normalize(&input, &config(), &mut report).unwrap();

    assert_eq!(input.num_columns(), columns_before);
    assert!(out.num_columns() > columns_before);
    // Same raw cells in the input after the run
    let exp = utils::column(&input, "total_expenditure").unwrap();
    assert_eq!(utils::f64_value(exp, 1), Some(50_000.0));
}

#[test]
fn missing_denominator_column_is_a_schema_error() {
    let incomplete = batch(vec![(
        "city",
        Arc::new(StringArray::from(vec!["BOISE"])) as ArrayRef,
    )]);
    let mut report = QualityReport::default();
    let err = normalize(&incomplete, &config(), &mut report).unwrap_err();
    assert!(matches!(err, PanelError::Schema { .. }));
}

#[test]
fn size_buckets_come_from_the_threshold_config() {
    let cities = batch(vec![
        (
            "city",
            Arc::new(StringArray::from(vec!["BOISE", "DRIGGS", "MIDVALE", "UNKNOWN"])) as ArrayRef,
        ),
        (
            "population",
            Arc::new(Int64Array::from(vec![Some(200_000), Some(1_800), Some(4_000), None]))
                as ArrayRef,
        ),
    ]);

    let out = categorize_size(&cities, "population", &SizeThresholds::default()).unwrap();
    let size = utils::column(&out, "size_class").unwrap();
    assert_eq!(utils::string_value(size, 0).as_deref(), Some("urban"));
    assert_eq!(utils::string_value(size, 1).as_deref(), Some("rural"));
    assert_eq!(utils::string_value(size, 2).as_deref(), Some("non-urban"));
    assert_eq!(utils::string_value(size, 3), None);

    // Moving a threshold moves the boundary without touching anything else
    let wide_rural = SizeThresholds {
        rural_below: 5_000.0,
        urban_at_least: 50_000.0,
    };
    let out = categorize_size(&cities, "population", &wide_rural).unwrap();
    let size = utils::column(&out, "size_class").unwrap();
    assert_eq!(utils::string_value(size, 2).as_deref(), Some("rural"));
}

#[test]
fn drop_raw_columns_keeps_only_derived_counterparts() {
    let mut report = QualityReport::default();
    let cfg = config();
    let out = normalize(&panel(), &cfg, &mut report).unwrap();
    let trimmed = drop_raw_columns(&out, &cfg).unwrap();

    assert!(utils::column(&trimmed, "total_expenditure_per_capita").is_ok());
    assert!(utils::column(&trimmed, "police_expenditure_pct_exp").is_ok());
    assert!(utils::column(&trimmed, "police_expenditure").is_err());
    assert!(utils::column(&trimmed, "total_crime").is_err());
    // Denominators and identifiers survive
    assert!(utils::column(&trimmed, "population").is_ok());
    assert!(utils::column(&trimmed, "city").is_ok());
}
