//! Full pipeline runs over a synthetic data directory: harmonization
//! with aliases and tie-breaks, merge composition, inflation, derived
//! features, export round-trip and the abbreviated subset.

mod common;

use std::path::Path;
use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema};
use common::{financial_csv, geo_line, write_file, FinRow, EMPLOYMENT_HEADER};
use muni_panel::inflation::Period;
use muni_panel::source::read::read_delimited;
use muni_panel::{abbreviated_panel, PanelBuilder, PanelOptions, PipelineConfig};
use muni_panel::utils;

/// Lay out a complete synthetic data directory and point a config at it
fn configure(dir: &Path) -> PipelineConfig {
    let rows = vec![
        FinRow::default(), // BOISE 2005, county 1, pop 200k, debt 1M
        FinRow {
            city: "ST ANTHONY",
            year: 2005,
            county_fips: 43,
            population: 3_000,
            total_revenue: 8_000.0,
            total_expenditure: 6_000.0,
            total_debt: 20_000.0,
            total_crime: 12.0,
        },
        FinRow {
            city: "COEUR D ALENE",
            year: 2005,
            county_fips: 55,
            population: 40_000,
            total_revenue: 90_000.0,
            total_expenditure: 70_000.0,
            total_debt: 150_000.0,
            total_crime: 60.0,
        },
        FinRow {
            city: "NOWHERE",
            year: 2007,
            county_fips: 1,
            population: 0,
            total_revenue: 60_000.0,
            total_expenditure: 50_000.0,
            total_debt: 10_000.0,
            total_crime: 5.0,
        },
    ];
    write_file(dir, "municipal/municipal_database.csv", &financial_csv(&rows));

    // Two Boise ZIPs so coordinates aggregate to the place mean
    let geo = [
        geo_line("83701", "Boise", "Ada", "001", 43.6, -116.2),
        geo_line("83702-4455", "Boise", "Ada", "001", 43.8, -116.4),
        geo_line("83445", "St. Anthony", "Fremont", "043", 43.97, -111.68),
        geo_line("83814", "Coeur d'Alene", "Kootenai", "055", 47.67, -116.78),
    ]
    .join("\n");
    write_file(dir, "id_postal_codes.txt", &geo);

    write_file(
        dir,
        "employment/laucnty05.csv",
        &format!(
            "{EMPLOYMENT_HEADER}\n\
             1,16,2005,180000,170000,10000,5.6\n\
             43,16,2005,6000,5700,300,5.0\n\
             55,16,2005,30000,28400,1600,5.3\n"
        ),
    );
    write_file(
        dir,
        "employment/laucnty07.csv",
        &format!("{EMPLOYMENT_HEADER}\n1,16,2007,190000,181000,9000,4.7\n"),
    );

    write_file(
        dir,
        "cpi_series.csv",
        "year,period,value\n\
         2005,M13,195.3\n\
         2007,M13,207.3\n\
         2019,M10,257.2\n",
    );

    write_file(
        dir,
        "column_descriptions.csv",
        "name,description\n\
         total_crime,All index crimes reported\n\
         total_debt,Outstanding municipal debt\n",
    );

    write_file(
        dir,
        "city_aliases.json",
        "{\"COEUR D ALENE\": \"Coeur d'Alene\"}",
    );

    let mut config = PipelineConfig::default();
    config.workbook_dir = dir.join("municipal");
    config.geographic_path = dir.join("id_postal_codes.txt");
    config.employment_dir = dir.join("employment");
    config.cpi_path = dir.join("cpi_series.csv");
    config.columns_path = dir.join("column_descriptions.csv");
    config.alias_path = Some(dir.join("city_aliases.json"));
    config
}

#[test]
fn builds_the_complete_panel() {
    let dir = tempfile::tempdir().unwrap();
    let config = configure(dir.path());
    let run = PanelBuilder::new(config)
        .build(&PanelOptions::default())
        .unwrap();

    // Cardinality: one row per authoritative (city, year)
    assert_eq!(run.panel.num_rows(), 4);
    assert_eq!(run.report.authoritative_rows, 4);

    // Boise: inflation-adjusted debt in Oct 2019 dollars
    let debt = utils::column(&run.panel, "total_debt").unwrap();
    let boise_debt = utils::f64_value(debt, 0).unwrap();
    assert!((boise_debt - 1_000_000.0 * 257.2 / 195.3).abs() < 1e-6);

    // Coordinates come from the place mean over its ZIP rows
    let lat = utils::column(&run.panel, "latitude").unwrap();
    assert!((utils::f64_value(lat, 0).unwrap() - 43.7).abs() < 1e-9);

    // Employment joined on (county, year)
    let labor = utils::column(&run.panel, "labor_force").unwrap();
    assert_eq!(utils::f64_value(labor, 0), Some(180_000.0));
    assert_eq!(utils::f64_value(labor, 3), Some(190_000.0));

    // Alias resolved Coeur d'Alene; spelling variant matched St Anthony
    let resolved = utils::column(&run.panel, "geo_resolved").unwrap();
    let lat_cda = utils::f64_value(lat, 2).unwrap();
    assert!((lat_cda - 47.67).abs() < 1e-9);
    let postal = utils::column(&run.panel, "postal_code").unwrap();
    assert_eq!(utils::string_value(postal, 1).as_deref(), Some("83445"));

    // The unknown city is retained, flagged, with null geography
    assert_eq!(run.report.unresolved_city_keys, 1);
    assert_eq!(utils::f64_value(lat, 3), None);
    use arrow::array::{Array, BooleanArray};
    let resolved = resolved.as_any().downcast_ref::<BooleanArray>().unwrap();
    assert!(resolved.value(0));
    assert!(!resolved.value(3));

    // Derived features and size buckets (per-capita is over real dollars,
    // so the nominal 1.5 is scaled by the 2005 inflation factor)
    let per_capita = utils::column(&run.panel, "total_expenditure_per_capita").unwrap();
    let expected = 300_000.0 * (257.2 / 195.3) / 200_000.0;
    assert!((utils::f64_value(per_capita, 0).unwrap() - expected).abs() < 1e-9);
    // Zero population: null, not an arithmetic error
    assert_eq!(utils::f64_value(per_capita, 3), None);
    assert!(run.report.guarded_divisions >= 1);

    let size = utils::column(&run.panel, "size_class").unwrap();
    assert_eq!(utils::string_value(size, 0).as_deref(), Some("urban"));
    assert_eq!(utils::string_value(size, 1).as_deref(), Some("non-urban"));
}

#[test]
fn normalize_flag_controls_feature_derivation() {
    let dir = tempfile::tempdir().unwrap();
    let config = configure(dir.path());
    let run = PanelBuilder::new(config)
        .build(&PanelOptions {
            normalize: false,
            export: None,
        })
        .unwrap();

    assert!(utils::column(&run.panel, "total_expenditure_per_capita").is_err());
    // The size bucket is categorization, not normalization; always present
    assert!(utils::column(&run.panel, "size_class").is_ok());
}

#[test]
fn export_round_trips_non_derived_cells() {
    let dir = tempfile::tempdir().unwrap();
    let config = configure(dir.path());
    let export_path = dir.path().join("panel.csv");
    let run = PanelBuilder::new(config)
        .build(&PanelOptions {
            normalize: true,
            export: Some(export_path.clone()),
        })
        .unwrap();

    let expected = Arc::new(Schema::new(vec![
        Field::new("city", DataType::Utf8, false),
        Field::new("year", DataType::Int64, false),
        Field::new("population", DataType::Int64, true),
        Field::new("total_debt", DataType::Float64, true),
        Field::new("latitude", DataType::Float64, true),
    ]));
    let reloaded = read_delimited(&export_path, "panel", &expected, b',').unwrap();
    assert_eq!(reloaded.num_rows(), run.panel.num_rows());

    let exported_debt = utils::column(&run.panel, "total_debt").unwrap();
    let reloaded_debt = utils::column(&reloaded, "total_debt").unwrap();
    for row in 0..run.panel.num_rows() {
        match (
            utils::f64_value(exported_debt, row),
            utils::f64_value(reloaded_debt, row),
        ) {
            (Some(a), Some(b)) => assert!((a - b).abs() < 1e-6 * a.abs().max(1.0)),
            (a, b) => assert_eq!(a, b),
        }
    }

    let city = utils::column(&reloaded, "city").unwrap();
    assert_eq!(utils::string_value(city, 0).as_deref(), Some("BOISE"));
}

#[test]
fn abbreviated_subset_filters_years_and_cities() {
    let dir = tempfile::tempdir().unwrap();
    let config = configure(dir.path());
    let run = PanelBuilder::new(config)
        .build(&PanelOptions::default())
        .unwrap();

    let subset = abbreviated_panel(&run.panel, &[2005], &["Boise", "St. Anthony"]).unwrap();
    assert_eq!(subset.num_rows(), 2);

    let city = utils::column(&subset, "city").unwrap();
    assert_eq!(utils::string_value(city, 0).as_deref(), Some("BOISE"));
    assert_eq!(utils::string_value(city, 1).as_deref(), Some("ST ANTHONY"));
}

#[test]
fn metadata_catalog_loads_alongside_the_build() {
    let dir = tempfile::tempdir().unwrap();
    let config = configure(dir.path());
    let builder = PanelBuilder::new(config);
    let catalog = builder.metadata().unwrap();

    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.search("crime").len(), 1);
    assert!(catalog.search("xyzzy").is_empty());

    let run = builder.build(&PanelOptions::default()).unwrap();
    assert_eq!(run.panel.num_rows(), 4);
    assert_eq!(
        Period::parse("Oct 2019").unwrap(),
        builder.config().reference_period
    );
}
