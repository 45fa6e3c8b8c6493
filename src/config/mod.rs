//! Configuration for the panel pipeline.
//!
//! One explicit struct enumerates every input path and tunable; nothing in
//! the library reads module-level defaults or environment state.

use std::fmt;
use std::path::PathBuf;

use crate::inflation::Period;
use crate::normalize::{NormalizeConfig, SizeThresholds};

/// Configuration for a panel build
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding one delimited export per workbook sheet
    pub workbook_dir: PathBuf,
    /// Which sheet of the financial workbook to load (`<sheet>.csv` in
    /// `workbook_dir`)
    pub sheet_name: String,
    /// GeoNames-style postal file (tab-delimited, no header)
    pub geographic_path: PathBuf,
    /// Directory of per-year employment files
    pub employment_dir: PathBuf,
    /// CPI table in BLS SeriesReport layout (year, period, value)
    pub cpi_path: PathBuf,
    /// Two-column column-name/description table
    pub columns_path: PathBuf,
    /// Optional JSON map of city-name variants to canonical names
    pub alias_path: Option<PathBuf>,
    /// Period whose dollars every currency column is rescaled to
    pub reference_period: Period,
    /// Population cutoffs for the `size_class` bucket
    pub thresholds: SizeThresholds,
    /// Column lists for the derived features
    pub normalize: NormalizeConfig,
    /// Currency columns subject to inflation adjustment
    pub currency_columns: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let data = PathBuf::from("data");
        Self {
            workbook_dir: data.join("municipal"),
            sheet_name: "municipal_database".to_string(),
            geographic_path: data.join("id_postal_codes.txt"),
            employment_dir: data.join("employment"),
            cpi_path: data.join("cpi_series.csv"),
            columns_path: data.join("column_descriptions.csv"),
            alias_path: Some(data.join("city_aliases.json")),
            reference_period: Period::Month(2019, 10),
            thresholds: SizeThresholds::default(),
            normalize: NormalizeConfig {
                population_column: "population".to_string(),
                total_expenditure_column: "total_expenditure".to_string(),
                total_revenue_column: "total_revenue".to_string(),
                expenditure_columns: vec![
                    "police_expenditure".to_string(),
                    "fire_expenditure".to_string(),
                    "highways_expenditure".to_string(),
                    "parks_expenditure".to_string(),
                    "sewerage_expenditure".to_string(),
                ],
                revenue_columns: vec![
                    "tax_revenue".to_string(),
                    "intergovernmental_revenue".to_string(),
                    "charges_revenue".to_string(),
                ],
                per_capita_columns: vec![
                    "total_expenditure".to_string(),
                    "total_revenue".to_string(),
                    "total_debt".to_string(),
                    "long_term_debt".to_string(),
                    "total_crime".to_string(),
                    "violent_crime".to_string(),
                    "property_crime".to_string(),
                ],
            },
            currency_columns: vec![
                "total_revenue".to_string(),
                "tax_revenue".to_string(),
                "intergovernmental_revenue".to_string(),
                "charges_revenue".to_string(),
                "total_expenditure".to_string(),
                "police_expenditure".to_string(),
                "fire_expenditure".to_string(),
                "highways_expenditure".to_string(),
                "parks_expenditure".to_string(),
                "sewerage_expenditure".to_string(),
                "total_debt".to_string(),
                "long_term_debt".to_string(),
                "short_term_debt".to_string(),
                "interest_on_debt".to_string(),
            ],
        }
    }
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pipeline Configuration:")?;
        writeln!(f, "  Workbook: {} (sheet {})", self.workbook_dir.display(), self.sheet_name)?;
        writeln!(f, "  Geographic: {}", self.geographic_path.display())?;
        writeln!(f, "  Employment: {}", self.employment_dir.display())?;
        writeln!(f, "  CPI: {}", self.cpi_path.display())?;
        writeln!(f, "  Reference Period: {}", self.reference_period)?;
        if let Some(alias) = &self.alias_path {
            writeln!(f, "  Alias Table: {}", alias.display())?;
        }
        writeln!(
            f,
            "  Size Thresholds: rural < {}, urban >= {}",
            self.thresholds.rural_below, self.thresholds.urban_at_least
        )?;
        Ok(())
    }
}
