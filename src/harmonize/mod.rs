//! Key harmonization across heterogeneous sources
//!
//! City names arrive in different spellings, postal codes arrive with and
//! without ZIP+4 suffixes, and counties arrive as names or codes. This
//! module derives one canonical join key per record and resolves each
//! financial row against the geographic lookup: exact match first, then a
//! configured alias table, with county metadata breaking ties between
//! places that share a name. Unresolved rows are flagged and retained; the
//! caller decides whether to exclude them.

use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use rustc_hash::FxHashMap;

use crate::error::util::safe_open_file;
use crate::error::{PanelError, Result};
use crate::report::QualityReport;
use crate::utils;

/// Canonical form of a city name: trimmed, uppercased, periods stripped,
/// interior whitespace collapsed.
///
/// `" St. Anthony "`, `"ST ANTHONY"` and `"st.  anthony"` all map to
/// `"ST ANTHONY"`.
#[must_use]
pub fn canonical_city_key(name: &str) -> String {
    name.replace('.', " ")
        .split_whitespace()
        .map(str::to_uppercase)
        .join(" ")
}

/// Known name variants mapped to canonical names, loaded from a JSON file
/// of `{"variant": "canonical", ...}` pairs.
///
/// Both sides are canonicalized on load, so the file can use any casing.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    map: FxHashMap<String, String>,
}

impl AliasTable {
    /// An empty table: exact-match-only harmonization
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load alias pairs from a JSON object file
    pub fn load(path: &Path) -> Result<Self> {
        let file = safe_open_file(path, "alias table")?;
        let raw: FxHashMap<String, String> = serde_json::from_reader(file).map_err(|e| {
            PanelError::load("alias table", format!("{}: {e}", path.display()))
        })?;

        let map = raw
            .into_iter()
            .map(|(variant, canonical)| {
                (canonical_city_key(&variant), canonical_city_key(&canonical))
            })
            .collect();
        Ok(Self { map })
    }

    /// Insert a single alias pair (tests and programmatic construction)
    pub fn insert(&mut self, variant: &str, canonical: &str) {
        self.map
            .insert(canonical_city_key(variant), canonical_city_key(canonical));
    }

    /// Canonical name for a variant key, if configured
    #[must_use]
    pub fn resolve(&self, canonical_variant: &str) -> Option<&str> {
        self.map.get(canonical_variant).map(String::as_str)
    }

    /// Number of configured aliases
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when no aliases are configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Collapse the ZIP-level geographic batch into one row per place.
///
/// A place is a distinct (canonical city key, county fips) pair; its
/// coordinates are the mean over the covered postal codes and its
/// representative postal code is the lowest. Input columns: `postal_code`,
/// `city`, `state`, `county`, `county_fips`, `latitude`, `longitude`.
pub fn build_city_lookup(geo: &RecordBatch) -> Result<RecordBatch> {
    let postal = utils::column(geo, "postal_code")?;
    let city = utils::column(geo, "city")?;
    let state = utils::column(geo, "state")?;
    let county = utils::column(geo, "county")?;
    let county_fips = utils::column(geo, "county_fips")?;
    let latitude = utils::column(geo, "latitude")?;
    let longitude = utils::column(geo, "longitude")?;

    struct Place {
        city: String,
        state: Option<String>,
        county: Option<String>,
        county_fips: Option<i64>,
        postal: Option<String>,
        lat_sum: f64,
        lon_sum: f64,
        coord_count: usize,
    }

    let mut order: Vec<(String, Option<i64>)> = Vec::new();
    let mut places: FxHashMap<(String, Option<i64>), Place> = FxHashMap::default();

    for row in 0..geo.num_rows() {
        let Some(name) = utils::string_value(city, row) else {
            continue;
        };
        let key = canonical_city_key(&name);
        let fips = utils::i64_value(county_fips, row);
        let entry = places.entry((key.clone(), fips)).or_insert_with(|| {
            order.push((key, fips));
            Place {
                city: name,
                state: None,
                county: None,
                county_fips: fips,
                postal: None,
                lat_sum: 0.0,
                lon_sum: 0.0,
                coord_count: 0,
            }
        });

        if entry.state.is_none() {
            entry.state = utils::string_value(state, row);
        }
        if entry.county.is_none() {
            entry.county = utils::string_value(county, row);
        }
        let zip = utils::string_value(postal, row);
        if let Some(zip) = zip
            && entry.postal.as_ref().is_none_or(|existing| zip < *existing)
        {
            entry.postal = Some(zip);
        }
        if let (Some(lat), Some(lon)) = (
            utils::f64_value(latitude, row),
            utils::f64_value(longitude, row),
        ) {
            entry.lat_sum += lat;
            entry.lon_sum += lon;
            entry.coord_count += 1;
        }
    }

    let mut city_key = Vec::with_capacity(order.len());
    let mut cities = Vec::with_capacity(order.len());
    let mut states = Vec::with_capacity(order.len());
    let mut counties = Vec::with_capacity(order.len());
    let mut fips_values = Vec::with_capacity(order.len());
    let mut postals = Vec::with_capacity(order.len());
    let mut lats = Vec::with_capacity(order.len());
    let mut lons = Vec::with_capacity(order.len());

    for key in &order {
        let place = &places[key];
        city_key.push(Some(key.0.clone()));
        cities.push(Some(place.city.clone()));
        states.push(place.state.clone());
        counties.push(place.county.clone());
        fips_values.push(place.county_fips);
        postals.push(place.postal.clone());
        if place.coord_count > 0 {
            lats.push(Some(place.lat_sum / place.coord_count as f64));
            lons.push(Some(place.lon_sum / place.coord_count as f64));
        } else {
            lats.push(None);
            lons.push(None);
        }
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("city_key", DataType::Utf8, false),
        Field::new("place_name", DataType::Utf8, true),
        Field::new("state", DataType::Utf8, true),
        Field::new("county", DataType::Utf8, true),
        Field::new("county_fips", DataType::Int64, true),
        Field::new("postal_code", DataType::Utf8, true),
        Field::new("latitude", DataType::Float64, true),
        Field::new("longitude", DataType::Float64, true),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(city_key)),
        Arc::new(StringArray::from(cities)),
        Arc::new(StringArray::from(states)),
        Arc::new(StringArray::from(counties)),
        Arc::new(Int64Array::from(fips_values)),
        Arc::new(StringArray::from(postals)),
        Arc::new(Float64Array::from(lats)),
        Arc::new(Float64Array::from(lons)),
    ];
    Ok(RecordBatch::try_new(schema, columns)?)
}

/// Index over the place-level lookup, keyed by canonical city key
#[derive(Debug)]
pub struct GeoIndex {
    by_key: FxHashMap<String, Vec<usize>>,
    county_fips: Vec<Option<i64>>,
}

/// How a city resolved against the geographic lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The canonical key matched directly; row index into the lookup
    Exact(usize),
    /// The alias table redirected to a matching canonical key
    Alias(usize),
    /// No match, or an ambiguity no tie-break could settle
    Unresolved,
}

impl GeoIndex {
    /// Build the index from a [`build_city_lookup`] batch
    pub fn from_lookup(lookup: &RecordBatch) -> Result<Self> {
        let keys = utils::column(lookup, "city_key")?;
        let fips = utils::column(lookup, "county_fips")?;

        let mut by_key: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        let mut county_fips = Vec::with_capacity(lookup.num_rows());
        for row in 0..lookup.num_rows() {
            if let Some(key) = utils::string_value(keys, row) {
                by_key.entry(key).or_default().push(row);
            }
            county_fips.push(utils::i64_value(fips, row));
        }
        Ok(Self { by_key, county_fips })
    }

    /// Resolve one city name against the lookup.
    ///
    /// Exact canonical-key match first, alias fallback second. When a key
    /// names several places, the one whose county matches the financial
    /// row's county wins; with no county agreement the row stays
    /// unresolved rather than guessing.
    #[must_use]
    pub fn resolve(
        &self,
        city: &str,
        county_hint: Option<i64>,
        aliases: &AliasTable,
    ) -> Resolution {
        let key = canonical_city_key(city);

        if let Some(rows) = self.by_key.get(&key) {
            if let Some(row) = self.pick(rows, county_hint) {
                return Resolution::Exact(row);
            }
            return Resolution::Unresolved;
        }

        if let Some(canonical) = aliases.resolve(&key)
            && let Some(rows) = self.by_key.get(canonical)
            && let Some(row) = self.pick(rows, county_hint)
        {
            return Resolution::Alias(row);
        }

        Resolution::Unresolved
    }

    fn pick(&self, rows: &[usize], county_hint: Option<i64>) -> Option<usize> {
        if rows.len() == 1 {
            return Some(rows[0]);
        }
        let hint = county_hint?;
        rows.iter()
            .find(|&&row| self.county_fips[row] == Some(hint))
            .copied()
    }
}

/// Per-row outcome of harmonizing the authoritative table's city keys
#[derive(Debug)]
pub struct CityResolution {
    /// Canonical key per financial row (derived even when unresolved)
    pub city_key: StringArray,
    /// Matching row in the place lookup, where resolved
    pub lookup_rows: Vec<Option<u32>>,
    /// Per-row resolution flag (`false` rows are retained but unjoinable)
    pub resolved: BooleanArray,
}

/// Resolve every row of the financial table against the place lookup.
///
/// Unresolved rows are counted in the report, flagged, and kept.
pub fn resolve_cities(
    financial: &RecordBatch,
    city_column: &str,
    county_column: &str,
    index: &GeoIndex,
    aliases: &AliasTable,
    report: &mut QualityReport,
) -> Result<CityResolution> {
    let cities = utils::column(financial, city_column)?;
    let counties = utils::column(financial, county_column)?;

    let mut keys: Vec<Option<String>> = Vec::with_capacity(financial.num_rows());
    let mut lookup_rows = Vec::with_capacity(financial.num_rows());
    let mut resolved_flags = Vec::with_capacity(financial.num_rows());
    let mut unresolved = 0usize;
    let mut alias_hits = 0usize;

    for row in 0..financial.num_rows() {
        let Some(city) = utils::string_value(cities, row) else {
            keys.push(None);
            lookup_rows.push(None);
            resolved_flags.push(Some(false));
            unresolved += 1;
            continue;
        };
        let hint = utils::i64_value(counties, row);
        let key = canonical_city_key(&city);

        match index.resolve(&city, hint, aliases) {
            Resolution::Exact(lookup_row) => {
                lookup_rows.push(Some(lookup_row as u32));
                resolved_flags.push(Some(true));
            }
            Resolution::Alias(lookup_row) => {
                alias_hits += 1;
                lookup_rows.push(Some(lookup_row as u32));
                resolved_flags.push(Some(true));
            }
            Resolution::Unresolved => {
                unresolved += 1;
                lookup_rows.push(None);
                resolved_flags.push(Some(false));
            }
        }
        keys.push(Some(key));
    }

    if alias_hits > 0 {
        log::info!("{alias_hits} city names resolved through the alias table");
    }
    if unresolved > 0 {
        log::warn!("{unresolved} financial rows have no geographic match; flagged as unjoinable");
        report.unresolved_city_keys += unresolved;
    }

    Ok(CityResolution {
        city_key: StringArray::from(keys),
        lookup_rows,
        resolved: BooleanArray::from(resolved_flags),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_keys_collapse_spelling_variants() {
        assert_eq!(canonical_city_key(" St. Anthony "), "ST ANTHONY");
        assert_eq!(canonical_city_key("ST ANTHONY"), "ST ANTHONY");
        assert_eq!(canonical_city_key("st.  anthony"), "ST ANTHONY");
        assert_eq!(canonical_city_key("Boise"), "BOISE");
    }

    #[test]
    fn alias_table_canonicalizes_both_sides() {
        let mut aliases = AliasTable::empty();
        aliases.insert("Cd'A", "Coeur d'Alene");
        assert_eq!(aliases.resolve("CD'A"), Some("COEUR D'ALENE"));
        assert_eq!(aliases.resolve("NOWHERE"), None);
    }
}
