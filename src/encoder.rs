//! Feature encoding: readings + location → model input vector.
//!
//! Column layout, schema v1 (must match the order the model was trained on):
//!
//! | index      | column          | value                                  |
//! |------------|-----------------|----------------------------------------|
//! | 0..6       | pm25 … o3       | pollutants, declaration order          |
//! | 6..9       | temperature, humidity, wind_speed | weather              |
//! | 9          | country_usa     | 1 iff country == "USA", else 0         |
//! | 10..10+N   | city_<slug>     | one-hot over the flattened city list   |
//!
//! The country indicator is deliberately NOT one-hot over all countries.
//! The trained model only ever saw a single USA flag.
//!
//! Any change to this layout or to the geography table order requires a new
//! `FEATURE_SCHEMA_VERSION` and a retrained model artifact.

use std::ops::Range;

use crate::geography::GeographyTable;
use crate::readings::ReadingSet;
use crate::validator::ValidatedLocation;

pub const FEATURE_SCHEMA_VERSION: u32 = 1;

/// The only country with its own indicator column.
pub const REFERENCE_COUNTRY: &str = "USA";

pub const READING_COLUMNS: [&str; 9] = [
    "pm25",
    "pm10",
    "no2",
    "so2",
    "co",
    "o3",
    "temperature",
    "humidity",
    "wind_speed",
];

pub const COUNTRY_INDICATOR_COLUMN: &str = "country_usa";

/// Column name for a city's one-hot slot, e.g. `"Los Angeles"` → `city_los_angeles`.
pub fn city_column_name(city: &str) -> String {
    let slug: String = city
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("city_{}", slug)
}

// ============================================================================
// Schema
// ============================================================================

/// Named, ordered column layout for one geography table.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    columns: Vec<String>,
    cities: Vec<String>,
}

impl FeatureSchema {
    pub fn for_geography(geography: &GeographyTable) -> Self {
        let cities = geography.all_cities_flattened().to_vec();
        let columns = READING_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(std::iter::once(COUNTRY_INDICATOR_COLUMN.to_string()))
            .chain(cities.iter().map(|c| city_column_name(c)))
            .collect();

        Self { columns, cities }
    }

    pub fn version(&self) -> u32 {
        FEATURE_SCHEMA_VERSION
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// `9 + 1 + number of cities`
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn country_indicator_index(&self) -> usize {
        READING_COLUMNS.len()
    }

    /// Index range of the one-hot city segment.
    pub fn city_range(&self) -> Range<usize> {
        let start = READING_COLUMNS.len() + 1;
        start..start + self.cities.len()
    }

    /// Encode into labeled columns, in schema order.
    pub fn encode_labeled(
        &self,
        readings: &ReadingSet,
        location: &ValidatedLocation,
    ) -> LabeledFeatures<'_> {
        let p = &readings.pollutants;
        let w = &readings.weather;
        let values = [
            p.pm25,
            p.pm10,
            p.no2,
            p.so2,
            p.co,
            p.o3,
            w.temperature,
            w.humidity,
            f64::from(w.wind_speed),
        ];

        let country_flag = if location.country() == REFERENCE_COUNTRY { 1.0 } else { 0.0 };

        let mut entries = Vec::with_capacity(self.columns.len());
        entries.extend(
            self.columns[..READING_COLUMNS.len()]
                .iter()
                .map(String::as_str)
                .zip(values),
        );
        entries.push((self.columns[self.country_indicator_index()].as_str(), country_flag));
        entries.extend(
            self.columns[self.city_range()]
                .iter()
                .zip(&self.cities)
                .map(|(column, city)| {
                    let hot = if city == location.city() { 1.0 } else { 0.0 };
                    (column.as_str(), hot)
                }),
        );

        LabeledFeatures { entries }
    }

    /// Encode straight to the flat model input.
    pub fn encode(&self, readings: &ReadingSet, location: &ValidatedLocation) -> FeatureVector {
        self.encode_labeled(readings, location).into_vector()
    }
}

// ============================================================================
// Encoded output
// ============================================================================

/// Encoder output with column names attached.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledFeatures<'a> {
    entries: Vec<(&'a str, f64)>,
}

impl<'a> LabeledFeatures<'a> {
    pub fn get(&self, column: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop the labels. This is the single hand-off point to the model.
    pub fn into_vector(self) -> FeatureVector {
        FeatureVector(self.entries.into_iter().map(|(_, v)| v).collect())
    }
}

/// Flat, ordered model input.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}
