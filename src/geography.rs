//! Country → city lookup table.
//!
//! The flattened city list (countries in declaration order, cities in
//! declaration order within each country) defines the one-hot column order
//! of the feature vector. Reordering or inserting entries here changes the
//! model input layout; see `encoder::FEATURE_SCHEMA_VERSION`.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::ConfigurationError;

// ============================================================================
// Reference table (matches the layout the bundled model was trained on)
// ============================================================================

static REFERENCE_TABLE: &[(&str, &[&str])] = &[
    ("USA", &["Los Angeles", "New York"]),
    ("India", &["Chennai", "Delhi", "Mumbai"]),
    ("UAE", &["Dubai"]),
    ("UK", &["London"]),
    ("Australia", &["Sydney"]),
    ("China", &["Shanghai"]),
];

/// Ordered country → cities mapping. Immutable once built.
#[derive(Debug, Clone)]
pub struct GeographyTable {
    countries: Vec<Country>,
    index: FxHashMap<String, usize>,
    flattened: Vec<String>,
}

#[derive(Debug, Clone)]
struct Country {
    name: String,
    cities: Vec<String>,
}

impl GeographyTable {
    /// Build a table from `(country, cities)` entries, in order.
    ///
    /// Rejects duplicate countries, duplicate cities (a city may belong to
    /// exactly one country) and countries without cities.
    pub fn new<C, I, S>(entries: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (C, Vec<S>)>,
        C: Into<String>,
        S: Into<String>,
    {
        let mut countries = Vec::new();
        let mut index = FxHashMap::default();
        let mut seen_cities = FxHashSet::default();

        for (name, cities) in entries {
            let name = name.into();
            let cities: Vec<String> = cities.into_iter().map(Into::into).collect();

            if cities.is_empty() {
                return Err(ConfigurationError::Geography(format!(
                    "country '{}' has no cities",
                    name
                )));
            }
            if index.contains_key(&name) {
                return Err(ConfigurationError::Geography(format!(
                    "country '{}' is listed twice",
                    name
                )));
            }
            for city in &cities {
                if !seen_cities.insert(city.clone()) {
                    return Err(ConfigurationError::Geography(format!(
                        "city '{}' appears under more than one country",
                        city
                    )));
                }
            }

            index.insert(name.clone(), countries.len());
            countries.push(Country { name, cities });
        }

        let flattened = countries
            .iter()
            .flat_map(|c| c.cities.iter().cloned())
            .collect();

        Ok(Self {
            countries,
            index,
            flattened,
        })
    }

    /// The table the bundled model was trained against.
    pub fn reference() -> Self {
        let mut countries = Vec::with_capacity(REFERENCE_TABLE.len());
        let mut index = FxHashMap::default();
        for (i, (name, cities)) in REFERENCE_TABLE.iter().enumerate() {
            index.insert(name.to_string(), i);
            countries.push(Country {
                name: name.to_string(),
                cities: cities.iter().map(|c| c.to_string()).collect(),
            });
        }
        let flattened = countries
            .iter()
            .flat_map(|c| c.cities.iter().cloned())
            .collect();

        Self {
            countries,
            index,
            flattened,
        }
    }

    /// Cities of `country` in declaration order, or `None` for an unknown country.
    pub fn cities_of(&self, country: &str) -> Option<&[String]> {
        self.index
            .get(country)
            .map(|&i| self.countries[i].cities.as_slice())
    }

    /// All cities, concatenated in table order. This is the one-hot column order.
    pub fn all_cities_flattened(&self) -> &[String] {
        &self.flattened
    }

    /// Country names in declaration order.
    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.countries.iter().map(|c| c.name.as_str())
    }

    pub fn contains_country(&self, country: &str) -> bool {
        self.index.contains_key(country)
    }

    pub fn total_city_count(&self) -> usize {
        self.flattened.len()
    }

    /// Position of `city` within the flattened list.
    pub fn city_position(&self, city: &str) -> Option<usize> {
        self.flattened.iter().position(|c| c == city)
    }
}

impl Default for GeographyTable {
    fn default() -> Self {
        Self::reference()
    }
}
