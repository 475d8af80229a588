//! City/country consistency check.
//!
//! `validate` is the only way to obtain a `ValidatedLocation`, and the
//! encoder only accepts a `ValidatedLocation`, so an unchecked selection can
//! never reach the model.

use crate::error::ValidationError;
use crate::geography::GeographyTable;
use crate::readings::LocationSelection;

/// A location whose city is known to belong to its country.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLocation(LocationSelection);

impl ValidatedLocation {
    pub fn country(&self) -> &str {
        &self.0.country
    }

    pub fn city(&self) -> &str {
        &self.0.city
    }
}

/// Check that `city` is one of `country`'s cities.
///
/// An unknown country has no cities, so every city fails for it.
pub fn validate(
    geography: &GeographyTable,
    country: &str,
    city: &str,
) -> Result<ValidatedLocation, ValidationError> {
    let belongs = geography
        .cities_of(country)
        .map(|cities| cities.iter().any(|c| c == city))
        .unwrap_or(false);

    if belongs {
        Ok(ValidatedLocation(LocationSelection::new(country, city)))
    } else {
        Err(ValidationError::InvalidCity {
            country: country.to_string(),
            city: city.to_string(),
        })
    }
}

/// `validate` over a `LocationSelection`.
pub fn validate_location(
    geography: &GeographyTable,
    location: &LocationSelection,
) -> Result<ValidatedLocation, ValidationError> {
    validate(geography, &location.country, &location.city)
}
