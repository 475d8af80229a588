//! Pollutant and weather readings, plus the raw form they are collected from.
//!
//! Each input field has a documented `[min, max]` range. Bounds are only used
//! to clamp what the user typed; they are never a validation failure.

use serde::{Deserialize, Serialize};

use crate::geography::GeographyTable;

/// Range and default value of one numeric form field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldBounds {
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl FieldBounds {
    const fn new(min: f64, max: f64, default: f64) -> Self {
        Self { min, max, default }
    }

    /// Clamp into `[min, max]`; non-finite input falls back to the default.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_finite() {
            value.clamp(self.min, self.max)
        } else {
            self.default
        }
    }
}

// ============================================================================
// Field bounds
// ============================================================================

pub const PM25_BOUNDS: FieldBounds = FieldBounds::new(0.0, 500.0, 0.0);
pub const PM10_BOUNDS: FieldBounds = FieldBounds::new(0.0, 500.0, 0.0);
pub const NO2_BOUNDS: FieldBounds = FieldBounds::new(0.0, 300.0, 0.0);
pub const SO2_BOUNDS: FieldBounds = FieldBounds::new(0.0, 300.0, 0.0);
pub const CO_BOUNDS: FieldBounds = FieldBounds::new(0.0, 300.0, 0.0);
pub const O3_BOUNDS: FieldBounds = FieldBounds::new(0.0, 300.0, 0.0);
pub const TEMPERATURE_BOUNDS: FieldBounds = FieldBounds::new(-10.0, 100.0, 25.0);
pub const HUMIDITY_BOUNDS: FieldBounds = FieldBounds::new(0.0, 100.0, 50.0);
pub const WIND_SPEED_BOUNDS: FieldBounds = FieldBounds::new(0.0, 100.0, 5.0);

/// Pollutant concentrations, in declaration (and feature) order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pollutants {
    pub pm25: f64,
    pub pm10: f64,
    pub no2: f64,
    pub so2: f64,
    pub co: f64,
    pub o3: f64,
}

/// Weather conditions, in declaration (and feature) order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weather {
    /// °C, may be negative
    pub temperature: f64,
    /// %
    pub humidity: f64,
    /// km/h
    pub wind_speed: u32,
}

/// One set of readings for a single prediction request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadingSet {
    pub pollutants: Pollutants,
    pub weather: Weather,
}

/// The user's country/city choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationSelection {
    pub country: String,
    pub city: String,
}

impl LocationSelection {
    pub fn new(country: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            city: city.into(),
        }
    }
}

// ============================================================================
// Raw form submission
// ============================================================================

/// Everything the input page submits, exactly as typed.
///
/// Kept in the session so the input page can show the user's values again
/// after an error or after navigating back from a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionForm {
    pub pm25: f64,
    pub pm10: f64,
    pub no2: f64,
    pub so2: f64,
    pub co: f64,
    pub o3: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub country: String,
    pub city: String,
}

impl PredictionForm {
    /// Default field values with the first country and its first city selected.
    pub fn initial(geography: &GeographyTable) -> Self {
        let country = geography.countries().next().unwrap_or_default().to_string();
        let city = geography
            .cities_of(&country)
            .and_then(|cities| cities.first())
            .cloned()
            .unwrap_or_default();

        Self {
            pm25: PM25_BOUNDS.default,
            pm10: PM10_BOUNDS.default,
            no2: NO2_BOUNDS.default,
            so2: SO2_BOUNDS.default,
            co: CO_BOUNDS.default,
            o3: O3_BOUNDS.default,
            temperature: TEMPERATURE_BOUNDS.default,
            humidity: HUMIDITY_BOUNDS.default,
            wind_speed: WIND_SPEED_BOUNDS.default,
            country,
            city,
        }
    }

    /// Clamped readings. Wind speed is rounded to a whole km/h.
    pub fn readings(&self) -> ReadingSet {
        ReadingSet {
            pollutants: Pollutants {
                pm25: PM25_BOUNDS.clamp(self.pm25),
                pm10: PM10_BOUNDS.clamp(self.pm10),
                no2: NO2_BOUNDS.clamp(self.no2),
                so2: SO2_BOUNDS.clamp(self.so2),
                co: CO_BOUNDS.clamp(self.co),
                o3: O3_BOUNDS.clamp(self.o3),
            },
            weather: Weather {
                temperature: TEMPERATURE_BOUNDS.clamp(self.temperature),
                humidity: HUMIDITY_BOUNDS.clamp(self.humidity),
                wind_speed: WIND_SPEED_BOUNDS.clamp(self.wind_speed).round() as u32,
            },
        }
    }

    pub fn location(&self) -> LocationSelection {
        LocationSelection::new(self.country.clone(), self.city.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chennai_form() -> PredictionForm {
        PredictionForm {
            pm25: 40.0,
            pm10: 60.0,
            no2: 20.0,
            so2: 10.0,
            co: 1.0,
            o3: 30.0,
            temperature: 30.0,
            humidity: 70.0,
            wind_speed: 5.0,
            country: "India".to_string(),
            city: "Chennai".to_string(),
        }
    }

    #[test]
    fn test_in_range_values_pass_through() {
        let readings = chennai_form().readings();
        assert_eq!(readings.pollutants.pm25, 40.0);
        assert_eq!(readings.pollutants.o3, 30.0);
        assert_eq!(readings.weather.temperature, 30.0);
        assert_eq!(readings.weather.wind_speed, 5);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let mut form = chennai_form();
        form.pm25 = 750.0;
        form.no2 = -3.0;
        form.temperature = -40.0;
        form.humidity = 120.0;
        form.wind_speed = 250.0;

        let readings = form.readings();
        assert_eq!(readings.pollutants.pm25, 500.0);
        assert_eq!(readings.pollutants.no2, 0.0);
        assert_eq!(readings.weather.temperature, -10.0);
        assert_eq!(readings.weather.humidity, 100.0);
        assert_eq!(readings.weather.wind_speed, 100);
    }

    #[test]
    fn test_non_finite_values_use_default() {
        let mut form = chennai_form();
        form.temperature = f64::NAN;
        form.co = f64::INFINITY;

        let readings = form.readings();
        assert_eq!(readings.weather.temperature, 25.0);
        assert_eq!(readings.pollutants.co, 0.0);
    }

    #[test]
    fn test_fractional_wind_speed_rounds() {
        let mut form = chennai_form();
        form.wind_speed = 7.6;
        assert_eq!(form.readings().weather.wind_speed, 8);
    }

    #[test]
    fn test_initial_form_selects_first_country_and_city() {
        let form = PredictionForm::initial(&GeographyTable::reference());
        assert_eq!(form.country, "USA");
        assert_eq!(form.city, "Los Angeles");
        assert_eq!(form.temperature, 25.0);
        assert_eq!(form.humidity, 50.0);
        assert_eq!(form.wind_speed, 5.0);
    }
}
