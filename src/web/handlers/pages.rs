// Page templates for HTML rendering with Askama

use askama::Template;

use crate::geography::GeographyTable;
use crate::readings::{
    FieldBounds, PredictionForm, CO_BOUNDS, HUMIDITY_BOUNDS, NO2_BOUNDS, O3_BOUNDS, PM10_BOUNDS,
    PM25_BOUNDS, SO2_BOUNDS, TEMPERATURE_BOUNDS, WIND_SPEED_BOUNDS,
};
use crate::severity::classify;

pub const PAGE_TITLE: &str = "AQI Prediction";

// ============================================================================
// View models
// ============================================================================

/// One numeric `<input>`, pre-formatted for the template.
#[derive(Debug, Clone)]
pub struct NumberField {
    pub name: &'static str,
    pub label: &'static str,
    pub min: String,
    pub max: String,
    pub step: &'static str,
    pub value: String,
}

impl NumberField {
    fn real(name: &'static str, label: &'static str, bounds: FieldBounds, value: f64) -> Self {
        Self {
            name,
            label,
            min: format!("{:.2}", bounds.min),
            max: format!("{:.2}", bounds.max),
            step: "0.01",
            value: format!("{:.2}", value),
        }
    }

    fn integer(name: &'static str, label: &'static str, bounds: FieldBounds, value: f64) -> Self {
        Self {
            name,
            label,
            min: format!("{}", bounds.min as i64),
            max: format!("{}", bounds.max as i64),
            step: "1",
            value: format!("{}", value.round() as i64),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub selected: bool,
}

/// `<option>` list for `cities`, marking `selected` (or the first city if
/// `selected` is not among them).
pub fn build_city_options(cities: &[String], selected: &str) -> Vec<SelectOption> {
    let any_match = cities.iter().any(|c| c == selected);
    cities
        .iter()
        .enumerate()
        .map(|(i, city)| SelectOption {
            value: city.clone(),
            selected: if any_match { city == selected } else { i == 0 },
        })
        .collect()
}

// ============================================================================
// Input page
// ============================================================================

#[derive(Template)]
#[template(path = "pages/input.html")]
pub struct InputTemplate {
    pub title: String,
    pub has_notice: bool,
    pub notice: String,
    pub pollutant_fields: Vec<NumberField>,
    pub weather_fields: Vec<NumberField>,
    pub country_options: Vec<SelectOption>,
    pub city_options: Vec<SelectOption>,
}

impl InputTemplate {
    pub fn new(geography: &GeographyTable, form: &PredictionForm, notice: Option<String>) -> Self {
        let pollutant_fields = vec![
            NumberField::real("pm25", "PM2.5", PM25_BOUNDS, form.pm25),
            NumberField::real("pm10", "PM10", PM10_BOUNDS, form.pm10),
            NumberField::real("no2", "NO2", NO2_BOUNDS, form.no2),
            NumberField::real("so2", "SO2", SO2_BOUNDS, form.so2),
            NumberField::real("co", "CO", CO_BOUNDS, form.co),
            NumberField::real("o3", "O3", O3_BOUNDS, form.o3),
        ];
        let weather_fields = vec![
            NumberField::real("temperature", "Temperature (°C)", TEMPERATURE_BOUNDS, form.temperature),
            NumberField::real("humidity", "Humidity (%)", HUMIDITY_BOUNDS, form.humidity),
            NumberField::integer("wind_speed", "Wind Speed (km/h)", WIND_SPEED_BOUNDS, form.wind_speed),
        ];

        // A stale form may name a country that no longer exists; fall back to the first.
        let country = if geography.contains_country(&form.country) {
            form.country.clone()
        } else {
            geography.countries().next().unwrap_or_default().to_string()
        };
        let country_options = geography
            .countries()
            .map(|c| SelectOption {
                value: c.to_string(),
                selected: c == country,
            })
            .collect();
        let city_options = geography
            .cities_of(&country)
            .map(|cities| build_city_options(cities, &form.city))
            .unwrap_or_default();

        Self {
            title: PAGE_TITLE.to_string(),
            has_notice: notice.is_some(),
            notice: notice.unwrap_or_default(),
            pollutant_fields,
            weather_fields,
            country_options,
            city_options,
        }
    }
}

/// htmx fragment: the city `<option>`s for a newly selected country.
#[derive(Template)]
#[template(path = "partials/city_options.html")]
pub struct CityOptionsTemplate {
    pub city_options: Vec<SelectOption>,
}

impl CityOptionsTemplate {
    pub fn new(cities: &[String]) -> Self {
        Self {
            city_options: build_city_options(cities, ""),
        }
    }
}

// ============================================================================
// Result page
// ============================================================================

#[derive(Template)]
#[template(path = "pages/result.html")]
pub struct ResultTemplate {
    pub title: String,
    pub aqi_formatted: String,
    pub label: &'static str,
    pub message: &'static str,
    pub band_color: &'static str,
}

impl ResultTemplate {
    pub fn new(aqi: f64) -> Self {
        let band = classify(aqi);
        Self {
            title: PAGE_TITLE.to_string(),
            aqi_formatted: format!("{:.2}", aqi),
            label: band.label(),
            message: band.message(),
            band_color: band.color(),
        }
    }
}
