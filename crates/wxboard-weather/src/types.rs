//! Data types shared across the weather crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Condition text carried by every failed summary.
pub const ERROR_CONDITION: &str = "Error";
/// Condition used when the daily document has no first period.
pub const UNKNOWN_CONDITION: &str = "Unknown";
/// Forecast text used when the daily periods cannot be rendered.
pub const FORECAST_UNAVAILABLE: &str = "Forecast unavailable";

pub const ERROR_NO_INTERNET: &str =
    "Unable to connect to the weather service. Check internet connection.";
pub const ERROR_NO_DATA: &str = "Weather data not available for this location.";
pub const ERROR_API_TIMEOUT: &str = "Weather service is taking too long to respond.";

/// A tracked city from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl City {
    pub fn coordinates(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// Normalized result of one fetch for one city.
///
/// `condition == "Error"` exactly when the fetch failed; the forecast then
/// holds the message to show and the temperature is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSummary {
    pub temperature: Option<i32>,
    pub condition: String,
    pub forecast: String,
    pub timestamp: DateTime<Utc>,
}

impl WeatherSummary {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            temperature: None,
            condition: ERROR_CONDITION.to_string(),
            forecast: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.condition == ERROR_CONDITION
    }

    /// Whether two summaries carry the same weather, ignoring when they were taken
    pub fn same_weather(&self, other: &WeatherSummary) -> bool {
        self.temperature == other.temperature
            && self.condition == other.condition
            && self.forecast == other.forecast
    }
}
