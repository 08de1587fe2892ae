use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Contact address used when neither the config file nor `APP_EMAIL` provide one.
pub const PLACEHOLDER_CONTACT_EMAIL: &str = "your@email.com";

/// Longest forecast horizon the forecast endpoint serves.
pub const MAX_FORECAST_DAYS: u32 = 7;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Weather service and refresh settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Dashboard layout
    #[serde(default)]
    pub ui: UiConfig,

    /// City catalog location
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Temperature unit requested from the forecast endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Fahrenheit,
    Celsius,
}

impl TemperatureUnit {
    /// Single-letter suffix shown after the degree sign.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Fahrenheit => "F",
            Self::Celsius => "C",
        }
    }

    /// Value of the `units` query parameter understood by api.weather.gov.
    pub fn query_value(&self) -> &'static str {
        match self {
            Self::Fahrenheit => "us",
            Self::Celsius => "si",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL of the National Weather Service API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-attempt request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Attempts per HTTP request, the first one included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay between attempts in milliseconds (0 retries immediately)
    #[serde(default)]
    pub retry_backoff_ms: u64,

    /// Upper bound for the doubled backoff delay
    #[serde(default = "default_retry_backoff_max_ms")]
    pub retry_backoff_max_ms: u64,

    /// Refresh interval in minutes
    #[serde(default = "default_refresh_minutes")]
    pub refresh_minutes: u32,

    /// Days of forecast text shown per city (two periods per day)
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,

    /// Temperature unit preference
    #[serde(default)]
    pub temperature_unit: TemperatureUnit,

    /// Contact address sent in the User-Agent, as the NWS asks of clients
    #[serde(default = "default_contact_email")]
    pub contact_email: String,
}

fn default_base_url() -> String {
    "https://api.weather.gov".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_max_ms() -> u64 {
    5000
}

fn default_refresh_minutes() -> u32 {
    10
}

fn default_forecast_days() -> u32 {
    MAX_FORECAST_DAYS
}

fn default_contact_email() -> String {
    std::env::var("APP_EMAIL")
        .ok()
        .filter(|email| !email.trim().is_empty())
        .unwrap_or_else(|| PLACEHOLDER_CONTACT_EMAIL.to_string())
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: 0,
            retry_backoff_max_ms: default_retry_backoff_max_ms(),
            refresh_minutes: default_refresh_minutes(),
            forecast_days: default_forecast_days(),
            temperature_unit: TemperatureUnit::default(),
            contact_email: default_contact_email(),
        }
    }
}

impl WeatherConfig {
    /// User-Agent header value identifying this application to the API.
    pub fn user_agent(&self) -> String {
        format!("(wxboard, {})", self.contact_email)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Title printed above the card grid
    #[serde(default = "default_window_title")]
    pub window_title: String,

    /// Dashboard width in terminal columns
    #[serde(default = "default_window_width")]
    pub window_width: u32,

    /// Cards per grid row
    #[serde(default = "default_cards_per_row")]
    pub cards_per_row: u32,

    /// Show the multi-period forecast under each card
    #[serde(default = "default_show_detailed_forecast")]
    pub show_detailed_forecast: bool,
}

fn default_window_title() -> String {
    "US CITIES WEATHER APP".to_string()
}

fn default_window_width() -> u32 {
    120
}

fn default_cards_per_row() -> u32 {
    3
}

fn default_show_detailed_forecast() -> bool {
    true
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_title: default_window_title(),
            window_width: default_window_width(),
            cards_per_row: default_cards_per_row(),
            show_detailed_forecast: default_show_detailed_forecast(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON file listing the tracked cities
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
}

fn default_catalog_path() -> PathBuf {
    default_config_dir().join("cities.json")
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wxboard")
}

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there on first run
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Created default configuration at {}", path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration from the default location and validate it
    pub fn load_validated() -> Result<(Self, ValidationResult), ConfigError> {
        let path = Self::config_path().map_err(|e| ConfigError::LoadFailed(format!("{:#}", e)))?;
        Self::load_validated_from(&path)
    }

    /// Load configuration from `path` and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// An unreadable file is `LoadFailed`; critical validation errors are `Invalid`.
    pub fn load_validated_from(path: &Path) -> Result<(Self, ValidationResult), ConfigError> {
        let config = Self::load_from(path).map_err(|e| ConfigError::LoadFailed(format!("{:#}", e)))?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.base_url, "weather.base_url", &mut result);

        if self.weather.request_timeout_secs == 0 {
            result.add_error(
                "weather.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        }

        if self.weather.max_attempts == 0 {
            result.add_error("weather.max_attempts", "At least one attempt is required");
        }

        if self.weather.refresh_minutes == 0 {
            result.add_warning(
                "weather.refresh_minutes",
                "Refresh interval of 0 minutes polls continuously",
            );
        } else if self.weather.refresh_minutes > 1440 {
            result.add_warning(
                "weather.refresh_minutes",
                "Weather refresh interval is more than 24 hours",
            );
        }

        if self.weather.forecast_days == 0 || self.weather.forecast_days > MAX_FORECAST_DAYS {
            result.add_error(
                "weather.forecast_days",
                format!("Forecast days must be between 1 and {}", MAX_FORECAST_DAYS),
            );
        }

        if self.weather.contact_email.trim().is_empty()
            || self.weather.contact_email == PLACEHOLDER_CONTACT_EMAIL
        {
            result.add_warning(
                "weather.contact_email",
                "No contact e-mail configured; set APP_EMAIL or edit the config file",
            );
        }

        if self.ui.window_width == 0 {
            result.add_error("ui.window_width", "Window width must be greater than 0");
        } else if self.ui.window_width > 1000 {
            result.add_warning("ui.window_width", "Window width is unusually large (>1000 columns)");
        }

        if self.ui.cards_per_row == 0 {
            result.add_error("ui.cards_per_row", "At least one card per row is required");
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Directory holding the config file and, by default, the city catalog
    pub fn config_dir() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Failed to get config directory")?
            .join("wxboard"))
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }
}
