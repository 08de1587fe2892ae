//! National Weather Service client.
//!
//! A fetch resolves grid metadata for a coordinate pair, pulls the daily and
//! hourly forecast documents it points to and reduces them to a
//! [`WeatherSummary`]. Grid metadata is never cached.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use url::Url;
use wxboard_core::{TemperatureUnit, WeatherConfig};

use crate::error::FetchError;
use crate::retry::{with_retry, RetryPolicy};
use crate::types::WeatherSummary;

/// Anything that can turn a coordinate pair into a summary without failing
pub trait WeatherSource: Send + Sync + 'static {
    fn get_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> impl Future<Output = WeatherSummary> + Send;
}

#[derive(Debug, Clone)]
pub struct WeatherService {
    client: Arc<Client>,
    base_url: String,
    retry: RetryPolicy,
    forecast_periods: usize,
    unit: TemperatureUnit,
    cancel: CancellationToken,
}

impl WeatherService {
    /// Build a service with one shared HTTP session.
    ///
    /// # Errors
    /// Fails if the configured contact details are not a valid header value
    /// or the TLS backend cannot be initialized.
    pub fn new(config: &WeatherConfig) -> Result<Self, FetchError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::from_config(config),
            forecast_periods: config.forecast_days as usize * 2,
            unit: config.temperature_unit,
            cancel: CancellationToken::new(),
        })
    }

    /// Stop in-flight retries when `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Fetch the current summary for a coordinate pair.
    ///
    /// Failures never escape: they come back as an error summary whose
    /// forecast carries the message for the dashboard.
    pub async fn get_weather(&self, latitude: f64, longitude: f64) -> WeatherSummary {
        match self.try_get_weather(latitude, longitude).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!("Weather fetch for {},{} failed: {}", latitude, longitude, e);
                WeatherSummary::error(e.kind().user_message())
            }
        }
    }

    async fn try_get_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherSummary, FetchError> {
        let points_url = format!("{}/points/{},{}", self.base_url, latitude, longitude);
        let points: nws::PointsDocument = self.get_json(&points_url).await?;
        let grid = points.grid()?;

        let daily_url = self.with_units(&grid.forecast)?;
        let hourly_url = self.with_units(&grid.forecast_hourly)?;

        let (daily, hourly) = tokio::try_join!(
            self.get_json::<nws::ForecastDocument>(daily_url.as_str()),
            self.get_json::<nws::ForecastDocument>(hourly_url.as_str()),
        )?;

        Ok(WeatherSummary {
            temperature: hourly.current_temperature(),
            condition: daily.current_condition(),
            forecast: daily.forecast_text(self.forecast_periods, self.unit),
            timestamp: Utc::now(),
        })
    }

    /// Append the `units` query for non-default units
    fn with_units(&self, raw: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(raw).map_err(|e| FetchError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        if self.unit != TemperatureUnit::Fahrenheit {
            url.query_pairs_mut()
                .append_pair("units", self.unit.query_value());
        }
        Ok(url)
    }

    /// GET a JSON document, retrying per policy
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        with_retry(&self.retry, &self.cancel, || async {
            tracing::debug!("GET {}", url);
            let response = self.client.get(url).send().await?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            Ok(response.json::<T>().await?)
        })
        .await
    }
}

impl WeatherSource for WeatherService {
    fn get_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> impl Future<Output = WeatherSummary> + Send {
        WeatherService::get_weather(self, latitude, longitude)
    }
}

/// api.weather.gov document shapes and reductions
mod nws {
    use serde::Deserialize;
    use wxboard_core::TemperatureUnit;

    use crate::error::FetchError;
    use crate::types::{FORECAST_UNAVAILABLE, UNKNOWN_CONDITION};

    /// `GET /points/{lat},{lon}`
    #[derive(Debug, Deserialize)]
    pub struct PointsDocument {
        pub properties: Option<PointsProperties>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PointsProperties {
        pub forecast: Option<String>,
        pub forecast_hourly: Option<String>,
    }

    /// Forecast office endpoints for one coordinate pair
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct GridReference {
        pub forecast: String,
        pub forecast_hourly: String,
    }

    impl PointsDocument {
        pub fn grid(self) -> Result<GridReference, FetchError> {
            let properties = self
                .properties
                .ok_or(FetchError::MissingField("properties"))?;
            Ok(GridReference {
                forecast: properties
                    .forecast
                    .ok_or(FetchError::MissingField("properties.forecast"))?,
                forecast_hourly: properties
                    .forecast_hourly
                    .ok_or(FetchError::MissingField("properties.forecastHourly"))?,
            })
        }
    }

    /// Daily (`/forecast`) and hourly (`/forecast/hourly`) documents share a shape
    #[derive(Debug, Deserialize)]
    pub struct ForecastDocument {
        pub properties: Option<ForecastProperties>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ForecastProperties {
        pub periods: Option<Vec<Period>>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Period {
        pub name: Option<String>,
        pub temperature: Option<f64>,
        pub short_forecast: Option<String>,
    }

    impl ForecastDocument {
        fn periods(&self) -> Option<&[Period]> {
            self.properties.as_ref()?.periods.as_deref()
        }

        fn first_period(&self) -> Option<&Period> {
            self.periods()?.first()
        }

        /// Hourly document: temperature of the current hour, ties rounded to even
        pub fn current_temperature(&self) -> Option<i32> {
            self.first_period()?
                .temperature
                .map(|t| t.round_ties_even() as i32)
        }

        /// Daily document: short forecast of the current period
        pub fn current_condition(&self) -> String {
            self.first_period()
                .and_then(|p| p.short_forecast.clone())
                .unwrap_or_else(|| UNKNOWN_CONDITION.to_string())
        }

        /// Daily document: one line per period, at most `limit` periods
        pub fn forecast_text(&self, limit: usize, unit: TemperatureUnit) -> String {
            let Some(periods) = self.periods() else {
                return FORECAST_UNAVAILABLE.to_string();
            };

            let lines: Option<Vec<String>> = periods
                .iter()
                .take(limit)
                .map(|period| {
                    Some(format!(
                        "{}: {}°{}, {}",
                        period.name.as_deref()?,
                        period.temperature?,
                        unit.symbol(),
                        period.short_forecast.as_deref()?
                    ))
                })
                .collect();

            lines
                .map(|lines| lines.join("\n"))
                .unwrap_or_else(|| FORECAST_UNAVAILABLE.to_string())
        }
    }

}
