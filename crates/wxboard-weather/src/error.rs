//! Weather-specific error types.

use thiserror::Error;
use wxboard_core::{NetworkError, ReqwestErrorExt};

use crate::types::{ERROR_API_TIMEOUT, ERROR_NO_DATA, ERROR_NO_INTERNET};

/// Failure inside a single fetch. Never leaves `WeatherService::get_weather`;
/// it is reduced to a [`FetchErrorKind`] and rendered into an error summary.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0}")]
    Network(#[from] NetworkError),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Grid metadata is missing `{0}`")]
    MissingField(&'static str),

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Fetch cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Network(e.into_network_error())
    }
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Network(NetworkError::ConnectionFailed(_)) => FetchErrorKind::NoInternet,
            FetchError::Network(NetworkError::Timeout) => FetchErrorKind::Timeout,
            FetchError::Network(NetworkError::InvalidResponse(_)) | FetchError::MissingField(_) => {
                FetchErrorKind::NoData
            }
            other => FetchErrorKind::Unexpected(other.to_string()),
        }
    }

    /// Whether another attempt of the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            FetchError::Cancelled | FetchError::InvalidUrl { .. } | FetchError::MissingField(_)
        )
    }
}

/// What the dashboard tells the user about a failed fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchErrorKind {
    NoInternet,
    Timeout,
    NoData,
    Unexpected(String),
}

impl FetchErrorKind {
    pub fn user_message(&self) -> String {
        match self {
            Self::NoInternet => ERROR_NO_INTERNET.to_string(),
            Self::Timeout => ERROR_API_TIMEOUT.to_string(),
            Self::NoData => ERROR_NO_DATA.to_string(),
            Self::Unexpected(text) => text.clone(),
        }
    }
}

/// City catalog load failures. Logged by `CityCatalog::load`, never surfaced.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read city catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid city catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid {field} for {city}: {value:?}")]
    InvalidCoordinate {
        city: String,
        field: &'static str,
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping_is_total() {
        let cases = [
            (
                FetchError::Network(NetworkError::ConnectionFailed("refused".into())),
                FetchErrorKind::NoInternet,
            ),
            (FetchError::Network(NetworkError::Timeout), FetchErrorKind::Timeout),
            (
                FetchError::Network(NetworkError::InvalidResponse("eof".into())),
                FetchErrorKind::NoData,
            ),
            (FetchError::MissingField("properties.forecast"), FetchErrorKind::NoData),
        ];

        for (error, expected) in cases {
            assert_eq!(error.kind(), expected, "wrong kind for {:?}", error);
        }
    }

    #[test]
    fn test_unexpected_keeps_raw_text() {
        let error = FetchError::Status {
            status: 500,
            url: "https://api.weather.gov/points/1,2".into(),
        };
        let kind = error.kind();
        assert_eq!(
            kind.user_message(),
            "HTTP 500 from https://api.weather.gov/points/1,2"
        );
    }

    #[test]
    fn test_fixed_messages() {
        assert_eq!(FetchErrorKind::NoInternet.user_message(), ERROR_NO_INTERNET);
        assert_eq!(FetchErrorKind::Timeout.user_message(), ERROR_API_TIMEOUT);
        assert_eq!(FetchErrorKind::NoData.user_message(), ERROR_NO_DATA);
    }

    #[test]
    fn test_retryable() {
        assert!(FetchError::Network(NetworkError::Timeout).is_retryable());
        assert!(FetchError::Status { status: 404, url: String::new() }.is_retryable());
        assert!(!FetchError::Cancelled.is_retryable());
        assert!(!FetchError::MissingField("properties.forecastHourly").is_retryable());
    }
}
