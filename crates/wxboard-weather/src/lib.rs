//! Weather service for wxboard
//!
//! Fetches National Weather Service forecasts for catalog cities and keeps
//! them refreshed from a background task.

pub mod catalog;
pub mod error;
pub mod poller;
pub mod provider;
pub mod retry;
pub mod types;

pub use catalog::{CityCatalog, CoordinateLookup};
pub use error::{CatalogError, FetchError, FetchErrorKind};
pub use poller::{dispatch, DisplaySurface, PollerMessage, RefreshPoller};
pub use provider::{WeatherService, WeatherSource};
pub use retry::RetryPolicy;
pub use types::*;
