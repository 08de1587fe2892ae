//! City catalog: display names and coordinates, loaded once per process.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use serde::Deserialize;

use crate::error::CatalogError;
use crate::types::City;

static CATALOG: OnceLock<Arc<CityCatalog>> = OnceLock::new();

/// Name-to-coordinates lookup used by the refresh poller
pub trait CoordinateLookup: Send + Sync + 'static {
    /// All known city names, sorted
    fn list_cities(&self) -> Vec<String>;

    /// Exact-match lookup
    fn coordinates_for(&self, name: &str) -> Option<(f64, f64)>;
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    cities: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    city: String,
    latitude: CoordinateValue,
    longitude: CoordinateValue,
}

impl CatalogEntry {
    fn to_city(&self) -> Result<City, CatalogError> {
        Ok(City {
            name: self.city.clone(),
            latitude: self.latitude.parse(&self.city, "latitude")?,
            longitude: self.longitude.parse(&self.city, "longitude")?,
        })
    }
}

/// Catalog files write coordinates either as numbers or as strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CoordinateValue {
    Number(f64),
    Text(String),
}

impl CoordinateValue {
    fn parse(&self, city: &str, field: &'static str) -> Result<f64, CatalogError> {
        match self {
            CoordinateValue::Number(value) => Ok(*value),
            CoordinateValue::Text(text) => {
                text.trim()
                    .parse()
                    .map_err(|_| CatalogError::InvalidCoordinate {
                        city: city.to_string(),
                        field,
                        value: text.clone(),
                    })
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CityCatalog {
    cities: Vec<City>,
}

impl CityCatalog {
    /// Load the catalog at `path`, degrading to an empty catalog on any error.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(catalog) => {
                tracing::info!("Loaded {} cities from {}", catalog.len(), path.display());
                catalog
            }
            Err(e) => {
                tracing::error!("City catalog unavailable: {}", e);
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;

        let cities = file
            .cities
            .into_iter()
            .filter_map(|entry| match entry.to_city() {
                Ok(city) => Some(city),
                Err(e) => {
                    tracing::warn!("Skipping catalog entry: {}", e);
                    None
                }
            })
            .collect();

        Ok(Self { cities })
    }

    pub fn from_cities(cities: Vec<City>) -> Self {
        Self { cities }
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    pub fn list_cities(&self) -> Vec<String> {
        let mut names: Vec<String> = self.cities.iter().map(|c| c.name.clone()).collect();
        names.sort();
        names
    }

    pub fn coordinates_for(&self, name: &str) -> Option<(f64, f64)> {
        self.cities
            .iter()
            .find(|c| c.name == name)
            .map(City::coordinates)
    }
}

impl CoordinateLookup for CityCatalog {
    fn list_cities(&self) -> Vec<String> {
        CityCatalog::list_cities(self)
    }

    fn coordinates_for(&self, name: &str) -> Option<(f64, f64)> {
        CityCatalog::coordinates_for(self, name)
    }
}

/// Load the process-wide catalog. Only the first call reads `path`.
pub fn init_global(path: &Path) -> Arc<CityCatalog> {
    CATALOG
        .get_or_init(|| Arc::new(CityCatalog::load(path)))
        .clone()
}

/// The process-wide catalog, if `init_global` has run
pub fn global() -> Option<Arc<CityCatalog>> {
    CATALOG.get().cloned()
}
