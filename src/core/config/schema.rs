//! core::config::schema
//!
//! Configuration schema types.
//!
//! Every field is optional; accessors on [`super::Config`] supply defaults.
//!
//! # Validation
//!
//! Values are validated after parsing (store kind, URLs, timeouts).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Top-level configuration file.
///
/// # Example
///
/// ```toml
/// codes_file = "country_codes.json"
/// artifact_path = "templates/map.html"
///
/// [store]
/// kind = "http"
/// url = "http://localhost:8080"
/// collection = "TestBotCollection"
/// field = "code"
///
/// [geocoder]
/// base_url = "https://nominatim.openstreetmap.org"
/// user_agent = "countmap"
/// timeout_secs = 10
///
/// [map]
/// quantity_label = "Medicines"
/// inject_metadata = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// JSON object of code specification -> country name
    pub codes_file: Option<PathBuf>,

    /// Where the rendered map is written
    pub artifact_path: Option<PathBuf>,

    /// Count store settings
    pub store: Option<StoreConfig>,

    /// Geocoding settings
    pub geocoder: Option<GeocoderConfig>,

    /// Map rendering settings
    pub map: Option<MapConfig>,
}

impl ConfigFile {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(store) = &self.store {
            store.validate()?;
        }
        if let Some(geocoder) = &self.geocoder {
            geocoder.validate()?;
        }
        Ok(())
    }
}

/// Count store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Store backend ("http", "mongodb" or "file")
    pub kind: Option<String>,

    /// Base URL of the HTTP store, or the MongoDB connection string
    pub url: Option<String>,

    /// Database holding the collection ("mongodb" backend)
    pub database: Option<String>,

    /// Collection holding the records
    pub collection: Option<String>,

    /// Document field carrying the numeric code
    pub field: Option<String>,

    /// Document file for the "file" backend
    pub path: Option<PathBuf>,

    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl StoreConfig {
    /// Valid store backends.
    pub const VALID_KINDS: &'static [&'static str] = &["http", "mongodb", "file"];

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(kind) = &self.kind {
            if !Self::VALID_KINDS.contains(&kind.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid store kind '{}', must be one of: {}",
                    kind,
                    Self::VALID_KINDS.join(", ")
                )));
            }
        }

        if let Some(url) = &self.url {
            if self.kind.as_deref() == Some("mongodb") {
                validate_connection_string("store.url", url)?;
            } else {
                validate_url("store.url", url)?;
            }
        }

        if let Some(database) = &self.database {
            if database.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "store.database cannot be empty".to_string(),
                ));
            }
        }

        if let Some(field) = &self.field {
            if field.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "store.field cannot be empty".to_string(),
                ));
            }
        }

        if self.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "store.timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Geocoding service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GeocoderConfig {
    /// Nominatim-compatible base URL
    pub base_url: Option<String>,

    /// User-Agent sent with every request
    pub user_agent: Option<String>,

    /// Per-lookup timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Minimum delay between lookups in milliseconds
    pub min_interval_ms: Option<u64>,
}

impl GeocoderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.base_url {
            validate_url("geocoder.base_url", url)?;
        }

        if let Some(agent) = &self.user_agent {
            if agent.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "geocoder.user_agent cannot be empty".to_string(),
                ));
            }
        }

        if self.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "geocoder.timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Map rendering configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MapConfig {
    /// Popup label for the quantity
    pub quantity_label: Option<String>,

    /// Inject icon and title after rendering
    pub inject_metadata: Option<bool>,

    /// Icon reference injected into the document head
    pub icon_href: Option<String>,

    /// Document title injected into the document head
    pub title: Option<String>,
}

fn validate_url(key: &str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue(format!(
            "{} must be an http(s) URL, got '{}'",
            key, url
        )))
    }
}

fn validate_connection_string(key: &str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("mongodb://") || url.starts_with("mongodb+srv://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue(format!(
            "{} must be a mongodb:// or mongodb+srv:// connection string",
            key
        )))
    }
}
