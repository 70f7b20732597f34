//! core::config
//!
//! Configuration schema and loading.
//!
//! # Locations
//!
//! The first existing file wins:
//! 1. An explicit path (`--config`); missing is an error
//! 2. `$COUNTMAP_CONFIG` if set
//! 3. `./countmap.toml`
//! 4. `$XDG_CONFIG_HOME/countmap/config.toml`
//! 5. `~/.countmap/config.toml`
//!
//! No file at all means defaults everywhere.
//!
//! # Example
//!
//! ```no_run
//! use countmap::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("codes: {}", config.codes_file().display());
//! println!("artifact: {}", config.artifact_path().display());
//! ```

pub mod schema;

pub use schema::{ConfigFile, GeocoderConfig, MapConfig, StoreConfig};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "COUNTMAP_CONFIG";

/// Default code specification source.
pub const DEFAULT_CODES_FILE: &str = "country_codes.json";

/// Default artifact location.
pub const DEFAULT_ARTIFACT_PATH: &str = "templates/map.html";

/// Default HTTP store endpoint.
pub const DEFAULT_STORE_URL: &str = "http://localhost:8080";

/// Default connection string for the "mongodb" store.
pub const DEFAULT_MONGODB_URL: &str = "mongodb://localhost:27017";

/// Default geocoding service.
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

/// Default icon injected into the artifact head.
pub const DEFAULT_ICON_HREF: &str = "/static/MSB_Logo_transparent.png";

/// Default title injected into the artifact head.
pub const DEFAULT_TITLE: &str = "MSB Map";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Loaded configuration with defaulting accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents
    pub file: ConfigFile,
    /// Path the file was loaded from, if any
    path: Option<PathBuf>,
}

impl Config {
    /// Wrap already-parsed settings.
    pub fn from_file(file: ConfigFile) -> Result<Self, ConfigError> {
        file.validate()?;
        Ok(Self { file, path: None })
    }

    /// Load configuration from the explicit path or the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if the explicit path is missing, or if a found file
    /// cannot be parsed or fails validation.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        match Self::discover() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load and validate a specific config file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        Ok(Self {
            file,
            path: Some(path.to_path_buf()),
        })
    }

    fn discover() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let local = PathBuf::from("countmap.toml");
        if local.exists() {
            return Some(local);
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("countmap/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".countmap/config.toml"))
            .filter(|path| path.exists())
    }

    /// Path the configuration was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    pub fn codes_file(&self) -> PathBuf {
        self.file
            .codes_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CODES_FILE))
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.file
            .artifact_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACT_PATH))
    }

    fn store(&self) -> Option<&StoreConfig> {
        self.file.store.as_ref()
    }

    fn geocoder(&self) -> Option<&GeocoderConfig> {
        self.file.geocoder.as_ref()
    }

    fn map(&self) -> Option<&MapConfig> {
        self.file.map.as_ref()
    }

    /// Store backend. Defaults to "http".
    pub fn store_kind(&self) -> &str {
        self.store()
            .and_then(|s| s.kind.as_deref())
            .unwrap_or("http")
    }

    /// Store location. The default follows the backend kind.
    pub fn store_url(&self) -> &str {
        let default = match self.store_kind() {
            "mongodb" => DEFAULT_MONGODB_URL,
            _ => DEFAULT_STORE_URL,
        };
        self.store()
            .and_then(|s| s.url.as_deref())
            .unwrap_or(default)
    }

    pub fn store_database(&self) -> &str {
        self.store()
            .and_then(|s| s.database.as_deref())
            .unwrap_or("countmap")
    }

    pub fn store_collection(&self) -> &str {
        self.store()
            .and_then(|s| s.collection.as_deref())
            .unwrap_or("records")
    }

    /// Document field holding the code. Defaults to "code".
    pub fn store_field(&self) -> &str {
        self.store()
            .and_then(|s| s.field.as_deref())
            .unwrap_or("code")
    }

    pub fn store_path(&self) -> PathBuf {
        self.store()
            .and_then(|s| s.path.clone())
            .unwrap_or_else(|| PathBuf::from("records.json"))
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store().and_then(|s| s.timeout_secs).unwrap_or(30))
    }

    pub fn geocoder_url(&self) -> &str {
        self.geocoder()
            .and_then(|g| g.base_url.as_deref())
            .unwrap_or(DEFAULT_GEOCODER_URL)
    }

    pub fn geocoder_user_agent(&self) -> String {
        self.geocoder()
            .and_then(|g| g.user_agent.clone())
            .unwrap_or_else(|| format!("countmap/{}", env!("CARGO_PKG_VERSION")))
    }

    /// Per-lookup timeout. Defaults to 10 seconds.
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.geocoder().and_then(|g| g.timeout_secs).unwrap_or(10))
    }

    pub fn geocoder_min_interval(&self) -> Duration {
        Duration::from_millis(self.geocoder().and_then(|g| g.min_interval_ms).unwrap_or(0))
    }

    pub fn quantity_label(&self) -> &str {
        self.map()
            .and_then(|m| m.quantity_label.as_deref())
            .unwrap_or("Medicines")
    }

    /// Whether to inject icon and title. Defaults to `false`.
    pub fn inject_metadata(&self) -> bool {
        self.map().and_then(|m| m.inject_metadata).unwrap_or(false)
    }

    pub fn icon_href(&self) -> &str {
        self.map()
            .and_then(|m| m.icon_href.as_deref())
            .unwrap_or(DEFAULT_ICON_HREF)
    }

    pub fn title(&self) -> &str {
        self.map()
            .and_then(|m| m.title.as_deref())
            .unwrap_or(DEFAULT_TITLE)
    }

    /// The configuration with every default filled in.
    pub fn effective(&self) -> ConfigFile {
        ConfigFile {
            codes_file: Some(self.codes_file()),
            artifact_path: Some(self.artifact_path()),
            store: Some(StoreConfig {
                kind: Some(self.store_kind().to_string()),
                url: Some(self.store_url().to_string()),
                database: Some(self.store_database().to_string()),
                collection: Some(self.store_collection().to_string()),
                field: Some(self.store_field().to_string()),
                path: Some(self.store_path()),
                timeout_secs: Some(self.store_timeout().as_secs()),
            }),
            geocoder: Some(GeocoderConfig {
                base_url: Some(self.geocoder_url().to_string()),
                user_agent: Some(self.geocoder_user_agent()),
                timeout_secs: Some(self.lookup_timeout().as_secs()),
                min_interval_ms: Some(self.geocoder_min_interval().as_millis() as u64),
            }),
            map: Some(MapConfig {
                quantity_label: Some(self.quantity_label().to_string()),
                inject_metadata: Some(self.inject_metadata()),
                icon_href: Some(self.icon_href().to_string()),
                title: Some(self.title().to_string()),
            }),
        }
    }
}
