/// Service configuration
///
/// Settings live in a TOML file (`quakemon.toml` by default). Every field has
/// a default, so a partial or missing file still yields a usable config.
/// Credentials are better kept out of the file: `GEONAMES_USERNAME` and
/// `GOOGLE_MAPS_API_KEY` from the environment (or a `.env` file) override it.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;

use crate::analysis::top_ten::WideningPolicy;
use crate::ingest::geocoder::GOOGLE_GEOCODE_URL;
use crate::ingest::geonames::GEONAMES_BASE_URL;
use crate::logging::LogLevel;

pub const DEFAULT_CONFIG_PATH: &str = "quakemon.toml";

pub const ENV_GEONAMES_USERNAME: &str = "GEONAMES_USERNAME";
pub const ENV_GOOGLE_API_KEY: &str = "GOOGLE_MAPS_API_KEY";

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub geonames: GeoNamesConfig,
    pub geocoder: GeocoderConfig,
    pub search: WideningPolicy,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoNamesConfig {
    pub base_url: String,
    /// GeoNames account name; the free service rejects "demo" once its quota is spent.
    pub username: String,
    /// Row cap for bounding-box searches.
    pub box_max_rows: u32,
    pub timeout_secs: u64,
}

impl Default for GeoNamesConfig {
    fn default() -> Self {
        Self {
            base_url: GEONAMES_BASE_URL.to_string(),
            username: "demo".to_string(),
            box_max_rows: 25,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: GOOGLE_GEOCODE_URL.to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of debug, info, warn, error.
    pub level: String,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            timestamps: false,
        }
    }
}

impl LoggingConfig {
    pub fn min_level(&self) -> Result<LogLevel, String> {
        self.level.parse()
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, Box<dyn Error>> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::from_toml(&content).map_err(|e| format!("Invalid {}: {}", path.display(), e).into())
    }

    pub fn validate(&self) -> Result<(), String> {
        self.search.validate()?;
        self.logging.min_level()?;
        if self.geonames.box_max_rows == 0 {
            return Err("geonames.box_max_rows must be at least 1".to_string());
        }
        Ok(())
    }

    /// Apply credential overrides from the process environment, reading a
    /// `.env` file first if one exists.
    pub fn apply_env_overrides(&mut self) {
        dotenv::dotenv().ok();
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply credential overrides from an arbitrary lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(username) = lookup(ENV_GEONAMES_USERNAME).filter(|v| !v.trim().is_empty()) {
            self.geonames.username = username;
        }
        if let Some(key) = lookup(ENV_GOOGLE_API_KEY).filter(|v| !v.trim().is_empty()) {
            self.geocoder.api_key = Some(key);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
