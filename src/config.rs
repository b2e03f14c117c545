//! Runtime configuration
//!
//! Layering: built-in defaults, then an optional YAML file named by
//! `ISS_CONFIG`, then individual environment overrides.
//!
//! ```yaml
//! bind_addr: 0.0.0.0:5011
//! position_source: https://nasa-public-data.s3.amazonaws.com/iss-coords/2022-02-13/ISS_OEM/ISS.OEM_J2K_EPH.xml
//! sighting_source: data/XMLsightingData_citiesUSA06.xml
//! preload: true
//! fetch_timeout_secs: 30
//! dump_dir: /tmp/iss
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "ISS_CONFIG";
pub const BIND_ADDR_ENV: &str = "ISS_BIND_ADDR";
pub const POSITION_SOURCE_ENV: &str = "ISS_POSITION_SOURCE";
pub const SIGHTING_SOURCE_ENV: &str = "ISS_SIGHTING_SOURCE";
pub const PRELOAD_ENV: &str = "ISS_PRELOAD";
pub const FETCH_TIMEOUT_ENV: &str = "ISS_FETCH_TIMEOUT_SECS";
pub const DUMP_DIR_ENV: &str = "ISS_DUMP_DIR";

const DEFAULT_POSITION_SOURCE: &str = "data/ISS.OEM_J2K_EPH.xml";
const DEFAULT_SIGHTING_SOURCE: &str = "data/XMLsightingData_citiesUSA06.xml";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

/// Where a dataset's raw bytes come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceLocation {
    /// `http://` or `https://` URL
    Url(String),
    /// Local file path
    File(PathBuf),
}

impl From<String> for SourceLocation {
    fn from(value: String) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            SourceLocation::Url(value)
        } else {
            SourceLocation::File(PathBuf::from(value))
        }
    }
}

impl From<&str> for SourceLocation {
    fn from(value: &str) -> Self {
        SourceLocation::from(value.to_string())
    }
}

impl From<SourceLocation> for String {
    fn from(value: SourceLocation) -> Self {
        value.to_string()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::Url(url) => f.write_str(url),
            SourceLocation::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the HTTP facade listens on
    pub bind_addr: SocketAddr,
    pub position_source: SourceLocation,
    pub sighting_source: SourceLocation,
    /// Load both datasets at startup instead of waiting for `POST /load_data`
    pub preload: bool,
    /// Timeout for URL sources
    pub fetch_timeout_secs: u64,
    /// Directory for diagnostic JSON dumps
    pub dump_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5011)),
            position_source: SourceLocation::from(DEFAULT_POSITION_SOURCE),
            sighting_source: SourceLocation::from(DEFAULT_SIGHTING_SOURCE),
            preload: false,
            fetch_timeout_secs: 30,
            dump_dir: None,
        }
    }
}

impl AppConfig {
    /// Load from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(&lookup)?;
        Ok(config)
    }

    /// Read a YAML config file. Missing keys take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_overrides<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(BIND_ADDR_ENV) {
            self.bind_addr = value
                .parse()
                .map_err(|_| invalid(BIND_ADDR_ENV, &value))?;
        }
        if let Some(value) = lookup(POSITION_SOURCE_ENV) {
            self.position_source = SourceLocation::from(value);
        }
        if let Some(value) = lookup(SIGHTING_SOURCE_ENV) {
            self.sighting_source = SourceLocation::from(value);
        }
        if let Some(value) = lookup(PRELOAD_ENV) {
            self.preload = parse_flag(&value).ok_or_else(|| invalid(PRELOAD_ENV, &value))?;
        }
        if let Some(value) = lookup(FETCH_TIMEOUT_ENV) {
            self.fetch_timeout_secs = value
                .parse()
                .map_err(|_| invalid(FETCH_TIMEOUT_ENV, &value))?;
        }
        if let Some(value) = lookup(DUMP_DIR_ENV) {
            self.dump_dir = (!value.is_empty()).then(|| PathBuf::from(value));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
