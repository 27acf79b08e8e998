//! Configuration loading.
//!
//! Configuration is loaded from a TOML file with the following resolution
//! order:
//! 1. explicit path (fails if it does not exist)
//! 2. `~/.tokenmeter/config.toml` (user)
//! 3. `/etc/tokenmeter/config.toml` (system)
//!
//! When neither implicit location exists the defaults are used. Every
//! field is optional.
//!
//! ```toml
//! [service]
//! name = "pedro-ops"
//! version = "1.0.0"
//!
//! [histograms]
//! latency_ms = [10.0, 50.0, 100.0, 500.0, 1000.0]
//! size_bytes = [100.0, 1000.0, 10000.0]
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::version;
use crate::{Result, TokenmeterError};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub histograms: HistogramConfig,
}

/// Identity published once in the lightweight backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceConfig {
    /// Service name (default: "tokenmeter").
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Service version (default: the crate's build version string).
    #[serde(default = "default_service_version")]
    pub version: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            version: default_service_version(),
        }
    }
}

fn default_service_name() -> String {
    "tokenmeter".to_string()
}

fn default_service_version() -> String {
    version::version_string()
}

/// Histogram bucket boundaries for exporters that need them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistogramConfig {
    /// Buckets for `*_milliseconds` histograms (default: 5ms .. 10s).
    #[serde(default = "default_latency_buckets")]
    pub latency_ms: Vec<f64>,
    /// Buckets for `*_size_bytes` histograms (default: 100B doubling to 51200B).
    #[serde(default = "default_size_buckets")]
    pub size_bytes: Vec<f64>,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_buckets(),
            size_bytes: default_size_buckets(),
        }
    }
}

fn default_latency_buckets() -> Vec<f64> {
    vec![
        5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0,
    ]
}

fn default_size_buckets() -> Vec<f64> {
    (0..10).map(|n| 100.0 * f64::from(1u32 << n)).collect()
}

impl Config {
    /// Load configuration from the standard locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            TokenmeterError::Configuration(format!("Failed to parse config: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            TokenmeterError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            TokenmeterError::Configuration(msg) => {
                TokenmeterError::Configuration(format!("{msg} ({path:?})"))
            }
            other => other,
        })
    }

    /// Resolve the config file path, if any.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(TokenmeterError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".tokenmeter").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/tokenmeter/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    fn validate(&self) -> Result<()> {
        self.histograms.validate()
    }
}

impl HistogramConfig {
    /// Bucket lists must be non-empty and strictly increasing.
    pub fn validate(&self) -> Result<()> {
        for (name, buckets) in [
            ("histograms.latency_ms", &self.latency_ms),
            ("histograms.size_bytes", &self.size_bytes),
        ] {
            if buckets.is_empty() {
                return Err(TokenmeterError::Configuration(format!("{name} is empty")));
            }
            if buckets.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(TokenmeterError::Configuration(format!(
                    "{name} must be strictly increasing"
                )));
            }
        }
        Ok(())
    }
}
