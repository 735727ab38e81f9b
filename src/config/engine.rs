//! Engine configuration loaded from `~/.tempvar/config.toml`.
//!
//! # File Format
//!
//! ```toml
//! # Default endpoint for templates without a source
//! endpoint = "http://localhost:8086/query"
//! request_timeout_secs = 30
//! database = "telegraf"
//!
//! # Endpoints for templates carrying a sourceID
//! [sources]
//! "1" = "http://influx-a:8086/query"
//! "2" = "http://influx-b:8086/query"
//! ```
//!
//! # Location
//!
//! 1. An explicit path (the `--config` flag)
//! 2. The `TEMPVAR_CONFIG` environment variable
//! 3. `~/.tempvar/config.toml`
//!
//! A missing file yields [`EngineConfig::default`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_ENV_VAR, CONFIG_FILE_NAME, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::resolver::HydrateOptions;

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// User configuration of the engine and its data sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Default query endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Query endpoints by source id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sources: BTreeMap<String, String>,

    /// HTTP timeout for metadata queries, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Database sent as the `db` parameter with every query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            sources: BTreeMap::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            database: None,
        }
    }
}

impl EngineConfig {
    /// Load the configuration from `path`, or from the standard locations when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(path: Option<PathBuf>) -> Result<Self> {
        let path = match resolve_path(path, std::env::var(CONFIG_ENV_VAR).ok()) {
            Some(path) => path,
            None => return Ok(Self::default()),
        };

        if path.exists() {
            Self::load_from(&path).await
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load the configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// `~/.tempvar/config.toml`, if the home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Hydration options carrying this configuration's endpoints.
    pub fn hydrate_options(&self) -> HydrateOptions {
        HydrateOptions {
            endpoint: self.endpoint.clone(),
            sources: self.sources.clone().into_iter().collect(),
            ..HydrateOptions::default()
        }
    }
}

/// Pick the config file: explicit path, then environment, then the default location.
fn resolve_path(explicit: Option<PathBuf>, from_env: Option<String>) -> Option<PathBuf> {
    explicit
        .or_else(|| from_env.filter(|p| !p.is_empty()).map(PathBuf::from))
        .or_else(EngineConfig::default_path)
}
