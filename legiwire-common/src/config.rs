//! Configuration loading
//!
//! `ScraperConfig` resolves in priority order:
//! 1. Command-line `--config` path (highest)
//! 2. `LEGIWIRE_CONFIG` environment variable
//! 3. `~/.config/legiwire/config.toml`, then `/etc/legiwire/config.toml`
//! 4. Compiled defaults (fallback)
//!
//! Collaborator base URLs may additionally be overridden through
//! `LEGIWIRE_DOC_SERVICE_URL`, `LEGIWIRE_METADATA_URL`, and
//! `LEGIWIRE_PUBLISHER_URL`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Document-service collaborator endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocServiceConfig {
    pub base_url: String,
}

impl Default for DocServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8170".to_string(),
        }
    }
}

/// Locality-metadata collaborator endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub base_url: String,
    /// Requester tag sent on every metadata RPC
    pub requester: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8171".to_string(),
            requester: "legiwire".to_string(),
        }
    }
}

/// Message-bus publisher endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    pub base_url: String,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8172".to_string(),
        }
    }
}

/// HTTP fetch policy shared by jurisdiction scrapers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Retry budget for 5xx and transport errors
    pub retry_attempts: u32,
    /// Outbound request rate cap; 0 disables limiting
    pub rate_limit_per_sec: u32,
    /// Retry 400 responses too, for upstreams that use 400 as
    /// recoverable rate-limiting
    pub retry_on_400: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "legiwire/0.1.0 (legislative data scraper)".to_string(),
            timeout_secs: 30,
            retry_attempts: 3,
            rate_limit_per_sec: 5,
            retry_on_400: false,
        }
    }
}

/// Top-level scraper configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub doc_service: DocServiceConfig,
    pub metadata: MetadataConfig,
    pub publisher: PublisherConfig,
    pub http: HttpConfig,
}

impl ScraperConfig {
    /// Load configuration following the priority order
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let mut config = match resolve_config_path(cli_path) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse a specific TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid config file {}: {}", path.display(), e)))
    }

    /// Environment-variable overrides for collaborator base URLs
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("LEGIWIRE_DOC_SERVICE_URL") {
            self.doc_service.base_url = url;
        }
        if let Ok(url) = std::env::var("LEGIWIRE_METADATA_URL") {
            self.metadata.base_url = url;
        }
        if let Ok(url) = std::env::var("LEGIWIRE_PUBLISHER_URL") {
            self.publisher.base_url = url;
        }
    }
}

/// Locate the config file to load, if any
fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: command-line argument
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    // Priority 2: environment variable
    if let Ok(path) = std::env::var("LEGIWIRE_CONFIG") {
        return Some(PathBuf::from(path));
    }

    // Priority 3: platform config locations
    if let Some(path) = dirs::config_dir().map(|d| d.join("legiwire").join("config.toml")) {
        if path.exists() {
            return Some(path);
        }
    }
    if cfg!(target_os = "linux") {
        let system = PathBuf::from("/etc/legiwire/config.toml");
        if system.exists() {
            return Some(system);
        }
    }

    None
}
