//! Configuration loading and analysis server resolution
//!
//! Configuration lives in a single TOML file. Every field is optional and
//! falls back to a compiled default, so a missing file is a valid (empty)
//! configuration.
//!
//! Server URL priority:
//! 1. `FOODLENS_SERVER_URL` environment variable (highest priority)
//! 2. Persisted user setting (`server_url` in the TOML file)
//! 3. Compiled default

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Compiled fallback for the analysis server
pub const DEFAULT_SERVER_URL: &str = "https://foodlens-2-w1xu.onrender.com";

/// Environment override for the analysis server URL
pub const SERVER_URL_ENV: &str = "FOODLENS_SERVER_URL";

/// Environment override for the config file location
pub const CONFIG_PATH_ENV: &str = "FOODLENS_CONFIG";

/// Locale sent with requests when nothing else is configured
pub const DEFAULT_LOCALE: &str = "en-US";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter directive (e.g. "info", "foodlens_client=debug")
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Photo upload tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Attempts per upload, including the first one
    pub max_attempts: u32,
    /// Overall timeout raced against each attempt
    pub timeout_secs: u64,
    /// Base of the exponential backoff between attempts
    pub base_delay_ms: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout_secs: 180,
            base_delay_ms: 1000,
        }
    }
}

/// Barcode lookup tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub max_attempts: u32,
    /// Per-attempt timeout, enforced by cancelling the request
    pub attempt_timeout_secs: u64,
    pub base_delay_ms: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout_secs: 15,
            base_delay_ms: 500,
        }
    }
}

/// Barcode scan confirmation tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Consecutive identical reads needed before a barcode is accepted
    pub required_matches: u32,
    /// Side length of the centered square region of interest
    pub roi_side: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            required_matches: 3,
            roi_side: 280.0,
        }
    }
}

/// Contents of the FoodLens TOML configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Persisted user choice of analysis server (no trailing slash)
    pub server_url: Option<String>,
    /// Request locale (e.g. "ko-KR")
    pub locale: Option<String>,
    pub logging: LoggingConfig,
    pub upload: UploadConfig,
    pub lookup: LookupConfig,
    pub scan: ScanConfig,
}

/// Resolve the config file path
///
/// Priority: explicit argument, then `FOODLENS_CONFIG`, then
/// `<config dir>/foodlens/config.toml`.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = cli_arg {
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join("foodlens").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Load the TOML config file, treating a missing file as an empty config
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file not found, using defaults");
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Write the TOML config file atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;

    Ok(())
}

/// Trim whitespace and any trailing slashes from a server URL
pub fn normalize_server_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Resolve the analysis server base URL (environment, persisted, default)
pub fn resolve_server_url(toml_config: &TomlConfig) -> String {
    if let Ok(url) = std::env::var(SERVER_URL_ENV) {
        if !url.trim().is_empty() {
            debug!("Server URL loaded from environment variable");
            return normalize_server_url(&url);
        }
    }

    if let Some(url) = toml_config.server_url.as_deref() {
        if !url.trim().is_empty() {
            debug!("Server URL loaded from persisted setting");
            return normalize_server_url(url);
        }
    }

    DEFAULT_SERVER_URL.to_string()
}

/// Persist a new server URL, or clear the setting when `url` is blank
pub fn set_server_url(path: &Path, url: &str) -> Result<()> {
    let mut config = load_toml_config(path)?;

    if url.trim().is_empty() {
        config.server_url = None;
        info!("Cleared persisted server URL");
    } else {
        let clean = normalize_server_url(url);
        if !(clean.starts_with("http://") || clean.starts_with("https://")) {
            return Err(Error::InvalidInput(format!(
                "Server URL must start with http:// or https://: {}",
                clean
            )));
        }
        info!(url = %clean, "Persisted server URL");
        config.server_url = Some(clean);
    }

    write_toml_config(&config, path)
}
