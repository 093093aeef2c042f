//! Runtime configuration for foodlens-client
//!
//! Resolved once from the TOML file and environment, then handed to both
//! transports. Nothing downstream reads the environment again.

use crate::models::Locale;
use crate::utils::RetryPolicy;
use foodlens_common::config::{
    load_toml_config, resolve_config_path, resolve_server_url, TomlConfig, DEFAULT_LOCALE,
    DEFAULT_SERVER_URL,
};
use foodlens_common::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Fully resolved client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Analysis server base URL without trailing slash
    pub server_url: String,
    /// BCP 47 tag sent as `locale`
    pub locale_tag: String,
    /// Upload policy; the attempt timeout is the overall per-attempt limit
    pub upload: RetryPolicy,
    pub lookup: RetryPolicy,
    pub required_matches: u32,
    pub roi_side: f64,
    /// Tracing filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// File the config was read from, when any
    pub source_path: Option<PathBuf>,
}

impl ClientConfig {
    /// Resolve from a parsed TOML file plus environment overrides
    pub fn from_toml(toml_config: &TomlConfig) -> Self {
        let upload = RetryPolicy::new(
            toml_config.upload.max_attempts,
            Duration::from_millis(toml_config.upload.base_delay_ms),
        )
        .with_attempt_timeout(Duration::from_secs(toml_config.upload.timeout_secs));

        let lookup = RetryPolicy::new(
            toml_config.lookup.max_attempts,
            Duration::from_millis(toml_config.lookup.base_delay_ms),
        )
        .with_attempt_timeout(Duration::from_secs(toml_config.lookup.attempt_timeout_secs));

        Self {
            server_url: resolve_server_url(toml_config),
            locale_tag: resolve_locale_tag(toml_config),
            upload,
            lookup,
            required_matches: toml_config.scan.required_matches.max(1),
            roi_side: toml_config.scan.roi_side,
            log_level: toml_config.logging.level.clone(),
            source_path: None,
        }
    }

    /// Load the config file (explicit path, `FOODLENS_CONFIG`, or default location)
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let path = resolve_config_path(cli_path)?;
        let toml_config = load_toml_config(&path)?;

        debug!(path = %path.display(), "Client configuration loaded");
        Ok(Self {
            source_path: Some(path),
            ..Self::from_toml(&toml_config)
        })
    }

    pub fn locale(&self) -> Locale {
        Locale::from_tag(&self.locale_tag)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        let toml_config = TomlConfig::default();
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            locale_tag: DEFAULT_LOCALE.to_string(),
            ..Self::from_toml(&toml_config)
        }
    }
}

/// Request locale: TOML setting, then `LANG`, then `en-US`
fn resolve_locale_tag(toml_config: &TomlConfig) -> String {
    if let Some(locale) = toml_config.locale.as_deref() {
        if !locale.trim().is_empty() {
            return locale.trim().to_string();
        }
    }

    if let Ok(lang) = std::env::var("LANG") {
        if let Some(tag) = locale_tag_from_posix(&lang) {
            debug!(lang = %lang, "Locale taken from LANG");
            return tag;
        }
    }

    DEFAULT_LOCALE.to_string()
}

/// "ko_KR.UTF-8" -> "ko-KR"; "C" and "POSIX" carry no locale
fn locale_tag_from_posix(value: &str) -> Option<String> {
    let base = value.split(['.', '@']).next().unwrap_or_default().trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(base.replace('_', "-"))
}
