//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "account.toml",
    "config.toml",
    "./config/account.toml",
    "/etc/account/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file() {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        apply_overrides(&mut config, |key| env::var(key).ok());

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!(?path, "Configured path does not exist, searching defaults");
        }

        if let Ok(path) = env::var("ACCOUNT_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply overrides from a key lookup (the process environment in production)
pub(crate) fn apply_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("ACCOUNT_DEV_MODE") {
        match parse_flag(&val) {
            Some(flag) => config.dev_mode = flag,
            None => warn!(value = %val, "Ignoring invalid ACCOUNT_DEV_MODE"),
        }
    }

    // HTTP
    if let Some(val) = lookup("ACCOUNT_HTTP_HOST") {
        config.http.host = val;
    }
    if let Some(val) = lookup("ACCOUNT_HTTP_PORT") {
        match val.parse() {
            Ok(port) => config.http.port = port,
            Err(_) => warn!(value = %val, "Ignoring invalid ACCOUNT_HTTP_PORT"),
        }
    }

    // Login service
    if let Some(val) = lookup("ACCOUNT_LOGIN_URL") {
        config.login.base_url = val.trim_end_matches('/').to_string();
    }
    if let Some(val) = lookup("ACCOUNT_LOGIN_AUTH_KEY") {
        config.login.auth_key = val;
    }

    // Permissions service
    if let Some(val) = lookup("ACCOUNT_PERMISSIONS_URL") {
        config.permissions.base_url = val.trim_end_matches('/').to_string();
    }
    if let Some(val) = lookup("ACCOUNT_PERMISSIONS_AUTH_KEY") {
        config.permissions.auth_key = val;
    }

    // Shared timeout
    if let Some(val) = lookup("ACCOUNT_REMOTE_TIMEOUT_MS") {
        match val.parse() {
            Ok(timeout) => {
                config.login.timeout_ms = timeout;
                config.permissions.timeout_ms = timeout;
            }
            Err(_) => warn!(value = %val, "Ignoring invalid ACCOUNT_REMOTE_TIMEOUT_MS"),
        }
    }

    // Workflow
    if let Some(val) = lookup("ACCOUNT_COMPENSATE_FAILED_REGISTER") {
        match parse_flag(&val) {
            Some(flag) => config.workflow.compensate_failed_register = flag,
            None => warn!(value = %val, "Ignoring invalid ACCOUNT_COMPENSATE_FAILED_REGISTER"),
        }
    }
}

/// `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`, case-insensitive
fn parse_flag(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
