//! Account Orchestrator Configuration
//!
//! TOML-based configuration with environment variable override support.
//! Every value is read once at startup and handed to the components that need
//! it; nothing here is global.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Serve from in-process Login/Permissions stand-ins instead of the remotes
    pub dev_mode: bool,
    pub http: HttpConfig,
    /// Login service (credential storage, identity issuance)
    pub login: RemoteServiceConfig,
    /// Permissions service (grant storage, evaluation)
    pub permissions: RemoteServiceConfig,
    pub workflow: WorkflowConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub port: u16,
    pub host: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
        }
    }
}

/// Connection settings for one backing service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteServiceConfig {
    /// Base URL, without trailing slash
    pub base_url: String,
    /// Value sent in the authorization header
    pub auth_key: String,
    /// Authorization header name
    pub auth_header: String,
    /// Whole-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Maximum idle pooled connections kept per host
    pub max_idle_connections: usize,
    /// Idle pooled connection lifetime in seconds
    pub idle_timeout_secs: u64,
}

impl Default for RemoteServiceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            auth_key: String::new(),
            auth_header: "X-Authorization".to_string(),
            timeout_ms: 10_000,
            connect_timeout_ms: 5_000,
            max_idle_connections: 100,
            idle_timeout_secs: 120,
        }
    }
}

impl RemoteServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    fn validate(&self, section: &str) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "[{}] base_url is required",
                section
            )));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "[{}] base_url must start with http:// or https://",
                section
            )));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(format!(
                "[{}] timeout_ms must be greater than zero",
                section
            )));
        }
        if self.auth_header.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "[{}] auth_header cannot be empty",
                section
            )));
        }
        Ok(())
    }
}

/// Workflow behaviour switches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Delete the freshly created login when storing its permissions fails
    pub compensate_failed_register: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            compensate_failed_register: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    /// Check that both backing services are reachable in principle.
    /// Development mode needs no remotes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dev_mode {
            return Ok(());
        }
        self.login.validate("login")?;
        self.permissions.validate("permissions")?;
        Ok(())
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# Account Orchestrator Configuration
# Environment variables override these settings

# Use in-memory Login/Permissions services (no remotes needed)
dev_mode = false

[http]
port = 8080
host = "0.0.0.0"

[login]
base_url = "https://login.example.com"
auth_key = ""
auth_header = "X-Authorization"
timeout_ms = 10000
connect_timeout_ms = 5000
max_idle_connections = 100
idle_timeout_secs = 120

[permissions]
base_url = "https://permissions.example.com"
auth_key = ""
auth_header = "X-Authorization"
timeout_ms = 10000
connect_timeout_ms = 5000
max_idle_connections = 100
idle_timeout_secs = 120

[workflow]
# Delete the new login if its default permissions cannot be stored
compensate_failed_register = true
"#
        .to_string()
    }
}
