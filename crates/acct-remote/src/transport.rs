//! Shared request/response plumbing for the HTTP clients.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{RemoteError, Result};
use crate::{wire, Endpoint};

/// Longest slice of a rejected body kept for diagnostics
const MAX_REJECTED_BODY: usize = 512;

/// Connection settings for one backing service
#[derive(Debug, Clone)]
pub struct RemoteClientConfig {
    /// Service base URL, e.g. `https://login.example.com`
    pub base_url: String,
    /// Authorization header name
    pub auth_header: String,
    /// Authorization header value
    pub auth_key: String,
    /// Whole-request timeout
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Idle pooled connections kept per host
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
}

impl RemoteClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_header: "X-Authorization".to_string(),
            auth_key: String::new(),
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            pool_max_idle_per_host: 100,
            pool_idle_timeout: Duration::from_secs(120),
        }
    }

    pub fn with_auth(mut self, header: impl Into<String>, key: impl Into<String>) -> Self {
        self.auth_header = header.into();
        self.auth_key = key.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_pool(mut self, max_idle_per_host: usize, idle_timeout: Duration) -> Self {
        self.pool_max_idle_per_host = max_idle_per_host;
        self.pool_idle_timeout = idle_timeout;
        self
    }

    fn url_for(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), endpoint.path())
    }
}

/// Pooled HTTP client bound to one service and its credentials
#[derive(Debug, Clone)]
pub(crate) struct RemoteTransport {
    client: Client,
    config: RemoteClientConfig,
}

impl RemoteTransport {
    pub(crate) fn new(config: RemoteClientConfig) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .build()?;

        Ok(Self { client, config })
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Send one JSON request and return the body of a 2xx response.
    ///
    /// The response body is always read to the end, so the connection goes
    /// back to the pool on success and failure alike.
    pub(crate) async fn call<B>(&self, endpoint: Endpoint, body: &B) -> Result<String>
    where
        B: Serialize + ?Sized,
    {
        let url = self.config.url_for(endpoint);
        let payload =
            serde_json::to_vec(body).map_err(|source| RemoteError::Encode { endpoint, source })?;

        debug!(endpoint = %endpoint, url = %url, "Calling remote service");

        let response = self
            .client
            .request(endpoint.method(), &url)
            .header(self.config.auth_header.as_str(), self.config.auth_key.as_str())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|source| {
                warn!(
                    endpoint = %endpoint,
                    error = %source,
                    timeout = source.is_timeout(),
                    "Remote call failed"
                );
                RemoteError::Transport { endpoint, source }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| RemoteError::Transport { endpoint, source })?;

        if status.is_success() {
            debug!(endpoint = %endpoint, status = status.as_u16(), "Remote call succeeded");
            return Ok(text);
        }

        if let Some(message) = wire::error_field(&text) {
            debug!(
                endpoint = %endpoint,
                status = status.as_u16(),
                "Remote rejected request with error body"
            );
            return Err(RemoteError::domain(endpoint, &message));
        }

        warn!(endpoint = %endpoint, status = status.as_u16(), "Remote returned non-success status");
        Err(RemoteError::Rejected {
            endpoint,
            status: status.as_u16(),
            body: text.chars().take(MAX_REJECTED_BODY).collect(),
        })
    }
}
