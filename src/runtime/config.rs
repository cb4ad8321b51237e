//! Runtime configuration.
//!
//! Settings are layered with figment, lowest priority first:
//!
//! 1. built-in defaults
//! 2. `FUNCGATE_*` environment variables (`FUNCGATE_MOCK_MODE=true` sets
//!    `mock_mode`)
//! 3. whatever the caller merges on top, such as command line overrides

use crate::gateway::DEFAULT_MAX_BODY_SIZE;
use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Prefix of every environment variable read by [`RuntimeConfig::from_env`].
pub const ENV_PREFIX: &str = "FUNCGATE_";

const SETTINGS: &[(&str, &str)] = &[
    ("HOST", "Host address to bind to (default 0.0.0.0)"),
    ("PORT", "Port to listen on (default 8080)"),
    ("API_VERSION", "Version segment of the Invoke path (default 2015-03-31)"),
    ("HEALTH_PATH", "Route answering liveness checks (default /healthcheck)"),
    ("MAX_BODY_SIZE", "Maximum request payload in bytes (default 6291456)"),
    ("MOCK_MODE", "Replace every function with a no-op mock (default false)"),
    ("EVENT_TIMEOUT_MS", "Bound for Event invocations in milliseconds (default unbounded)"),
    ("METRICS_ENABLED", "Export Prometheus metrics (default true)"),
    ("METRICS_PATH", "Route serving the metrics (default /metrics)"),
];

/// Error type for configuration loading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value for {key}: {message}")]
pub struct ConfigError {
    /// Environment variable naming the offending setting.
    pub key: String,
    pub message: String,
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        let key = if err.path.is_empty() {
            "configuration".to_string()
        } else {
            format!("{}{}", ENV_PREFIX, err.path.join("_").to_uppercase())
        };
        Self {
            key,
            message: err.kind.to_string(),
        }
    }
}

/// Configuration for the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Version segment of `/{api_version}/functions/{name}/invocations`.
    pub api_version: String,
    /// Liveness route.
    pub health_path: String,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
    /// Serve mocks instead of the registered functions.
    pub mock_mode: bool,
    /// Optional bound for background invocations, in milliseconds.
    pub event_timeout_ms: Option<u64>,
    /// Install the Prometheus recorder and serve it on `metrics_path`.
    pub metrics_enabled: bool,
    pub metrics_path: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            api_version: "2015-03-31".to_string(),
            health_path: "/healthcheck".to_string(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            mock_mode: false,
            event_timeout_ms: None,
            metrics_enabled: true,
            metrics_path: "/metrics".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with `FUNCGATE_*` environment variables.
    ///
    /// Merge further providers on the result to override both.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default())).merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load from `FUNCGATE_*` environment variables over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// Extract a config from an assembled figment.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let mut config: Self = figment.extract()?;
        config.api_version = config.api_version.trim_matches('/').to_string();
        Ok(config)
    }

    /// Describe the recognized environment variables.
    pub fn help() -> String {
        let mut out = String::from("Environment:\n");
        for (name, description) in SETTINGS {
            out.push_str(&format!("  {}{:<18} {}\n", ENV_PREFIX, name, description));
        }
        out
    }

    /// Set the host address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the API version path segment.
    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Set the health check route.
    pub fn health_path(mut self, health_path: impl Into<String>) -> Self {
        self.health_path = health_path.into();
        self
    }

    /// Set the maximum request body size.
    pub fn max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    /// Enable or disable mock mode.
    pub fn mock_mode(mut self, mock_mode: bool) -> Self {
        self.mock_mode = mock_mode;
        self
    }

    /// Enable or disable the Prometheus exporter.
    pub fn metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    /// Bound background invocations.
    pub fn event_timeout(mut self, timeout: Duration) -> Self {
        self.event_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// The background invocation bound, if any.
    pub fn event_timeout_duration(&self) -> Option<Duration> {
        self.event_timeout_ms.map(Duration::from_millis)
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
