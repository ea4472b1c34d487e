//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::config::loader::ConfigError;
use crate::dataset::RefreshPolicy;
use crate::matching::Strategy;
use crate::protocol::DEFAULT_MAX_PAYLOAD;

/// Root configuration for the line query server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, TLS, connection ceiling).
    pub listener: ListenerConfig,

    /// Dataset source and matching settings.
    pub dataset: DatasetConfig,

    /// Frame limits.
    pub protocol: ProtocolConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:44445").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:44445".to_string(),
            tls: None,
            max_connections: 1024,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate chain file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Dataset configuration.
///
/// `path` and `refresh_policy` have no defaults; validation rejects a
/// config that leaves either unset.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Path of the reference text file.
    pub path: Option<String>,

    /// When to reload the dataset.
    pub refresh_policy: Option<RefreshPolicy>,

    /// Matching algorithm.
    pub strategy: Strategy,

    /// Load the dataset at startup instead of on first query.
    pub preload: bool,

    /// Refresh the cache whenever the dataset file changes.
    pub watch: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: None,
            refresh_policy: None,
            strategy: Strategy::default(),
            preload: true,
            watch: false,
        }
    }
}

impl DatasetConfig {
    /// The dataset path, or a `MissingKey` error.
    pub fn require_path(&self) -> Result<&str, ConfigError> {
        self.path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or(ConfigError::MissingKey("dataset.path"))
    }

    /// The refresh policy, or a `MissingKey` error.
    pub fn require_policy(&self) -> Result<RefreshPolicy, ConfigError> {
        self.refresh_policy
            .ok_or(ConfigError::MissingKey("dataset.refresh_policy"))
    }
}

/// Frame limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Maximum accepted payload size in bytes.
    pub max_payload_bytes: usize,

    /// Malformed headers tolerated per connection before closing it.
    pub malformed_header_allowance: u32,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: DEFAULT_MAX_PAYLOAD,
            malformed_header_allowance: 0,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Idle timeout waiting for the next request, in seconds. 0 disables.
    pub idle_secs: u64,

    /// How long shutdown waits for open connections to finish, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            idle_secs: 0,
            shutdown_grace_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, for development.
    Pretty,
    /// One JSON object per event, for log aggregation.
    Json,
}
