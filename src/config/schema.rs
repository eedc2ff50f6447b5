//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// Named upstream services the gateway proxies to.
    pub upstreams: Vec<UpstreamConfig>,

    /// Timeout configuration for outbound calls.
    pub timeouts: TimeoutConfig,

    /// Authentication configuration.
    pub auth: AuthConfig,

    /// Access-check endpoint configuration.
    pub access: AccessConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl GatewayConfig {
    /// Look up an upstream by name.
    pub fn upstream(&self, name: &str) -> Option<&UpstreamConfig> {
        self.upstreams.iter().find(|u| u.name == name)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_size: 2 * 1024 * 1024,
        }
    }
}

/// A named upstream service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Logical service name used by callers (e.g., "platform").
    pub name: String,

    /// Base URL for the service (e.g., "http://platform.internal:9000").
    pub base_url: String,
}

/// Timeout configuration for outbound calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Authentication configuration.
///
/// Token minting is an external collaborator; the gateway only forwards the
/// inbound bearer token or substitutes this opaque machine credential.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Machine-to-machine token for privileged sub-calls.
    pub m2m_token: Option<String>,
}

/// Access-check endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Upstream service name hosting the access-check endpoint.
    pub service: String,

    /// Path of the batch access-check endpoint on that service.
    pub path: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            service: "access".to_string(),
            path: "/access-check".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
