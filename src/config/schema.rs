//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Proxy/CDN infrastructure headers stripped in both directions by default.
pub const DEFAULT_SENSITIVE_HEADERS: &[&str] = &[
    "X-Forwarded-For",
    "CF-Connecting-IP",
    "CF-IPCountry",
    "CF-Ray",
    "CF-Request-ID",
    "CF-Visitor",
    "Cdn-Loop",
];

/// Root configuration for the forward proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Forwarding engine settings.
    pub forwarding: ForwardConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3469").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3469".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// How paths outside the route prefix are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// Only `{prefix}/<url>` is proxied; everything else is 403.
    #[default]
    Strict,
    /// Any non-root path is also treated as an embedded target URL.
    Open,
}

/// Forwarding engine configuration.
///
/// Immutable once handed to [`crate::forward::ForwardEngine::new`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardConfig {
    /// Path prefix under which targets are embedded, and which redirect
    /// locations are rewritten to.
    pub route_prefix: String,

    /// Direct-access policy for paths outside the prefix.
    pub access_mode: AccessMode,

    /// Overall outbound round-trip timeout in seconds.
    pub timeout_secs: u64,

    /// Maximum size of a relayed body chunk in bytes.
    pub chunk_size: usize,

    /// Maximum inbound request body size in bytes.
    pub max_body_bytes: usize,

    /// Honor HTTP_PROXY/HTTPS_PROXY for outbound calls.
    pub use_env_proxy: bool,

    /// Infrastructure headers never forwarded to the origin nor returned to
    /// the caller. Matched case-insensitively.
    pub sensitive_headers: Vec<String>,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            route_prefix: "/proxy".to_string(),
            access_mode: AccessMode::Strict,
            timeout_secs: 300,
            chunk_size: 8 * 1024,
            max_body_bytes: 2048 * 1024 * 1024,
            use_env_proxy: false,
            sensitive_headers: DEFAULT_SENSITIVE_HEADERS
                .iter()
                .map(|h| h.to_string())
                .collect(),
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
