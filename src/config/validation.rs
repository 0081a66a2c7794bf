//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Keep the route prefix from shadowing other endpoints
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.trim().is_empty() {
            errors.push(ValidationError::new("listener.tls.cert_path", "must not be empty"));
        }
        if tls.key_path.trim().is_empty() {
            errors.push(ValidationError::new("listener.tls.key_path", "must not be empty"));
        }
    }

    let fwd = &config.forwarding;
    let prefix = fwd.route_prefix.as_str();
    if !prefix.starts_with('/') || prefix == "/" || prefix.ends_with('/') {
        errors.push(ValidationError::new(
            "forwarding.route_prefix",
            format!("'{}' must start with '/', have a segment and no trailing '/'", prefix),
        ));
    } else if prefix.contains(['{', '}', '?', '#']) {
        errors.push(ValidationError::new(
            "forwarding.route_prefix",
            format!("'{}' contains reserved characters", prefix),
        ));
    } else if prefix == "/healthz" {
        errors.push(ValidationError::new(
            "forwarding.route_prefix",
            "'/healthz' is reserved for the health endpoint",
        ));
    }

    if fwd.timeout_secs == 0 {
        errors.push(ValidationError::new("forwarding.timeout_secs", "must be greater than 0"));
    }
    if fwd.chunk_size == 0 {
        errors.push(ValidationError::new("forwarding.chunk_size", "must be greater than 0"));
    }
    if fwd.max_body_bytes == 0 {
        errors.push(ValidationError::new("forwarding.max_body_bytes", "must be greater than 0"));
    }

    for name in &fwd.sensitive_headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "forwarding.sensitive_headers",
                format!("'{}' is not a valid header name", name),
            ));
        }
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", obs.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
