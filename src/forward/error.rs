//! Forwarding failures.

use std::time::Duration;

use axum::http::header::InvalidHeaderName;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForwardError {
    /// The outbound HTTP client could not be constructed.
    #[error("failed to build outbound client: {0}")]
    Client(#[source] reqwest::Error),

    /// A configured sensitive header is not a valid header name.
    #[error("invalid sensitive header name: {0}")]
    HeaderName(#[from] InvalidHeaderName),

    /// Connection, DNS, TLS or timeout failure before the origin's response
    /// head arrived.
    #[error("origin unreachable: {0}")]
    OriginUnreachable(#[source] reqwest::Error),

    /// No response head from the origin within the configured timeout.
    #[error("origin did not respond within {0:?}")]
    Timeout(Duration),

    /// The inbound body outgrew the request body limit mid-upload.
    #[error("request body exceeded the size limit: {0}")]
    BodyTooLarge(#[source] reqwest::Error),
}

impl ForwardError {
    pub fn is_timeout(&self) -> bool {
        match self {
            ForwardError::OriginUnreachable(e) | ForwardError::Client(e) => e.is_timeout(),
            ForwardError::Timeout(_) => true,
            ForwardError::HeaderName(_) | ForwardError::BodyTooLarge(_) => false,
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::Client(_) => "client",
            ForwardError::HeaderName(_) => "config",
            ForwardError::Timeout(_) => "timeout",
            ForwardError::BodyTooLarge(_) => "body_limit",
            ForwardError::OriginUnreachable(e) if e.is_timeout() => "timeout",
            ForwardError::OriginUnreachable(e) if e.is_connect() => "connect",
            ForwardError::OriginUnreachable(_) => "origin",
        }
    }
}
