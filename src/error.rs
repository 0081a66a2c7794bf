//! Request-level failures and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::forward::ForwardError;
use crate::resolve::ResolveError;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Forward(#[from] ForwardError),

    /// Root or non-prefixed path; rejected by the server layer.
    #[error("Direct access is not allowed")]
    DisallowedAccess,
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Resolve(_) => StatusCode::BAD_REQUEST,
            ProxyError::Forward(ForwardError::OriginUnreachable(_) | ForwardError::Timeout(_)) => {
                StatusCode::BAD_GATEWAY
            }
            ProxyError::Forward(ForwardError::BodyTooLarge(_)) => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Forward(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::DisallowedAccess => StatusCode::FORBIDDEN,
        }
    }

    /// Text returned to the caller. Origin failures are not described in
    /// detail; the cause goes to the log instead.
    pub fn description(&self) -> String {
        match self {
            ProxyError::Resolve(e) => e.to_string(),
            ProxyError::Forward(e) if e.is_timeout() => "Bad gateway: origin timed out".to_string(),
            ProxyError::Forward(ForwardError::OriginUnreachable(_)) => {
                "Bad gateway: origin unreachable".to_string()
            }
            ProxyError::Forward(ForwardError::BodyTooLarge(_)) => "Request body too large".to_string(),
            ProxyError::Forward(_) => "Proxy misconfigured".to_string(),
            ProxyError::DisallowedAccess => self.to_string(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.description()).into_response()
    }
}
