//! Outbound dispatch and response assembly.

use std::time::Duration;

use axum::body::{Body, HttpBody};
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::{Request, Response, StatusCode};
use http_body_util::LengthLimitError;
use reqwest::redirect::Policy;

use crate::config::ForwardConfig;
use crate::forward::body::ChunkedBody;
use crate::forward::error::ForwardError;
use crate::forward::headers::HeaderPolicy;
use crate::forward::redirect::rewrite_location;
use crate::resolve::TargetUrl;

/// Fallback when neither the filtered headers nor the origin carry one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Forwards one request to its target origin and relays the response.
///
/// Holds only immutable settings and the outbound client; share it across
/// requests behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ForwardEngine {
    client: reqwest::Client,
    policy: HeaderPolicy,
    route_prefix: String,
    chunk_size: usize,
    timeout: Duration,
}

impl ForwardEngine {
    pub fn new(config: &ForwardConfig) -> Result<Self, ForwardError> {
        let policy = HeaderPolicy::new(&config.sensitive_headers)?;
        let timeout = Duration::from_secs(config.timeout_secs);

        // Per connect and per read; the response head is bounded in `forward`.
        let mut builder = reqwest::Client::builder()
            .redirect(Policy::none())
            .connect_timeout(timeout)
            .read_timeout(timeout);
        if !config.use_env_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(ForwardError::Client)?;

        Ok(Self {
            client,
            policy,
            route_prefix: config.route_prefix.clone(),
            chunk_size: config.chunk_size,
            timeout,
        })
    }

    /// Send `request` to `target` and build the caller's response.
    ///
    /// Transport failures surface as [`ForwardError::OriginUnreachable`]
    /// before any part of a response exists. `timeout` bounds the wait for
    /// the origin's response head only; once relaying starts, each body read
    /// is bounded separately so long transfers are not cut off.
    pub async fn forward(
        &self,
        request: Request<Body>,
        target: &TargetUrl,
    ) -> Result<Response<Body>, ForwardError> {
        let (parts, body) = request.into_parts();
        let wants_range = parts.headers.contains_key(header::RANGE);
        let headers = self.policy.sanitize_request(&parts.headers);

        let mut outbound = self
            .client
            .request(parts.method, target.as_url().clone())
            .headers(headers);
        if body.size_hint().exact() != Some(0) {
            outbound = outbound.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        let origin = match tokio::time::timeout(self.timeout, outbound.send()).await {
            Ok(Ok(origin)) => origin,
            Ok(Err(e)) if exceeded_body_limit(&e) => return Err(ForwardError::BodyTooLarge(e)),
            Ok(Err(e)) => return Err(ForwardError::OriginUnreachable(e)),
            Err(_) => return Err(ForwardError::Timeout(self.timeout)),
        };

        let status = origin.status();
        let headers = self.assemble_headers(status, origin.headers(), wants_range, target);
        let body = ChunkedBody::new(Box::pin(origin.bytes_stream()), self.chunk_size);

        let mut response = Response::new(Body::from_stream(body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }

    /// Caller-facing headers for an origin response to `target`.
    pub fn assemble_headers(
        &self,
        status: StatusCode,
        origin: &HeaderMap,
        wants_range: bool,
        target: &TargetUrl,
    ) -> HeaderMap {
        let mut headers = self.policy.filter_response(origin);

        if status.is_redirection() {
            if let Some(location) = origin.get(header::LOCATION) {
                let rewritten = location
                    .to_str()
                    .ok()
                    .and_then(|location| rewrite_location(location, target, &self.route_prefix))
                    .and_then(|location| HeaderValue::from_str(&location).ok());
                match rewritten {
                    Some(value) => {
                        headers.insert(header::LOCATION, value);
                    }
                    None => tracing::warn!(url = %target, "Redirect location left unrewritten"),
                }
            }
        }

        if wants_range && status == StatusCode::PARTIAL_CONTENT {
            if let Some(range) = origin.get(header::CONTENT_RANGE) {
                headers.insert(header::CONTENT_RANGE, range.clone());
            }
            headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        }

        if !headers.contains_key(header::CONTENT_TYPE) {
            let content_type = origin
                .get(header::CONTENT_TYPE)
                .cloned()
                .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
            headers.insert(header::CONTENT_TYPE, content_type);
        }

        headers
    }
}

/// Whether the inbound body was cut off by the request body limit while
/// being streamed to the origin.
fn exceeded_body_limit(err: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        if cause.is::<LengthLimitError>() {
            return true;
        }
        source = cause.source();
    }
    false
}
