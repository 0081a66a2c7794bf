//! Header sanitization in both directions.
//!
//! # Responsibilities
//! - Strip client identity (Host, Cookie, Authorization) before dispatch
//! - Strip proxy/CDN infrastructure metadata in both directions
//! - Strip connection-scoped (hop-by-hop) headers, including any named by
//!   a `Connection` header
//! - Strip response framing headers; the server re-frames the relayed body
//! - Force `Accept-Encoding: identity` so bodies arrive undecoded
//!
//! # Design Decisions
//! - Exclusion sets hold `HeaderName`s, which are lowercase-normalized, so
//!   every membership test is case-insensitive
//! - Sets are compiled once at engine construction and never mutated

use std::collections::HashSet;

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue, InvalidHeaderName};

/// Request headers that identify the proxy's client to the origin.
const CLIENT_IDENTITY: [HeaderName; 3] = [header::HOST, header::COOKIE, header::AUTHORIZATION];

/// Connection-scoped headers (RFC 9110 §7.6.1).
const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::TE,
    header::TRAILER,
    header::UPGRADE,
    header::TRANSFER_ENCODING,
];

/// Response framing headers recomputed by the server for the relayed body.
const RESPONSE_FRAMING: [HeaderName; 2] = [header::CONTENT_ENCODING, header::CONTENT_LENGTH];

/// Compiled request/response exclusion sets.
#[derive(Debug, Clone)]
pub struct HeaderPolicy {
    request_excluded: HashSet<HeaderName>,
    response_excluded: HashSet<HeaderName>,
}

impl HeaderPolicy {
    /// Build the policy from the configured infrastructure header names.
    pub fn new<S: AsRef<str>>(sensitive: &[S]) -> Result<Self, InvalidHeaderName> {
        let sensitive = sensitive
            .iter()
            .map(|name| HeaderName::from_bytes(name.as_ref().as_bytes()))
            .collect::<Result<Vec<_>, _>>()?;

        let request_excluded = CLIENT_IDENTITY
            .iter()
            .chain(HOP_BY_HOP.iter())
            .chain(sensitive.iter())
            .cloned()
            .collect();

        let response_excluded = RESPONSE_FRAMING
            .iter()
            .chain(HOP_BY_HOP.iter())
            .chain(sensitive.iter())
            .cloned()
            .collect();

        Ok(Self {
            request_excluded,
            response_excluded,
        })
    }

    pub fn is_request_excluded(&self, name: &HeaderName) -> bool {
        self.request_excluded.contains(name)
    }

    pub fn is_response_excluded(&self, name: &HeaderName) -> bool {
        self.response_excluded.contains(name)
    }

    /// Headers to send to the origin.
    pub fn sanitize_request(&self, inbound: &HeaderMap) -> HeaderMap {
        let mut outbound = filter(inbound, &self.request_excluded);
        outbound.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("identity"));
        outbound
    }

    /// Headers to return to the caller, before redirect/range/content-type
    /// adjustments.
    pub fn filter_response(&self, origin: &HeaderMap) -> HeaderMap {
        filter(origin, &self.response_excluded)
    }
}

fn filter(source: &HeaderMap, excluded: &HashSet<HeaderName>) -> HeaderMap {
    let listed = connection_tokens(source);
    let mut out = HeaderMap::with_capacity(source.len());
    for (name, value) in source {
        if excluded.contains(name) || listed.contains(name) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// Header names listed in `Connection`, which are hop-by-hop as well.
fn connection_tokens(headers: &HeaderMap) -> HashSet<HeaderName> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_SENSITIVE_HEADERS;

    fn policy() -> HeaderPolicy {
        HeaderPolicy::new(DEFAULT_SENSITIVE_HEADERS).unwrap()
    }

    fn map(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.append(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        headers
    }

    #[test]
    fn test_request_strips_identity_and_infrastructure_in_any_case() {
        let inbound = map(&[
            ("HOST", "proxy.local"),
            ("cookie", "session=1"),
            ("Authorization", "Bearer x"),
            ("x-FORWARDED-for", "10.0.0.1"),
            ("Cf-Connecting-Ip", "10.0.0.2"),
            ("CF-IPCOUNTRY", "NL"),
            ("cf-ray", "abc"),
            ("CF-Request-Id", "r1"),
            ("cf-visitor", "{\"scheme\":\"https\"}"),
            ("CDN-LOOP", "cloudflare"),
            ("Accept", "text/html"),
            ("Range", "bytes=0-99"),
        ]);

        let outbound = policy().sanitize_request(&inbound);

        for name in [
            "host",
            "cookie",
            "authorization",
            "x-forwarded-for",
            "cf-connecting-ip",
            "cf-ipcountry",
            "cf-ray",
            "cf-request-id",
            "cf-visitor",
            "cdn-loop",
        ] {
            assert!(!outbound.contains_key(name), "{name} leaked");
        }
        assert_eq!(outbound["accept"], "text/html");
        assert_eq!(outbound["range"], "bytes=0-99");
    }

    #[test]
    fn test_request_forces_identity_encoding() {
        let inbound = map(&[("Accept-Encoding", "gzip, br")]);
        let outbound = policy().sanitize_request(&inbound);
        assert_eq!(outbound.get_all("accept-encoding").iter().count(), 1);
        assert_eq!(outbound["accept-encoding"], "identity");

        let outbound = policy().sanitize_request(&HeaderMap::new());
        assert_eq!(outbound["accept-encoding"], "identity");
    }

    #[test]
    fn test_request_drops_connection_scoped_headers() {
        let inbound = map(&[
            ("Connection", "keep-alive, X-Session-Hint"),
            ("Keep-Alive", "timeout=5"),
            ("Upgrade", "websocket"),
            ("X-Session-Hint", "abc"),
            ("X-Custom", "kept"),
            ("Content-Length", "12"),
        ]);
        let outbound = policy().sanitize_request(&inbound);
        assert!(!outbound.contains_key("connection"));
        assert!(!outbound.contains_key("keep-alive"));
        assert!(!outbound.contains_key("upgrade"));
        assert!(!outbound.contains_key("x-session-hint"));
        assert_eq!(outbound["x-custom"], "kept");
        assert_eq!(outbound["content-length"], "12");
    }

    #[test]
    fn test_response_strips_framing_and_infrastructure() {
        let origin = map(&[
            ("Content-Encoding", "gzip"),
            ("CONTENT-LENGTH", "10"),
            ("Transfer-Encoding", "chunked"),
            ("Connection", "close"),
            ("CF-Ray", "abc"),
            ("cdn-loop", "cloudflare"),
            ("X-Forwarded-For", "1.2.3.4"),
            ("Content-Type", "text/plain"),
            ("ETag", "\"v1\""),
        ]);
        let filtered = policy().filter_response(&origin);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered["content-type"], "text/plain");
        assert_eq!(filtered["etag"], "\"v1\"");
    }

    #[test]
    fn test_multi_valued_headers_are_preserved() {
        let origin = map(&[("Set-Cookie", "a=1"), ("Set-Cookie", "b=2")]);
        let filtered = policy().filter_response(&origin);
        let values: Vec<_> = filtered.get_all("set-cookie").iter().collect();
        assert_eq!(values, vec!["a=1", "b=2"]);
    }

    #[test]
    fn test_custom_sensitive_list() {
        let policy = HeaderPolicy::new(&["X-Real-IP"]).unwrap();
        assert!(policy.is_request_excluded(&HeaderName::from_static("x-real-ip")));
        assert!(policy.is_response_excluded(&HeaderName::from_static("x-real-ip")));
        assert!(!policy.is_request_excluded(&HeaderName::from_static("cf-ray")));
        assert!(policy.is_request_excluded(&header::HOST));
        assert!(!policy.is_response_excluded(&header::HOST));

        assert!(HeaderPolicy::new(&["bad name"]).is_err());
    }
}
