//! Direct-access policy.
//!
//! Decides, from the raw request path alone, whether a request names an
//! embedded target or must be refused with 403.

use axum::http::Method;

use crate::config::AccessMode;

/// Outcome of classifying an inbound path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathAccess<'a> {
    /// Raw (still encoded) target segment; may be empty.
    Target(&'a str),
    Forbidden,
}

/// Methods the proxy forwards.
pub const FORWARDED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
];

pub fn is_forwarded_method(method: &Method) -> bool {
    // HEAD is answered by the GET route with the body removed.
    *method == Method::HEAD || FORWARDED_METHODS.contains(method)
}

pub fn classify_path<'a>(path: &'a str, prefix: &str, mode: AccessMode) -> PathAccess<'a> {
    if let Some(rest) = path.strip_prefix(prefix) {
        if rest.is_empty() {
            return PathAccess::Target("");
        }
        if let Some(raw) = rest.strip_prefix('/') {
            return PathAccess::Target(raw);
        }
    }

    match (path, mode) {
        ("" | "/", _) | (_, AccessMode::Strict) => PathAccess::Forbidden,
        (_, AccessMode::Open) => PathAccess::Target(&path[1..]),
    }
}
