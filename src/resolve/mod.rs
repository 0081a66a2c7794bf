//! Target URL resolution.
//!
//! # Data Flow
//! ```text
//! raw path segment after "{prefix}/"
//!     → percent-decode once
//!     → trim
//!     → scheme detection (keep http(s)://, keep other explicit schemes,
//!       prepend https:// to bare hosts, reject the rest)
//!     → url::Url parse (scheme + authority required)
//!     → scheme check (http/https only)
//!     → inbound query appended
//!     → TargetUrl
//! ```
//!
//! # Design Decisions
//! - Decoding happens exactly once; already-decoded input is not re-decoded
//! - `http:/host` is not repaired; it is treated as a bare host
//! - Every rejection happens before any outbound call

mod target;

pub use target::TargetUrl;

use percent_encoding::percent_decode_str;
use thiserror::Error;
use url::Url;

/// Why an embedded target could not be turned into a [`TargetUrl`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Neither a recognized scheme nor a bare host.
    #[error("Invalid URL format: {0:?}")]
    InvalidFormat(String),

    /// Not parseable as an absolute URL, or no authority.
    #[error("Invalid URL structure: {0}")]
    InvalidStructure(String),

    /// Scheme other than http or https.
    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),
}

/// Resolve the raw (still percent-encoded) path segment of an inbound
/// request into an absolute target URL.
///
/// `inbound_query` is the query string of the inbound request, which the
/// router keeps apart from the path; it is appended to the target's own query.
pub fn resolve_target(raw: &str, inbound_query: Option<&str>) -> Result<TargetUrl, ResolveError> {
    let decoded = percent_decode_str(raw).decode_utf8_lossy();
    let candidate = decoded.trim();

    let absolute = if has_http_prefix(candidate) || has_explicit_scheme(candidate) {
        candidate.to_string()
    } else if candidate.chars().next().is_some_and(char::is_alphanumeric) {
        format!("https://{}", candidate)
    } else {
        return Err(ResolveError::InvalidFormat(candidate.to_string()));
    };

    let mut url =
        Url::parse(&absolute).map_err(|e| ResolveError::InvalidStructure(format!("{}: {}", e, absolute)))?;

    if url.cannot_be_a_base() || url.host_str().map_or(true, str::is_empty) {
        return Err(ResolveError::InvalidStructure(format!("missing authority: {}", absolute)));
    }

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ResolveError::InvalidScheme(url.scheme().to_string()));
    }

    if let Some(extra) = inbound_query.filter(|q| !q.is_empty()) {
        let merged = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{}&{}", existing, extra),
            _ => extra.to_string(),
        };
        url.set_query(Some(&merged));
    }

    Ok(TargetUrl::new(url))
}

/// `http://` or `https://`, ASCII case-insensitive.
pub fn has_http_prefix(value: &str) -> bool {
    starts_with_ignore_case(value, "http://") || starts_with_ignore_case(value, "https://")
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// `<scheme>://` with an RFC 3986 scheme name.
fn has_explicit_scheme(value: &str) -> bool {
    let Some(end) = value.find("://") else {
        return false;
    };
    let scheme = &value[..end];
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
