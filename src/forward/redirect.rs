//! Redirect `Location` rewriting.
//!
//! A redirect from the origin is pointed back at the proxy, so the caller's
//! next hop re-enters it as `{prefix}/<absolute-url>` instead of going to the
//! redirect target directly.

use crate::resolve::{has_http_prefix, TargetUrl};

/// Rewrite a `Location` value from a response to `target`.
///
/// Absolute `http(s)://` locations are wrapped verbatim. Anything else is
/// resolved against `target` first. Returns `None` when the location cannot
/// be resolved to an http(s) URL; the caller keeps the origin's value then.
pub fn rewrite_location(location: &str, target: &TargetUrl, prefix: &str) -> Option<String> {
    let location = location.trim();
    if has_http_prefix(location) {
        return Some(format!("{}/{}", prefix, location));
    }

    let resolved = target.join(location).ok()?;
    if matches!(resolved.scheme(), "http" | "https") {
        Some(format!("{}/{}", prefix, resolved))
    } else {
        None
    }
}
