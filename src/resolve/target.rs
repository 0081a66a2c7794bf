//! Validated absolute target URL.

use std::fmt;

use url::Url;

/// An absolute `http`/`https` URL with a non-empty authority.
///
/// Only [`crate::resolve::resolve_target`] constructs these, so holders can
/// rely on the scheme and host being present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUrl {
    url: Url,
}

impl TargetUrl {
    pub(crate) fn new(url: Url) -> Self {
        Self { url }
    }

    /// Lowercase scheme, `http` or `https`.
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// `host[:port]`, with the port only when it differs from the scheme default.
    pub fn authority(&self) -> String {
        match self.url.port() {
            Some(port) => format!("{}:{}", self.host(), port),
            None => self.host().to_string(),
        }
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.url.query()
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.url
    }

    /// Resolve a possibly relative reference against this URL.
    pub fn join(&self, reference: &str) -> Result<Url, url::ParseError> {
        self.url.join(reference)
    }
}

impl fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}
