//! Outgoing response headers with first-writer-wins semantics.

use http::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::DeliveryError;

/// Header names written by the delivery pipeline.
pub mod header_names {
    /// Identity header advertising the serving platform.
    pub const X_POWERED_BY: &str = "X-Powered-By";
    /// Entity tag.
    pub const ETAG: &str = "ETag";
    /// Caching directives.
    pub const CACHE_CONTROL: &str = "Cache-Control";
    /// Media type of the body.
    pub const CONTENT_TYPE: &str = "Content-Type";
    /// Body length in bytes.
    pub const CONTENT_LENGTH: &str = "Content-Length";
    /// Modification time used for `If-Modified-Since`.
    pub const LAST_MODIFIED: &str = "Last-Modified";
}

/// Response header collection.
///
/// Header names are case-insensitive. `set_if_absent` never replaces a value
/// written by an earlier stage; `set` always does.
#[derive(Debug, Clone, Default)]
pub struct ResponseHeaders {
    inner: HeaderMap,
}

impl ResponseHeaders {
    /// Create an empty header collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing any existing value.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), DeliveryError> {
        let (name, value) = parse_pair(name, value)?;
        self.inner.insert(name, value);
        Ok(())
    }

    /// Set a header only if no value is present.
    ///
    /// Returns `true` when the value was written.
    pub fn set_if_absent(&mut self, name: &str, value: &str) -> Result<bool, DeliveryError> {
        let (name, value) = parse_pair(name, value)?;
        if self.inner.contains_key(&name) {
            return Ok(false);
        }
        self.inner.insert(name, value);
        Ok(true)
    }

    /// Get a header value as text.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).and_then(|v| v.to_str().ok())
    }

    /// Check whether a header is present.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    /// Remove a header, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<HeaderValue> {
        self.inner.remove(name)
    }

    /// Number of headers.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if no headers are set.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate over headers as text pairs. Non-UTF-8 values are skipped.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str(), v)))
    }

    /// Borrow the underlying `http::HeaderMap`.
    pub fn as_header_map(&self) -> &HeaderMap {
        &self.inner
    }

    /// Consume into the underlying `http::HeaderMap`.
    pub fn into_header_map(self) -> HeaderMap {
        self.inner
    }
}

impl From<HeaderMap> for ResponseHeaders {
    fn from(inner: HeaderMap) -> Self {
        Self { inner }
    }
}

fn parse_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), DeliveryError> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| DeliveryError::invalid_header(name, e))?;
    let header_value =
        HeaderValue::from_str(value).map_err(|e| DeliveryError::invalid_header(name, e))?;
    Ok((header_name, header_value))
}
