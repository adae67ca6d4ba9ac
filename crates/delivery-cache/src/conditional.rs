//! Conditional-GET negotiation.

use chrono::{DateTime, NaiveDateTime};
use delivery_core::{header_names, DeliveryError, ResponseHeaders};
use http::header::{HeaderMap, HeaderName, CACHE_CONTROL, IF_MODIFIED_SINCE, IF_NONE_MATCH};

use crate::fingerprint::Fingerprint;

/// Validators borrowed from the inbound request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConditionalValidators<'a> {
    /// `If-None-Match` value.
    pub if_none_match: Option<&'a str>,
    /// `If-Modified-Since` value.
    pub if_modified_since: Option<&'a str>,
    /// Request `Cache-Control` value.
    pub cache_control: Option<&'a str>,
}

impl<'a> ConditionalValidators<'a> {
    /// Extract validators from request headers. Non-UTF-8 values are ignored.
    pub fn from_headers(headers: &'a HeaderMap) -> Self {
        Self {
            if_none_match: header_text(headers, IF_NONE_MATCH),
            if_modified_since: header_text(headers, IF_MODIFIED_SINCE),
            cache_control: header_text(headers, CACHE_CONTROL),
        }
    }

    /// Validators with only an `If-None-Match` value.
    pub fn if_none_match(value: &'a str) -> Self {
        Self {
            if_none_match: Some(value),
            ..Default::default()
        }
    }

    /// Check whether the request carries any validator.
    pub fn is_empty(&self) -> bool {
        self.if_none_match.is_none() && self.if_modified_since.is_none()
    }

    /// Decide whether the client's cached copy is still valid.
    ///
    /// `etag` and `last_modified` describe the response that would be sent.
    /// `If-Modified-Since` is only consulted when no `If-None-Match` is sent.
    pub fn is_fresh(&self, etag: Option<&str>, last_modified: Option<&str>) -> bool {
        if self.is_empty() {
            return false;
        }

        if self.cache_control.is_some_and(requests_no_cache) {
            return false;
        }

        if let Some(none_match) = self.if_none_match.filter(|v| v.trim() != "*") {
            let Some(etag) = etag else {
                return false;
            };
            if !etag_list_matches(none_match, etag) {
                return false;
            }
        }

        let modified_since = self
            .if_modified_since
            .filter(|_| self.if_none_match.is_none());
        if let Some(modified_since) = modified_since {
            let last = last_modified.and_then(parse_http_date);
            let since = parse_http_date(modified_since);
            let not_modified = matches!((last, since), (Some(last), Some(since)) if last <= since);
            if !not_modified {
                return false;
            }
        }

        true
    }
}

/// Result of conditional negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Negotiation {
    /// The client copy is valid; answer 304 with no body and stop.
    NotModified,
    /// Continue with a full response.
    Proceed,
}

impl Negotiation {
    /// Check whether the exchange should be short-circuited.
    pub fn is_not_modified(&self) -> bool {
        matches!(self, Self::NotModified)
    }
}

/// Attach `fingerprint` as `ETag` and compare it against the validators.
///
/// The tag is written before comparison so that both 200 and 304 responses
/// carry it. Without a fingerprint the exchange always proceeds.
pub fn negotiate(
    validators: &ConditionalValidators<'_>,
    response: &mut ResponseHeaders,
    fingerprint: Option<&Fingerprint>,
) -> Result<Negotiation, DeliveryError> {
    let Some(fingerprint) = fingerprint else {
        return Ok(Negotiation::Proceed);
    };

    response.set(header_names::ETAG, fingerprint.as_str())?;

    let last_modified = response.get(header_names::LAST_MODIFIED);
    if validators.is_fresh(Some(fingerprint.as_str()), last_modified) {
        tracing::debug!(etag = %fingerprint, "conditional request matched");
        Ok(Negotiation::NotModified)
    } else {
        Ok(Negotiation::Proceed)
    }
}

fn header_text(headers: &HeaderMap, name: HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn requests_no_cache(cache_control: &str) -> bool {
    cache_control
        .split(',')
        .any(|directive| directive.trim().eq_ignore_ascii_case("no-cache"))
}

/// Match an `If-None-Match` list using weak comparison.
fn etag_list_matches(list: &str, etag: &str) -> bool {
    list.split([',', ' '])
        .filter(|token| !token.is_empty())
        .any(|token| {
            token == etag
                || token.strip_prefix("W/") == Some(etag)
                || etag.strip_prefix("W/") == Some(token)
        })
}

/// Obsolete HTTP-date layouts (RFC 850, asctime) still accepted from clients.
const OBSOLETE_DATE_FORMATS: [&str; 2] = ["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %e %H:%M:%S %Y"];

fn parse_http_date(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.timestamp());
    }
    OBSOLETE_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|dt| dt.and_utc().timestamp())
}
