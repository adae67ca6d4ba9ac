//! Revalidation policy and `Cache-Control` formatting.

use serde::{Deserialize, Serialize};

/// One year in seconds, the ceiling used for content that is not revalidated
/// on a timer.
pub const CACHE_ONE_YEAR: u64 = 31_536_000;

/// Value sent for responses that must not be cached.
pub const NO_CACHE_DIRECTIVE: &str = "private, no-cache, no-store, max-age=0, must-revalidate";

/// When a cached response must be revalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RevalidatePolicy {
    /// Fresh for this many seconds at shared caches; `0` disables caching.
    Window(u64),
    /// Content never expires.
    Never,
    /// Cached until explicitly purged.
    OnDemand,
}

impl RevalidatePolicy {
    /// Parse a CLI/config token: a number of seconds, `never`, or `on-demand`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "never" => Some(Self::Never),
            "on-demand" | "ondemand" => Some(Self::OnDemand),
            other => other.parse().ok().map(Self::Window),
        }
    }
}

/// Caller-supplied caching policy for one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDirectives {
    /// Revalidation policy.
    pub revalidate: RevalidatePolicy,
    /// Stale-while-revalidate window in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stale_window: Option<u64>,
}

impl CacheDirectives {
    /// Create directives without a stale window.
    pub fn new(revalidate: RevalidatePolicy) -> Self {
        Self {
            revalidate,
            stale_window: None,
        }
    }

    /// Set the stale-while-revalidate window.
    pub fn with_stale_window(mut self, seconds: u64) -> Self {
        self.stale_window = Some(seconds);
        self
    }

    /// Generate the `Cache-Control` header value.
    pub fn cache_control_header(&self) -> String {
        let swr = self
            .stale_window
            .map(|s| format!(", stale-while-revalidate={}", s))
            .unwrap_or_default();

        match self.revalidate {
            RevalidatePolicy::Window(0) => NO_CACHE_DIRECTIVE.to_string(),
            RevalidatePolicy::Window(seconds) => format!("s-maxage={}{}", seconds, swr),
            RevalidatePolicy::OnDemand => format!("s-maxage={}{}", CACHE_ONE_YEAR, swr),
            RevalidatePolicy::Never => format!("public, max-age={}, immutable", CACHE_ONE_YEAR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_with_stale() {
        let d = CacheDirectives::new(RevalidatePolicy::Window(60)).with_stale_window(30);
        assert_eq!(d.cache_control_header(), "s-maxage=60, stale-while-revalidate=30");
    }

    #[test]
    fn test_window_without_stale() {
        let d = CacheDirectives::new(RevalidatePolicy::Window(300));
        assert_eq!(d.cache_control_header(), "s-maxage=300");
    }

    #[test]
    fn test_zero_window_disables_caching() {
        let d = CacheDirectives::new(RevalidatePolicy::Window(0)).with_stale_window(30);
        assert_eq!(d.cache_control_header(), NO_CACHE_DIRECTIVE);
    }

    #[test]
    fn test_on_demand() {
        let d = CacheDirectives::new(RevalidatePolicy::OnDemand).with_stale_window(10);
        assert_eq!(
            d.cache_control_header(),
            "s-maxage=31536000, stale-while-revalidate=10"
        );
    }

    #[test]
    fn test_never() {
        let d = CacheDirectives::new(RevalidatePolicy::Never);
        assert_eq!(d.cache_control_header(), "public, max-age=31536000, immutable");
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(RevalidatePolicy::parse("60"), Some(RevalidatePolicy::Window(60)));
        assert_eq!(RevalidatePolicy::parse("never"), Some(RevalidatePolicy::Never));
        assert_eq!(RevalidatePolicy::parse("on-demand"), Some(RevalidatePolicy::OnDemand));
        assert_eq!(RevalidatePolicy::parse("soon"), None);
    }

    #[test]
    fn test_directives_serde() {
        let d: CacheDirectives =
            serde_json::from_str(r#"{"revalidate":{"window":120},"stale_window":5}"#).unwrap();
        assert_eq!(d.revalidate, RevalidatePolicy::Window(120));
        assert_eq!(d.stale_window, Some(5));

        let d: CacheDirectives = serde_json::from_str(r#"{"revalidate":"on-demand"}"#).unwrap();
        assert_eq!(d.revalidate, RevalidatePolicy::OnDemand);
        assert_eq!(d.stale_window, None);
    }
}
