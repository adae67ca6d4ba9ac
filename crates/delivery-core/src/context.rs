//! Request context with typed method and headers.

use std::fmt;
use std::str::FromStr;

use http::HeaderMap;

/// Unique request identifier for tracing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new request ID.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Create from an existing ID string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl Method {
    /// Methods whose response carries headers only, never a body.
    pub fn is_metadata_only(&self) -> bool {
        matches!(self, Self::Head)
    }

    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown method name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported HTTP method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "PATCH" => Ok(Self::Patch),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

impl From<&http::Method> for Method {
    fn from(method: &http::Method) -> Self {
        match *method {
            http::Method::HEAD => Self::Head,
            http::Method::POST => Self::Post,
            http::Method::PUT => Self::Put,
            http::Method::DELETE => Self::Delete,
            http::Method::PATCH => Self::Patch,
            http::Method::OPTIONS => Self::Options,
            _ => Self::Get,
        }
    }
}

/// Inbound request view used by the delivery pipeline.
///
/// Only the method and the request headers matter to delivery; headers are
/// borrowed read-only during conditional negotiation.
#[derive(Debug)]
pub struct RequestContext {
    /// Unique request identifier.
    pub request_id: RequestId,
    /// HTTP method.
    pub method: Method,
    /// Request path.
    pub path: String,
    /// HTTP headers.
    pub headers: HeaderMap,
}

impl RequestContext {
    /// Create a new request context.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::generate(),
            method,
            path: path.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Build a context from an `http::Request`, discarding the body.
    pub fn from_http<B>(request: &http::Request<B>) -> Self {
        Self {
            request_id: RequestId::generate(),
            method: Method::from(request.method()),
            path: request.uri().path().to_string(),
            headers: request.headers().clone(),
        }
    }

    /// Add a request header. Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::HeaderName::from_bytes(name.as_bytes()),
            http::HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Get a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse_case_insensitive() {
        assert_eq!("head".parse::<Method>().unwrap(), Method::Head);
        assert_eq!("GET".parse::<Method>().unwrap(), Method::Get);
        assert!("BREW".parse::<Method>().is_err());
    }

    #[test]
    fn test_method_metadata_only() {
        assert!(Method::Head.is_metadata_only());
        assert!(!Method::Get.is_metadata_only());
        assert!(!Method::Options.is_metadata_only());
    }

    #[test]
    fn test_context_header_lookup() {
        let ctx = RequestContext::new(Method::Get, "/")
            .with_header("If-None-Match", "\"abc\"");

        assert_eq!(ctx.header("if-none-match"), Some("\"abc\""));
        assert_eq!(ctx.header("IF-NONE-MATCH"), Some("\"abc\""));
        assert_eq!(ctx.header("if-modified-since"), None);
    }

    #[test]
    fn test_context_from_http_request() {
        let request = http::Request::builder()
            .method(http::Method::HEAD)
            .uri("/products/42?x=1")
            .header("If-None-Match", "\"v1\"")
            .body(())
            .unwrap();

        let ctx = RequestContext::from_http(&request);
        assert_eq!(ctx.method, Method::Head);
        assert_eq!(ctx.path, "/products/42");
        assert_eq!(ctx.header("if-none-match"), Some("\"v1\""));
    }

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(RequestId::generate(), RequestId::generate());
    }
}
