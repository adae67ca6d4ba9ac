//! Per-exchange tracing spans.

use delivery_core::{ContentKind, RequestContext};

/// Incoming W3C trace context.
///
/// Format: `{version}-{trace_id}-{parent_id}-{flags}`
/// Example: `00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceParent {
    /// The trace ID (128-bit, hex encoded).
    pub trace_id: String,
    /// The caller's span ID (64-bit, hex encoded).
    pub parent_id: String,
    /// Whether the caller sampled this trace.
    pub sampled: bool,
}

impl TraceParent {
    /// Parse a `traceparent` header value. Only version `00` is accepted.
    pub fn parse(header: &str) -> Option<Self> {
        let parts: Vec<&str> = header.trim().split('-').collect();
        let [version, trace_id, parent_id, flags] = parts.as_slice() else {
            return None;
        };

        if *version != "00" || !is_hex(trace_id, 32) || !is_hex(parent_id, 16) {
            return None;
        }
        let flags = u8::from_str_radix(flags, 16).ok()?;

        Some(Self {
            trace_id: trace_id.to_string(),
            parent_id: parent_id.to_string(),
            sampled: flags & 0x01 != 0,
        })
    }
}

fn is_hex(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Span covering one delivery.
///
/// The trace id comes from the request's `traceparent` header when present,
/// otherwise from the request id.
pub fn delivery_span(request: &RequestContext, kind: ContentKind) -> tracing::Span {
    let trace_id = request
        .header("traceparent")
        .and_then(TraceParent::parse)
        .map(|tp| tp.trace_id)
        .unwrap_or_else(|| request.request_id.to_string());

    tracing::info_span!(
        "deliver",
        request_id = %request.request_id,
        trace_id = %trace_id,
        method = %request.method,
        path = %request.path,
        kind = %kind,
    )
}
