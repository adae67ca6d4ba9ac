//! Observability for the edge response delivery pipeline.
//!
//! This crate provides:
//! - `init_logging` - Installs the tracing subscriber (human or JSON)
//! - `delivery_span` - Per-exchange span carrying request and trace ids
//! - `TraceParent` - W3C `traceparent` parsing

mod logging;
mod span;

pub use logging::*;
pub use span::*;
