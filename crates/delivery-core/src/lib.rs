//! Core types for the edge response delivery pipeline.
//!
//! This crate provides the fundamental types and traits:
//! - `RequestContext` - Inbound request view (method, path, headers)
//! - `ResponseHeaders` - Outgoing headers with set-if-absent semantics
//! - `RenderedOutput` - Buffered or streaming render result
//! - `StreamProducer` - Incremental writer into a transport sink
//! - `DeliveryLifecycle` - Per-exchange state machine
//! - `DeliveryConfig` - Process-wide delivery flags

mod config;
mod context;
mod error;
mod headers;
mod lifecycle;
mod output;

pub use config::*;
pub use context::*;
pub use error::*;
pub use headers::*;
pub use lifecycle::*;
pub use output::*;
