//! Response delivery orchestration for rendered pages and data.
//!
//! This crate decides how a rendered output reaches the client:
//! - `Orchestrator` - Cache headers, conditional 304, buffered or streamed body
//! - `ResponseTransport` - Response primitives provided by the HTTP layer
//! - `DeliverySink` - Byte-counting wrapper around the transport body sink
//! - `MemoryTransport` - In-process transport for tests and tooling

mod orchestrator;
mod sink;
mod transport;

pub use orchestrator::*;
pub use sink::*;
pub use transport::*;
