//! Caching primitives for the edge response delivery pipeline.
//!
//! This crate provides:
//! - `Fingerprint` - Strong entity tag derived from normalized content
//! - `ConditionalValidators` - `If-None-Match` / `If-Modified-Since` view
//! - `negotiate` - Attach the entity tag and decide on 304 Not Modified
//! - `CacheDirectives` - Revalidation policy formatted as `Cache-Control`
//!
//! # Example
//!
//! ```ignore
//! use delivery_cache::{CacheDirectives, Fingerprint, RevalidatePolicy};
//!
//! let directives = CacheDirectives::new(RevalidatePolicy::Window(60)).with_stale_window(30);
//! assert_eq!(directives.cache_control_header(), "s-maxage=60, stale-while-revalidate=30");
//!
//! let etag = Fingerprint::compute(b"<html></html>");
//! ```

mod conditional;
mod fingerprint;
mod policy;

pub use conditional::*;
pub use fingerprint::*;
pub use policy::*;
