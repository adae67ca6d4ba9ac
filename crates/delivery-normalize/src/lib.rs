//! Order-insensitive content normalization for response fingerprints.
//!
//! Streaming renderers resolve data concurrently and serialize chunks in
//! completion order, so two renders of identical content can differ byte for
//! byte. The `Normalizer` produces a canonical copy used only as fingerprint
//! input:
//! - structured data: newline-delimited lines are sorted
//! - markup: inline scripts carrying the streaming marker are moved to the end
//!   of `<body>` in sorted order
//! - component streams: unchanged
//!
//! Markup normalization is best effort. On failure the original payload is
//! used and a warning is logged.

mod lines;
mod markup;

use std::borrow::Cow;

use delivery_core::{ContentKind, DeliveryConfig};

pub use lines::{sort_lines, LINE_DELIMITER};
pub use markup::{reorder_stream_scripts, MarkupError};

/// Errors from `Normalizer::try_normalize`.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    /// Markup could not be restructured.
    #[error(transparent)]
    Markup(#[from] MarkupError),
}

/// Produces canonical fingerprint input for a rendered payload.
#[derive(Debug, Clone)]
pub struct Normalizer {
    stream_marker: String,
}

impl Normalizer {
    /// Create a normalizer that reorders scripts containing `stream_marker`.
    ///
    /// An empty marker disables markup reordering.
    pub fn new(stream_marker: impl Into<String>) -> Self {
        Self {
            stream_marker: stream_marker.into(),
        }
    }

    /// Create a normalizer from delivery configuration.
    pub fn from_config(config: &DeliveryConfig) -> Self {
        Self::new(config.stream_marker.clone())
    }

    /// Streaming marker token.
    pub fn stream_marker(&self) -> &str {
        &self.stream_marker
    }

    /// Normalize, reporting markup failures.
    pub fn try_normalize<'a>(
        &self,
        payload: &'a str,
        kind: ContentKind,
    ) -> Result<Cow<'a, str>, NormalizeError> {
        match kind {
            ContentKind::StructuredData => Ok(Cow::Owned(sort_lines(payload))),
            ContentKind::Markup => {
                if self.stream_marker.is_empty() || !payload.contains(&self.stream_marker) {
                    return Ok(Cow::Borrowed(payload));
                }
                let reordered = reorder_stream_scripts(payload, &self.stream_marker)?;
                Ok(Cow::Owned(reordered))
            }
            ContentKind::ComponentStream => Ok(Cow::Borrowed(payload)),
        }
    }

    /// Normalize, falling back to the original payload on failure.
    pub fn normalize<'a>(&self, payload: &'a str, kind: ContentKind) -> Cow<'a, str> {
        match self.try_normalize(payload, kind) {
            Ok(normalized) => normalized,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    kind = %kind,
                    bytes = payload.len(),
                    "normalization failed, fingerprinting original payload"
                );
                Cow::Borrowed(payload)
            }
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::from_config(&DeliveryConfig::default())
    }
}
