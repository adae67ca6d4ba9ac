//! Process-wide delivery configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DeliveryError;

/// Streaming marker carried by inline fragments emitted out of order.
pub const DEFAULT_STREAM_MARKER: &str = "self.__edge_f.push";

/// Identity header value.
pub const DEFAULT_POWERED_BY: &str = "edge-delivery";

/// Delivery flags. Read-only while exchanges are processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Compute entity tags for materialized payloads.
    pub generate_etags: bool,
    /// Send the identity header on markup responses.
    pub powered_by_header: bool,
    /// Identity header value.
    pub powered_by_value: String,
    /// Marker identifying reorderable inline script fragments.
    pub stream_marker: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            generate_etags: true,
            powered_by_header: true,
            powered_by_value: DEFAULT_POWERED_BY.to_string(),
            stream_marker: DEFAULT_STREAM_MARKER.to_string(),
        }
    }
}

impl DeliveryConfig {
    /// Parse from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, DeliveryError> {
        toml::from_str(content).map_err(|e| DeliveryError::Config(e.to_string()))
    }

    /// Parse from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self, DeliveryError> {
        serde_json::from_str(content).map_err(|e| DeliveryError::Config(e.to_string()))
    }

    /// Load from a file; `.json` files are read as JSON, anything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DeliveryError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DeliveryError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Disable entity tag generation.
    pub fn without_etags(mut self) -> Self {
        self.generate_etags = false;
        self
    }

    /// Set the streaming marker token.
    pub fn with_stream_marker(mut self, marker: impl Into<String>) -> Self {
        self.stream_marker = marker.into();
        self
    }
}
