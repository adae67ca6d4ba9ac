//! Delivery error type.

use crate::lifecycle::DeliveryPhase;

/// Result alias for delivery operations.
pub type DeliveryResult<T> = Result<T, DeliveryError>;

/// Error type for delivery operations.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The transport failed to write, flush, close or end the response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A value could not be used as an HTTP header.
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    /// The exchange attempted an illegal lifecycle transition.
    #[error("Invalid lifecycle transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: DeliveryPhase,
        to: DeliveryPhase,
    },

    /// Configuration could not be read or parsed.
    #[error("Config error: {0}")]
    Config(String),
}

impl DeliveryError {
    /// Create a transport error from any displayable cause.
    pub fn transport(cause: impl std::fmt::Display) -> Self {
        Self::Transport(cause.to_string())
    }

    /// Create an invalid header error.
    pub fn invalid_header(name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if this error came from the transport.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
