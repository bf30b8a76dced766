//! Error types for the SkyTrack environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error)]
pub enum EnvError {
    /// Transport receive failed (connection dropped, socket error, etc.)
    #[error("Transport error: {0}")]
    TransportError(String),

    /// The receiving side of a hand-off queue has been dropped
    #[error("Channel closed")]
    Closed,

    /// A frame arrived but could not be read as a message (e.g. not UTF-8);
    /// the connection itself is fine
    #[error("Decode error: {0}")]
    DecodeError(String),
}

impl EnvError {
    /// Creates a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::TransportError(msg.into())
    }

    /// Creates a decode error.
    pub fn decode(msg: impl std::fmt::Display) -> Self {
        Self::DecodeError(msg.to_string())
    }

    /// Whether a feed should retry after this error.
    ///
    /// `Closed` means the other end is gone for good.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_is_terminal() {
        assert!(!EnvError::Closed.is_retryable());
        assert!(EnvError::transport("reset by peer").is_retryable());
        assert!(EnvError::decode("bad frame").is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = EnvError::decode("expected value at line 1");
        assert_eq!(err.to_string(), "Decode error: expected value at line 1");
    }
}
