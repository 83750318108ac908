//! Tierlock error types.

use thiserror::Error;

/// Errors that can occur while managing local license state.
#[derive(Debug, Error)]
pub enum TierlockError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The signing key could not be produced.
    #[error("Signing key unavailable: {0}")]
    KeyUnavailable(String),

    /// Persisted state does not match its signature.
    ///
    /// The record was edited after it was written. It is never downgraded to
    /// a default tier; the caller decides whether to deactivate.
    #[error("License state tampering detected")]
    TamperedState,

    /// Persisted state exists but is not a well-formed envelope.
    #[error("License state corrupted: {0}")]
    CorruptedState(String),

    /// Filesystem error while reading or writing state.
    #[error("State I/O error: {context}: {source}")]
    StateIO {
        /// What the store was doing when the error occurred.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// HTTP transport error communicating with the license server.
    #[error("Network error: {0}")]
    ValidatorTransport(String),

    /// License server answered with a 5xx status.
    #[error("License server error: HTTP {0}")]
    ValidatorServerError(u16),

    /// License server response could not be understood.
    #[error("Protocol error: {0}")]
    ProtocolError(String),
}

impl TierlockError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::StateIO {
            context: context.into(),
            source,
        }
    }

    /// Whether this error means the stored record cannot be trusted.
    ///
    /// True for both tampering and corruption.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, Self::TamperedState | Self::CorruptedState(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrity_failures() {
        assert!(TierlockError::TamperedState.is_integrity_failure());
        assert!(TierlockError::CorruptedState("bad".into()).is_integrity_failure());
        assert!(!TierlockError::ValidatorTransport("down".into()).is_integrity_failure());
        assert!(!TierlockError::ValidatorServerError(503).is_integrity_failure());
    }

    #[test]
    fn test_server_error_message_has_no_network_prefix() {
        let err = TierlockError::ValidatorServerError(500);
        assert_eq!(err.to_string(), "License server error: HTTP 500");
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error as _;

        let err = TierlockError::io(
            "Failed to read license file",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("Failed to read license file"));
        assert!(err.source().is_some());
    }
}
