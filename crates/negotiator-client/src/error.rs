//! Transport errors
//!
//! Every failed request maps to one of four kinds the UI understands:
//! - `badResponseStatus`: non-2xx status
//! - `badResponseType`: non-empty body that is not JSON
//! - `timeout`: no response within the request timeout
//! - `error`: anything else, including undecodable JSON

use std::fmt;

/// Failure of one request to the negotiation service
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Status outside 200-299
    #[error("An unexpected status code was received from server ({status}).")]
    BadResponseStatus { status: u16 },

    /// Body present but not JSON
    #[error("Expected JSON-formatted response from server; received `{content_type}`.")]
    BadResponseType { content_type: String },

    /// Request could not be sent
    #[error("Failed to send request to server: {message}")]
    Error { message: String },

    /// No response in time
    #[error("Server failed to respond to sent request within {} seconds.", seconds(.after_ms))]
    Timeout { after_ms: u64 },

    /// JSON body did not match the expected shape
    #[error("Failed to decode response: {message}")]
    Decode { message: String },
}

impl TransportError {
    /// Error kind
    #[must_use]
    pub const fn kind(&self) -> TransportErrorKind {
        match self {
            Self::BadResponseStatus { .. } => TransportErrorKind::BadResponseStatus,
            Self::BadResponseType { .. } => TransportErrorKind::BadResponseType,
            Self::Timeout { .. } => TransportErrorKind::Timeout,
            Self::Error { .. } | Self::Decode { .. } => TransportErrorKind::Error,
        }
    }
}

#[allow(clippy::cast_precision_loss, clippy::trivially_copy_pass_by_ref)]
fn seconds(ms: &u64) -> f64 {
    *ms as f64 / 1000.0
}

/// Coarse classification of a [`TransportError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    BadResponseStatus,
    BadResponseType,
    Error,
    Timeout,
}

impl TransportErrorKind {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BadResponseStatus => "badResponseStatus",
            Self::BadResponseType => "badResponseType",
            Self::Error => "error",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_and_messages() {
        let err = TransportError::BadResponseStatus { status: 503 };
        assert_eq!(err.kind().as_str(), "badResponseStatus");
        assert_eq!(
            err.to_string(),
            "An unexpected status code was received from server (503)."
        );

        let err = TransportError::Timeout { after_ms: 3000 };
        assert_eq!(err.kind(), TransportErrorKind::Timeout);
        assert_eq!(
            err.to_string(),
            "Server failed to respond to sent request within 3 seconds."
        );
    }

    #[test]
    fn decode_failures_are_plain_errors() {
        let err = TransportError::Decode {
            message: "missing field".into(),
        };
        assert_eq!(err.kind().to_string(), "error");
    }
}
