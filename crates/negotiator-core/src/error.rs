//! Error types for the negotiator controller

use negotiator_client::TransportError;
use negotiator_contract::NegotiationId;
use negotiator_inbox::ReconcileError;

/// Main controller error type
#[derive(Debug, thiserror::Error)]
pub enum NegotiatorError {
    /// Request to the service failed
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Card could not be built
    #[error("render failed: {0}")]
    Render(#[from] ReconcileError),

    /// No offer known for the negotiation
    #[error("no offer known for negotiation {0}")]
    UnknownNegotiation(NegotiationId),

    /// Identity not loaded yet
    #[error("identity not loaded; refresh first")]
    IdentityUnknown,

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl NegotiatorError {
    /// Check if error came from the transport layer
    #[inline]
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
