//! Error types for inbox reconciliation

use negotiator_contract::{LookupError, NegotiationId};

/// Failure to process one inbox entry
///
/// Treated as transient: the entry is retried within the batch, then
/// dropped and logged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// Referenced template or party not loaded
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Offer carries no contract to render
    #[error("offer in negotiation {0} carries no contract")]
    MissingContract(NegotiationId),
}
