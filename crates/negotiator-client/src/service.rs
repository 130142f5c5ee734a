//! Negotiation service abstraction
//!
//! The controller talks to the service only through [`NegotiationService`],
//! so tests can substitute an in-memory fake for [`crate::NegotiatorClient`].

use crate::error::TransportError;
use crate::payload::{CounterOffer, OfferReceipt, OfferReply, OfferSubmission};
use async_trait::async_trait;
use negotiator_contract::{Party, Template};
use negotiator_inbox::InboxEntry;

/// Batch of inbox entries
///
/// `len` counts every entry served, including ones that failed to decode and
/// were skipped, so the inbox offset stays aligned with the server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboxBatch {
    /// Decoded entries in received order
    pub entries: Vec<InboxEntry>,
    /// Number of entries served
    pub len: usize,
}

impl InboxBatch {
    /// Batch where every entry decoded
    #[must_use]
    pub fn new(entries: Vec<InboxEntry>) -> Self {
        let len = entries.len();
        Self { entries, len }
    }

    /// Check if nothing was served
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// UI endpoints of the negotiation service
#[async_trait]
pub trait NegotiationService: Send + Sync {
    /// `GET /ui/me`
    async fn me(&self) -> Result<Party, TransportError>;

    /// `GET /ui/parties`
    async fn parties(&self) -> Result<Vec<Party>, TransportError>;

    /// `GET /ui/templates`
    async fn templates(&self) -> Result<Vec<Template>, TransportError>;

    /// `GET /ui/inbox/entries?from=N`
    async fn inbox_entries(&self, from: usize) -> Result<InboxBatch, TransportError>;

    /// `DELETE /ui/inbox/entries`: fetch and remove all pending entries
    async fn drain_inbox(&self) -> Result<InboxBatch, TransportError>;

    /// `POST /ui/offers`
    async fn submit_offer(&self, offer: &OfferSubmission) -> Result<OfferReceipt, TransportError>;

    /// `POST /ui/acceptances`
    async fn accept(&self, reply: &OfferReply) -> Result<(), TransportError>;

    /// `POST /ui/counter-offers`
    async fn counter_offer(&self, offer: &CounterOffer) -> Result<(), TransportError>;

    /// `POST /ui/rejections`
    async fn reject(&self, reply: &OfferReply) -> Result<(), TransportError>;
}
