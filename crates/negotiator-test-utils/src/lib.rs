//! Testing utilities for the negotiator workspace
//!
//! Shared fixtures and an in-memory [`FakeService`].

#![allow(missing_docs)]

use async_trait::async_trait;
use negotiator_client::{
    CounterOffer, InboxBatch, NegotiationService, OfferReceipt, OfferReply, OfferSubmission,
    TransportError,
};
use negotiator_contract::{
    ContractArguments, Directory, NegotiationId, Party, Template, TrustedContract, TrustedOffer,
};
use negotiator_inbox::InboxEntry;
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;

pub fn alice() -> Party {
    Party::new("alice", "Alice Ltd")
}

pub fn bob() -> Party {
    Party::new("bob", "Bob Inc")
}

pub fn payment_template() -> Template {
    Template::new("pay.txt", "Payment", "Pay {amount} to {recipient}")
}

/// Directory as seen by alice
pub fn directory() -> Directory {
    Directory::new()
        .with_me(alice())
        .with_parties(vec![alice(), bob()])
        .with_templates(vec![payment_template()])
}

pub fn payment_offer(offeror: &str, receiver: &str, amount: &str) -> TrustedOffer {
    let mut args = ContractArguments::new();
    args.insert("amount".into(), amount.into());
    args.insert("recipient".into(), "Bob".into());
    TrustedOffer::new(offeror, receiver, TrustedContract::new("pay.txt", args))
}

/// `OFFER_SUBMIT` from bob to alice
pub fn submit_entry(id: i64) -> InboxEntry {
    InboxEntry::OfferSubmit {
        id: NegotiationId(id),
        offer: payment_offer("bob", "alice", "100"),
    }
}

/// `OFFER_ACCEPT` of alice's offer by bob
pub fn accept_entry(id: i64) -> InboxEntry {
    InboxEntry::OfferAccept {
        id: NegotiationId(id),
        offer: payment_offer("alice", "bob", "100"),
    }
}

/// Service endpoint, for failure injection and call counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Me,
    Parties,
    Templates,
    Inbox,
    Drain,
    Offers,
    Acceptances,
    CounterOffers,
    Rejections,
}

/// Write request received by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Offer(OfferSubmission),
    Accept(OfferReply),
    Counter(CounterOffer),
    Reject(OfferReply),
}

#[derive(Debug, Default)]
struct FakeState {
    me: Option<Party>,
    parties: Vec<Party>,
    templates: Vec<Template>,
    inbox: Vec<InboxEntry>,
    next_id: i64,
    failures: HashMap<Endpoint, TransportError>,
    calls: HashMap<Endpoint, usize>,
    recorded: Vec<Recorded>,
}

/// In-memory negotiation service
#[derive(Debug, Default)]
pub struct FakeService {
    state: Mutex<FakeState>,
}

impl FakeService {
    /// Fake serving [`directory`] with an empty inbox
    #[must_use]
    pub fn new() -> Self {
        let fake = Self::default();
        {
            let mut state = fake.state.lock();
            state.me = Some(alice());
            state.parties = vec![alice(), bob()];
            state.templates = vec![payment_template()];
            state.next_id = 100;
        }
        fake
    }

    /// Append entries to the inbox
    pub fn push_entries(&self, entries: impl IntoIterator<Item = InboxEntry>) {
        self.state.lock().inbox.extend(entries);
    }

    /// Replace served templates
    pub fn set_templates(&self, templates: Vec<Template>) {
        self.state.lock().templates = templates;
    }

    /// Make every call to `endpoint` fail with `error`
    pub fn fail(&self, endpoint: Endpoint, error: TransportError) {
        self.state.lock().failures.insert(endpoint, error);
    }

    /// Stop failing `endpoint`
    pub fn heal(&self, endpoint: Endpoint) {
        self.state.lock().failures.remove(&endpoint);
    }

    /// Number of calls made to `endpoint`
    #[must_use]
    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.state.lock().calls.get(&endpoint).copied().unwrap_or_default()
    }

    /// Write requests received, in order
    #[must_use]
    pub fn recorded(&self) -> Vec<Recorded> {
        self.state.lock().recorded.clone()
    }

    fn enter(&self, endpoint: Endpoint) -> Result<MutexGuard<'_, FakeState>, TransportError> {
        let mut state = self.state.lock();
        *state.calls.entry(endpoint).or_default() += 1;
        if let Some(error) = state.failures.get(&endpoint).cloned() {
            return Err(error);
        }
        Ok(state)
    }
}

#[async_trait]
impl NegotiationService for FakeService {
    async fn me(&self) -> Result<Party, TransportError> {
        self.enter(Endpoint::Me)?
            .me
            .clone()
            .ok_or(TransportError::BadResponseStatus { status: 404 })
    }

    async fn parties(&self) -> Result<Vec<Party>, TransportError> {
        Ok(self.enter(Endpoint::Parties)?.parties.clone())
    }

    async fn templates(&self) -> Result<Vec<Template>, TransportError> {
        Ok(self.enter(Endpoint::Templates)?.templates.clone())
    }

    async fn inbox_entries(&self, from: usize) -> Result<InboxBatch, TransportError> {
        let state = self.enter(Endpoint::Inbox)?;
        let entries = state.inbox.get(from..).unwrap_or_default().to_vec();
        Ok(InboxBatch::new(entries))
    }

    async fn drain_inbox(&self) -> Result<InboxBatch, TransportError> {
        let mut state = self.enter(Endpoint::Drain)?;
        Ok(InboxBatch::new(std::mem::take(&mut state.inbox)))
    }

    async fn submit_offer(&self, offer: &OfferSubmission) -> Result<OfferReceipt, TransportError> {
        let mut state = self.enter(Endpoint::Offers)?;
        state.recorded.push(Recorded::Offer(offer.clone()));
        state.next_id += 1;
        Ok(OfferReceipt {
            id: NegotiationId(state.next_id),
        })
    }

    async fn accept(&self, reply: &OfferReply) -> Result<(), TransportError> {
        let mut state = self.enter(Endpoint::Acceptances)?;
        state.recorded.push(Recorded::Accept(reply.clone()));
        Ok(())
    }

    async fn counter_offer(&self, offer: &CounterOffer) -> Result<(), TransportError> {
        let mut state = self.enter(Endpoint::CounterOffers)?;
        state.recorded.push(Recorded::Counter(offer.clone()));
        Ok(())
    }

    async fn reject(&self, reply: &OfferReply) -> Result<(), TransportError> {
        let mut state = self.enter(Endpoint::Rejections)?;
        state.recorded.push(Recorded::Reject(reply.clone()));
        Ok(())
    }
}
