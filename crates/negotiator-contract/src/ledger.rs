//! Negotiation ledger
//!
//! Owns everything learned from the inbox:
//! - signed definitions, addressed by each of their hashes
//! - per-negotiation aggregates (trusted offers, signed offers,
//!   acceptance, rejection)
//!
//! The ledger is held by a single owner and passed explicitly to the
//! reconciler (mutably) and the template renderer (shared).

use crate::hash::DefinitionHash;
use crate::offer::{NegotiationId, TrustedOffer};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Kind of signed commitment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    /// Signed offer
    Offer,
    /// Signed acceptance
    Acceptance,
    /// Signed rejection
    Rejection,
}

impl DefinitionKind {
    /// Label used in descriptions
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Offer => "Offer",
            Self::Acceptance => "Acceptance",
            Self::Rejection => "Rejection",
        }
    }
}

/// Hash-addressed signed commitment received from the service
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    /// Commitment kind
    pub kind: DefinitionKind,
    /// Negotiation the commitment belongs to
    pub negotiation_id: NegotiationId,
    /// Hashes the definition is addressed by, first one is primary
    pub hashes: Vec<DefinitionHash>,
    /// Signed body as received
    pub body: serde_json::Value,
}

impl Definition {
    /// Create new definition
    #[inline]
    #[must_use]
    pub fn new(
        kind: DefinitionKind,
        negotiation_id: NegotiationId,
        hashes: Vec<DefinitionHash>,
        body: serde_json::Value,
    ) -> Self {
        Self {
            kind,
            negotiation_id,
            hashes,
            body,
        }
    }

    /// Primary hash, used as option value and in descriptions
    #[inline]
    #[must_use]
    pub fn primary_hash(&self) -> Option<&DefinitionHash> {
        self.hashes.first()
    }

    /// Whether the definition is addressed by `hash`
    #[inline]
    #[must_use]
    pub fn has_hash(&self, hash: &str) -> bool {
        self.hashes.iter().any(|h| h.as_str() == hash)
    }
}

/// Implicit stage of a negotiation, derived from its aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationStage {
    /// Nothing but definitions seen so far
    Pending,
    /// One trusted offer
    Offered,
    /// More than one trusted offer
    Countered,
    /// Signed acceptance received
    Accepted,
    /// Signed rejection received
    Rejected,
}

/// Aggregate state of one negotiation
///
/// No terminal state is enforced: an accepted negotiation keeps accepting
/// entries.
#[derive(Debug, Clone, Default)]
pub struct Negotiation {
    /// Offers vouched for by the service, oldest first
    pub trusted_offers: Vec<TrustedOffer>,
    /// Signed offer definitions, oldest first
    pub signed_offers: Vec<Arc<Definition>>,
    /// Signed acceptance, if any
    pub signed_acceptance: Option<Arc<Definition>>,
    /// Signed rejection, if any
    pub signed_rejection: Option<Arc<Definition>>,
}

impl Negotiation {
    /// Most recent trusted offer
    #[inline]
    #[must_use]
    pub fn latest_offer(&self) -> Option<&TrustedOffer> {
        self.trusted_offers.last()
    }

    /// Current stage
    #[must_use]
    pub fn stage(&self) -> NegotiationStage {
        if self.signed_acceptance.is_some() {
            NegotiationStage::Accepted
        } else if self.signed_rejection.is_some() {
            NegotiationStage::Rejected
        } else if self.trusted_offers.len() > 1 {
            NegotiationStage::Countered
        } else if self.trusted_offers.is_empty() {
            NegotiationStage::Pending
        } else {
            NegotiationStage::Offered
        }
    }

    /// Kind of the signed definition in this negotiation carrying `hash`
    fn kind_of(&self, hash: &str) -> Option<DefinitionKind> {
        if self.signed_offers.iter().rev().any(|d| d.has_hash(hash)) {
            return Some(DefinitionKind::Offer);
        }
        if self.signed_acceptance.as_ref().is_some_and(|d| d.has_hash(hash)) {
            return Some(DefinitionKind::Acceptance);
        }
        if self.signed_rejection.as_ref().is_some_and(|d| d.has_hash(hash)) {
            return Some(DefinitionKind::Rejection);
        }
        None
    }
}

/// Definitions and negotiations learned during the session
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    /// Insertion-ordered; re-inserting a hash keeps its position
    definitions: IndexMap<DefinitionHash, Arc<Definition>>,
    negotiations: HashMap<NegotiationId, Negotiation>,
}

impl Ledger {
    /// Create empty ledger
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Negotiation aggregate, if anything was recorded for `id`
    #[inline]
    #[must_use]
    pub fn negotiation(&self, id: NegotiationId) -> Option<&Negotiation> {
        self.negotiations.get(&id)
    }

    /// Negotiation aggregate, created on first use
    pub fn negotiation_mut(&mut self, id: NegotiationId) -> &mut Negotiation {
        self.negotiations.entry(id).or_default()
    }

    /// Number of negotiations
    #[inline]
    #[must_use]
    pub fn negotiation_count(&self) -> usize {
        self.negotiations.len()
    }

    /// Append a trusted offer to a negotiation
    pub fn record_trusted_offer(&mut self, id: NegotiationId, offer: TrustedOffer) {
        self.negotiation_mut(id).trusted_offers.push(offer);
    }

    /// Learn a signed definition received for negotiation `id`
    ///
    /// Acceptances and rejections replace the negotiation's previous one;
    /// offers are appended only for set ids. Every hash of the definition is
    /// registered for lookup.
    pub fn learn(&mut self, id: NegotiationId, definition: Definition) -> Arc<Definition> {
        let definition = Arc::new(definition);

        match definition.kind {
            DefinitionKind::Acceptance => {
                self.negotiation_mut(id).signed_acceptance = Some(Arc::clone(&definition));
            }
            DefinitionKind::Offer => {
                if id.value() > 0 {
                    self.negotiation_mut(id)
                        .signed_offers
                        .push(Arc::clone(&definition));
                }
            }
            DefinitionKind::Rejection => {
                self.negotiation_mut(id).signed_rejection = Some(Arc::clone(&definition));
            }
        }

        if definition.hashes.is_empty() {
            tracing::warn!("Definition for negotiation {} contains no hashes", id);
        }
        for hash in &definition.hashes {
            self.definitions
                .insert(hash.clone(), Arc::clone(&definition));
        }

        definition
    }

    /// Definition addressed by `hash`
    #[inline]
    #[must_use]
    pub fn definition(&self, hash: &str) -> Option<&Arc<Definition>> {
        self.definitions.get(hash)
    }

    /// Definitions in hash insertion order, once per registered hash
    pub fn definitions(&self) -> impl Iterator<Item = &Arc<Definition>> {
        self.definitions.values()
    }

    /// Number of registered hashes
    #[inline]
    #[must_use]
    pub fn hash_count(&self) -> usize {
        self.definitions.len()
    }

    /// Human-readable description of a definition hash
    ///
    /// `"[<id>] <short-hash>..."`, prefixed with the definition kind when the
    /// negotiation's signed definitions contain the hash.
    #[must_use]
    pub fn describe(&self, id: NegotiationId, hash: &DefinitionHash) -> String {
        let id_hash = format!("[{}] {}...", id, hash.short());
        match self
            .negotiation(id)
            .and_then(|negotiation| negotiation.kind_of(hash.as_str()))
        {
            Some(kind) => format!("{} {}", kind.label(), id_hash),
            None => id_hash,
        }
    }

    /// Description of a definition through its primary hash
    #[must_use]
    pub fn describe_definition(&self, definition: &Definition) -> String {
        match definition.primary_hash() {
            Some(hash) => self.describe(definition.negotiation_id, hash),
            None => format!("[{}]", definition.negotiation_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offer::TrustedContract;

    fn hash(s: &str) -> DefinitionHash {
        s.parse().unwrap()
    }

    fn definition(kind: DefinitionKind, id: i64, hashes: &[&str]) -> Definition {
        Definition::new(
            kind,
            NegotiationId(id),
            hashes.iter().map(|h| hash(h)).collect(),
            serde_json::Value::Null,
        )
    }

    #[test]
    fn learn_registers_every_hash() {
        let mut ledger = Ledger::new();
        ledger.learn(
            NegotiationId(1),
            definition(DefinitionKind::Offer, 1, &["sha:aaa", "sha:bbb"]),
        );
        assert_eq!(ledger.hash_count(), 2);
        assert!(ledger.definition("sha:aaa").is_some());
        assert!(ledger.definition("sha:bbb").is_some());
        assert_eq!(ledger.negotiation(NegotiationId(1)).unwrap().signed_offers.len(), 1);
    }

    #[test]
    fn learn_offer_with_unset_id_only_registers_hashes() {
        let mut ledger = Ledger::new();
        ledger.learn(
            NegotiationId(0),
            definition(DefinitionKind::Offer, 0, &["sha:aaa"]),
        );
        assert!(ledger.negotiation(NegotiationId(0)).is_none());
        assert!(ledger.definition("sha:aaa").is_some());
    }

    #[test]
    fn learn_acceptance_sets_stage() {
        let mut ledger = Ledger::new();
        let id = NegotiationId(4);
        ledger.record_trusted_offer(
            id,
            TrustedOffer::new("a", "b", TrustedContract::new("t", Default::default())),
        );
        assert_eq!(ledger.negotiation(id).unwrap().stage(), NegotiationStage::Offered);
        ledger.learn(id, definition(DefinitionKind::Acceptance, 4, &["sha:acc"]));
        assert_eq!(ledger.negotiation(id).unwrap().stage(), NegotiationStage::Accepted);
    }

    #[test]
    fn reinserted_hash_keeps_position() {
        let mut ledger = Ledger::new();
        ledger.learn(NegotiationId(1), definition(DefinitionKind::Offer, 1, &["sha:a"]));
        ledger.learn(NegotiationId(2), definition(DefinitionKind::Offer, 2, &["sha:b"]));
        ledger.learn(NegotiationId(3), definition(DefinitionKind::Offer, 3, &["sha:a"]));
        let ids: Vec<_> = ledger.definitions().map(|d| d.negotiation_id.value()).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn describe_prefixes_kind() {
        let mut ledger = Ledger::new();
        let id = NegotiationId(9);
        ledger.learn(id, definition(DefinitionKind::Offer, 9, &["SHA-256:0123456789abcdefXYZ"]));
        ledger.learn(id, definition(DefinitionKind::Rejection, 9, &["SHA-256:ffff"]));

        assert_eq!(
            ledger.describe(id, &hash("SHA-256:0123456789abcdefXYZ")),
            "Offer [9] 0123456789abcd..."
        );
        assert_eq!(ledger.describe(id, &hash("SHA-256:ffff")), "Rejection [9] ffff...");
        assert_eq!(ledger.describe(id, &hash("SHA-256:none")), "[9] none...");
    }

    #[test]
    fn describe_unknown_negotiation_does_not_create_it() {
        let ledger = Ledger::new();
        assert_eq!(ledger.describe(NegotiationId(5), &hash("sha:abc")), "[5] abc...");
        assert_eq!(ledger.negotiation_count(), 0);
    }
}
