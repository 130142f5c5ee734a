//! Inbox entries as served by `/ui/inbox/entries`

use negotiator_contract::{
    Definition, DefinitionHash, DefinitionKind, HashDigest, NegotiationId, TrustedOffer,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One server-pushed negotiation event
///
/// Decoded from `{"type": "...", "id": ..., ...}`. Types this client does not
/// know decode to [`InboxEntry::Unknown`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InboxEntry {
    /// Signed definition related to a negotiation
    Definition {
        id: NegotiationId,
        #[serde(default)]
        definition: DefinitionEnvelope,
    },
    /// Offer received
    OfferSubmit { id: NegotiationId, offer: TrustedOffer },
    /// Offer accepted by its receiver
    OfferAccept { id: NegotiationId, offer: TrustedOffer },
    /// Offer rejected by its receiver
    OfferReject { id: NegotiationId, offer: TrustedOffer },
    /// Counter-offer received
    OfferCounter { id: NegotiationId, offer: TrustedOffer },
    /// Negotiation failed on the service side
    OfferFault {
        id: NegotiationId,
        #[serde(default)]
        error: Option<String>,
    },
    /// Negotiation expired
    OfferExpiry { id: NegotiationId },
    /// Unrecognised entry type
    #[serde(other)]
    Unknown,
}

impl InboxEntry {
    /// Negotiation the entry refers to
    #[must_use]
    pub fn id(&self) -> Option<NegotiationId> {
        match self {
            Self::Definition { id, .. }
            | Self::OfferSubmit { id, .. }
            | Self::OfferAccept { id, .. }
            | Self::OfferReject { id, .. }
            | Self::OfferCounter { id, .. }
            | Self::OfferFault { id, .. }
            | Self::OfferExpiry { id } => Some(*id),
            Self::Unknown => None,
        }
    }

    /// Wire type name
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Definition { .. } => "DEFINITION",
            Self::OfferSubmit { .. } => "OFFER_SUBMIT",
            Self::OfferAccept { .. } => "OFFER_ACCEPT",
            Self::OfferReject { .. } => "OFFER_REJECT",
            Self::OfferCounter { .. } => "OFFER_COUNTER",
            Self::OfferFault { .. } => "OFFER_FAULT",
            Self::OfferExpiry { .. } => "OFFER_EXPIRY",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Payload of a `DEFINITION` entry
///
/// Exactly one of `acceptance`, `offer` or `rejection` is expected; the
/// hashes sit next to it rather than inside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefinitionEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashes: Option<Vec<HashDigest>>,
}

impl DefinitionEnvelope {
    /// Envelope wrapping one signed body
    #[must_use]
    pub fn new(kind: DefinitionKind, body: Value, hashes: Vec<HashDigest>) -> Self {
        let mut envelope = Self {
            hashes: Some(hashes),
            ..Self::default()
        };
        match kind {
            DefinitionKind::Offer => envelope.offer = Some(body),
            DefinitionKind::Acceptance => envelope.acceptance = Some(body),
            DefinitionKind::Rejection => envelope.rejection = Some(body),
        }
        envelope
    }

    /// Signed body and its kind; acceptance wins over offer over rejection
    #[must_use]
    pub fn body(&self) -> Option<(DefinitionKind, &Value)> {
        if let Some(body) = &self.acceptance {
            Some((DefinitionKind::Acceptance, body))
        } else if let Some(body) = &self.offer {
            Some((DefinitionKind::Offer, body))
        } else {
            self.rejection
                .as_ref()
                .map(|body| (DefinitionKind::Rejection, body))
        }
    }

    /// Convert into a ledger definition
    ///
    /// The negotiation id is taken from the body's `negotiationId` when
    /// present, else from the entry. Returns `None` for an empty or
    /// unrecognised envelope.
    #[must_use]
    pub fn to_definition(&self, entry_id: NegotiationId) -> Option<Definition> {
        let (kind, body) = self.body()?;
        let negotiation_id = body
            .get("negotiationId")
            .and_then(Value::as_i64)
            .map_or(entry_id, NegotiationId::new);
        let hashes = self
            .hashes
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(DefinitionHash::from_digest)
            .collect();
        Some(Definition::new(kind, negotiation_id, hashes, body.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_offer_submit() {
        let entry: InboxEntry = serde_json::from_value(json!({
            "type": "OFFER_SUBMIT",
            "id": 12,
            "offer": {
                "offerorName": "bob",
                "receiverName": "alice",
                "contracts": [{"templateName": "pay.txt", "arguments": {"amount": "5"}}]
            }
        }))
        .unwrap();
        assert_eq!(entry.kind(), "OFFER_SUBMIT");
        assert_eq!(entry.id(), Some(NegotiationId(12)));
    }

    #[test]
    fn decode_fault_and_expiry() {
        let fault: InboxEntry =
            serde_json::from_value(json!({"type": "OFFER_FAULT", "id": 3, "error": "boom"}))
                .unwrap();
        assert_eq!(
            fault,
            InboxEntry::OfferFault {
                id: NegotiationId(3),
                error: Some("boom".into())
            }
        );

        let expiry: InboxEntry =
            serde_json::from_value(json!({"type": "OFFER_EXPIRY", "id": 3, "offer": null}))
                .unwrap();
        assert_eq!(expiry, InboxEntry::OfferExpiry { id: NegotiationId(3) });
    }

    #[test]
    fn unknown_type_decodes_to_unknown() {
        let entry: InboxEntry =
            serde_json::from_value(json!({"type": "CONTRACT", "id": 1})).unwrap();
        assert_eq!(entry, InboxEntry::Unknown);
        assert_eq!(entry.id(), None);
    }

    #[test]
    fn definition_envelope_to_definition() {
        let entry: InboxEntry = serde_json::from_value(json!({
            "type": "DEFINITION",
            "id": 8,
            "definition": {
                "acceptance": {"negotiationId": 9, "offerHash": "x"},
                "hashes": [{"algorithm": "SHA-256", "sum": "abc"}]
            }
        }))
        .unwrap();
        let InboxEntry::Definition { id, definition } = entry else {
            panic!("expected definition entry");
        };
        let def = definition.to_definition(id).unwrap();
        assert_eq!(def.kind, DefinitionKind::Acceptance);
        assert_eq!(def.negotiation_id, NegotiationId(9));
        assert_eq!(def.hashes[0].as_str(), "SHA-256:abc");
    }

    #[test]
    fn empty_envelope_has_no_definition() {
        assert!(DefinitionEnvelope::default()
            .to_definition(NegotiationId(1))
            .is_none());
    }

    #[test]
    fn envelope_without_hashes_still_converts() {
        let envelope = DefinitionEnvelope {
            offer: Some(json!({})),
            ..DefinitionEnvelope::default()
        };
        let def = envelope.to_definition(NegotiationId(2)).unwrap();
        assert_eq!(def.negotiation_id, NegotiationId(2));
        assert!(def.hashes.is_empty());
    }
}
