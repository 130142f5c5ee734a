//! Request and response bodies of the write endpoints

use negotiator_contract::{
    ContractArguments, NegotiationId, Template, TrustedContract, TrustedOffer,
};
use serde::{Deserialize, Serialize};

/// Body of `POST /ui/offers`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferSubmission {
    /// Party the offer is made to
    pub receiver: String,
    /// Filled template arguments
    pub contract: ContractArguments,
    /// Template the arguments fill
    pub template: Template,
}

impl OfferSubmission {
    /// Offer as it will appear once sent by `me`
    #[must_use]
    pub fn to_trusted_offer(&self, me: &str) -> TrustedOffer {
        TrustedOffer::new(
            me,
            self.receiver.clone(),
            TrustedContract::new(self.template.name.clone(), self.contract.clone()),
        )
    }
}

/// Response of `POST /ui/offers`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferReceipt {
    /// Negotiation created by the offer
    pub id: NegotiationId,
}

/// Body of `POST /ui/acceptances` and `POST /ui/rejections`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferReply {
    /// Negotiation answered
    pub id: NegotiationId,
    /// Offer being answered
    pub offer: TrustedOffer,
}

impl OfferReply {
    /// Create new reply
    #[inline]
    #[must_use]
    pub fn new(id: NegotiationId, offer: TrustedOffer) -> Self {
        Self { id, offer }
    }
}

/// Body of `POST /ui/counter-offers`
///
/// Serialized flat, as a trusted offer with its `negotiationId` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterOffer {
    /// Negotiation countered
    pub negotiation_id: NegotiationId,
    /// Counter-offer content; its own `negotiation_id` is ignored
    #[serde(flatten)]
    pub offer: TrustedOffer,
}

impl CounterOffer {
    /// Create new counter-offer
    #[must_use]
    pub fn new(negotiation_id: NegotiationId, mut offer: TrustedOffer) -> Self {
        offer.negotiation_id = None;
        Self {
            negotiation_id,
            offer,
        }
    }

    /// Counter-offer as a trusted offer carrying its negotiation id
    #[must_use]
    pub fn to_trusted_offer(&self) -> TrustedOffer {
        TrustedOffer {
            negotiation_id: Some(self.negotiation_id),
            ..self.offer.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counter_offer_serializes_flat() {
        let mut args = ContractArguments::new();
        args.insert("amount".into(), "90".into());
        let mut offer = TrustedOffer::new("alice", "bob", TrustedContract::new("pay.txt", args));
        offer.offered_at = Some("2024-05-01T10:00:00Z".into());
        offer.negotiation_id = Some(NegotiationId(99));

        let counter = CounterOffer::new(NegotiationId(3), offer);
        assert_eq!(
            serde_json::to_value(&counter).unwrap(),
            json!({
                "negotiationId": 3,
                "offerorName": "alice",
                "receiverName": "bob",
                "offeredAt": "2024-05-01T10:00:00Z",
                "contracts": [{"templateName": "pay.txt", "arguments": {"amount": "90"}}]
            })
        );
        assert_eq!(
            counter.to_trusted_offer().negotiation_id,
            Some(NegotiationId(3))
        );
    }

    #[test]
    fn submission_becomes_offer_from_me() {
        let mut contract = ContractArguments::new();
        contract.insert("amount".into(), "5".into());
        let submission = OfferSubmission {
            receiver: "bob".into(),
            contract,
            template: Template::new("pay.txt", "Payment", "Pay {amount}"),
        };
        let offer = submission.to_trusted_offer("alice");
        assert_eq!(offer.offeror_name, "alice");
        assert_eq!(offer.receiver_name, "bob");
        assert_eq!(offer.contracts[0].template_name, "pay.txt");
    }
}
