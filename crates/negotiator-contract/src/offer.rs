//! Offers exchanged during a negotiation

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Field name → value mapping filled into a contract template
pub type ContractArguments = IndexMap<String, String>;

/// Negotiation identifier assigned by the service
///
/// Zero is used by the service for "no negotiation" and is never matched
/// against rendered cards.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NegotiationId(pub i64);

impl NegotiationId {
    /// Create new identifier
    #[inline]
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw value
    #[inline]
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Whether this id refers to an actual negotiation
    #[inline]
    #[must_use]
    pub const fn is_set(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for NegotiationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for NegotiationId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// One contract of an offer: a template name and its arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustedContract {
    /// Name of the template the arguments fill
    pub template_name: String,
    /// Template arguments
    #[serde(default)]
    pub arguments: ContractArguments,
}

impl TrustedContract {
    /// Create new contract
    #[inline]
    #[must_use]
    pub fn new(template_name: impl Into<String>, arguments: ContractArguments) -> Self {
        Self {
            template_name: template_name.into(),
            arguments,
        }
    }
}

/// Offer as vouched for by the negotiation service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustedOffer {
    /// Negotiation the offer belongs to, when the service includes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negotiation_id: Option<NegotiationId>,
    /// Party making the offer
    pub offeror_name: String,
    /// Party receiving the offer
    pub receiver_name: String,
    /// Start of validity window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_after: Option<String>,
    /// End of validity window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
    /// When the offer was made
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offered_at: Option<String>,
    /// Offered contracts
    #[serde(default)]
    pub contracts: Vec<TrustedContract>,
}

impl TrustedOffer {
    /// Create offer with a single contract and no validity window
    #[must_use]
    pub fn new(
        offeror_name: impl Into<String>,
        receiver_name: impl Into<String>,
        contract: TrustedContract,
    ) -> Self {
        Self {
            negotiation_id: None,
            offeror_name: offeror_name.into(),
            receiver_name: receiver_name.into(),
            valid_after: None,
            valid_until: None,
            offered_at: None,
            contracts: vec![contract],
        }
    }

    /// First contract; the one cards and dialogs display
    #[inline]
    #[must_use]
    pub fn primary_contract(&self) -> Option<&TrustedContract> {
        self.contracts.first()
    }
}
