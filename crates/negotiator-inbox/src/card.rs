//! Cards: the rendered view-model items of the board

use crate::error::ReconcileError;
use negotiator_contract::{
    render, resolve_references, ContractArguments, Directory, Ledger, NegotiationId,
    RenderedSegment, Template, TrustedOffer,
};
use serde::{Deserialize, Serialize};

/// Board section a card lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// Contract templates
    Templates,
    /// Negotiation inbox
    Inbox,
    /// Concluded contracts
    Contracts,
}

impl Section {
    /// All sections in display order
    pub const ALL: [Self; 3] = [Self::Templates, Self::Inbox, Self::Contracts];

    /// Section heading
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Templates => "Contract Templates",
            Self::Inbox => "Negotiation Inbox",
            Self::Contracts => "Contracts",
        }
    }
}

/// What a card shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardKind {
    Template,
    OfferReceived,
    CounterOfferReceived,
    AcceptReceived,
    RejectReceived,
    OfferSent,
    CounterOfferSent,
    AcceptSent,
    RejectSent,
    Contract,
}

impl CardKind {
    /// Verb used in the heading of received cards
    const fn received_verb(self) -> &'static str {
        match self {
            Self::CounterOfferReceived => "countered",
            Self::AcceptReceived => "Accepted",
            Self::RejectReceived => "Rejected",
            _ => "offered",
        }
    }

    /// Action label and direction word of sent cards
    const fn sent_labels(self) -> (&'static str, &'static str) {
        match self {
            Self::AcceptSent => ("Accepted", "from"),
            Self::CounterOfferSent => ("Countered", "from"),
            Self::RejectSent => ("Rejected", "from"),
            _ => ("Offered", "to"),
        }
    }

    /// Footer message of sent cards
    const fn sent_message(self) -> Option<&'static str> {
        match self {
            Self::AcceptSent => Some(CONTRACT_SAVED),
            Self::OfferSent | Self::CounterOfferSent => Some("Awaiting response ..."),
            _ => None,
        }
    }
}

const CONTRACT_SAVED: &str = "Accepted contract saved to 'Contracts' section.";

/// User action offered on a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardAction {
    /// Open the offer dialog for a template
    NewOffer,
    /// Accept a received offer
    Accept,
    /// Open the counter-offer dialog
    Counter,
    /// Reject a received offer
    Reject,
}

impl CardAction {
    /// Button label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NewOffer => "New Offer",
            Self::Accept => "Accept",
            Self::Counter => "Counter",
            Self::Reject => "Reject",
        }
    }
}

/// Status indicator severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    #[default]
    Hidden,
    Info,
    Ok,
    Warning,
    Error,
}

/// One rendered card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// What the card shows
    pub kind: CardKind,
    /// Negotiation the card belongs to (absent for template cards)
    pub negotiation: Option<NegotiationId>,
    /// Heading line
    pub title: String,
    /// RFC 3339 timestamp shown above the heading
    pub timestamp: Option<String>,
    /// Rendered contract text
    pub body: Vec<RenderedSegment>,
    /// Footer labels
    pub footer: Vec<String>,
    /// Available actions
    pub actions: Vec<CardAction>,
    /// Offer the card was built from
    pub offer: Option<TrustedOffer>,
}

impl Card {
    /// Template card with a "New Offer" action
    #[must_use]
    pub fn template(template: &Template, ledger: &Ledger) -> Self {
        Self {
            kind: CardKind::Template,
            negotiation: None,
            title: template.label.clone(),
            timestamp: None,
            body: render(&template.text, &ContractArguments::new(), false, ledger),
            footer: Vec::new(),
            actions: vec![CardAction::NewOffer],
            offer: None,
        }
    }

    /// Card for an offer, acceptance, rejection or counter-offer received
    /// from `sender`
    ///
    /// # Errors
    /// Fails when the offer has no contract, or its template or the sender
    /// is not known yet.
    pub fn received(
        kind: CardKind,
        id: NegotiationId,
        offer: &TrustedOffer,
        sender: &str,
        directory: &Directory,
        ledger: &Ledger,
    ) -> Result<Self, ReconcileError> {
        let contract = offer
            .primary_contract()
            .ok_or(ReconcileError::MissingContract(id))?;
        let template = directory.template_by_name(&contract.template_name)?;
        let sender = directory.party_by_name(sender)?;

        let actions = match kind {
            CardKind::OfferReceived | CardKind::CounterOfferReceived => {
                vec![CardAction::Accept, CardAction::Counter, CardAction::Reject]
            }
            _ => Vec::new(),
        };
        let footer = match kind {
            CardKind::AcceptReceived => vec![CONTRACT_SAVED.to_string()],
            _ => Vec::new(),
        };

        Ok(Self {
            kind,
            negotiation: Some(id),
            title: format!(
                "{} {} {} [{}]",
                sender.label,
                kind.received_verb(),
                template.label,
                id
            ),
            timestamp: Some(offer.offered_at.clone().unwrap_or_else(now)),
            body: render(&template.text, &contract.arguments, false, ledger),
            footer,
            actions,
            offer: Some(offer.clone()),
        })
    }

    /// Card for an offer, acceptance, rejection or counter-offer sent to or
    /// answered for `counterparty`
    ///
    /// # Errors
    /// Fails when the offer has no contract, or its template or the
    /// counterparty is unknown.
    pub fn sent(
        kind: CardKind,
        id: NegotiationId,
        offer: &TrustedOffer,
        counterparty: &str,
        directory: &Directory,
        ledger: &Ledger,
    ) -> Result<Self, ReconcileError> {
        let contract = offer
            .primary_contract()
            .ok_or(ReconcileError::MissingContract(id))?;
        let template = directory.template_by_name(&contract.template_name)?;
        let counterparty = directory.party_by_name(counterparty)?;
        let (action, direction) = kind.sent_labels();

        Ok(Self {
            kind,
            negotiation: Some(id),
            title: format!(
                "{} {} [{}] {} {}",
                action, template.label, id, direction, counterparty.label
            ),
            timestamp: Some(now()),
            body: render(&template.text, &contract.arguments, false, ledger),
            footer: kind
                .sent_message()
                .map(str::to_string)
                .into_iter()
                .collect(),
            actions: Vec::new(),
            offer: Some(offer.clone()),
        })
    }

    /// Concluded contract, signed by receiver and offeror
    ///
    /// # Errors
    /// Fails when the offer has no contract, or its template or either
    /// party is unknown.
    pub fn contract(
        id: NegotiationId,
        offer: &TrustedOffer,
        directory: &Directory,
        ledger: &Ledger,
    ) -> Result<Self, ReconcileError> {
        let contract = offer
            .primary_contract()
            .ok_or(ReconcileError::MissingContract(id))?;
        let template = directory.template_by_name(&contract.template_name)?;
        let receiver = directory.party_by_name(&offer.receiver_name)?;
        let offeror = directory.party_by_name(&offer.offeror_name)?;

        Ok(Self {
            kind: CardKind::Contract,
            negotiation: Some(id),
            title: format!("{} [{}]", template.label, id),
            timestamp: None,
            body: render(&template.text, &contract.arguments, false, ledger),
            footer: vec![
                "Signed by".to_string(),
                receiver.label.clone(),
                offeror.label.clone(),
            ],
            actions: Vec::new(),
            offer: Some(offer.clone()),
        })
    }

    /// Resolve reference fields against definitions learned after the card
    /// was built; returns the number resolved
    pub fn resolve_references(&mut self, ledger: &Ledger) -> usize {
        resolve_references(&mut self.body, ledger)
    }

    /// Whether the card belongs to negotiation `id`
    #[inline]
    #[must_use]
    pub fn belongs_to(&self, id: NegotiationId) -> bool {
        self.negotiation == Some(id)
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
