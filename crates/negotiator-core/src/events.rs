//! Events published by the UI and handled by the controller

use negotiator_client::{CounterOffer, OfferReply, OfferSubmission};
use negotiator_contract::{NegotiationId, Template};

pub const TOPIC_REFRESH: &str = "refresh";
pub const TOPIC_SHOW_OFFER: &str = "dialog.show.offer";
pub const TOPIC_SHOW_COUNTER_OFFER: &str = "dialog.show.counterOffer";
pub const TOPIC_HIDE_DIALOG: &str = "dialog.hide";
pub const TOPIC_OFFER_SUBMIT: &str = "offer.submit";
pub const TOPIC_OFFER_ACCEPT: &str = "offer.accept";
pub const TOPIC_OFFER_COUNTER: &str = "offer.counter";
pub const TOPIC_OFFER_REJECT: &str = "offer.reject";

/// Every topic the controller subscribes to
pub const TOPICS: [&str; 8] = [
    TOPIC_REFRESH,
    TOPIC_SHOW_OFFER,
    TOPIC_SHOW_COUNTER_OFFER,
    TOPIC_HIDE_DIALOG,
    TOPIC_OFFER_SUBMIT,
    TOPIC_OFFER_ACCEPT,
    TOPIC_OFFER_COUNTER,
    TOPIC_OFFER_REJECT,
];

/// UI event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Fetch identity, parties, templates and new inbox entries
    Refresh,
    /// Open the offer dialog for a template
    ShowOfferDialog(Template),
    /// Open the counter-offer dialog for a received offer
    ShowCounterOfferDialog(NegotiationId),
    /// Close the open dialog
    HideDialog,
    /// Send a new offer
    SubmitOffer(OfferSubmission),
    /// Accept a received offer
    Accept(OfferReply),
    /// Send a counter-offer
    Counter(CounterOffer),
    /// Reject a received offer
    Reject(OfferReply),
}

impl UiEvent {
    /// Topic the event is published on
    #[must_use]
    pub const fn topic(&self) -> &'static str {
        match self {
            Self::Refresh => TOPIC_REFRESH,
            Self::ShowOfferDialog(_) => TOPIC_SHOW_OFFER,
            Self::ShowCounterOfferDialog(_) => TOPIC_SHOW_COUNTER_OFFER,
            Self::HideDialog => TOPIC_HIDE_DIALOG,
            Self::SubmitOffer(_) => TOPIC_OFFER_SUBMIT,
            Self::Accept(_) => TOPIC_OFFER_ACCEPT,
            Self::Counter(_) => TOPIC_OFFER_COUNTER,
            Self::Reject(_) => TOPIC_OFFER_REJECT,
        }
    }
}
