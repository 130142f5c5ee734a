//! View patches produced by reconciliation

use crate::card::{Card, Section, StatusLevel};
use negotiator_contract::NegotiationId;

/// One ordered change to the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiPatch {
    /// Remove the first inbox card of a negotiation (no-op when absent)
    RemoveById(NegotiationId),
    /// Insert a card at the top of a section
    PrependCard { section: Section, card: Card },
    /// Set the status indicator of a negotiation's inbox card
    SetStatus {
        id: NegotiationId,
        level: StatusLevel,
        message: String,
    },
}

impl UiPatch {
    /// Prepend to the inbox
    #[inline]
    #[must_use]
    pub fn inbox(card: Card) -> Self {
        Self::PrependCard {
            section: Section::Inbox,
            card,
        }
    }

    /// Short description for logs and tests
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::RemoveById(id) => format!("remove #{id}"),
            Self::PrependCard { section, card } => match card.negotiation {
                Some(id) => format!("prepend {:?}#{} to {:?}", card.kind, id, section),
                None => format!("prepend {:?} to {:?}", card.kind, section),
            },
            Self::SetStatus { id, level, .. } => format!("status #{id} {level:?}"),
        }
    }
}

/// Patches replacing a negotiation's inbox card with `card`
///
/// Ids of zero never match rendered cards, so no removal is emitted.
#[must_use]
pub fn replace_inbox_card(id: NegotiationId, card: Card) -> Vec<UiPatch> {
    let mut patches = Vec::with_capacity(2);
    if id.is_set() {
        patches.push(UiPatch::RemoveById(id));
    }
    patches.push(UiPatch::inbox(card));
    patches
}
