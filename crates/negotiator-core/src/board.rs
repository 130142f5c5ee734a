//! Board: the three card sections and per-card status
//!
//! Cards live in an arena keyed by [`CardHandle`]; sections hold ordered
//! handle lists, newest first.

use indexmap::IndexMap;
use negotiator_contract::{plain_text, Ledger, NegotiationId};
use negotiator_inbox::{Card, Section, StatusLevel, UiPatch};
use std::fmt;

/// Opaque reference to a card on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardHandle(u64);

/// Status indicator of a card
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardStatus {
    pub level: StatusLevel,
    pub message: String,
}

/// Card plus its status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardNode {
    pub card: Card,
    pub status: CardStatus,
}

/// Sections of cards
#[derive(Debug, Clone, Default)]
pub struct Board {
    next_handle: u64,
    nodes: IndexMap<CardHandle, CardNode>,
    templates: Vec<CardHandle>,
    inbox: Vec<CardHandle>,
    contracts: Vec<CardHandle>,
}

impl Board {
    /// Create empty board
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn section(&self, section: Section) -> &Vec<CardHandle> {
        match section {
            Section::Templates => &self.templates,
            Section::Inbox => &self.inbox,
            Section::Contracts => &self.contracts,
        }
    }

    fn section_mut(&mut self, section: Section) -> &mut Vec<CardHandle> {
        match section {
            Section::Templates => &mut self.templates,
            Section::Inbox => &mut self.inbox,
            Section::Contracts => &mut self.contracts,
        }
    }

    fn insert(&mut self, card: Card) -> CardHandle {
        let handle = CardHandle(self.next_handle);
        self.next_handle += 1;
        self.nodes.insert(
            handle,
            CardNode {
                card,
                status: CardStatus::default(),
            },
        );
        handle
    }

    /// Insert a card at the top of a section
    pub fn prepend(&mut self, section: Section, card: Card) -> CardHandle {
        let handle = self.insert(card);
        self.section_mut(section).insert(0, handle);
        handle
    }

    /// Remove the first card of `section` belonging to negotiation `id`
    pub fn remove_first(&mut self, section: Section, id: NegotiationId) -> Option<Card> {
        let handle = self.find_by_negotiation(section, id)?;
        self.section_mut(section).retain(|h| *h != handle);
        self.nodes.shift_remove(&handle).map(|node| node.card)
    }

    /// Replace the content of a section
    pub fn replace_section(&mut self, section: Section, cards: Vec<Card>) {
        for handle in std::mem::take(self.section_mut(section)) {
            self.nodes.shift_remove(&handle);
        }
        let handles: Vec<CardHandle> = cards.into_iter().map(|card| self.insert(card)).collect();
        *self.section_mut(section) = handles;
    }

    /// First card of `section` belonging to negotiation `id`
    #[must_use]
    pub fn find_by_negotiation(&self, section: Section, id: NegotiationId) -> Option<CardHandle> {
        self.section(section)
            .iter()
            .copied()
            .find(|handle| self.nodes.get(handle).is_some_and(|n| n.card.belongs_to(id)))
    }

    /// Set a card's status; returns whether the card exists
    pub fn set_status(
        &mut self,
        handle: CardHandle,
        level: StatusLevel,
        message: impl Into<String>,
    ) -> bool {
        match self.nodes.get_mut(&handle) {
            Some(node) => {
                node.status = CardStatus {
                    level,
                    message: message.into(),
                };
                true
            }
            None => false,
        }
    }

    /// Card by handle
    #[inline]
    #[must_use]
    pub fn get(&self, handle: CardHandle) -> Option<&CardNode> {
        self.nodes.get(&handle)
    }

    /// Cards of a section in display order
    pub fn cards(&self, section: Section) -> impl Iterator<Item = &CardNode> {
        self.section(section)
            .iter()
            .filter_map(|handle| self.nodes.get(handle))
    }

    /// Number of cards in a section
    #[inline]
    #[must_use]
    pub fn len(&self, section: Section) -> usize {
        self.section(section).len()
    }

    /// Check if the board holds no card
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolve reference fields of every card against `ledger`; returns the
    /// number of fields resolved
    pub fn resolve_references(&mut self, ledger: &Ledger) -> usize {
        self.nodes
            .values_mut()
            .map(|node| node.card.resolve_references(ledger))
            .sum()
    }

    /// Apply one reconciliation patch
    pub fn apply(&mut self, patch: UiPatch) {
        match patch {
            UiPatch::RemoveById(id) => {
                self.remove_first(Section::Inbox, id);
            }
            UiPatch::PrependCard { section, card } => {
                self.prepend(section, card);
            }
            UiPatch::SetStatus { id, level, message } => {
                match self.find_by_negotiation(Section::Inbox, id) {
                    Some(handle) => {
                        self.set_status(handle, level, message);
                    }
                    None => tracing::warn!("Negotiation {} failed: {}", id, message),
                }
            }
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in Section::ALL {
            writeln!(f, "== {} ==", section.title())?;
            for node in self.cards(section) {
                if let Some(timestamp) = &node.card.timestamp {
                    writeln!(f, "  {timestamp}")?;
                }
                writeln!(f, "  {}", node.card.title)?;
                writeln!(f, "    {}", plain_text(&node.card.body))?;
                if !node.card.footer.is_empty() {
                    writeln!(f, "    {}", node.card.footer.join(" | "))?;
                }
                if !node.card.actions.is_empty() {
                    let actions: Vec<_> = node.card.actions.iter().map(|a| a.label()).collect();
                    writeln!(f, "    [{}]", actions.join("] ["))?;
                }
                if node.status.level != StatusLevel::Hidden {
                    writeln!(f, "    ({:?}) {}", node.status.level, node.status.message)?;
                }
            }
        }
        Ok(())
    }
}
