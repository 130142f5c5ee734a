//! Inbox reconciliation
//!
//! Folds a batch of [`InboxEntry`]s into the [`Ledger`] and produces the
//! ordered [`UiPatch`]es that bring the board up to date:
//! - `DEFINITION` only teaches the ledger
//! - offers, acceptances and rejections replace the negotiation's inbox card
//! - faults set the card's status; expiries are ignored
//!
//! Entries that fail (usually a template or party not loaded yet) are
//! retried per [`RetryPolicy`], then dropped and logged.

use crate::card::{Card, CardKind, Section, StatusLevel};
use crate::entry::{DefinitionEnvelope, InboxEntry};
use crate::error::ReconcileError;
use crate::patch::{replace_inbox_card, UiPatch};
use crate::retry::{run_with_retry, RetryPolicy};
use negotiator_contract::{Directory, Ledger, NegotiationId, TrustedOffer};

/// Outcome of reconciling one batch
#[derive(Debug, Default)]
pub struct Reconciliation {
    /// Patches to apply, in order
    pub patches: Vec<UiPatch>,
    /// Entries given up on
    pub dropped: Vec<(InboxEntry, ReconcileError)>,
    /// Passes made over the batch
    pub passes: usize,
}

/// Applies inbox batches to a ledger
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler {
    policy: RetryPolicy,
}

impl Reconciler {
    /// Create reconciler with retry policy
    #[inline]
    #[must_use]
    pub const fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Reconcile a batch in received order
    pub fn reconcile(
        &self,
        ledger: &mut Ledger,
        directory: &Directory,
        entries: Vec<InboxEntry>,
    ) -> Reconciliation {
        let count = entries.len();
        let mut outcome = run_with_retry(entries, self.policy, |entry| {
            apply_entry(ledger, directory, entry)
        });

        // Definitions usually arrive after the offers that reference them
        let resolved: usize = outcome
            .outputs
            .iter_mut()
            .map(|patch| match patch {
                UiPatch::PrependCard { card, .. } => card.resolve_references(ledger),
                _ => 0,
            })
            .sum();
        if resolved > 0 {
            tracing::debug!("Resolved {} late references", resolved);
        }

        for (entry, error) in &outcome.dropped {
            tracing::error!("Dropped {} entry {:?}: {}", entry.kind(), entry.id(), error);
        }
        tracing::debug!(
            "Reconciled {} entries into {} patches ({} dropped)",
            count,
            outcome.outputs.len(),
            outcome.dropped.len()
        );

        Reconciliation {
            patches: outcome.outputs,
            dropped: outcome.dropped,
            passes: outcome.passes,
        }
    }
}

/// Apply one entry
///
/// Cards are built before the ledger is touched, so a failed entry leaves
/// no trace and a retry behaves like a first attempt.
///
/// # Errors
/// Fails when a referenced template or party is unknown, or an offer has no
/// contract.
pub fn apply_entry(
    ledger: &mut Ledger,
    directory: &Directory,
    entry: &InboxEntry,
) -> Result<Vec<UiPatch>, ReconcileError> {
    match entry {
        InboxEntry::Definition { id, definition } => {
            learn_definition(ledger, *id, definition);
            Ok(Vec::new())
        }
        InboxEntry::OfferSubmit { id, offer } => received(
            ledger,
            directory,
            CardKind::OfferReceived,
            *id,
            offer,
            &offer.offeror_name,
        ),
        InboxEntry::OfferCounter { id, offer } => received(
            ledger,
            directory,
            CardKind::CounterOfferReceived,
            *id,
            offer,
            &offer.offeror_name,
        ),
        InboxEntry::OfferReject { id, offer } => received(
            ledger,
            directory,
            CardKind::RejectReceived,
            *id,
            offer,
            &offer.receiver_name,
        ),
        InboxEntry::OfferAccept { id, offer } => {
            let contract = Card::contract(*id, offer, directory, ledger)?;
            let card = Card::received(
                CardKind::AcceptReceived,
                *id,
                offer,
                &offer.receiver_name,
                directory,
                ledger,
            )?;
            ledger.record_trusted_offer(*id, offer.clone());

            let mut patches = vec![UiPatch::PrependCard {
                section: Section::Contracts,
                card: contract,
            }];
            patches.extend(replace_inbox_card(*id, card));
            Ok(patches)
        }
        InboxEntry::OfferFault { id, error } => Ok(vec![UiPatch::SetStatus {
            id: *id,
            level: StatusLevel::Error,
            message: error.clone().unwrap_or_default(),
        }]),
        InboxEntry::OfferExpiry { id } => {
            tracing::debug!("Ignoring expiry of negotiation {}", id);
            Ok(Vec::new())
        }
        InboxEntry::Unknown => {
            tracing::warn!("Received entry with unexpected type");
            Ok(Vec::new())
        }
    }
}

fn received(
    ledger: &mut Ledger,
    directory: &Directory,
    kind: CardKind,
    id: NegotiationId,
    offer: &TrustedOffer,
    sender: &str,
) -> Result<Vec<UiPatch>, ReconcileError> {
    let card = Card::received(kind, id, offer, sender, directory, ledger)?;
    ledger.record_trusted_offer(id, offer.clone());
    Ok(replace_inbox_card(id, card))
}

fn learn_definition(ledger: &mut Ledger, id: NegotiationId, envelope: &DefinitionEnvelope) {
    match envelope.to_definition(id) {
        Some(definition) => {
            let definition = ledger.learn(id, definition);
            tracing::debug!(
                "Learned {:?} definition with {} hashes for negotiation {}",
                definition.kind,
                definition.hashes.len(),
                id
            );
        }
        None => {
            tracing::warn!(
                "Received empty or unrecognized type of definition entry for negotiation {}",
                id
            );
        }
    }
}
