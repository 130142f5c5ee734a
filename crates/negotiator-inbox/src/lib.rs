//! Negotiator Inbox
//!
//! Reconciles asynchronously arriving inbox entries into ordered view
//! patches.
//!
//! # Architecture
//!
//! ```text
//! /ui/inbox/entries → InboxEntry* → Reconciler ─┬→ Ledger (definitions, negotiations)
//!                                               └→ UiPatch* → Board
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use negotiator_inbox::Reconciler;
//!
//! let result = Reconciler::default().reconcile(&mut ledger, &directory, entries);
//! for patch in result.patches {
//!     board.apply(patch);
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod card;
pub mod entry;
pub mod error;
pub mod patch;
pub mod reconcile;
pub mod retry;

// Re-exports for convenience
pub use card::{Card, CardAction, CardKind, Section, StatusLevel};
pub use entry::{DefinitionEnvelope, InboxEntry};
pub use error::ReconcileError;
pub use patch::{replace_inbox_card, UiPatch};
pub use reconcile::{apply_entry, Reconciler, Reconciliation};
pub use retry::{run_with_retry, RetryOutcome, RetryPolicy};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
