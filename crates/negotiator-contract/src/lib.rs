//! Negotiator Contract Model
//!
//! Contract templates, signed definitions and the per-negotiation ledger.
//!
//! # Core Concepts
//!
//! - [`Template`]: contract text with `{placeholder}` fields
//! - [`render()`]: template text + arguments → [`RenderedSegment`]s
//! - [`Ledger`]: definitions by [`DefinitionHash`] and negotiation aggregates
//! - [`Directory`]: parties and templates loaded from the service
//!
//! # Example
//!
//! ```rust
//! use negotiator_contract::{render, plain_text, ContractArguments, Ledger};
//!
//! let mut data = ContractArguments::new();
//! data.insert("amount".into(), "100".into());
//! data.insert("recipient".into(), "Bob".into());
//!
//! let segments = render("Pay {amount} to {recipient}", &data, false, &Ledger::new());
//! assert_eq!(plain_text(&segments), "Pay 100 to Bob");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod directory;
mod hash;
mod ledger;
mod offer;
pub mod render;
pub mod template;

// Re-exports
pub use directory::{Directory, LookupError, Party, Template};
pub use hash::{DefinitionHash, HashDigest, HashError};
pub use ledger::{Definition, DefinitionKind, Ledger, Negotiation, NegotiationStage};
pub use offer::{ContractArguments, NegotiationId, TrustedContract, TrustedOffer};
pub use render::{
    plain_text, reference_options, render, resolve_references, InputField, ReferenceDisplay,
    ReferenceField, ReferenceOption, RenderedSegment,
};
pub use template::{Placeholder, TemplateError, TemplatePart};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
