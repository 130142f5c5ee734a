//! Negotiator Core
//!
//! Session controller of the negotiation client:
//! - Polls the service and reconciles inbox entries onto the board
//! - Sends offers, acceptances, counter-offers and rejections
//! - Hosts offer and counter-offer dialogs with field validation
//! - Routes UI events through a topic publisher
//!
//! # Example
//!
//! ```rust,ignore
//! use negotiator_core::{Negotiator, NegotiatorConfig, UiEvent};
//!
//! let mut negotiator = Negotiator::connect(NegotiatorConfig::default())?;
//! negotiator.dispatch(UiEvent::Refresh);
//! negotiator.process_pending().await;
//! println!("{}", negotiator.board());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod board;
pub mod bus;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod forms;

// Re-exports for convenience
pub use board::{Board, CardHandle, CardNode, CardStatus};
pub use bus::{Publisher, SubscriptionId};
pub use config::{ConfigError, InboxMode, NegotiatorConfig};
pub use controller::{Negotiator, RefreshReport};
pub use error::NegotiatorError;
pub use events::UiEvent;
pub use forms::{CounterOfferForm, Dialog, OfferForm, ValidationErrors};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the negotiator
    pub use crate::{
        Board, Dialog, Negotiator, NegotiatorConfig, NegotiatorError, OfferForm, UiEvent,
    };
    pub use negotiator_client::NegotiationService;
    pub use negotiator_inbox::{CardKind, Section, StatusLevel};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
