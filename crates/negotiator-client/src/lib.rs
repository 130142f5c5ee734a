//! Negotiator Client
//!
//! JSON over HTTP access to the negotiation service's `/ui` endpoints.
//!
//! # Example
//!
//! ```rust,ignore
//! use negotiator_client::{ClientConfig, NegotiationService, NegotiatorClient};
//!
//! let client = NegotiatorClient::new(ClientConfig::new("http://localhost:8080"))?;
//! let templates = client.templates().await?;
//! let batch = client.inbox_entries(0).await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod http;
pub mod payload;
pub mod service;

pub use error::{TransportError, TransportErrorKind};
pub use http::{ClientConfig, NegotiatorClient};
pub use payload::{CounterOffer, OfferReceipt, OfferReply, OfferSubmission};
pub use service::{InboxBatch, NegotiationService};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
