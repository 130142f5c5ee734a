//! reqwest-backed [`NegotiationService`]

use crate::error::TransportError;
use crate::payload::{CounterOffer, OfferReceipt, OfferReply, OfferSubmission};
use crate::service::{InboxBatch, NegotiationService};
use async_trait::async_trait;
use negotiator_contract::{Party, Template};
use negotiator_inbox::InboxEntry;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const APPLICATION_JSON: &str = "application/json";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service root, e.g. `http://localhost:8080`
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ClientConfig {
    /// Create config with default timeout
    #[inline]
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(3),
        }
    }
}

/// HTTP client for the negotiation service
#[derive(Debug, Clone)]
pub struct NegotiatorClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl NegotiatorClient {
    /// Create client
    ///
    /// # Errors
    /// Fails when the underlying HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("negotiator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Error {
                message: e.to_string(),
            })?;
        Ok(Self { config, http })
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn map_send_error(&self, error: &reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout {
                after_ms: u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            TransportError::Error {
                message: error.to_string(),
            }
        }
    }

    /// Send a request, expecting a JSON body or none
    ///
    /// Returns `None` for an empty body.
    async fn request_json<P: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        payload: Option<&P>,
    ) -> Result<Option<Value>, TransportError> {
        tracing::debug!("{} {}", method, path);

        let mut request = self
            .http
            .request(method.clone(), self.url(path))
            .header(ACCEPT, APPLICATION_JSON);
        if let Some(payload) = payload {
            let body = serde_json::to_vec(payload).map_err(|e| TransportError::Error {
                message: e.to_string(),
            })?;
            request = request.header(CONTENT_TYPE, APPLICATION_JSON).body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.map_send_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("{} {} returned {}", method, path, status);
            return Err(TransportError::BadResponseStatus {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_send_error(&e))?;

        if body.is_empty() {
            return Ok(None);
        }
        if !content_type.starts_with(APPLICATION_JSON) {
            return Err(TransportError::BadResponseType { content_type });
        }
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| TransportError::Decode {
                message: e.to_string(),
            })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let value = self
            .request_json::<()>(Method::GET, path, None)
            .await?
            .unwrap_or(Value::Null);
        decode(value)
    }

    async fn post<P: Serialize + Sync>(
        &self,
        path: &str,
        payload: &P,
    ) -> Result<Option<Value>, TransportError> {
        self.request_json(Method::POST, path, Some(payload)).await
    }

    async fn inbox(&self, method: Method, path: &str) -> Result<InboxBatch, TransportError> {
        let value = self.request_json::<()>(method, path, None).await?;
        decode_inbox(value)
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, TransportError> {
    serde_json::from_value(value).map_err(|e| TransportError::Decode {
        message: e.to_string(),
    })
}

/// Decode entries one by one; malformed entries are skipped and counted
fn decode_inbox(value: Option<Value>) -> Result<InboxBatch, TransportError> {
    let raw = match value {
        None | Some(Value::Null) => return Ok(InboxBatch::default()),
        Some(Value::Array(raw)) => raw,
        Some(other) => {
            return Err(TransportError::Decode {
                message: format!("expected array of inbox entries, got {other}"),
            })
        }
    };

    let len = raw.len();
    let entries = raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<InboxEntry>(entry) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping malformed inbox entry {}: {}", index, e);
                None
            }
        })
        .collect();
    Ok(InboxBatch { entries, len })
}

#[async_trait]
impl NegotiationService for NegotiatorClient {
    async fn me(&self) -> Result<Party, TransportError> {
        self.get("/ui/me").await
    }

    async fn parties(&self) -> Result<Vec<Party>, TransportError> {
        self.get("/ui/parties").await
    }

    async fn templates(&self) -> Result<Vec<Template>, TransportError> {
        self.get("/ui/templates").await
    }

    async fn inbox_entries(&self, from: usize) -> Result<InboxBatch, TransportError> {
        self.inbox(Method::GET, &format!("/ui/inbox/entries?from={from}"))
            .await
    }

    async fn drain_inbox(&self) -> Result<InboxBatch, TransportError> {
        self.inbox(Method::DELETE, "/ui/inbox/entries").await
    }

    async fn submit_offer(&self, offer: &OfferSubmission) -> Result<OfferReceipt, TransportError> {
        let value = self.post("/ui/offers", offer).await?;
        decode(value.unwrap_or(Value::Null))
    }

    async fn accept(&self, reply: &OfferReply) -> Result<(), TransportError> {
        self.post("/ui/acceptances", reply).await.map(drop)
    }

    async fn counter_offer(&self, offer: &CounterOffer) -> Result<(), TransportError> {
        self.post("/ui/counter-offers", offer).await.map(drop)
    }

    async fn reject(&self, reply: &OfferReply) -> Result<(), TransportError> {
        self.post("/ui/rejections", reply).await.map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use negotiator_contract::NegotiationId;
    use serde_json::json;

    #[test]
    fn url_joins_without_double_slash() {
        let client = NegotiatorClient::new(ClientConfig::new("http://host:1/")).unwrap();
        assert_eq!(client.url("/ui/me"), "http://host:1/ui/me");
    }

    #[test]
    fn decode_inbox_skips_malformed_but_counts_them() {
        let batch = decode_inbox(Some(json!([
            {"type": "OFFER_EXPIRY", "id": 1},
            {"type": "OFFER_SUBMIT", "id": "not-a-number"},
            {"type": "OFFER_EXPIRY", "id": 2}
        ])))
        .unwrap();
        assert_eq!(batch.len, 3);
        assert_eq!(
            batch.entries,
            vec![
                InboxEntry::OfferExpiry { id: NegotiationId(1) },
                InboxEntry::OfferExpiry { id: NegotiationId(2) },
            ]
        );
    }

    #[test]
    fn decode_inbox_empty_body_is_empty_batch() {
        assert!(decode_inbox(None).unwrap().is_empty());
        assert!(decode_inbox(Some(json!({"type": "x"}))).is_err());
    }
}
