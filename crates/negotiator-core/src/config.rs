//! Negotiator configuration
//!
//! Loaded from TOML; every field has a default, so an empty file is valid.
//!
//! ```toml
//! base_url = "http://localhost:8080"
//! request_timeout_ms = 3000
//! poll_interval_secs = 10
//! inbox_mode = "poll"
//!
//! [retry]
//! max_passes = 5
//! max_attempts = 3
//! ```

use negotiator_client::ClientConfig;
use negotiator_inbox::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// How new inbox entries are fetched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InboxMode {
    /// `GET /ui/inbox/entries?from=N`, advancing a local offset
    #[default]
    Poll,
    /// `DELETE /ui/inbox/entries`, consuming entries on the server
    Drain,
}

/// Negotiator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegotiatorConfig {
    /// Service root
    pub base_url: String,
    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Interval between refreshes in `watch` mode
    pub poll_interval_secs: u64,
    /// Inbox fetch strategy
    pub inbox_mode: InboxMode,
    /// Reconciliation retry bounds
    pub retry: RetryPolicy,
}

impl NegotiatorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With service root
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    /// With poll interval
    #[inline]
    #[must_use]
    pub fn with_poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    /// With inbox mode
    #[inline]
    #[must_use]
    pub fn with_inbox_mode(mut self, mode: InboxMode) -> Self {
        self.inbox_mode = mode;
        self
    }

    /// With retry policy
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// Fails on invalid TOML or out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Fails when the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Check values are usable
    ///
    /// # Errors
    /// Fails on an empty base URL or zero timeout, interval or retry bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_secs must be greater than 0".into(),
            ));
        }
        if self.retry.max_passes == 0 || self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry bounds must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Request timeout
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Poll interval
    #[inline]
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// HTTP client configuration
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url.clone()).with_timeout(self.request_timeout())
    }
}

impl Default for NegotiatorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            request_timeout_ms: 3000,
            poll_interval_secs: 10,
            inbox_mode: InboxMode::Poll,
            retry: RetryPolicy::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for this config
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
