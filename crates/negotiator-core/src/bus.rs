//! Topic-based publish/subscribe
//!
//! Delivery is synchronous, in subscription order, to subscribers whose
//! topic equals the published one. A failing subscriber is logged and does
//! not stop delivery to the rest.

use indexmap::IndexMap;
use std::fmt;

/// Identifies one subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

type Callback<T> = Box<dyn Fn(&T) -> anyhow::Result<()> + Send + Sync>;

struct Subscription<T> {
    topic: String,
    callback: Callback<T>,
}

/// Publisher of `T` values on string topics
pub struct Publisher<T> {
    next_id: u64,
    /// Insertion-ordered, so delivery follows subscription order
    subscriptions: IndexMap<SubscriptionId, Subscription<T>>,
}

impl<T> Default for Publisher<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            subscriptions: IndexMap::new(),
        }
    }
}

impl<T> fmt::Debug for Publisher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("subscriptions", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}

impl<T> Publisher<T> {
    /// Create publisher without subscribers
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `topic`
    pub fn subscribe<F>(&mut self, topic: impl Into<String>, callback: F) -> SubscriptionId
    where
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        let topic = topic.into();
        tracing::debug!("Subscribed {} to '{}'", id, topic);
        self.subscriptions.insert(
            id,
            Subscription {
                topic,
                callback: Box::new(callback),
            },
        );
        id
    }

    /// Remove a subscription; returns whether it existed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.shift_remove(&id).is_some()
    }

    /// Deliver `data` to every subscriber of `topic`
    ///
    /// Returns the number of subscribers that handled it without error.
    pub fn publish(&self, topic: &str, data: &T) -> usize {
        let mut receivers = 0;
        let mut delivered = 0;
        for (id, subscription) in &self.subscriptions {
            if subscription.topic != topic {
                continue;
            }
            receivers += 1;
            match (subscription.callback)(data) {
                Ok(()) => delivered += 1,
                Err(e) => tracing::error!("Subscriber {} of '{}' failed: {:#}", id, topic, e),
            }
        }
        if receivers == 0 {
            tracing::warn!("Published to '{}', which has no subscribers", topic);
        }
        delivered
    }

    /// Number of subscribers of `topic`
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.subscriptions
            .values()
            .filter(|subscription| subscription.topic == topic)
            .count()
    }
}
