//! Bounded pass-by-pass retry
//!
//! Items are processed in order; the subset that failed is processed again
//! in the next pass. An item is dropped once it has failed `max_attempts`
//! times, and no more than `max_passes` passes are made.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Retry bounds for one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum passes over the failing subset
    pub max_passes: usize,
    /// Attempts per item before it is dropped
    pub max_attempts: usize,
}

impl RetryPolicy {
    /// Create new policy
    #[inline]
    #[must_use]
    pub const fn new(max_passes: usize, max_attempts: usize) -> Self {
        Self {
            max_passes,
            max_attempts,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_passes: 5,
            max_attempts: 3,
        }
    }
}

/// Result of a retried batch
#[derive(Debug)]
pub struct RetryOutcome<T, O, E> {
    /// Outputs of successful attempts, in completion order
    pub outputs: Vec<O>,
    /// Items given up on, with their last error
    pub dropped: Vec<(T, E)>,
    /// Passes made
    pub passes: usize,
}

/// Process `items` with `f`, retrying failures per `policy`
///
/// Outputs of an item that succeeds on a later pass are appended after the
/// outputs of the pass it succeeded in, so ordering follows completion.
/// Every item is attempted at least once, even under a zero policy.
pub fn run_with_retry<T, O, E, F>(items: Vec<T>, policy: RetryPolicy, mut f: F) -> RetryOutcome<T, O, E>
where
    E: Display,
    F: FnMut(&T) -> Result<Vec<O>, E>,
{
    let mut outputs = Vec::new();
    let mut dropped = Vec::new();
    let mut pending: Vec<(T, Option<E>)> = items.into_iter().map(|item| (item, None)).collect();
    let mut passes = 0;
    let max_passes = policy.max_passes.max(1);
    let max_attempts = policy.max_attempts.max(1);

    while !pending.is_empty() && passes < max_passes {
        passes += 1;
        let mut failures = Vec::new();
        for (item, _) in pending {
            match f(&item) {
                Ok(out) => outputs.extend(out),
                Err(error) if passes < max_attempts => {
                    tracing::debug!("Attempt {} failed, retrying: {}", passes, error);
                    failures.push((item, Some(error)));
                }
                Err(error) => {
                    tracing::warn!("Giving up after {} attempts: {}", passes, error);
                    dropped.push((item, error));
                }
            }
        }
        pending = failures;
    }

    for (item, error) in pending {
        if let Some(error) = error {
            tracing::warn!("Giving up after {} passes: {}", passes, error);
            dropped.push((item, error));
        }
    }

    RetryOutcome {
        outputs,
        dropped,
        passes,
    }
}
