//! Throttle-aware retry decorator for adapters.
//!
//! The reconciler records a failed call and moves on; rate-limit retries
//! belong to the adapter, so they live here as a wrapper any adapter can opt
//! into.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use rbacsync_core::IdentityKey;
use rbacsync_policy::{Entitlement, EntitlementSet};

use crate::adapter::{AdapterError, DirectoryAdapter, MutationAdapter};

/// Backoff strategy for retries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed,
    /// Exponential backoff: base * 2^(attempt-1)
    #[default]
    Exponential,
    /// Linear backoff: base * attempt
    Linear,
}

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first (1 = no retries)
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Maximum delay cap
    pub max_delay: Duration,
    pub strategy: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            strategy: BackoffStrategy::Exponential,
        }
    }
}

impl RetryPolicy {
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: delay,
            max_delay: delay,
            strategy: BackoffStrategy::Fixed,
        }
    }

    pub fn exponential(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
            strategy: BackoffStrategy::Exponential,
        }
    }

    /// Delay before retry number `attempt` (1-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let delay = match self.strategy {
            BackoffStrategy::Fixed => self.base_delay,
            BackoffStrategy::Exponential => {
                let factor = 2u32.saturating_pow(attempt - 1);
                self.base_delay.saturating_mul(factor)
            }
            BackoffStrategy::Linear => self.base_delay.saturating_mul(attempt),
        };
        delay.min(self.max_delay)
    }
}

/// How the wrapper waits between attempts; swapped out in tests.
pub type Sleeper = Arc<dyn Fn(Duration) + Send + Sync>;

/// Wraps an adapter and retries [`AdapterError::Throttled`] failures.
///
/// Every other failure is returned on first occurrence.
#[derive(Clone)]
pub struct Retrying<A> {
    inner: A,
    policy: RetryPolicy,
    sleeper: Sleeper,
}

impl<A> Retrying<A> {
    pub fn new(inner: A, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            sleeper: Arc::new(std::thread::sleep),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Sleeper) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    fn call<T>(&self, op: &str, mut f: impl FnMut(&A) -> Result<T, AdapterError>) -> Result<T, AdapterError> {
        let mut attempt = 1;
        loop {
            match f(&self.inner) {
                Err(e) if e.is_retryable() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.delay_for_attempt(attempt);
                    warn!(op, attempt, delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX), error = %e, "throttled, retrying");
                    (self.sleeper)(delay);
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

impl<A> core::fmt::Debug for Retrying<A>
where
    A: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Retrying")
            .field("inner", &self.inner)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<A: DirectoryAdapter> DirectoryAdapter for Retrying<A> {
    fn current_entitlements(&self, identity: &IdentityKey) -> Result<EntitlementSet, AdapterError> {
        self.call("current_entitlements", |a| a.current_entitlements(identity))
    }
}

impl<A: MutationAdapter> MutationAdapter for Retrying<A> {
    fn add_entitlement(&self, identity: &IdentityKey, entitlement: &Entitlement) -> Result<(), AdapterError> {
        self.call("add_entitlement", |a| a.add_entitlement(identity, entitlement))
    }

    fn remove_entitlement(&self, identity: &IdentityKey, entitlement: &Entitlement) -> Result<(), AdapterError> {
        self.call("remove_entitlement", |a| a.remove_entitlement(identity, entitlement))
    }
}
