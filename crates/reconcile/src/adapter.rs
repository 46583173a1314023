//! Boundary contracts to the directory (reads) and to the entitlement
//! mutation API (writes).
//!
//! Implementations own transport, timeouts and retries; the reconciler only
//! sees a finite, fallible call.

use std::sync::Arc;

use rbacsync_core::IdentityKey;
use rbacsync_policy::{Entitlement, EntitlementSet};

/// Failure reported by an adapter call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    #[error("identity not found: {0}")]
    NotFound(String),
    #[error("throttled: {0}")]
    Throttled(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("{0}")]
    Other(String),
}

impl AdapterError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn throttled(msg: impl Into<String>) -> Self {
        Self::Throttled(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Transient failures worth another attempt (rate limiting).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Throttled(_))
    }
}

/// Live read of an identity's current entitlements.
pub trait DirectoryAdapter {
    /// Must return the live set, not a cached one.
    fn current_entitlements(&self, identity: &IdentityKey) -> Result<EntitlementSet, AdapterError>;
}

/// Entitlement grants and revocations.
///
/// Implementations must be idempotent: adding a held entitlement or removing
/// an absent one succeeds without effect.
pub trait MutationAdapter {
    fn add_entitlement(&self, identity: &IdentityKey, entitlement: &Entitlement) -> Result<(), AdapterError>;

    fn remove_entitlement(&self, identity: &IdentityKey, entitlement: &Entitlement) -> Result<(), AdapterError>;
}

impl<T: DirectoryAdapter + ?Sized> DirectoryAdapter for &T {
    fn current_entitlements(&self, identity: &IdentityKey) -> Result<EntitlementSet, AdapterError> {
        (**self).current_entitlements(identity)
    }
}

impl<T: DirectoryAdapter + ?Sized> DirectoryAdapter for Arc<T> {
    fn current_entitlements(&self, identity: &IdentityKey) -> Result<EntitlementSet, AdapterError> {
        (**self).current_entitlements(identity)
    }
}

impl<T: MutationAdapter + ?Sized> MutationAdapter for &T {
    fn add_entitlement(&self, identity: &IdentityKey, entitlement: &Entitlement) -> Result<(), AdapterError> {
        (**self).add_entitlement(identity, entitlement)
    }

    fn remove_entitlement(&self, identity: &IdentityKey, entitlement: &Entitlement) -> Result<(), AdapterError> {
        (**self).remove_entitlement(identity, entitlement)
    }
}

impl<T: MutationAdapter + ?Sized> MutationAdapter for Arc<T> {
    fn add_entitlement(&self, identity: &IdentityKey, entitlement: &Entitlement) -> Result<(), AdapterError> {
        (**self).add_entitlement(identity, entitlement)
    }

    fn remove_entitlement(&self, identity: &IdentityKey, entitlement: &Entitlement) -> Result<(), AdapterError> {
        (**self).remove_entitlement(identity, entitlement)
    }
}
