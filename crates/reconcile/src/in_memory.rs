//! In-memory directory for tests, demos and offline runs.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use serde::Serialize;

use rbacsync_core::IdentityKey;
use rbacsync_policy::{Entitlement, EntitlementSet};

use crate::adapter::{AdapterError, DirectoryAdapter, MutationAdapter};
use crate::result::Direction;

/// A mutation the directory received, successful or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationCall {
    pub identity: IdentityKey,
    pub entitlement: Entitlement,
    pub direction: Direction,
    pub succeeded: bool,
}

#[derive(Debug, Default)]
struct DirectoryState {
    accounts: HashMap<IdentityKey, EntitlementSet>,
    read_failures: HashMap<IdentityKey, AdapterError>,
    mutation_failures: HashMap<(IdentityKey, Entitlement), AdapterError>,
    calls: Vec<MutationCall>,
}

/// Directory + mutation adapter backed by a map.
///
/// Unknown identities fail reads with [`AdapterError::NotFound`]. Mutations
/// are idempotent, and failures can be injected per identity (reads) or per
/// `(identity, entitlement)` pair (mutations).
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    state: RwLock<DirectoryState>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Seed from `{ "identity": ["Entitlement", ...], ... }`.
    pub fn from_snapshot_json(json: &str) -> Result<Self, serde_json::Error> {
        let snapshot: HashMap<IdentityKey, EntitlementSet> = serde_json::from_str(json)?;
        Ok(Self {
            state: RwLock::new(DirectoryState {
                accounts: snapshot,
                ..Default::default()
            }),
        })
    }

    pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Self, AdapterError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AdapterError::unavailable(format!("{}: {e}", path.display())))?;
        Self::from_snapshot_json(&raw)
            .map_err(|e| AdapterError::Other(format!("{}: invalid snapshot: {e}", path.display())))
    }

    /// Create or replace an account's entitlements.
    pub fn insert<I, E>(&self, identity: impl Into<IdentityKey>, entitlements: I)
    where
        I: IntoIterator<Item = E>,
        E: Into<Entitlement>,
    {
        let set = entitlements.into_iter().map(Into::<Entitlement>::into).collect();
        if let Ok(mut state) = self.state.write() {
            state.accounts.insert(identity.into(), set);
        }
    }

    pub fn fail_reads_for(&self, identity: impl Into<IdentityKey>, error: AdapterError) {
        if let Ok(mut state) = self.state.write() {
            state.read_failures.insert(identity.into(), error);
        }
    }

    pub fn fail_mutations_for(
        &self,
        identity: impl Into<IdentityKey>,
        entitlement: impl Into<Entitlement>,
        error: AdapterError,
    ) {
        if let Ok(mut state) = self.state.write() {
            state
                .mutation_failures
                .insert((identity.into(), entitlement.into()), error);
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut state) = self.state.write() {
            state.read_failures.clear();
            state.mutation_failures.clear();
        }
    }

    /// Current entitlements without failure injection (for assertions).
    pub fn entitlements_of(&self, identity: &IdentityKey) -> Option<EntitlementSet> {
        self.state.read().ok()?.accounts.get(identity).cloned()
    }

    /// Every mutation received so far, in call order.
    pub fn calls(&self) -> Vec<MutationCall> {
        self.state.read().map(|s| s.calls.clone()).unwrap_or_default()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut state) = self.state.write() {
            state.calls.clear();
        }
    }

    /// Snapshot of all accounts, keys sorted.
    pub fn snapshot(&self) -> Vec<(IdentityKey, EntitlementSet)> {
        let mut out: Vec<_> = self
            .state
            .read()
            .map(|s| s.accounts.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    fn mutate(
        &self,
        identity: &IdentityKey,
        entitlement: &Entitlement,
        direction: Direction,
    ) -> Result<(), AdapterError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| AdapterError::unavailable("directory lock poisoned"))?;

        let injected = state
            .mutation_failures
            .get(&(identity.clone(), entitlement.clone()))
            .cloned();

        let outcome = match (injected, state.accounts.get_mut(identity)) {
            (Some(err), _) => Err(err),
            (None, None) => Err(AdapterError::not_found(identity.as_str())),
            (None, Some(set)) => {
                match direction {
                    Direction::Add => set.insert(entitlement.clone()),
                    Direction::Remove => set.remove(entitlement),
                };
                Ok(())
            }
        };

        state.calls.push(MutationCall {
            identity: identity.clone(),
            entitlement: entitlement.clone(),
            direction,
            succeeded: outcome.is_ok(),
        });
        outcome
    }
}

impl DirectoryAdapter for InMemoryDirectory {
    fn current_entitlements(&self, identity: &IdentityKey) -> Result<EntitlementSet, AdapterError> {
        let state = self
            .state
            .read()
            .map_err(|_| AdapterError::unavailable("directory lock poisoned"))?;

        if let Some(err) = state.read_failures.get(identity) {
            return Err(err.clone());
        }
        state
            .accounts
            .get(identity)
            .cloned()
            .ok_or_else(|| AdapterError::not_found(identity.as_str()))
    }
}

impl MutationAdapter for InMemoryDirectory {
    fn add_entitlement(&self, identity: &IdentityKey, entitlement: &Entitlement) -> Result<(), AdapterError> {
        self.mutate(identity, entitlement, Direction::Add)
    }

    fn remove_entitlement(&self, identity: &IdentityKey, entitlement: &Entitlement) -> Result<(), AdapterError> {
        self.mutate(identity, entitlement, Direction::Remove)
    }
}
