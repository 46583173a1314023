//! Reconciliation orchestrator.
//!
//! For each identity: read current entitlements, resolve required ones, diff,
//! and (optionally) push corrections through the mutation adapter.
//!
//! ## Failure model
//!
//! - Invalid or duplicate records fail alone (`ErrorKind::InputRecord`).
//! - A failed directory read fails that identity alone; no diff is computed.
//! - A failed mutation is recorded on its outcome and the next one proceeds.
//!
//! Nothing below the run aborts the run. Configuration errors are rejected
//! earlier, when the [`PolicyConfig`] is built.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use rbacsync_core::{DomainError, Entity, IdentityKey, RunId};
use rbacsync_observability::AUDIT_TARGET;
use rbacsync_policy::{Entitlement, EntitlementSet, PolicyConfig};

use crate::adapter::{DirectoryAdapter, MutationAdapter};
use crate::diff::{Discrepancies, compute_discrepancies};
use crate::identity::IdentityRecord;
use crate::report::RunReport;
use crate::result::{Direction, ErrorDetail, ReconciliationResult, RemediationOutcome};
use crate::summary::aggregate;

/// Reconciler configuration.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Name for logging and reports
    pub name: String,
    /// Apply corrections, or only report drift
    pub auto_remediate: bool,
    /// Worker threads for [`Reconciler::run`] (1 = sequential)
    pub max_concurrent: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            name: "rbacsync".to_string(),
            auto_remediate: false,
            max_concurrent: 1,
        }
    }
}

impl ReconcilerConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_auto_remediate(mut self, enabled: bool) -> Self {
        self.auto_remediate = enabled;
        self
    }

    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }
}

/// Reconciles identities against an immutable policy.
pub struct Reconciler<D, M> {
    policy: PolicyConfig,
    directory: D,
    mutator: M,
    config: ReconcilerConfig,
}

impl<D, M> Reconciler<D, M>
where
    D: DirectoryAdapter,
    M: MutationAdapter,
{
    pub fn new(policy: PolicyConfig, directory: D, mutator: M) -> Self {
        Self {
            policy,
            directory,
            mutator,
            config: ReconcilerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn mutator(&self) -> &M {
        &self.mutator
    }

    /// Required entitlements for a department/title pair.
    pub fn resolve_required(&self, department: &str, title: &str) -> &EntitlementSet {
        self.policy.table.resolve(department, title)
    }

    /// Reconcile one identity.
    ///
    /// Running this twice with no external change in between (and with the
    /// first run's mutations succeeding) yields no discrepancies and no
    /// mutation calls the second time.
    pub fn reconcile_identity(&self, record: &IdentityRecord, auto_remediate: bool) -> ReconciliationResult {
        let key = &record.identifier_key;

        if let Err(e) = record.validate() {
            warn!(identity = %key, error = %e, "invalid identity record");
            return ReconciliationResult::errored(key.clone(), ErrorDetail::input_record(e.to_string()));
        }

        let current = match self.directory.current_entitlements(key) {
            Ok(set) => set,
            Err(e) => {
                warn!(identity = %key, error = %e, "directory read failed");
                return ReconciliationResult::errored(key.clone(), ErrorDetail::directory_read(e.to_string()));
            }
        };

        let required = self.resolve_required(&record.department, &record.title);
        let discrepancies = compute_discrepancies(required, &current, &self.policy.protected);

        if discrepancies.is_compliant() {
            debug!(identity = %key, "compliant");
            return ReconciliationResult::diffed(key.clone(), discrepancies, Vec::new());
        }

        info!(
            identity = %key,
            department = %record.department,
            title = %record.title,
            missing = discrepancies.missing.len(),
            excess = discrepancies.excess.len(),
            "drift detected"
        );

        let remediated = if auto_remediate {
            self.remediate(key, &discrepancies)
        } else {
            Vec::new()
        };

        ReconciliationResult::diffed(key.clone(), discrepancies, remediated)
    }

    fn remediate(&self, key: &IdentityKey, discrepancies: &Discrepancies) -> Vec<RemediationOutcome> {
        let additions = discrepancies.missing.iter().map(|e| (e, Direction::Add));
        let removals = discrepancies.excess.iter().map(|e| (e, Direction::Remove));

        additions
            .chain(removals)
            .map(|(entitlement, direction)| self.apply(key, entitlement, direction))
            .collect()
    }

    fn apply(&self, key: &IdentityKey, entitlement: &Entitlement, direction: Direction) -> RemediationOutcome {
        let started = Instant::now();
        let result = match direction {
            Direction::Add => self.mutator.add_entitlement(key, entitlement),
            Direction::Remove => self.mutator.remove_entitlement(key, entitlement),
        };
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(()) => {
                info!(
                    target: AUDIT_TARGET,
                    action = %direction,
                    identity = %key,
                    entitlement = %entitlement,
                    outcome = "success",
                    elapsed_ms,
                    "entitlement mutation"
                );
                RemediationOutcome::success(entitlement.clone(), direction)
            }
            Err(e) => {
                error!(
                    target: AUDIT_TARGET,
                    action = %direction,
                    identity = %key,
                    entitlement = %entitlement,
                    outcome = "failed",
                    elapsed_ms,
                    error = %e,
                    "entitlement mutation"
                );
                RemediationOutcome::failure(entitlement.clone(), direction, e.to_string())
            }
        }
    }
}

impl<D, M> Reconciler<D, M>
where
    D: DirectoryAdapter + Sync,
    M: MutationAdapter + Sync,
{
    /// Reconcile a roster and assemble the run report.
    pub fn run<I>(&self, records: I) -> RunReport
    where
        I: IntoIterator<Item = IdentityRecord>,
    {
        let records: Vec<IdentityRecord> = records.into_iter().collect();
        let run_id = RunId::new();
        let started_at = Utc::now();

        info!(
            run_id = %run_id,
            name = %self.config.name,
            identities = records.len(),
            auto_remediate = self.config.auto_remediate,
            workers = self.config.max_concurrent,
            "reconciliation run started"
        );

        let results = self.reconcile_all(&records);
        let summary = aggregate(&results);

        info!(
            run_id = %run_id,
            analyzed = summary.analyzed,
            compliant = summary.compliant,
            remediated = summary.remediated_count,
            errors = summary.error_count,
            compliance = %summary.compliance_percent(),
            "reconciliation run finished"
        );

        RunReport {
            run_id,
            name: self.config.name.clone(),
            started_at,
            finished_at: Utc::now(),
            auto_remediate: self.config.auto_remediate,
            summary,
            results,
        }
    }

    /// Results in source order, one per record.
    ///
    /// A repeated identifier is reported as an input error; only its first
    /// occurrence is reconciled.
    pub fn reconcile_all(&self, records: &[IdentityRecord]) -> Vec<ReconciliationResult> {
        let duplicates = find_duplicates(records);
        let auto_remediate = self.config.auto_remediate;

        let process = |i: usize| match &duplicates[i] {
            Some(e) => {
                warn!(identity = %records[i].identifier_key, "duplicate identity in roster");
                ReconciliationResult::errored(
                    records[i].identifier_key.clone(),
                    ErrorDetail::input_record(e.to_string()),
                )
            }
            None => self.reconcile_identity(&records[i], auto_remediate),
        };

        let workers = self.config.max_concurrent.min(records.len());
        if workers <= 1 {
            return (0..records.len()).map(process).collect();
        }

        let next = AtomicUsize::new(0);
        let mut indexed: Vec<(usize, ReconciliationResult)> = std::thread::scope(|s| {
            let mut handles = Vec::with_capacity(workers);
            for _ in 0..workers {
                handles.push(s.spawn(|| {
                    let mut local = Vec::new();
                    loop {
                        let i = next.fetch_add(1, Ordering::Relaxed);
                        if i >= records.len() {
                            break;
                        }
                        local.push((i, process(i)));
                    }
                    local
                }));
            }

            handles
                .into_iter()
                .flat_map(|h| match h.join() {
                    Ok(local) => local,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });

        indexed.sort_by_key(|(i, _)| *i);
        indexed.into_iter().map(|(_, r)| r).collect()
    }
}

/// Flags every repeat of an identifier already claimed by a valid record.
/// Invalid records never claim a key; they fail on their own.
fn find_duplicates(records: &[IdentityRecord]) -> Vec<Option<DomainError>> {
    let mut seen: HashSet<&IdentityKey> = HashSet::new();
    records
        .iter()
        .map(|r| {
            if r.validate().is_err() || seen.insert(r.id()) {
                None
            } else {
                Some(DomainError::conflict(format!(
                    "identity '{}' appears more than once in this run",
                    r.identifier_key
                )))
            }
        })
        .collect()
}
