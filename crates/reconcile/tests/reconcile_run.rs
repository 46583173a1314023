//! Whole-run behavior against the in-memory directory.

use std::sync::Arc;
use std::time::Duration;

use rbacsync_core::IdentityKey;
use rbacsync_policy::{Entitlement, EntitlementSet, PolicyConfig, PolicyKey, PolicyTable, ProtectedSet};
use rbacsync_reconcile::{
    AdapterError, Direction, ErrorKind, IdentityRecord, InMemoryDirectory, MutationAdapter, Reconciler, ReconcilerConfig,
    RetryPolicy, Retrying,
};

fn policy() -> PolicyConfig {
    PolicyConfig {
        table: PolicyTable::builder()
            .rule(PolicyKey::GlobalDefault, ["StandardUsers"])
            .rule(PolicyKey::department("IT"), ["StandardUsers", "IT-Users", "VPN-Access"])
            .rule(
                PolicyKey::exact("IT", "Developer"),
                ["StandardUsers", "IT-Users", "VPN-Access", "Developer-Tools"],
            )
            .rule(PolicyKey::department("Finance"), ["StandardUsers", "Finance-Users"])
            .build()
            .unwrap(),
        protected: ProtectedSet::new(["BreakGlass-Admins"]),
    }
}

fn key(s: &str) -> IdentityKey {
    IdentityKey::from(s)
}

fn remediating() -> ReconcilerConfig {
    ReconcilerConfig::default().with_auto_remediate(true)
}

#[test]
fn second_run_after_successful_remediation_is_a_no_op() {
    let dir = InMemoryDirectory::new();
    dir.insert("jsmith", ["StandardUsers", "Legacy-App"]);
    dir.insert("ajohnson", ["Finance-Users"]);
    let roster = vec![
        IdentityRecord::new("jsmith", "IT", "Developer"),
        IdentityRecord::new("ajohnson", "Finance", "Analyst"),
    ];
    let reconciler = Reconciler::new(policy(), &dir, &dir).with_config(remediating());

    let first = reconciler.run(roster.clone());
    assert_eq!(first.summary.compliant, 0);
    assert_eq!(first.summary.remediated_count, 5);

    dir.clear_calls();
    let second = reconciler.run(roster);
    assert_eq!(second.summary.compliant, 2);
    assert_eq!(second.summary.missing_count, 0);
    assert_eq!(second.summary.excess_count, 0);
    assert!(dir.calls().is_empty());
}

#[test]
fn failed_add_does_not_stop_the_rest() {
    let dir = InMemoryDirectory::new();
    dir.insert("jsmith", ["StandardUsers"]);
    dir.fail_mutations_for("jsmith", "VPN-Access", AdapterError::rejected("group is locked"));
    let reconciler = Reconciler::new(policy(), &dir, &dir);

    let result = reconciler.reconcile_identity(&IdentityRecord::new("jsmith", "IT", "Developer"), true);

    let outcomes: Vec<(&str, bool)> = result
        .remediated
        .iter()
        .map(|o| (o.entitlement.as_str(), o.succeeded))
        .collect();
    assert_eq!(
        outcomes,
        vec![("IT-Users", true), ("VPN-Access", false), ("Developer-Tools", true)]
    );
    assert_eq!(result.remediated[1].detail.as_deref(), Some("rejected: group is locked"));
    assert_eq!(
        dir.entitlements_of(&key("jsmith")).unwrap(),
        EntitlementSet::from(["StandardUsers", "IT-Users", "Developer-Tools"])
    );
}

#[test]
fn protected_entitlements_are_never_removed() {
    let dir = InMemoryDirectory::new();
    dir.insert("bwilliams", ["StandardUsers", "BreakGlass-Admins", "Legacy-App"]);
    let reconciler = Reconciler::new(policy(), &dir, &dir).with_config(remediating());

    let report = reconciler.run([IdentityRecord::new("bwilliams", "Sales", "Clerk")]);

    assert_eq!(report.results[0].excess, EntitlementSet::from(["Legacy-App"]));
    assert!(
        dir.calls()
            .iter()
            .all(|c| !(c.direction == Direction::Remove && c.entitlement.as_str() == "BreakGlass-Admins"))
    );
    assert!(dir.entitlements_of(&key("bwilliams")).unwrap().contains(&"BreakGlass-Admins".into()));
}

#[test]
fn one_bad_identity_does_not_affect_the_others() {
    let dir = InMemoryDirectory::new();
    dir.insert("alice", ["StandardUsers"]);
    dir.insert("carol", ["StandardUsers"]);
    dir.fail_reads_for("carol", AdapterError::unavailable("ldap timeout"));
    let reconciler = Reconciler::new(policy(), &dir, &dir).with_config(remediating());

    let report = reconciler.run([
        IdentityRecord::new("alice", "Legal", "Counsel"),
        IdentityRecord::new("bob", "Legal", "Counsel"),
        IdentityRecord::new("carol", "IT", "Developer"),
        IdentityRecord::new("alice", "IT", "Admin"),
        IdentityRecord::new("dave", "IT", "Developer").with_email("not-an-email"),
    ]);

    let kinds: Vec<Option<ErrorKind>> = report.results.iter().map(|r| r.error.as_ref().map(|e| e.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            None,
            Some(ErrorKind::DirectoryRead),
            Some(ErrorKind::DirectoryRead),
            Some(ErrorKind::InputRecord),
            Some(ErrorKind::InputRecord),
        ]
    );
    assert_eq!(report.summary.analyzed, 5);
    assert_eq!(report.summary.compliant, 1);
    assert_eq!(report.summary.error_count, 4);
    assert_eq!(report.summary.compliance_percent(), "20.0%");
    assert!(dir.calls().is_empty());
}

#[test]
fn parallel_run_matches_sequential_run() {
    let roster: Vec<IdentityRecord> = (0..60)
        .map(|i| {
            let (dept, title) = match i % 4 {
                0 => ("IT", "Developer"),
                1 => ("IT", "Support"),
                2 => ("Finance", "Analyst"),
                _ => ("Legal", "Counsel"),
            };
            IdentityRecord::new(format!("user{i:03}"), dept, title)
        })
        .collect();

    let seed = |dir: &InMemoryDirectory| {
        for (i, r) in roster.iter().enumerate() {
            if i % 5 != 4 {
                dir.insert(r.identifier_key.clone(), ["StandardUsers", "Legacy-App"]);
            }
        }
    };

    let sequential_dir = InMemoryDirectory::new();
    seed(&sequential_dir);
    let sequential = Reconciler::new(policy(), &sequential_dir, &sequential_dir)
        .with_config(remediating())
        .run(roster.clone());

    let parallel_dir = InMemoryDirectory::new();
    seed(&parallel_dir);
    let parallel = Reconciler::new(policy(), &parallel_dir, &parallel_dir)
        .with_config(remediating().with_max_concurrent(8))
        .run(roster.clone());

    assert_eq!(sequential.results, parallel.results);
    assert_eq!(sequential.summary, parallel.summary);
    assert_eq!(sequential_dir.snapshot(), parallel_dir.snapshot());
    let order: Vec<&IdentityKey> = parallel.results.iter().map(|r| &r.identifier_key).collect();
    let expected: Vec<&IdentityKey> = roster.iter().map(|r| &r.identifier_key).collect();
    assert_eq!(order, expected);
}

#[test]
fn retrying_adapter_absorbs_throttling() {
    struct ThrottleOnce {
        dir: InMemoryDirectory,
        throttled: std::sync::Mutex<bool>,
    }

    impl MutationAdapter for ThrottleOnce {
        fn add_entitlement(&self, id: &IdentityKey, e: &Entitlement) -> Result<(), AdapterError> {
            let mut throttled = self.throttled.lock().unwrap();
            if !*throttled {
                *throttled = true;
                return Err(AdapterError::throttled("rate exceeded"));
            }
            self.dir.add_entitlement(id, e)
        }

        fn remove_entitlement(&self, id: &IdentityKey, e: &Entitlement) -> Result<(), AdapterError> {
            self.dir.remove_entitlement(id, e)
        }
    }

    let flaky = ThrottleOnce {
        dir: InMemoryDirectory::new(),
        throttled: std::sync::Mutex::new(false),
    };
    flaky.dir.insert("jsmith", ["StandardUsers"]);

    let mutator = Retrying::new(&flaky, RetryPolicy::fixed(3, Duration::from_millis(1))).with_sleeper(Arc::new(|_| {}));
    let reconciler = Reconciler::new(policy(), &flaky.dir, mutator);

    let result = reconciler.reconcile_identity(&IdentityRecord::new("jsmith", "Finance", "Clerk"), true);
    assert_eq!(result.successful_remediations(), 1);
    assert_eq!(result.failed_remediations(), 0);
}

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    const POOL: &[&str] = &[
        "StandardUsers",
        "IT-Users",
        "VPN-Access",
        "Developer-Tools",
        "Finance-Users",
        "BreakGlass-Admins",
        "Legacy-App",
    ];

    fn holdings() -> impl Strategy<Value = Vec<&'static str>> {
        proptest::sample::subsequence(POOL, 0..=POOL.len())
    }

    fn assignment() -> impl Strategy<Value = (&'static str, &'static str)> {
        (
            prop_oneof![Just("IT"), Just("Finance"), Just("Legal")],
            prop_oneof![Just("Developer"), Just("Analyst")],
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 128, ..ProptestConfig::default() })]

        #[test]
        fn remediation_converges_in_one_pass(held in holdings(), (dept, title) in assignment()) {
            let dir = InMemoryDirectory::new();
            dir.insert("subject", held.clone());
            let reconciler = Reconciler::new(policy(), &dir, &dir);
            let record = IdentityRecord::new("subject", dept, title);

            reconciler.reconcile_identity(&record, true);
            dir.clear_calls();
            let again = reconciler.reconcile_identity(&record, true);

            prop_assert!(again.is_compliant());
            prop_assert!(dir.calls().is_empty());

            let after = dir.entitlements_of(&key("subject")).unwrap();
            prop_assert!(after.iter().all(|e| e.as_str() != "Legacy-App"));
            prop_assert_eq!(
                after.contains(&"BreakGlass-Admins".into()),
                held.contains(&"BreakGlass-Admins")
            );
        }
    }
}
