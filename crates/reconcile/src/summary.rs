//! Run-level tallies.

use serde::Serialize;

use crate::result::ReconciliationResult;

/// Counts over one run's results.
///
/// `missing_count` and `excess_count` count entitlements summed across
/// identities; `remediated_count` counts successful mutations only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub analyzed: usize,
    pub compliant: usize,
    pub missing_count: usize,
    pub excess_count: usize,
    pub remediated_count: usize,
    pub remediation_failures: usize,
    pub error_count: usize,
    pub compliance_rate: f64,
}

impl RunSummary {
    /// Identities with drift (errors excluded).
    pub fn non_compliant(&self) -> usize {
        self.analyzed - self.compliant - self.error_count
    }

    /// `compliance_rate` as a percentage string, e.g. `"83.3%"`.
    pub fn compliance_percent(&self) -> String {
        format!("{:.1}%", self.compliance_rate * 100.0)
    }
}

/// Pure fold over results; never contacts an adapter.
pub fn aggregate<'a, I>(results: I) -> RunSummary
where
    I: IntoIterator<Item = &'a ReconciliationResult>,
{
    let mut summary = results
        .into_iter()
        .fold(RunSummary::default(), |mut s, r| {
            s.analyzed += 1;
            if r.is_error() {
                s.error_count += 1;
            } else if r.is_compliant() {
                s.compliant += 1;
            }
            s.missing_count += r.missing.len();
            s.excess_count += r.excess.len();
            s.remediated_count += r.successful_remediations();
            s.remediation_failures += r.failed_remediations();
            s
        });

    summary.compliance_rate = if summary.analyzed == 0 {
        0.0
    } else {
        summary.compliant as f64 / summary.analyzed as f64
    };
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::Discrepancies;
    use crate::result::{Direction, ErrorDetail, RemediationOutcome};
    use rbacsync_core::IdentityKey;
    use rbacsync_policy::EntitlementSet;

    fn compliant(key: &str) -> ReconciliationResult {
        ReconciliationResult::diffed(IdentityKey::from(key), Discrepancies::default(), vec![])
    }

    #[test]
    fn empty_run_has_zero_rate() {
        let summary = aggregate(&[]);
        assert_eq!(summary.analyzed, 0);
        assert_eq!(summary.compliance_rate, 0.0);
    }

    #[test]
    fn fully_compliant_run_has_rate_one() {
        let results: Vec<_> = (0..10).map(|i| compliant(&format!("user{i}"))).collect();
        let summary = aggregate(&results);
        assert_eq!(summary.analyzed, 10);
        assert_eq!(summary.compliant, 10);
        assert_eq!(summary.compliance_rate, 1.0);
        assert_eq!(summary.compliance_percent(), "100.0%");
    }

    #[test]
    fn mixed_run_counts_each_bucket() {
        let drifted = ReconciliationResult::diffed(
            IdentityKey::from("drift"),
            Discrepancies {
                missing: EntitlementSet::from(["A", "B"]),
                excess: EntitlementSet::from(["X"]),
            },
            vec![
                RemediationOutcome::success("A".into(), Direction::Add),
                RemediationOutcome::failure("B".into(), Direction::Add, "throttled"),
                RemediationOutcome::success("X".into(), Direction::Remove),
            ],
        );
        let errored = ReconciliationResult::errored(
            IdentityKey::from("ghost"),
            ErrorDetail::directory_read("not found"),
        );
        let results = vec![compliant("ok1"), drifted, errored];

        let summary = aggregate(&results);
        assert_eq!(summary.analyzed, 3);
        assert_eq!(summary.compliant, 1);
        assert_eq!(summary.error_count, 1);
        assert_eq!(summary.non_compliant(), 1);
        assert_eq!(summary.missing_count, 2);
        assert_eq!(summary.excess_count, 1);
        assert_eq!(summary.remediated_count, 2);
        assert_eq!(summary.remediation_failures, 1);
        assert_eq!(summary.compliance_percent(), "33.3%");
    }

    #[test]
    fn aggregation_is_order_independent() {
        let mut results = vec![
            compliant("a"),
            ReconciliationResult::errored(IdentityKey::from("b"), ErrorDetail::input_record("bad")),
            compliant("c"),
        ];
        let forward = aggregate(&results);
        results.reverse();
        assert_eq!(forward, aggregate(&results));
    }
}
