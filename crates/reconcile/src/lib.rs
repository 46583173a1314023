//! `rbacsync-reconcile`: compares directory state with the policy matrix and
//! optionally corrects it.
//!
//! - `adapter`: directory read / mutation seams
//! - `diff`: missing / excess computation with the protected denylist
//! - `reconciler`: per-identity orchestration and whole-roster runs
//! - `summary` / `report`: run tallies and exported reports
//! - `retry`: throttle-aware adapter wrapper
//! - `in_memory`: map-backed directory for tests and offline runs

pub mod adapter;
pub mod diff;
pub mod identity;
pub mod in_memory;
pub mod reconciler;
pub mod report;
pub mod result;
pub mod retry;
pub mod roster;
pub mod summary;

pub use adapter::{AdapterError, DirectoryAdapter, MutationAdapter};
pub use diff::{Discrepancies, compute_discrepancies};
pub use identity::IdentityRecord;
pub use in_memory::{InMemoryDirectory, MutationCall};
pub use reconciler::{Reconciler, ReconcilerConfig};
pub use report::{JsonFileSink, ReportError, ReportSink, RunReport, TextSink};
pub use result::{Direction, ErrorDetail, ErrorKind, ReconciliationResult, RemediationOutcome};
pub use retry::{BackoffStrategy, RetryPolicy, Retrying, Sleeper};
pub use roster::{DEFAULT_TITLE, RosterError, load_roster, parse_roster, parse_roster_csv};
pub use summary::{RunSummary, aggregate};
