//! `rbacsync-policy`: the RBAC matrix, i.e. entitlements, policy keys, the
//! three-tier resolver and the protected denylist.
//!
//! This crate is pure configuration data plus lookups; it never talks to a
//! directory.

pub mod entitlement;
pub mod error;
pub mod explain;
pub mod key;
pub mod loader;
pub mod protected;
pub mod reference;
pub mod table;

pub use entitlement::{Entitlement, EntitlementSet};
pub use error::PolicyError;
pub use explain::Resolution;
pub use key::{PolicyKey, WILDCARD};
pub use loader::{PolicyConfig, PolicyDocument, PolicyRule, load_policy};
pub use protected::ProtectedSet;
pub use table::{PolicyTable, PolicyTableBuilder, ResolutionTier};
