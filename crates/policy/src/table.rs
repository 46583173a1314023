//! The policy matrix and its three-tier resolver.

use std::collections::HashMap;

use tracing::debug;

use crate::{Entitlement, EntitlementSet, PolicyError, PolicyKey};

#[derive(Debug, Clone, Default)]
struct DepartmentRules {
    wildcard: Option<EntitlementSet>,
    titles: HashMap<String, EntitlementSet>,
}

/// Immutable department/title → entitlement matrix.
///
/// # Invariants
/// - The global default `(*, *)` is always present, so resolution is total.
/// - The table is never mutated after [`PolicyTableBuilder::build`].
#[derive(Debug, Clone)]
pub struct PolicyTable {
    departments: HashMap<String, DepartmentRules>,
    global_default: EntitlementSet,
    rule_count: usize,
}

/// Which lookup tier answered a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionTier {
    Exact,
    DepartmentWildcard,
    GlobalDefault,
}

impl PolicyTable {
    pub fn builder() -> PolicyTableBuilder {
        PolicyTableBuilder::default()
    }

    /// Required entitlements for `(department, title)`.
    ///
    /// Exact match, then `(department, *)`, then `(*, *)`. Strings are compared
    /// byte-for-byte.
    pub fn resolve(&self, department: &str, title: &str) -> &EntitlementSet {
        self.lookup(department, title).1
    }

    pub(crate) fn lookup(&self, department: &str, title: &str) -> (ResolutionTier, &EntitlementSet) {
        if let Some(rules) = self.departments.get(department) {
            if let Some(set) = rules.titles.get(title) {
                return (ResolutionTier::Exact, set);
            }
            if let Some(set) = &rules.wildcard {
                return (ResolutionTier::DepartmentWildcard, set);
            }
        }
        (ResolutionTier::GlobalDefault, &self.global_default)
    }

    pub fn global_default(&self) -> &EntitlementSet {
        &self.global_default
    }

    /// Number of rules, the global default included.
    pub fn len(&self) -> usize {
        self.rule_count
    }

    /// Every rule in the table, global default first, then departments and
    /// titles in lexical order.
    pub fn rules(&self) -> Vec<(PolicyKey, &EntitlementSet)> {
        let mut out = vec![(PolicyKey::GlobalDefault, &self.global_default)];

        let mut departments: Vec<&String> = self.departments.keys().collect();
        departments.sort();
        for department in departments {
            let rules = &self.departments[department];
            if let Some(set) = &rules.wildcard {
                out.push((PolicyKey::department(department.clone()), set));
            }
            let mut titles: Vec<&String> = rules.titles.keys().collect();
            titles.sort();
            for title in titles {
                out.push((
                    PolicyKey::exact(department.clone(), title.clone()),
                    &rules.titles[title],
                ));
            }
        }
        out
    }

    /// Every entitlement the table can ever require.
    pub fn all_entitlements(&self) -> EntitlementSet {
        let mut all = EntitlementSet::new();
        for (_, set) in self.rules() {
            all.union_with(set);
        }
        all
    }
}

/// Collects rules and validates them into a [`PolicyTable`].
#[derive(Debug, Default)]
pub struct PolicyTableBuilder {
    rules: Vec<(PolicyKey, EntitlementSet)>,
}

impl PolicyTableBuilder {
    pub fn rule<I, E>(mut self, key: PolicyKey, entitlements: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Entitlement>,
    {
        self.push(key, entitlements.into_iter().map(Into::<Entitlement>::into).collect());
        self
    }

    pub fn push(&mut self, key: PolicyKey, entitlements: EntitlementSet) {
        self.rules.push((key, entitlements));
    }

    /// Validate and freeze the table.
    ///
    /// Fails with [`PolicyError::MissingGlobalDefault`] when no `(*, *)` rule
    /// was supplied, and with [`PolicyError::DuplicateKey`] on repeated keys.
    pub fn build(self) -> Result<PolicyTable, PolicyError> {
        let mut departments: HashMap<String, DepartmentRules> = HashMap::new();
        let mut global_default: Option<EntitlementSet> = None;
        let rule_count = self.rules.len();

        for (key, set) in self.rules {
            let duplicate = match &key {
                PolicyKey::GlobalDefault => global_default.replace(set).is_some(),
                PolicyKey::DepartmentWildcard { department } => departments
                    .entry(department.clone())
                    .or_default()
                    .wildcard
                    .replace(set)
                    .is_some(),
                PolicyKey::Exact { department, title } => departments
                    .entry(department.clone())
                    .or_default()
                    .titles
                    .insert(title.clone(), set)
                    .is_some(),
            };
            if duplicate {
                return Err(PolicyError::DuplicateKey(key.to_string()));
            }
        }

        let global_default = global_default.ok_or(PolicyError::MissingGlobalDefault)?;
        debug!(rules = rule_count, "policy table built");

        Ok(PolicyTable {
            departments,
            global_default,
            rule_count,
        })
    }
}
