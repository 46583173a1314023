//! Built-in demonstration matrix.
//!
//! Mirrors a typical small-company IAM layout: every account gets a baseline
//! group, departments add their groups, and a handful of titles add managed
//! policies on top of their department's set.
//!
//! Title policies are expanded only under the departments listed in
//! [`DEPARTMENT_GROUPS`]. A lookup has no title-only tier, so an identity in
//! any other department (`Legal` / `Admin`, say) resolves to the baseline and
//! does not receive the title's managed policy.

use crate::{Entitlement, EntitlementSet, PolicyConfig, PolicyKey, PolicyTable, ProtectedSet};

pub const BASELINE_GROUP: &str = "StandardUsers";

pub const BREAK_GLASS_GROUP: &str = "BreakGlass-Admins";

pub const DEPARTMENT_GROUPS: &[(&str, &[&str])] = &[
    ("IT", &["IT-Users", "VPN-Access", "CloudWatch-ReadOnly"]),
    ("Finance", &["Finance-Users", "Billing-ReadOnly"]),
    ("HR", &["HR-Users", "Employee-Records-Access"]),
    ("Engineering", &["Engineering-Users", "Developer-Tools", "S3-Dev-Access"]),
    ("Marketing", &["Marketing-Users", "Analytics-ReadOnly"]),
    ("Sales", &["Sales-Users", "CRM-Access"]),
];

pub const TITLE_POLICIES: &[(&str, &[&str])] = &[
    ("Developer", &["arn:aws:iam::aws:policy/PowerUserAccess"]),
    ("Analyst", &["arn:aws:iam::aws:policy/ReadOnlyAccess"]),
    ("Admin", &["arn:aws:iam::aws:policy/AdministratorAccess"]),
    ("Manager", &["arn:aws:iam::aws:policy/ReadOnlyAccess"]),
];

/// The reference matrix as a validated table.
pub fn reference_table() -> PolicyTable {
    let mut builder = PolicyTable::builder();
    let baseline = EntitlementSet::from([BASELINE_GROUP]);

    builder.push(PolicyKey::GlobalDefault, baseline.clone());

    for (department, groups) in DEPARTMENT_GROUPS {
        let mut dept_set = baseline.clone();
        dept_set.union_with(&groups.iter().copied().map(Entitlement::from).collect());
        builder.push(PolicyKey::department(*department), dept_set.clone());

        for (title, policies) in TITLE_POLICIES {
            let mut exact = dept_set.clone();
            exact.union_with(&policies.iter().copied().map(Entitlement::from).collect());
            builder.push(PolicyKey::exact(*department, *title), exact);
        }
    }

    match builder.build() {
        Ok(table) => table,
        // The constants above contain the global default and no duplicates.
        Err(e) => unreachable!("reference matrix is invalid: {e}"),
    }
}

/// Reference table plus the break-glass protected group.
pub fn reference_config() -> PolicyConfig {
    PolicyConfig {
        table: reference_table(),
        protected: ProtectedSet::new([BREAK_GLASS_GROUP]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engineering_developer_gets_groups_and_policy() {
        let table = reference_table();
        let set = table.resolve("Engineering", "Developer");
        assert_eq!(
            set.names(),
            vec![
                "StandardUsers",
                "Engineering-Users",
                "Developer-Tools",
                "S3-Dev-Access",
                "arn:aws:iam::aws:policy/PowerUserAccess",
            ]
        );
    }

    #[test]
    fn unknown_title_gets_department_groups_only() {
        let table = reference_table();
        assert_eq!(
            table.resolve("Finance", "Employee").names(),
            vec!["StandardUsers", "Finance-Users", "Billing-ReadOnly"]
        );
    }

    #[test]
    fn unknown_department_gets_baseline() {
        let table = reference_table();
        assert_eq!(table.resolve("Legal", "Admin").names(), vec!["StandardUsers"]);
        assert!(!table.resolve("Legal", "Admin").contains(&Entitlement::new(TITLE_POLICIES[2].1[0])));
    }

    #[test]
    fn rule_count_covers_every_combination() {
        let expected = 1 + DEPARTMENT_GROUPS.len() * (1 + TITLE_POLICIES.len());
        assert_eq!(reference_table().len(), expected);
    }

    #[test]
    fn break_glass_is_protected_but_never_required() {
        let config = reference_config();
        assert!(config.protected.contains(&BREAK_GLASS_GROUP.into()));
        assert!(!config.table.all_entitlements().contains(&BREAK_GLASS_GROUP.into()));
    }
}
