use serde::Serialize;

use crate::{PolicyKey, PolicyTable, ResolutionTier};

/// Auditable answer to "why does this identity require these entitlements?"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub department: String,
    pub title: String,
    pub tier: ResolutionTier,
    /// The rule that answered the lookup.
    pub key: PolicyKey,
    pub entitlements: Vec<String>,
    pub reason: String,
}

impl PolicyTable {
    /// Resolve `(department, title)` and report which tier matched.
    pub fn explain(&self, department: &str, title: &str) -> Resolution {
        let (tier, set) = self.lookup(department, title);

        let (key, reason) = match tier {
            ResolutionTier::Exact => (
                PolicyKey::exact(department, title),
                format!("exact rule for department '{department}' and title '{title}'"),
            ),
            ResolutionTier::DepartmentWildcard => (
                PolicyKey::department(department),
                format!("no rule for title '{title}'; department '{department}' wildcard applies"),
            ),
            ResolutionTier::GlobalDefault => (
                PolicyKey::GlobalDefault,
                format!("no rule matches department '{department}' and title '{title}'; global default applies"),
            ),
        };

        Resolution {
            department: department.to_string(),
            title: title.to_string(),
            tier,
            key,
            entitlements: set.names(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PolicyTable {
        PolicyTable::builder()
            .rule(PolicyKey::exact("IT", "Developer"), ["IT-Users", "Developer-Tools"])
            .rule(PolicyKey::department("IT"), ["IT-Users"])
            .rule(PolicyKey::GlobalDefault, ["StandardUsers"])
            .build()
            .unwrap()
    }

    #[test]
    fn explains_each_tier() {
        let table = table();

        let exact = table.explain("IT", "Developer");
        assert_eq!(exact.tier, ResolutionTier::Exact);
        assert_eq!(exact.key, PolicyKey::exact("IT", "Developer"));

        let dept = table.explain("IT", "Intern");
        assert_eq!(dept.tier, ResolutionTier::DepartmentWildcard);
        assert_eq!(dept.entitlements, vec!["IT-Users"]);

        let global = table.explain("Sales", "Clerk");
        assert_eq!(global.tier, ResolutionTier::GlobalDefault);
        assert_eq!(global.key, PolicyKey::GlobalDefault);
    }

    #[test]
    fn known_department_without_wildcard_explains_as_global_default() {
        let table = PolicyTable::builder()
            .rule(PolicyKey::exact("HR", "Manager"), ["HR-Managers"])
            .rule(PolicyKey::GlobalDefault, ["StandardUsers"])
            .build()
            .unwrap();
        let resolution = table.explain("HR", "Clerk");
        assert_eq!(resolution.tier, ResolutionTier::GlobalDefault);
        assert!(resolution.reason.contains("HR"));
    }

    #[test]
    fn serializes_tier_in_snake_case() {
        let json = serde_json::to_value(table().explain("IT", "Intern")).unwrap();
        assert_eq!(json["tier"], "department_wildcard");
        assert_eq!(json["key"]["kind"], "department_wildcard");
    }
}
