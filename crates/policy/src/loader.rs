//! Policy document loading (TOML or JSON).
//!
//! The document is the only place the `*` pattern literal appears; everything
//! past [`PolicyDocument::into_config`] works with typed [`PolicyKey`]s.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Entitlement, EntitlementSet, PolicyError, PolicyKey, PolicyTable, ProtectedSet};

/// One `[[rules]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    pub department: String,
    pub title: String,
    #[serde(default)]
    pub entitlements: Vec<String>,
}

/// On-disk policy representation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(default)]
    pub protected: Vec<String>,
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

/// Validated policy: everything a reconciler needs, built once per process.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    pub table: PolicyTable,
    pub protected: ProtectedSet,
}

impl PolicyDocument {
    pub fn from_toml_str(s: &str) -> Result<Self, PolicyError> {
        toml::from_str(s).map_err(|e| PolicyError::Parse {
            format: "toml",
            message: e.to_string(),
        })
    }

    pub fn from_json_str(s: &str) -> Result<Self, PolicyError> {
        serde_json::from_str(s).map_err(|e| PolicyError::Parse {
            format: "json",
            message: e.to_string(),
        })
    }

    /// Validate into a [`PolicyConfig`].
    ///
    /// Rejects unknown key shapes, bad entitlement names, duplicate rules and
    /// a missing `(*, *)` rule.
    pub fn into_config(self) -> Result<PolicyConfig, PolicyError> {
        let mut builder = PolicyTable::builder();

        for rule in self.rules {
            let key = PolicyKey::from_pattern(&rule.department, &rule.title)?;
            let set = parse_entitlements(rule.entitlements)?;
            builder.push(key, set);
        }

        let table = builder.build()?;
        let protected = ProtectedSet::from(parse_entitlements(self.protected)?);

        Ok(PolicyConfig { table, protected })
    }

    /// Inverse of [`Self::into_config`] (rule order normalized).
    pub fn from_config(config: &PolicyConfig) -> Self {
        let rules = config
            .table
            .rules()
            .into_iter()
            .map(|(key, set)| {
                let (department, title) = key.as_pattern();
                PolicyRule {
                    department: department.to_string(),
                    title: title.to_string(),
                    entitlements: set.names(),
                }
            })
            .collect();

        Self {
            protected: config.protected.as_set().names(),
            rules,
        }
    }
}

fn parse_entitlements(names: Vec<String>) -> Result<EntitlementSet, PolicyError> {
    names.into_iter().map(Entitlement::parse).collect()
}

/// Load and validate a policy document, choosing the format by extension.
pub fn load_policy(path: impl AsRef<Path>) -> Result<PolicyConfig, PolicyError> {
    let path = path.as_ref();
    let shown = path.display().to_string();

    let raw = std::fs::read_to_string(path).map_err(|e| PolicyError::Io {
        path: shown.clone(),
        message: e.to_string(),
    })?;

    let document = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => PolicyDocument::from_toml_str(&raw)?,
        Some("json") => PolicyDocument::from_json_str(&raw)?,
        _ => return Err(PolicyError::UnsupportedFormat(shown)),
    };

    let config = document.into_config()?;
    info!(
        path = %path.display(),
        rules = config.table.len(),
        protected = config.protected.len(),
        "policy loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
protected = ["BreakGlass-Admins"]

[[rules]]
department = "*"
title = "*"
entitlements = ["StandardUsers"]

[[rules]]
department = "IT"
title = "*"
entitlements = ["StandardUsers", "IT-Users"]

[[rules]]
department = "IT"
title = "Developer"
entitlements = ["StandardUsers", "IT-Users", "Developer-Tools"]
"#;

    #[test]
    fn toml_document_builds_table() {
        let config = PolicyDocument::from_toml_str(SAMPLE)
            .unwrap()
            .into_config()
            .unwrap();

        assert_eq!(config.table.len(), 3);
        assert!(config.protected.contains(&"BreakGlass-Admins".into()));
        assert_eq!(config.table.resolve("IT", "Developer").len(), 3);
        assert_eq!(config.table.resolve("IT", "Intern").len(), 2);
        assert_eq!(config.table.resolve("HR", "Clerk").len(), 1);
    }

    #[test]
    fn json_document_is_equivalent() {
        let json = r#"{
            "protected": [],
            "rules": [
                {"department": "*", "title": "*", "entitlements": ["StandardUsers"]}
            ]
        }"#;
        let config = PolicyDocument::from_json_str(json).unwrap().into_config().unwrap();
        assert_eq!(config.table.resolve("X", "Y"), &EntitlementSet::from(["StandardUsers"]));
        assert!(config.protected.is_empty());
    }

    #[test]
    fn missing_global_default_is_a_configuration_error() {
        let doc = r#"
[[rules]]
department = "IT"
title = "*"
entitlements = ["IT-Users"]
"#;
        let err = PolicyDocument::from_toml_str(doc).unwrap().into_config().unwrap_err();
        assert_eq!(err, PolicyError::MissingGlobalDefault);
    }

    #[test]
    fn whitespace_entitlement_is_rejected() {
        let doc = r#"
[[rules]]
department = "*"
title = "*"
entitlements = ["StandardUsers "]
"#;
        let err = PolicyDocument::from_toml_str(doc).unwrap().into_config().unwrap_err();
        assert!(matches!(err, PolicyError::InvalidEntitlement(_)));
    }

    #[test]
    fn malformed_toml_reports_parse_error() {
        let err = PolicyDocument::from_toml_str("rules = 12").unwrap_err();
        assert!(matches!(err, PolicyError::Parse { format: "toml", .. }));
    }

    #[test]
    fn document_round_trips_through_config() {
        let config = PolicyDocument::from_toml_str(SAMPLE).unwrap().into_config().unwrap();
        let doc = PolicyDocument::from_config(&config);
        let again = doc.clone().into_config().unwrap();

        assert_eq!(doc.rules.len(), 3);
        assert_eq!(doc.rules[0].department, "*");
        assert_eq!(
            again.table.resolve("IT", "Developer"),
            config.table.resolve("IT", "Developer")
        );
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_policy("/nonexistent/policy.toml").unwrap_err();
        assert!(matches!(err, PolicyError::Io { .. }));
    }

    #[test]
    fn load_policy_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("policy.toml");
        std::fs::write(&toml_path, SAMPLE).unwrap();
        assert_eq!(load_policy(&toml_path).unwrap().table.len(), 3);

        let yaml_path = dir.path().join("policy.yaml");
        std::fs::write(&yaml_path, SAMPLE).unwrap();
        assert!(matches!(
            load_policy(&yaml_path),
            Err(PolicyError::UnsupportedFormat(_))
        ));
    }
}
