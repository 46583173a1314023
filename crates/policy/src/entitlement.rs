use std::borrow::Cow;
use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::PolicyError;

/// Entitlement identifier (a security group, a managed policy ARN, ...).
///
/// Entitlements are modeled as opaque strings and compared byte-for-byte.
/// Case and whitespace handling is a policy authoring concern; [`Entitlement::parse`]
/// only rejects names that can never be right.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entitlement(Cow<'static, str>);

impl Entitlement {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Validating constructor used at configuration boundaries.
    pub fn parse(name: impl Into<Cow<'static, str>>) -> Result<Self, PolicyError> {
        let name = name.into();
        if name.is_empty() {
            return Err(PolicyError::InvalidEntitlement(
                "entitlement name is empty".to_string(),
            ));
        }
        if name.trim() != name {
            return Err(PolicyError::InvalidEntitlement(format!(
                "entitlement name '{name}' has leading or trailing whitespace"
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Entitlement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Entitlement {
    fn from(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }
}

impl From<String> for Entitlement {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

/// Insertion-ordered set of entitlements.
///
/// Membership is the contract; iteration order follows first insertion so
/// reports come out the same way on every run. Equality ignores order.
#[derive(Debug, Clone, Default)]
pub struct EntitlementSet {
    items: Vec<Entitlement>,
    index: HashSet<Entitlement>,
}

impl EntitlementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `entitlement`; returns `false` if it was already present.
    pub fn insert(&mut self, entitlement: Entitlement) -> bool {
        if self.index.contains(&entitlement) {
            return false;
        }
        self.index.insert(entitlement.clone());
        self.items.push(entitlement);
        true
    }

    pub fn remove(&mut self, entitlement: &Entitlement) -> bool {
        if !self.index.remove(entitlement) {
            return false;
        }
        self.items.retain(|e| e != entitlement);
        true
    }

    pub fn contains(&self, entitlement: &Entitlement) -> bool {
        self.index.contains(entitlement)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Entitlement> {
        self.items.iter()
    }

    /// Elements of `self` absent from `other`, in `self`'s order.
    pub fn difference<'a>(&'a self, other: &'a EntitlementSet) -> impl Iterator<Item = &'a Entitlement> + 'a {
        self.items.iter().filter(move |e| !other.contains(e))
    }

    /// Extends with every element of `other` not yet present.
    pub fn union_with(&mut self, other: &EntitlementSet) {
        for e in other.iter() {
            self.insert(e.clone());
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.items.iter().map(|e| e.as_str().to_string()).collect()
    }
}

impl PartialEq for EntitlementSet {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for EntitlementSet {}

impl FromIterator<Entitlement> for EntitlementSet {
    fn from_iter<I: IntoIterator<Item = Entitlement>>(iter: I) -> Self {
        let mut set = Self::new();
        for e in iter {
            set.insert(e);
        }
        set
    }
}

impl<'a> FromIterator<&'a Entitlement> for EntitlementSet {
    fn from_iter<I: IntoIterator<Item = &'a Entitlement>>(iter: I) -> Self {
        iter.into_iter().cloned().collect()
    }
}

impl<const N: usize> From<[&'static str; N]> for EntitlementSet {
    fn from(names: [&'static str; N]) -> Self {
        names.into_iter().map(Entitlement::from).collect()
    }
}

impl IntoIterator for EntitlementSet {
    type Item = Entitlement;
    type IntoIter = std::vec::IntoIter<Entitlement>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a EntitlementSet {
    type Item = &'a Entitlement;
    type IntoIter = core::slice::Iter<'a, Entitlement>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Serialize for EntitlementSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EntitlementSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<Entitlement>::deserialize(deserializer)?;
        Ok(items.into_iter().collect())
    }
}
