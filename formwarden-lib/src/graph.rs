//! Dependency graph between fields.

use std::collections::BTreeMap;

use crate::rules::RuleSet;

/// Maps a source field to the fields whose rules depend on it.
///
/// Built once from the rule set; read-only afterwards. Dependents are kept in
/// rule-set declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    dependents: BTreeMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Derives the graph from the `depends_on` lists of a rule set.
    pub fn from_rules(rules: &RuleSet) -> Self {
        let mut dependents: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (field, field_rules) in rules.iter() {
            for dependency in field_rules.iter().flat_map(|r| r.dependencies()) {
                let entry = dependents.entry(dependency.clone()).or_default();
                if !entry.iter().any(|d| d == field) {
                    entry.push(field.to_string());
                }
            }
        }
        Self { dependents }
    }

    /// Fields that must be revalidated when `source` changes.
    pub fn dependents_of(&self, source: &str) -> &[String] {
        self.dependents
            .get(source)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every field that at least one other field depends on.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.dependents.keys().map(String::as_str)
    }

    /// Returns `true` if no rule declares a dependency.
    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }
}
