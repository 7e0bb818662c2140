//! In-memory policy model — the structure an engine loads rules into
//! and saves rules out of.
//!
//! Two levels of keying: section ("p" for policies, "g" for grouping
//! rules) and policy type within the section ("p", "p2", "g", ...).

use std::collections::BTreeMap;

/// Policy rules keyed by section and policy type.
///
/// Rules are kept in arrival order and never deduplicated here; a load
/// reflects table scan order, nothing more.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyModel {
    sections: BTreeMap<String, BTreeMap<String, Vec<Vec<String>>>>,
}

impl PolicyModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one rule under an explicit section and policy type.
    pub fn add_rule(&mut self, sec: &str, ptype: &str, rule: Vec<String>) {
        self.sections
            .entry(sec.to_string())
            .or_default()
            .entry(ptype.to_string())
            .or_default()
            .push(rule);
    }

    /// Append one rule, deriving the section from the policy type's
    /// first character ("p2" lands in section "p").
    pub fn add_tuple(&mut self, ptype: &str, rule: Vec<String>) {
        let sec = ptype.get(..1).unwrap_or("").to_string();
        self.add_rule(&sec, ptype, rule);
    }

    /// Rules for one policy type; empty slice when the type is unknown.
    pub fn rules(&self, sec: &str, ptype: &str) -> &[Vec<String>] {
        self.sections
            .get(sec)
            .and_then(|ptypes| ptypes.get(ptype))
            .map(|rules| rules.as_slice())
            .unwrap_or(&[])
    }

    /// All policy types of a section with their rules, in key order.
    pub fn section<'a>(
        &'a self,
        sec: &str,
    ) -> impl Iterator<Item = (&'a str, &'a [Vec<String>])> + 'a {
        self.sections
            .get(sec)
            .into_iter()
            .flat_map(|ptypes| ptypes.iter().map(|(p, rules)| (p.as_str(), rules.as_slice())))
    }

    /// Total number of rules across all sections.
    pub fn len(&self) -> usize {
        self.sections
            .values()
            .flat_map(|ptypes| ptypes.values())
            .map(|rules| rules.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.sections.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_add_tuple_derives_section_from_ptype() {
        let mut model = PolicyModel::new();
        model.add_tuple("p", rule(&["alice", "data1", "read"]));
        model.add_tuple("p2", rule(&["bob", "data2"]));
        model.add_tuple("g", rule(&["alice", "admin"]));

        assert_eq!(model.rules("p", "p").len(), 1);
        assert_eq!(model.rules("p", "p2").len(), 1);
        assert_eq!(model.rules("g", "g").len(), 1);
        assert_eq!(model.len(), 3);
    }

    #[test]
    fn test_rules_for_unknown_type_is_empty() {
        let model = PolicyModel::new();
        assert!(model.rules("p", "p").is_empty());
        assert!(model.is_empty());
    }

    #[test]
    fn test_section_iterates_types_in_key_order() {
        let mut model = PolicyModel::new();
        model.add_tuple("p2", rule(&["x"]));
        model.add_tuple("p", rule(&["y"]));

        let ptypes: Vec<&str> = model.section("p").map(|(p, _)| p).collect();
        assert_eq!(ptypes, vec!["p", "p2"]);
        assert_eq!(model.section("g").count(), 0);
    }

    #[test]
    fn test_clear_empties_every_section() {
        let mut model = PolicyModel::new();
        model.add_tuple("p", rule(&["alice", "data1", "read"]));
        model.add_tuple("g", rule(&["alice", "admin"]));
        model.clear();
        assert!(model.is_empty());
        assert!(model.rules("g", "g").is_empty());
    }
}
