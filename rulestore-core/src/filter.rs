//! Per-column filter for partial policy loads.

use serde::{Deserialize, Serialize};

/// Candidate value sets for each column of the rule table.
///
/// An empty set places no constraint on its column; a filter with every
/// set empty matches the whole table. Within one column the candidates
/// are OR-ed, across columns the constraints are AND-ed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyFilter {
    pub ptype: Vec<String>,
    pub v0: Vec<String>,
    pub v1: Vec<String>,
    pub v2: Vec<String>,
    pub v3: Vec<String>,
    pub v4: Vec<String>,
    pub v5: Vec<String>,
}

impl PolicyFilter {
    /// True when no column carries a constraint.
    pub fn is_empty(&self) -> bool {
        self.value_sets().iter().all(|set| set.is_empty())
    }

    /// The candidate sets in table column order: p_type, v0..v5.
    pub fn value_sets(&self) -> [&[String]; 7] {
        [
            &self.ptype,
            &self.v0,
            &self.v1,
            &self.v2,
            &self.v3,
            &self.v4,
            &self.v5,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_is_empty() {
        assert!(PolicyFilter::default().is_empty());
    }

    #[test]
    fn test_any_populated_column_makes_it_non_empty() {
        let filter = PolicyFilter {
            v4: vec!["tenant1".to_string()],
            ..Default::default()
        };
        assert!(!filter.is_empty());
        assert_eq!(filter.value_sets()[5], ["tenant1".to_string()]);
    }

    #[test]
    fn test_partial_json_parses_with_defaults() {
        let filter: PolicyFilter = serde_json::from_str(r#"{"v0": ["alice", "bob"]}"#).unwrap();
        assert_eq!(filter.v0.len(), 2);
        assert!(filter.ptype.is_empty());
        assert!(filter.v5.is_empty());
    }
}
