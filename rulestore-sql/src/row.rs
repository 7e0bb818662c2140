//! The persisted rule row and its tuple codec.
//!
//! A rule of arity n (0..=6) maps onto a fixed-width row: `p_type` plus
//! six value columns, the trailing `6 - n` columns holding the
//! dialect's absent representation (empty string or SQL NULL).

use rulestore_core::{StoreError, StoreResult};

use crate::db::BindArg;
use crate::dialect::Dialect;

/// Columns of the rule table, in row order.
pub const COLUMNS: [&str; 7] = ["p_type", "v0", "v1", "v2", "v3", "v4", "v5"];

/// Most value fields a rule may carry.
pub const MAX_FIELDS: usize = 6;

/// One row of the rule table. `None` is the absent marker; whether it
/// round-trips distinct from `""` depends on the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleRow {
    pub ptype: String,
    pub values: [Option<String>; MAX_FIELDS],
}

impl RuleRow {
    /// Encode a policy tuple into a full-width row.
    pub fn from_rule(ptype: &str, rule: &[String]) -> StoreResult<Self> {
        if rule.len() > MAX_FIELDS {
            return Err(StoreError::TooManyFields {
                count: rule.len(),
                max: MAX_FIELDS,
            });
        }
        let mut values: [Option<String>; MAX_FIELDS] = Default::default();
        for (slot, field) in values.iter_mut().zip(rule.iter()) {
            *slot = Some(field.clone());
        }
        Ok(Self {
            ptype: ptype.to_string(),
            values,
        })
    }

    /// Bind arguments in column order; absent slots take the dialect's
    /// absent representation.
    pub fn bind_args(&self, dialect: Dialect) -> Vec<BindArg> {
        let mut args = Vec::with_capacity(COLUMNS.len());
        args.push(Some(self.ptype.clone()));
        for value in &self.values {
            args.push(match value {
                Some(text) => Some(text.clone()),
                None if dialect.null_absent() => None,
                None => Some(String::new()),
            });
        }
        args
    }

    /// Decode back into `(ptype, fields)`.
    ///
    /// Reconstruction stops at the first absent or empty column; later
    /// columns are dropped even if they hold text. Backends that store
    /// absent fields as `''` cannot tell the two apart, so empty and
    /// absent collapse here for every backend alike.
    pub fn into_tuple(self) -> (String, Vec<String>) {
        let mut fields = Vec::new();
        for value in self.values {
            match value {
                Some(text) if !text.is_empty() => fields.push(text),
                _ => break,
            }
        }
        (self.ptype, fields)
    }

    /// True when every value slot holds non-empty text. Full rows match
    /// the catalog's fixed exact-match statements.
    pub(crate) fn is_full(&self) -> bool {
        self.values
            .iter()
            .all(|v| v.as_deref().is_some_and(|s| !s.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_round_trip_all_arities() {
        let full = ["alice", "data1", "read", "allow", "tenant1", "v5x"];
        for arity in 0..=MAX_FIELDS {
            let fields = rule(&full[..arity]);
            let row = RuleRow::from_rule("p", &fields).unwrap();
            let (ptype, decoded) = row.into_tuple();
            assert_eq!(ptype, "p");
            assert_eq!(decoded, fields, "arity {arity} must round-trip");
        }
    }

    #[test]
    fn test_seven_fields_is_rejected() {
        let fields = rule(&["a", "b", "c", "d", "e", "f", "g"]);
        let err = RuleRow::from_rule("p", &fields).unwrap_err();
        assert!(matches!(
            err,
            StoreError::TooManyFields { count: 7, max: 6 }
        ));
    }

    #[test]
    fn test_decode_truncates_at_first_empty_field() {
        // Legacy semantics: the gap hides everything after it.
        let row = RuleRow::from_rule("p", &rule(&["alice", "", "read"])).unwrap();
        let (_, decoded) = row.into_tuple();
        assert_eq!(decoded, rule(&["alice"]));
    }

    #[test]
    fn test_decode_truncates_at_first_null_column() {
        let row = RuleRow {
            ptype: "g".to_string(),
            values: [
                Some("alice".to_string()),
                None,
                Some("ghost".to_string()),
                None,
                None,
                None,
            ],
        };
        let (_, decoded) = row.into_tuple();
        assert_eq!(decoded, rule(&["alice"]));
    }

    #[test]
    fn test_bind_args_pad_with_empty_string() {
        let row = RuleRow::from_rule("p", &rule(&["alice", "data1"])).unwrap();
        let args = row.bind_args(Dialect::Ansi);
        assert_eq!(args.len(), 7);
        assert_eq!(args[0].as_deref(), Some("p"));
        assert_eq!(args[2].as_deref(), Some("data1"));
        assert_eq!(args[3].as_deref(), Some(""));
        assert_eq!(args[6].as_deref(), Some(""));
    }

    #[test]
    fn test_bind_args_pad_with_null_on_oracle() {
        let row = RuleRow::from_rule("p", &rule(&["alice", "data1"])).unwrap();
        let args = row.bind_args(Dialect::Oracle);
        assert_eq!(args[2].as_deref(), Some("data1"));
        assert_eq!(args[3], None);
        assert_eq!(args[6], None);
    }
}
