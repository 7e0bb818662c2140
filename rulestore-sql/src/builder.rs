//! Runtime statement composition for the variable-shape operations:
//! partial-field deletes, filtered selects with IN-lists, and
//! old-row/new-row updates.
//!
//! Statements are composed with neutral `?` markers and rebound to the
//! dialect's style as the last step, so the data-dependent marker count
//! from IN-list expansion numbers correctly.

use rulestore_core::{PolicyFilter, StoreError, StoreResult};

use crate::db::BindArg;
use crate::dialect::StatementSet;
use crate::row::{RuleRow, COLUMNS, MAX_FIELDS};

/// A composed statement: final SQL text plus its arguments in order.
pub type BuiltStatement = (String, Vec<BindArg>);

/// Composes statements against one dialect's catalog.
pub struct StatementBuilder<'a> {
    stmts: &'a StatementSet,
}

impl<'a> StatementBuilder<'a> {
    pub fn new(stmts: &'a StatementSet) -> Self {
        Self { stmts }
    }

    /// DELETE matching a rule's non-empty fields.
    ///
    /// Empty fields impose no constraint (a documented limitation of
    /// the row scheme: they are indistinguishable from padding). The
    /// type column is always part of the predicate; a request with an
    /// empty type and no non-empty field is refused rather than let a
    /// degenerate predicate touch the whole type space.
    pub fn delete_by_rule(&self, ptype: &str, rule: &[String]) -> StoreResult<BuiltStatement> {
        let row = RuleRow::from_rule(ptype, rule)?;
        if row.is_full() {
            // All seven columns present: the fixed exact-match
            // statement applies on every dialect.
            return Ok((
                self.stmts.delete_exact.clone(),
                row.bind_args(self.stmts.dialect),
            ));
        }

        let mut sql = self.stmts.delete_where_base.clone();
        let mut args: Vec<BindArg> = vec![Some(ptype.to_string())];
        for (idx, field) in rule.iter().enumerate() {
            if !field.is_empty() {
                sql.push_str(&format!(" AND v{idx} = ?"));
                args.push(Some(field.clone()));
            }
        }
        if ptype.is_empty() && args.len() == 1 {
            return Err(StoreError::NoCriteria);
        }
        Ok((self.rebind(&sql), args))
    }

    /// DELETE over a column subrange: `field_values[i]` constrains
    /// column `field_index + i`.
    pub fn delete_by_field_range(
        &self,
        ptype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> StoreResult<BuiltStatement> {
        let (clauses, clause_args) = range_clauses(field_index, field_values);
        if ptype.is_empty() && clause_args.is_empty() {
            return Err(StoreError::NoCriteria);
        }
        let mut sql = self.stmts.delete_where_base.clone();
        sql.push_str(&clauses);
        let mut args: Vec<BindArg> = vec![Some(ptype.to_string())];
        args.extend(clause_args);
        Ok((self.rebind(&sql), args))
    }

    /// SELECT with the same subrange predicate as
    /// [`delete_by_field_range`](Self::delete_by_field_range); reads
    /// the rows a filtered update is about to displace.
    pub fn select_by_field_range(
        &self,
        ptype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> StoreResult<BuiltStatement> {
        let (clauses, clause_args) = range_clauses(field_index, field_values);
        if ptype.is_empty() && clause_args.is_empty() {
            return Err(StoreError::NoCriteria);
        }
        let mut sql = self.stmts.select_where_base.clone();
        sql.push_str("p_type = ?");
        sql.push_str(&clauses);
        let mut args: Vec<BindArg> = vec![Some(ptype.to_string())];
        args.extend(clause_args);
        Ok((self.rebind(&sql), args))
    }

    /// SELECT matching a per-column candidate filter.
    ///
    /// One candidate compiles to `col = ?`, several to `col IN (...)`;
    /// columns with no candidates add nothing. The all-empty filter is
    /// the full table scan, catalog text unchanged.
    pub fn select_by_filter(&self, filter: &PolicyFilter) -> BuiltStatement {
        if filter.is_empty() {
            return (self.stmts.select_all.clone(), Vec::new());
        }

        let mut sql = self.stmts.select_where_base.clone();
        let mut args: Vec<BindArg> = Vec::new();
        let mut first = true;
        for (col, candidates) in COLUMNS.iter().zip(filter.value_sets()) {
            if candidates.is_empty() {
                continue;
            }
            if !first {
                sql.push_str(" AND ");
            }
            first = false;
            if candidates.len() == 1 {
                sql.push_str(&format!("{col} = ?"));
                args.push(Some(candidates[0].clone()));
            } else {
                let marks = vec!["?"; candidates.len()].join(", ");
                sql.push_str(&format!("{col} IN ({marks})"));
                args.extend(candidates.iter().map(|c| Some(c.clone())));
            }
        }
        (self.rebind(&sql), args)
    }

    /// UPDATE rewriting the row that matches `old` to hold `new`.
    ///
    /// Backends padding with `''` take the fixed full-width statement.
    /// The NULL-padding backend needs `IS NULL` for absent old fields,
    /// because `col = NULL` matches nothing; its WHERE side is composed.
    pub fn update_by_rows(&self, old: &RuleRow, new: &RuleRow) -> BuiltStatement {
        let dialect = self.stmts.dialect;
        if !dialect.null_absent() {
            let mut args = new.bind_args(dialect);
            args.extend(old.bind_args(dialect));
            return (self.stmts.update_exact.clone(), args);
        }

        let mut sql = self.stmts.update_set_base.clone();
        let mut args = new.bind_args(dialect);
        sql.push_str("p_type = ?");
        args.push(Some(old.ptype.clone()));
        for (idx, value) in old.values.iter().enumerate() {
            match value {
                Some(text) => {
                    sql.push_str(&format!(" AND v{idx} = ?"));
                    args.push(Some(text.clone()));
                }
                None => sql.push_str(&format!(" AND v{idx} IS NULL")),
            }
        }
        (self.rebind(&sql), args)
    }

    fn rebind(&self, sql: &str) -> String {
        self.stmts.dialect.placeholder().rebind(sql)
    }
}

/// `AND v{i} = ?` for each non-empty in-range value. Values whose
/// column would land past v5 are ignored, matching the fixed 0..6
/// column loop this scheme has always had.
fn range_clauses(field_index: usize, field_values: &[String]) -> (String, Vec<BindArg>) {
    let mut clauses = String::new();
    let mut args: Vec<BindArg> = Vec::new();
    for (offset, value) in field_values.iter().enumerate() {
        let col = field_index + offset;
        if col >= MAX_FIELDS {
            break;
        }
        if !value.is_empty() {
            clauses.push_str(&format!(" AND v{col} = ?"));
            args.push(Some(value.clone()));
        }
    }
    (clauses, args)
}
