//! The SQL policy adapter: the facade an authorization engine drives.
//!
//! Owns the executor, the dialect resolved once at construction, the
//! statement catalog for its table, and the filtered-load flag.
//! Implements all four storage contracts from `rulestore-core`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use rulestore_core::{
    BatchPolicyAdapter, FilteredPolicyAdapter, PolicyAdapter, PolicyFilter, PolicyModel,
    StoreError, StoreResult, UpdatablePolicyAdapter,
};

use crate::builder::StatementBuilder;
use crate::db::PolicyDb;
use crate::dialect::{Dialect, StatementSet};
use crate::row::RuleRow;
use crate::txn;

/// Table used when none is configured.
pub const DEFAULT_TABLE: &str = "policy_rules";

/// Construction-time settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterOptions {
    /// Rule table name; [`DEFAULT_TABLE`] when `None`.
    pub table_name: Option<String>,
    /// Fail construction on an unrecognized driver name instead of
    /// falling back to the ANSI statement set.
    pub strict_dialect: bool,
}

/// Wrap a driver error with the failing action's name.
fn wrap(action: &'static str, source: StoreError) -> StoreError {
    StoreError::Statement {
        action,
        message: source.to_string(),
    }
}

/// Encode the model's "p" and "g" sections into rows, section order
/// first, policy-type order within.
fn encode_model(model: &PolicyModel) -> StoreResult<Vec<RuleRow>> {
    let mut rows = Vec::with_capacity(model.len());
    for sec in ["p", "g"] {
        for (ptype, rules) in model.section(sec) {
            for rule in rules {
                rows.push(RuleRow::from_rule(ptype, rule)?);
            }
        }
    }
    Ok(rows)
}

/// SQL persistence for policy rules over any [`PolicyDb`] executor.
#[derive(Debug)]
pub struct SqlAdapter<C: PolicyDb> {
    db: C,
    stmts: StatementSet,
    filtered: bool,
}

impl<C: PolicyDb> SqlAdapter<C> {
    /// Connect with defaults: the [`DEFAULT_TABLE`] name, ANSI fallback
    /// for unrecognized drivers.
    pub fn new(db: C) -> StoreResult<Self> {
        Self::with_options(db, AdapterOptions::default())
    }

    /// Connect against a specific table.
    pub fn with_table(db: C, table: impl Into<String>) -> StoreResult<Self> {
        Self::with_options(
            db,
            AdapterOptions {
                table_name: Some(table.into()),
                ..AdapterOptions::default()
            },
        )
    }

    /// Connect with explicit options. Pings the database, resolves the
    /// dialect from the driver name, validates the table name, and
    /// creates the table and index when the existence probe fails.
    pub fn with_options(mut db: C, options: AdapterOptions) -> StoreResult<Self> {
        db.ping().map_err(|e| StoreError::Unreachable {
            message: e.to_string(),
        })?;

        let driver = db.driver_name().to_string();
        let dialect = match Dialect::from_driver(&driver) {
            Some(dialect) => dialect,
            None if options.strict_dialect => {
                return Err(StoreError::UnsupportedDriver { driver });
            }
            None => {
                debug!(driver = %driver, "unrecognized driver, using ANSI statements");
                Dialect::Ansi
            }
        };

        let table = options.table_name.as_deref().unwrap_or(DEFAULT_TABLE);
        let stmts = StatementSet::build(dialect, table)?;

        let mut adapter = Self {
            db,
            stmts,
            filtered: false,
        };
        adapter.ensure_table()?;
        Ok(adapter)
    }

    /// The dialect resolved at construction.
    pub fn dialect(&self) -> Dialect {
        self.stmts.dialect
    }

    /// The validated, case-folded table name.
    pub fn table_name(&self) -> &str {
        &self.stmts.table
    }

    /// Hand the executor back.
    pub fn into_db(self) -> C {
        self.db
    }

    fn ensure_table(&mut self) -> StoreResult<()> {
        if self.db.probe(&self.stmts.probe).is_ok() {
            return Ok(());
        }
        debug!(table = %self.stmts.table, "rule table missing, creating");
        for ddl in &self.stmts.create_table {
            self.db
                .execute(ddl, &[])
                .map_err(|e| wrap("create table", e))?;
        }
        Ok(())
    }

    fn decode_into(model: &mut PolicyModel, rows: Vec<RuleRow>) {
        for row in rows {
            let (ptype, fields) = row.into_tuple();
            model.add_tuple(&ptype, fields);
        }
    }
}

impl<C: PolicyDb> PolicyAdapter for SqlAdapter<C> {
    fn load_policy(&mut self, model: &mut PolicyModel) -> StoreResult<()> {
        let rows = self
            .db
            .query(&self.stmts.select_all, &[])
            .map_err(|e| wrap("load policy", e))?;
        debug!(rules = rows.len(), "loaded policy rules");
        Self::decode_into(model, rows);
        self.filtered = false;
        Ok(())
    }

    fn save_policy(&mut self, model: &PolicyModel) -> StoreResult<()> {
        let rows = encode_model(model)?;
        debug!(rules = rows.len(), table = %self.stmts.table, "replacing policy set");
        txn::replace_all(&mut self.db, &self.stmts, &rows)
    }

    fn add_policy(&mut self, _sec: &str, ptype: &str, rule: &[String]) -> StoreResult<()> {
        let row = RuleRow::from_rule(ptype, rule)?;
        let args = row.bind_args(self.stmts.dialect);
        self.db
            .execute(&self.stmts.insert, &args)
            .map_err(|e| wrap("add policy", e))?;
        Ok(())
    }

    fn remove_policy(&mut self, _sec: &str, ptype: &str, rule: &[String]) -> StoreResult<()> {
        let (sql, args) = StatementBuilder::new(&self.stmts).delete_by_rule(ptype, rule)?;
        self.db
            .execute(&sql, &args)
            .map_err(|e| wrap("remove policy", e))?;
        Ok(())
    }

    fn remove_filtered_policy(
        &mut self,
        _sec: &str,
        ptype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> StoreResult<()> {
        let (sql, args) = StatementBuilder::new(&self.stmts).delete_by_field_range(
            ptype,
            field_index,
            field_values,
        )?;
        self.db
            .execute(&sql, &args)
            .map_err(|e| wrap("remove filtered policy", e))?;
        Ok(())
    }
}

impl<C: PolicyDb> FilteredPolicyAdapter for SqlAdapter<C> {
    fn load_filtered_policy(
        &mut self,
        model: &mut PolicyModel,
        filter: Option<&PolicyFilter>,
    ) -> StoreResult<()> {
        let filter = match filter {
            Some(filter) => filter,
            None => return self.load_policy(model),
        };
        let (sql, args) = StatementBuilder::new(&self.stmts).select_by_filter(filter);
        let rows = self
            .db
            .query(&sql, &args)
            .map_err(|e| wrap("load filtered policy", e))?;
        debug!(rules = rows.len(), "loaded filtered policy rules");
        Self::decode_into(model, rows);
        self.filtered = true;
        Ok(())
    }

    fn is_filtered(&self) -> bool {
        self.filtered
    }
}

impl<C: PolicyDb> BatchPolicyAdapter for SqlAdapter<C> {
    fn add_policies(&mut self, _sec: &str, ptype: &str, rules: &[Vec<String>]) -> StoreResult<()> {
        if rules.is_empty() {
            return Ok(());
        }
        let mut rows = Vec::with_capacity(rules.len());
        for rule in rules {
            rows.push(RuleRow::from_rule(ptype, rule)?);
        }
        txn::insert_batch(&mut self.db, &self.stmts, "add policies", &rows)
    }

    fn remove_policies(
        &mut self,
        _sec: &str,
        ptype: &str,
        rules: &[Vec<String>],
    ) -> StoreResult<()> {
        if rules.is_empty() {
            return Ok(());
        }
        let builder = StatementBuilder::new(&self.stmts);
        let mut statements = Vec::with_capacity(rules.len());
        for rule in rules {
            statements.push(builder.delete_by_rule(ptype, rule)?);
        }
        txn::execute_batch(&mut self.db, "remove policies", "delete rule", &statements)
    }
}

impl<C: PolicyDb> UpdatablePolicyAdapter for SqlAdapter<C> {
    fn update_policy(
        &mut self,
        _sec: &str,
        ptype: &str,
        old_rule: &[String],
        new_rule: &[String],
    ) -> StoreResult<()> {
        let old = RuleRow::from_rule(ptype, old_rule)?;
        let new = RuleRow::from_rule(ptype, new_rule)?;
        let (sql, args) = StatementBuilder::new(&self.stmts).update_by_rows(&old, &new);
        self.db
            .execute(&sql, &args)
            .map_err(|e| wrap("update policy", e))?;
        Ok(())
    }

    fn update_policies(
        &mut self,
        _sec: &str,
        ptype: &str,
        old_rules: &[Vec<String>],
        new_rules: &[Vec<String>],
    ) -> StoreResult<()> {
        if old_rules.len() != new_rules.len() {
            return Err(StoreError::RuleCountMismatch {
                old: old_rules.len(),
                new: new_rules.len(),
            });
        }
        if old_rules.is_empty() {
            return Ok(());
        }
        let builder = StatementBuilder::new(&self.stmts);
        let mut statements = Vec::with_capacity(old_rules.len());
        for (old_rule, new_rule) in old_rules.iter().zip(new_rules) {
            let old = RuleRow::from_rule(ptype, old_rule)?;
            let new = RuleRow::from_rule(ptype, new_rule)?;
            statements.push(builder.update_by_rows(&old, &new));
        }
        txn::execute_batch(&mut self.db, "update policies", "update rule", &statements)
    }

    fn update_filtered_policies(
        &mut self,
        _sec: &str,
        ptype: &str,
        new_rules: &[Vec<String>],
        field_index: usize,
        field_values: &[String],
    ) -> StoreResult<Vec<Vec<String>>> {
        let builder = StatementBuilder::new(&self.stmts);
        let select = builder.select_by_field_range(ptype, field_index, field_values)?;
        let delete = builder.delete_by_field_range(ptype, field_index, field_values)?;

        let mut rows = Vec::with_capacity(new_rules.len());
        for rule in new_rules {
            rows.push(RuleRow::from_rule(ptype, rule)?);
        }

        // Read the rows the predicate will displace before the
        // transaction opens, then swap inside it.
        let old_rows = self
            .db
            .query(&select.0, &select.1)
            .map_err(|e| wrap("update filtered policies", e))?;

        txn::delete_then_insert(
            &mut self.db,
            &self.stmts,
            "update filtered policies",
            &delete,
            &rows,
        )?;
        debug!(
            displaced = old_rows.len(),
            inserted = rows.len(),
            "updated filtered policies"
        );

        Ok(old_rows.into_iter().map(|row| row.into_tuple().1).collect())
    }
}
