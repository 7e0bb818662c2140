//! Transactional batches: begin, run every step, commit; any failing
//! step rolls the whole batch back.
//!
//! Errors name the failing step. A rollback that itself fails is the
//! one condition where table state is unknown, and it keeps both
//! errors (`StoreError::RollbackFailed`).

use tracing::warn;

use rulestore_core::{StoreError, StoreResult};

use crate::builder::BuiltStatement;
use crate::db::PolicyDb;
use crate::dialect::StatementSet;
use crate::row::RuleRow;

/// A failing step inside a batch.
pub(crate) struct StepError {
    step: String,
    source: StoreError,
}

impl StepError {
    fn new(step: impl Into<String>, source: StoreError) -> Self {
        Self {
            step: step.into(),
            source,
        }
    }
}

/// Begin, run the body, commit. The first failure (including a failing
/// commit) triggers a rollback and surfaces as `Aborted`; a rollback
/// failure on top becomes `RollbackFailed`.
fn in_transaction<T, F>(db: &mut dyn PolicyDb, action: &'static str, body: F) -> StoreResult<T>
where
    F: FnOnce(&mut dyn PolicyDb) -> Result<T, StepError>,
{
    db.begin().map_err(|e| StoreError::Statement {
        action,
        message: e.to_string(),
    })?;

    let failed = match body(db) {
        Ok(value) => match db.commit() {
            Ok(()) => return Ok(value),
            Err(e) => StepError::new("commit", e),
        },
        Err(step_error) => step_error,
    };

    warn!(action, step = %failed.step, "batch failed, rolling back");
    match db.rollback() {
        Ok(()) => Err(StoreError::Aborted {
            action,
            step: failed.step,
            message: failed.source.to_string(),
        }),
        Err(rollback_error) => Err(StoreError::RollbackFailed {
            action,
            step: failed.step,
            message: failed.source.to_string(),
            rollback: rollback_error.to_string(),
        }),
    }
}

fn insert_rows(
    db: &mut dyn PolicyDb,
    stmts: &StatementSet,
    rows: &[RuleRow],
) -> Result<(), StepError> {
    for (idx, row) in rows.iter().enumerate() {
        let args = row.bind_args(stmts.dialect);
        db.execute(&stmts.insert, &args)
            .map_err(|e| StepError::new(format!("insert rule {}", idx + 1), e))?;
    }
    Ok(())
}

/// Clear the table and insert every row. The clear statement is the
/// dialect's transaction-safe one, so nothing survives a failure.
pub(crate) fn replace_all(
    db: &mut dyn PolicyDb,
    stmts: &StatementSet,
    rows: &[RuleRow],
) -> StoreResult<()> {
    in_transaction(db, "save policy", |db| {
        db.execute(&stmts.clear, &[])
            .map_err(|e| StepError::new("clear table", e))?;
        insert_rows(db, stmts, rows)
    })
}

/// Insert a batch of rows, all or none.
pub(crate) fn insert_batch(
    db: &mut dyn PolicyDb,
    stmts: &StatementSet,
    action: &'static str,
    rows: &[RuleRow],
) -> StoreResult<()> {
    in_transaction(db, action, |db| insert_rows(db, stmts, rows))
}

/// Run pre-built statements, one step each, all or none.
pub(crate) fn execute_batch(
    db: &mut dyn PolicyDb,
    action: &'static str,
    step_noun: &'static str,
    statements: &[BuiltStatement],
) -> StoreResult<()> {
    in_transaction(db, action, |db| {
        for (idx, (sql, args)) in statements.iter().enumerate() {
            db.execute(sql, args)
                .map_err(|e| StepError::new(format!("{step_noun} {}", idx + 1), e))?;
        }
        Ok(())
    })
}

/// Delete by a pre-built predicate, then insert the replacement rows.
/// The caller reads the displaced rows before opening the transaction.
pub(crate) fn delete_then_insert(
    db: &mut dyn PolicyDb,
    stmts: &StatementSet,
    action: &'static str,
    delete: &BuiltStatement,
    rows: &[RuleRow],
) -> StoreResult<()> {
    in_transaction(db, action, |db| {
        db.execute(&delete.0, &delete.1)
            .map_err(|e| StepError::new("delete old rules", e))?;
        insert_rows(db, stmts, rows)
    })
}
