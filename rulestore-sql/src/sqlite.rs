//! Bundled SQLite executor.
//!
//! The reference `PolicyDb` implementation and the test vehicle for the
//! whole crate. One `rusqlite::Connection`, immediate-mode transactions.

use std::path::Path;
use std::time::Duration;

use rulestore_core::{StoreError, StoreResult};
use rusqlite::Connection;

use crate::db::{BindArg, PolicyDb};
use crate::row::{RuleRow, MAX_FIELDS};

/// Convert a driver error into the shared error currency.
fn drv(e: impl std::fmt::Display) -> StoreError {
    StoreError::Driver {
        message: e.to_string(),
    }
}

/// `PolicyDb` over a single `rusqlite::Connection`.
#[derive(Debug)]
pub struct SqliteDb {
    conn: Connection,
}

impl SqliteDb {
    /// Open a file-backed database. Applies a 5 s busy timeout so a
    /// second handle on the same file waits instead of failing.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path).map_err(drv)?;
        conn.busy_timeout(Duration::from_secs(5)).map_err(drv)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(drv)?;
        Ok(Self { conn })
    }

    /// Wrap a connection the caller configured themselves.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Hand the connection back.
    pub fn into_connection(self) -> Connection {
        self.conn
    }
}

impl PolicyDb for SqliteDb {
    fn driver_name(&self) -> &str {
        "sqlite"
    }

    fn ping(&mut self) -> StoreResult<()> {
        self.conn
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map(|_| ())
            .map_err(drv)
    }

    fn execute(&mut self, sql: &str, args: &[BindArg]) -> StoreResult<u64> {
        self.conn
            .execute(sql, rusqlite::params_from_iter(args.iter()))
            .map(|n| n as u64)
            .map_err(drv)
    }

    fn query(&mut self, sql: &str, args: &[BindArg]) -> StoreResult<Vec<RuleRow>> {
        let mut stmt = self.conn.prepare_cached(sql).map_err(drv)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(args.iter()), |row| {
                let mut values: [Option<String>; MAX_FIELDS] = Default::default();
                for (i, slot) in values.iter_mut().enumerate() {
                    *slot = row.get(i + 1)?;
                }
                Ok(RuleRow {
                    ptype: row.get(0)?,
                    values,
                })
            })
            .map_err(drv)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(drv)?);
        }
        Ok(result)
    }

    fn probe(&mut self, sql: &str) -> StoreResult<()> {
        // prepare alone fails on a missing table; stepping once covers
        // engines that defer name resolution to execution.
        let mut stmt = self.conn.prepare(sql).map_err(drv)?;
        let mut rows = stmt.query([]).map_err(drv)?;
        rows.next().map(|_| ()).map_err(drv)
    }

    fn begin(&mut self) -> StoreResult<()> {
        self.conn.execute_batch("BEGIN IMMEDIATE").map_err(drv)
    }

    fn commit(&mut self) -> StoreResult<()> {
        self.conn.execute_batch("COMMIT").map_err(drv)
    }

    fn rollback(&mut self) -> StoreResult<()> {
        self.conn.execute_batch("ROLLBACK").map_err(drv)
    }
}
