//! # rulestore-sql
//!
//! SQL persistence for policy rules. One seven-column table holds every
//! rule (`p_type`, `v0`..`v5`); this crate translates between that shape
//! and the in-memory [`rulestore_core::PolicyModel`], generating
//! dialect-correct statements for SQLite, MySQL, Postgres, SQL Server,
//! Oracle, and a plain ANSI fallback.
//!
//! A bundled SQLite executor backs the tests and small deployments;
//! any other database plugs in through the [`PolicyDb`] trait.

pub mod adapter;
pub mod builder;
pub mod db;
pub mod dialect;
pub mod row;
pub mod sqlite;

mod txn;

pub use adapter::{AdapterOptions, SqlAdapter, DEFAULT_TABLE};
pub use db::{BindArg, PolicyDb};
pub use dialect::{Dialect, Placeholder, StatementSet};
pub use row::{RuleRow, COLUMNS, MAX_FIELDS};
pub use sqlite::SqliteDb;
