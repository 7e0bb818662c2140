//! Per-backend SQL: dialect resolution, placeholder styles, and the
//! statement catalog.
//!
//! Everything that differs between backends is decided here, once, at
//! adapter construction: placeholder syntax, the absent-field
//! representation, DDL shape, identifier case folding, and which clear
//! statement is safe inside a transaction. Nothing downstream switches
//! on the backend again.

use rulestore_core::{StoreError, StoreResult};

use crate::row::COLUMNS;

// ─── Dialect ─────────────────────────────────────────────────────────

/// A supported SQL backend.
///
/// Resolved from the executor's self-reported driver name; unrecognized
/// drivers use `Ansi`, the plain `?`-placeholder variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Ansi,
    Sqlite,
    Mysql,
    Postgres,
    SqlServer,
    Oracle,
}

impl Dialect {
    /// Map a driver name to its dialect. Accepts the aliases the usual
    /// drivers register under; returns `None` for anything else so the
    /// caller can choose between fallback and strict rejection.
    pub fn from_driver(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            "mysql" | "mariadb" => Some(Self::Mysql),
            "postgres" | "postgresql" | "pgx" => Some(Self::Postgres),
            "sqlserver" | "mssql" => Some(Self::SqlServer),
            "oracle" | "oci8" | "ora" | "godror" => Some(Self::Oracle),
            _ => None,
        }
    }

    /// The placeholder syntax this backend expects.
    pub fn placeholder(self) -> Placeholder {
        match self {
            Self::Postgres => Placeholder::Dollar,
            Self::SqlServer => Placeholder::AtP,
            Self::Oracle => Placeholder::ColonArg,
            _ => Placeholder::Question,
        }
    }

    /// Whether absent value fields persist as SQL NULL. Oracle treats
    /// `''` and NULL as the same value, so it gets nullable columns and
    /// NULL padding; every other backend stores `''`.
    pub fn null_absent(self) -> bool {
        matches!(self, Self::Oracle)
    }

    /// Whether unquoted identifiers fold to upper case on this backend.
    pub fn uppercase_identifiers(self) -> bool {
        matches!(self, Self::Oracle)
    }

    /// Validate a table identifier and apply the dialect's case folding.
    ///
    /// Table names are interpolated into statement text (identifiers
    /// cannot be bound), so only plain names are admitted: a letter or
    /// underscore, then letters, digits, or underscores, 64 bytes max.
    pub fn table_name(self, name: &str) -> StoreResult<String> {
        let invalid = |reason| {
            Err(StoreError::InvalidTableName {
                name: name.to_string(),
                reason,
            })
        };
        if name.is_empty() {
            return invalid("must not be empty");
        }
        if name.len() > 64 {
            return invalid("longer than 64 characters");
        }
        let mut chars = name.chars();
        let first_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !first_ok || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return invalid("only [A-Za-z_][A-Za-z0-9_]* is accepted");
        }
        if self.uppercase_identifiers() {
            Ok(name.to_ascii_uppercase())
        } else {
            Ok(name.to_string())
        }
    }
}

// ─── Placeholders ────────────────────────────────────────────────────

/// Bind parameter syntax, per backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// `?` — driver-neutral positional markers.
    Question,
    /// `$1`, `$2`, ... (PostgreSQL).
    Dollar,
    /// `@p1`, `@p2`, ... (SQL Server).
    AtP,
    /// `:arg1`, `:arg2`, ... (Oracle named parameters).
    ColonArg,
}

impl Placeholder {
    /// Rewrite neutral `?` markers into this style, numbered left to
    /// right from 1. Runs after composition because IN-list expansion
    /// makes the marker count data-dependent. Statement templates never
    /// contain a literal `?`, so a linear scan is enough.
    pub fn rebind(self, sql: &str) -> String {
        let prefix = match self {
            Placeholder::Question => return sql.to_string(),
            Placeholder::Dollar => "$",
            Placeholder::AtP => "@p",
            Placeholder::ColonArg => ":arg",
        };
        let mut out = String::with_capacity(sql.len() + 16);
        let mut n = 0usize;
        for ch in sql.chars() {
            if ch == '?' {
                n += 1;
                out.push_str(prefix);
                out.push_str(&n.to_string());
            } else {
                out.push(ch);
            }
        }
        out
    }
}

// ─── Statement catalog ───────────────────────────────────────────────

/// Every statement the adapter runs against one table, materialized for
/// one dialect.
///
/// Fixed-arity statements are already rebound to the dialect's
/// placeholder style. The `*_base` fields stay in neutral `?` form:
/// the statement builder appends clauses to them and rebinds the
/// composed text as a whole.
#[derive(Debug, Clone)]
pub struct StatementSet {
    pub dialect: Dialect,
    /// Validated, case-folded table name.
    pub table: String,
    /// DDL run when the existence probe fails: table, then index
    /// (MySQL inlines the index into the CREATE TABLE).
    pub create_table: Vec<String>,
    /// Existence probe; any error means the table is missing.
    pub probe: String,
    pub insert: String,
    /// Table clear that stays inside the replace-all transaction.
    /// TRUNCATE only where it is transactional (PostgreSQL, SQL
    /// Server); DELETE FROM elsewhere.
    pub clear: String,
    /// Exact match over all seven columns.
    pub delete_exact: String,
    /// All seven SET columns, all seven WHERE columns.
    pub update_exact: String,
    pub select_all: String,
    /// `DELETE .. WHERE p_type = ?` — dynamic deletes extend this.
    pub delete_where_base: String,
    /// `SELECT .. WHERE ` — filtered selects extend this.
    pub select_where_base: String,
    /// `UPDATE .. SET <all columns> WHERE ` — composed updates extend
    /// this when the WHERE side needs IS NULL matching.
    pub update_set_base: String,
}

impl StatementSet {
    /// Validate the table name and materialize the statement catalog.
    /// Called once at adapter construction.
    pub fn build(dialect: Dialect, table: &str) -> StoreResult<Self> {
        let table = dialect.table_name(table)?;
        let ph = dialect.placeholder();

        let cols = COLUMNS.join(", ");
        let marks = vec!["?"; COLUMNS.len()].join(", ");
        let exact = COLUMNS
            .map(|c| format!("{c} = ?"))
            .join(" AND ");
        let set_list = COLUMNS
            .map(|c| format!("{c} = ?"))
            .join(", ");

        Ok(Self {
            create_table: create_table_ddl(dialect, &table),
            probe: format!("SELECT 1 FROM {table}"),
            insert: ph.rebind(&format!(
                "INSERT INTO {table} ({cols}) VALUES ({marks})"
            )),
            clear: clear_sql(dialect, &table),
            delete_exact: ph.rebind(&format!("DELETE FROM {table} WHERE {exact}")),
            update_exact: ph.rebind(&format!(
                "UPDATE {table} SET {set_list} WHERE {exact}"
            )),
            select_all: format!("SELECT {cols} FROM {table}"),
            delete_where_base: format!("DELETE FROM {table} WHERE p_type = ?"),
            select_where_base: format!("SELECT {cols} FROM {table} WHERE "),
            update_set_base: format!("UPDATE {table} SET {set_list} WHERE "),
            dialect,
            table,
        })
    }
}

/// Column definition list for the CREATE TABLE body.
fn column_defs(ptype_type: &str, value_type: &str, constraint: &str) -> String {
    let mut defs = Vec::with_capacity(COLUMNS.len());
    defs.push(format!("p_type {ptype_type}{constraint}"));
    for col in &COLUMNS[1..] {
        defs.push(format!("{col} {value_type}{constraint}"));
    }
    defs.join(", ")
}

fn create_table_ddl(dialect: Dialect, table: &str) -> Vec<String> {
    let index = format!("idx_{table}_p_type_v0_v1");
    let not_null = " NOT NULL DEFAULT ''";
    match dialect {
        Dialect::Ansi => vec![
            format!(
                "CREATE TABLE {table} ({})",
                column_defs("varchar(32)", "varchar(255)", not_null)
            ),
            format!("CREATE INDEX {index} ON {table} (p_type, v0, v1)"),
        ],
        Dialect::Sqlite => vec![
            format!(
                "CREATE TABLE IF NOT EXISTS {table} ({})",
                column_defs("varchar(32)", "varchar(255)", not_null)
            ),
            format!("CREATE INDEX IF NOT EXISTS {index} ON {table} (p_type, v0, v1)"),
        ],
        Dialect::Mysql => vec![format!(
            "CREATE TABLE IF NOT EXISTS {table} ({}, INDEX {index} (p_type, v0, v1)) \
             ENGINE = InnoDB DEFAULT CHARSET = utf8mb4",
            column_defs("varchar(32)", "varchar(255)", not_null)
        )],
        Dialect::Postgres => vec![
            format!(
                "CREATE TABLE IF NOT EXISTS {table} ({})",
                column_defs("varchar(32)", "varchar(255)", not_null)
            ),
            format!("CREATE INDEX IF NOT EXISTS {index} ON {table} (p_type, v0, v1)"),
        ],
        Dialect::SqlServer => vec![
            format!(
                "CREATE TABLE {table} ({})",
                column_defs("nvarchar(32)", "nvarchar(255)", not_null)
            ),
            format!("CREATE INDEX {index} ON {table} (p_type, v0, v1)"),
        ],
        // Oracle keeps the columns nullable: '' and NULL are the same
        // value there, so a NOT NULL DEFAULT '' column could never hold
        // an absent field.
        Dialect::Oracle => vec![
            format!(
                "CREATE TABLE {table} ({})",
                column_defs("NVARCHAR2(32)", "NVARCHAR2(255)", "")
            ),
            format!("CREATE INDEX {index} ON {table} (p_type, v0, v1)"),
        ],
    }
}

fn clear_sql(dialect: Dialect, table: &str) -> String {
    match dialect {
        // Transactional TRUNCATE.
        Dialect::Postgres | Dialect::SqlServer => format!("TRUNCATE TABLE {table}"),
        // TRUNCATE either implies a commit (MySQL, Oracle) or does not
        // exist (SQLite); the clear must roll back with the batch.
        _ => format!("DELETE FROM {table}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_name_aliases_resolve() {
        assert_eq!(Dialect::from_driver("sqlite3"), Some(Dialect::Sqlite));
        assert_eq!(Dialect::from_driver("SQLite"), Some(Dialect::Sqlite));
        assert_eq!(Dialect::from_driver("mariadb"), Some(Dialect::Mysql));
        assert_eq!(Dialect::from_driver("pgx"), Some(Dialect::Postgres));
        assert_eq!(Dialect::from_driver("mssql"), Some(Dialect::SqlServer));
        assert_eq!(Dialect::from_driver("godror"), Some(Dialect::Oracle));
        assert_eq!(Dialect::from_driver("couchbase"), None);
    }

    #[test]
    fn test_rebind_styles() {
        let sql = "INSERT INTO t (a, b) VALUES (?, ?)";
        assert_eq!(Placeholder::Question.rebind(sql), sql);
        assert_eq!(
            Placeholder::Dollar.rebind(sql),
            "INSERT INTO t (a, b) VALUES ($1, $2)"
        );
        assert_eq!(
            Placeholder::AtP.rebind(sql),
            "INSERT INTO t (a, b) VALUES (@p1, @p2)"
        );
        assert_eq!(
            Placeholder::ColonArg.rebind(sql),
            "INSERT INTO t (a, b) VALUES (:arg1, :arg2)"
        );
    }

    #[test]
    fn test_rebind_numbers_double_digits() {
        let sql = vec!["?"; 12].join(", ");
        let rebound = Placeholder::Dollar.rebind(&sql);
        assert!(rebound.ends_with("$11, $12"));
    }

    #[test]
    fn test_table_name_validation() {
        assert_eq!(
            Dialect::Ansi.table_name("policy_rules").unwrap(),
            "policy_rules"
        );
        assert_eq!(Dialect::Ansi.table_name("_t1").unwrap(), "_t1");

        for bad in ["", "1table", "my rules", "t;DROP TABLE x", "t-name", "t\"x"] {
            let err = Dialect::Ansi.table_name(bad).unwrap_err();
            assert!(
                matches!(err, StoreError::InvalidTableName { .. }),
                "{bad:?} must be rejected"
            );
        }

        let long = "t".repeat(65);
        assert!(Dialect::Ansi.table_name(&long).is_err());
    }

    #[test]
    fn test_oracle_uppercases_table_names() {
        assert_eq!(
            Dialect::Oracle.table_name("policy_rules").unwrap(),
            "POLICY_RULES"
        );
        assert_eq!(Dialect::Postgres.table_name("Policy").unwrap(), "Policy");
    }

    #[test]
    fn test_postgres_statements_use_dollar_markers() {
        let set = StatementSet::build(Dialect::Postgres, "policy_rules").unwrap();
        assert!(set.insert.ends_with("($1, $2, $3, $4, $5, $6, $7)"));
        assert!(set.delete_exact.contains("v5 = $7"));
        assert!(set.update_exact.contains("WHERE p_type = $8"));
        assert!(set.update_exact.ends_with("v5 = $14"));
        // Bases stay neutral for post-composition rebinding.
        assert!(set.delete_where_base.ends_with("p_type = ?"));
    }

    #[test]
    fn test_sqlserver_and_oracle_marker_styles() {
        let mssql = StatementSet::build(Dialect::SqlServer, "policy_rules").unwrap();
        assert!(mssql.insert.contains("@p7"));

        let oracle = StatementSet::build(Dialect::Oracle, "policy_rules").unwrap();
        assert!(oracle.insert.contains(":arg7"));
        assert_eq!(oracle.table, "POLICY_RULES");
        assert!(oracle.select_all.contains("FROM POLICY_RULES"));
    }

    #[test]
    fn test_mysql_create_is_one_statement_with_inline_index() {
        let set = StatementSet::build(Dialect::Mysql, "policy_rules").unwrap();
        assert_eq!(set.create_table.len(), 1);
        assert!(set.create_table[0].contains("INDEX idx_policy_rules_p_type_v0_v1"));
        assert!(set.create_table[0].contains("ENGINE = InnoDB"));
    }

    #[test]
    fn test_sqlite_ddl_is_idempotent() {
        let set = StatementSet::build(Dialect::Sqlite, "policy_rules").unwrap();
        assert_eq!(set.create_table.len(), 2);
        assert!(set.create_table[0].starts_with("CREATE TABLE IF NOT EXISTS"));
        assert!(set.create_table[1].starts_with("CREATE INDEX IF NOT EXISTS"));
    }

    #[test]
    fn test_oracle_columns_are_nullable() {
        let set = StatementSet::build(Dialect::Oracle, "policy_rules").unwrap();
        assert!(set.create_table[0].contains("NVARCHAR2(255)"));
        assert!(!set.create_table[0].contains("NOT NULL"));
    }

    #[test]
    fn test_clear_is_transaction_safe_per_dialect() {
        let truncating = [Dialect::Postgres, Dialect::SqlServer];
        for dialect in truncating {
            let set = StatementSet::build(dialect, "t").unwrap();
            assert!(set.clear.starts_with("TRUNCATE TABLE"), "{dialect:?}");
        }
        for dialect in [Dialect::Ansi, Dialect::Sqlite, Dialect::Mysql, Dialect::Oracle] {
            let set = StatementSet::build(dialect, "t").unwrap();
            assert!(set.clear.starts_with("DELETE FROM"), "{dialect:?}");
        }
    }

    #[test]
    fn test_select_lists_columns_explicitly() {
        let set = StatementSet::build(Dialect::Ansi, "t").unwrap();
        assert_eq!(
            set.select_all,
            "SELECT p_type, v0, v1, v2, v3, v4, v5 FROM t"
        );
    }
}
