//! Error taxonomy for policy storage adapters.
//!
//! Four families: configuration (construction-time), argument (caller
//! contract), statement (single execution), transaction (batch aborted,
//! with or without a clean rollback). Nothing is retried or swallowed.

/// Result alias used across the rulestore crates.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by policy storage adapters.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The liveness probe at construction failed.
    #[error("database unreachable: {message}")]
    Unreachable { message: String },

    /// Strict dialect checking rejected an unrecognized driver name.
    #[error("unsupported SQL driver: {driver}")]
    UnsupportedDriver { driver: String },

    /// The configured table name failed identifier validation.
    #[error("invalid table name {name:?}: {reason}")]
    InvalidTableName { name: String, reason: &'static str },

    /// A rule carried more value fields than the row schema holds.
    #[error("rule has {count} value fields, the row schema holds at most {max}")]
    TooManyFields { count: usize, max: usize },

    /// Old and new rule lists of a batch update differ in length.
    #[error("rule count mismatch: {old} old rules vs {new} new")]
    RuleCountMismatch { old: usize, new: usize },

    /// A predicate delete was requested with no criteria at all.
    /// Clearing the table goes through the save path, never through here.
    #[error("refusing to delete without criteria (save an empty policy set to clear the table)")]
    NoCriteria,

    /// The database rejected a single statement.
    #[error("{action} failed: {message}")]
    Statement {
        action: &'static str,
        message: String,
    },

    /// A transactional batch failed and was rolled back cleanly.
    #[error("{action} rolled back, {step} failed: {message}")]
    Aborted {
        action: &'static str,
        step: String,
        message: String,
    },

    /// A transactional batch failed and the rollback failed as well.
    /// The table is in an unknown state; both errors are preserved.
    #[error("{action} failed at {step} ({message}) and rollback also failed ({rollback}); table state unknown")]
    RollbackFailed {
        action: &'static str,
        step: String,
        message: String,
        rollback: String,
    },

    /// Raw driver error, as reported by the executor.
    #[error("{message}")]
    Driver { message: String },
}

impl StoreError {
    /// True for the unknown-state condition after a failed rollback.
    pub fn is_state_unknown(&self) -> bool {
        matches!(self, StoreError::RollbackFailed { .. })
    }
}
