//! The executor seam: one database connection running parameterized
//! statements against the rule table.
//!
//! The adapter never sees a driver type, only this trait. Errors cross
//! it as `StoreError::Driver` with the driver's own message; wrapping
//! with action context happens above.

use rulestore_core::StoreResult;

use crate::row::RuleRow;

/// One bound statement parameter. Policy storage only ever binds text
/// or the NULL absent marker.
pub type BindArg = Option<String>;

/// A single synchronous database connection.
///
/// Implementations are expected to hold exactly one connection; the
/// transaction methods operate on connection state. The caller owns the
/// handle's lifecycle and any cross-thread synchronization.
pub trait PolicyDb: Send {
    /// Driver identity as self-reported ("sqlite", "postgres", ...).
    /// Read once at construction to resolve the dialect.
    fn driver_name(&self) -> &str;

    /// Cheap liveness check; adapter construction fails when it does.
    fn ping(&mut self) -> StoreResult<()>;

    /// Run a statement, returning the affected row count.
    fn execute(&mut self, sql: &str, args: &[BindArg]) -> StoreResult<u64>;

    /// Run a query over the rule table, decoding its fixed seven
    /// columns per row.
    fn query(&mut self, sql: &str, args: &[BindArg]) -> StoreResult<Vec<RuleRow>>;

    /// Run a row-returning statement and discard the result. Used for
    /// the table existence probe, where only success matters.
    fn probe(&mut self, sql: &str) -> StoreResult<()>;

    fn begin(&mut self) -> StoreResult<()>;

    fn commit(&mut self) -> StoreResult<()>;

    fn rollback(&mut self) -> StoreResult<()>;
}
