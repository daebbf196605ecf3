//! The connection capability trait consumed by every builder.
//!
//! relq never opens, pools, or closes connections. The caller injects
//! something implementing [`Connection`] (the bundled SQLite driver, or an
//! adapter over any other engine) and keeps ownership of its lifecycle.
//! Builders are safe to share a connection sequentially; issuing statements
//! from several threads at once is only as safe as the driver makes it.

use crate::error::DbResult;
use crate::row::Rows;
use crate::value::Value;

/// A minimal prepared-statement capability interface over one database
/// connection.
///
/// All parameters are bound positionally from `params`; the SQL text itself
/// must already be complete. Implementations map their native errors into
/// [`DbError::Driver`](crate::DbError::Driver) so the original cause stays
/// on the source chain.
pub trait Connection: Send + Sync {
    /// Execute a DML statement and return the number of affected rows.
    fn execute(&self, sql: &str, params: &[Value]) -> DbResult<u64>;

    /// Execute a query and return a forward-only row cursor.
    fn query(&self, sql: &str, params: &[Value]) -> DbResult<Box<dyn Rows>>;

    /// Execute one parameterized statement once per row, as a single batch
    /// round-trip where the driver supports it, returning the total number
    /// of affected rows.
    ///
    /// The default implementation loops [`Connection::execute`]; drivers
    /// should override it with a true batched execution.
    fn execute_batch(&self, sql: &str, rows: &[Vec<Value>]) -> DbResult<u64> {
        let mut affected = 0;
        for row in rows {
            affected += self.execute(sql, row)?;
        }
        Ok(affected)
    }

    /// Raw-SQL escape hatch for statements outside the builder vocabulary
    /// (DDL, pragmas, vendor syntax). No parameters, no result rows.
    fn execute_raw(&self, sql: &str) -> DbResult<()>;

    /// Current auto-commit mode.
    fn auto_commit(&self) -> DbResult<bool>;

    /// Toggle auto-commit. Disabling it opens a transaction; re-enabling it
    /// while a transaction is open commits that transaction, matching the
    /// usual driver contract.
    fn set_auto_commit(&self, enabled: bool) -> DbResult<()>;

    /// Commit the open transaction.
    fn commit(&self) -> DbResult<()>;

    /// Roll back the open transaction.
    fn rollback(&self) -> DbResult<()>;
}
