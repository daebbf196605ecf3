//! Table-scoped entry point tying a connection to a dialect.
//!
//! [`Database`] is a thin facade: it owns a shared [`Connection`] handle and
//! the [`Dialect`] every builder it hands out should speak. Connection
//! lifecycle (opening, pooling, closing) stays with whoever created the
//! connection.

use std::sync::Arc;

use tracing::debug;

use crate::batch::{batch, BatchQuery};
use crate::client::Connection;
use crate::dialect::Dialect;
use crate::error::DbResult;
use crate::query::{query, run_blocking, TableQuery};
use crate::table::{create, TableBuilder};
use crate::transaction::with_transaction_result;

/// A connection/dialect pair handing out table-scoped builders.
#[derive(Clone)]
pub struct Database {
    conn: Arc<dyn Connection>,
    dialect: Dialect,
}

impl Database {
    /// Wrap an externally owned connection.
    pub fn new(conn: Arc<dyn Connection>, dialect: Dialect) -> Self {
        Self { conn, dialect }
    }

    /// Open an in-memory SQLite database with the bundled driver.
    #[cfg(feature = "sqlite")]
    pub fn sqlite_in_memory() -> DbResult<Self> {
        let conn = crate::sqlite::SqliteConnection::open_in_memory()?;
        Ok(Self::new(Arc::new(conn), Dialect::Sqlite))
    }

    /// Open a file-backed SQLite database with the bundled driver.
    #[cfg(feature = "sqlite")]
    pub fn sqlite(path: impl AsRef<std::path::Path>) -> DbResult<Self> {
        let conn = crate::sqlite::SqliteConnection::open(path)?;
        Ok(Self::new(Arc::new(conn), Dialect::Sqlite))
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Borrow the underlying connection for terminal builder calls.
    pub fn conn(&self) -> &dyn Connection {
        self.conn.as_ref()
    }

    /// Clone the shared connection handle, for the async wrappers.
    pub fn conn_arc(&self) -> Arc<dyn Connection> {
        Arc::clone(&self.conn)
    }

    /// Start a DML/SELECT builder bound to `table`.
    pub fn table(&self, table: impl Into<String>) -> TableQuery {
        query(self.dialect, table)
    }

    /// Start a `CREATE TABLE` builder bound to `table`.
    pub fn create(&self, table: impl Into<String>) -> TableBuilder {
        create(self.dialect, table)
    }

    /// Start a batched write against `table` with a fixed column schema.
    pub fn batch(&self, table: impl Into<String>, columns: &[&str]) -> DbResult<BatchQuery> {
        batch(self.dialect, table, columns)
    }

    /// Raw-SQL escape hatch for statements outside the builder vocabulary.
    pub fn execute_raw(&self, sql: &str) -> DbResult<()> {
        debug!(sql = %sql, "executing raw statement");
        self.conn.execute_raw(sql)
    }

    /// Run `work` inside a transaction on this database's connection.
    pub fn transaction<F>(&self, work: F) -> DbResult<()>
    where
        F: FnOnce(&dyn Connection) -> DbResult<()>,
    {
        with_transaction_result(self.conn.as_ref(), work)
    }

    /// Run `work` inside a transaction and return its value.
    pub fn transaction_result<T, F>(&self, work: F) -> DbResult<T>
    where
        F: FnOnce(&dyn Connection) -> DbResult<T>,
    {
        with_transaction_result(self.conn.as_ref(), work)
    }

    /// Asynchronous [`Database::transaction_result`]: the whole unit of
    /// work runs on the blocking pool.
    pub async fn transaction_result_async<T, F>(&self, work: F) -> DbResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Connection) -> DbResult<T> + Send + 'static,
    {
        let conn = self.conn_arc();
        run_blocking(move || with_transaction_result(conn.as_ref(), work)).await
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("dialect", &self.dialect)
            .finish_non_exhaustive()
    }
}
