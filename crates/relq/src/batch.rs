//! Multi-row batched writes.
//!
//! A [`BatchQuery`] accumulates same-shaped rows against a fixed column
//! schema and executes them as one batched statement, trading N round-trips
//! for one. Row arity is checked eagerly at [`BatchQuery::add`] so a shape
//! mismatch surfaces before hundreds of rows pile up behind it.

use std::sync::Arc;

use tracing::debug;

use crate::client::Connection;
use crate::dialect::{Dialect, DmlVerb};
use crate::error::{DbError, DbResult};
use crate::query::run_blocking;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchOp {
    Insert,
    Replace,
    InsertIgnore,
}

impl BatchOp {
    fn name(self) -> &'static str {
        match self {
            BatchOp::Insert => "BATCH INSERT",
            BatchOp::Replace => "BATCH REPLACE",
            BatchOp::InsertIgnore => "BATCH INSERT IGNORE",
        }
    }
}

/// Builder for batched `INSERT`/`REPLACE`/`INSERT IGNORE`.
#[derive(Debug, Clone)]
pub struct BatchQuery {
    dialect: Dialect,
    table: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    op: BatchOp,
}

/// Start a batch against `table` with a fixed column schema.
///
/// Fails fast on a blank table name, an empty column list, or a blank
/// column name.
pub fn batch(dialect: Dialect, table: impl Into<String>, columns: &[&str]) -> DbResult<BatchQuery> {
    let table = table.into();
    if table.trim().is_empty() {
        return Err(DbError::validation("table name must be non-blank"));
    }
    if columns.is_empty() {
        return Err(DbError::validation(format!(
            "batch on '{table}' needs at least one column"
        )));
    }
    if columns.iter().any(|c| c.trim().is_empty()) {
        return Err(DbError::validation("column name must be non-blank"));
    }
    Ok(BatchQuery {
        dialect,
        table,
        columns: columns.iter().map(|c| c.to_string()).collect(),
        rows: Vec::new(),
        op: BatchOp::Insert,
    })
}

impl BatchQuery {
    /// Use the plain insert verb (the default).
    pub fn insert(mut self) -> Self {
        self.op = BatchOp::Insert;
        self
    }

    /// Use the dialect's replace/upsert verb.
    pub fn replace(mut self) -> Self {
        self.op = BatchOp::Replace;
        self
    }

    /// Use the dialect's conflict-skipping insert verb.
    pub fn insert_ignore(mut self) -> Self {
        self.op = BatchOp::InsertIgnore;
        self
    }

    /// Append one row. Its arity must equal the declared column count;
    /// violations fail immediately, before any database round-trip.
    pub fn add(mut self, row: Vec<Value>) -> DbResult<Self> {
        if row.len() != self.columns.len() {
            return Err(DbError::validation(format!(
                "column count mismatch on '{}': expected {} values, got {}",
                self.table,
                self.columns.len(),
                row.len()
            )));
        }
        self.rows.push(row);
        Ok(self)
    }

    /// Number of accumulated rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render the batched statement (one row of placeholders).
    pub fn to_sql(&self) -> DbResult<String> {
        let verb = self.verb()?;
        let placeholders = vec!["?"; self.columns.len()].join(", ");
        Ok(format!(
            "{} {} ({}) VALUES ({}){}",
            verb.prefix,
            self.table,
            self.columns.join(", "),
            placeholders,
            verb.tail
        ))
    }

    /// Execute all accumulated rows as one batched statement, returning the
    /// total number of affected rows. With no rows this is a no-op
    /// returning 0; no statement is issued.
    pub fn execute(&self, conn: &dyn Connection) -> DbResult<u64> {
        if self.rows.is_empty() {
            return Ok(0);
        }
        let sql = self.to_sql()?;
        debug!(table = %self.table, rows = self.rows.len(), sql = %sql, "executing batch");
        conn.execute_batch(&sql, &self.rows)
            .map_err(|e| DbError::statement(self.op.name(), &self.table, e))
    }

    /// Asynchronous [`BatchQuery::execute`].
    pub async fn execute_async(self, conn: Arc<dyn Connection>) -> DbResult<u64> {
        run_blocking(move || self.execute(conn.as_ref())).await
    }

    fn verb(&self) -> DbResult<DmlVerb> {
        match self.op {
            BatchOp::Insert => Ok(self.dialect.insert_verb()),
            BatchOp::Replace => self.dialect.replace_verb(),
            BatchOp::InsertIgnore => Ok(self.dialect.insert_ignore_verb()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Rows;
    use crate::values;

    /// Connection that fails the test if any statement reaches it.
    struct UnreachableConn;

    impl Connection for UnreachableConn {
        fn execute(&self, _sql: &str, _params: &[Value]) -> DbResult<u64> {
            panic!("no statement should be issued");
        }
        fn query(&self, _sql: &str, _params: &[Value]) -> DbResult<Box<dyn Rows>> {
            panic!("no statement should be issued");
        }
        fn execute_raw(&self, _sql: &str) -> DbResult<()> {
            panic!("no statement should be issued");
        }
        fn auto_commit(&self) -> DbResult<bool> {
            Ok(true)
        }
        fn set_auto_commit(&self, _enabled: bool) -> DbResult<()> {
            Ok(())
        }
        fn commit(&self) -> DbResult<()> {
            Ok(())
        }
        fn rollback(&self) -> DbResult<()> {
            Ok(())
        }
    }

    #[test]
    fn arity_mismatch_fails_before_touching_the_connection() {
        let b = batch(Dialect::Sqlite, "t", &["a", "b"]).unwrap();
        let err = b.add(values![1]).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("expected 2"));
    }

    #[test]
    fn empty_batch_executes_as_noop() {
        let b = batch(Dialect::Sqlite, "t", &["a"]).unwrap();
        assert_eq!(b.execute(&UnreachableConn).unwrap(), 0);
    }

    #[test]
    fn renders_one_placeholder_per_column() {
        let b = batch(Dialect::MySql, "t", &["a", "b", "c"])
            .unwrap()
            .insert_ignore();
        assert_eq!(
            b.to_sql().unwrap(),
            "INSERT IGNORE INTO t (a, b, c) VALUES (?, ?, ?)"
        );
    }

    #[test]
    fn postgres_insert_ignore_appends_conflict_tail() {
        let b = batch(Dialect::Postgres, "t", &["a"]).unwrap().insert_ignore();
        assert_eq!(
            b.to_sql().unwrap(),
            "INSERT INTO t (a) VALUES (?) ON CONFLICT DO NOTHING"
        );
    }

    #[test]
    fn schema_violations_fail_at_construction() {
        assert!(batch(Dialect::Sqlite, " ", &["a"]).is_err());
        assert!(batch(Dialect::Sqlite, "t", &[]).is_err());
        assert!(batch(Dialect::Sqlite, "t", &["a", ""]).is_err());
    }
}
