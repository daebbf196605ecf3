//! Bundled SQLite driver, enabled by the `sqlite` feature.
//!
//! Wraps a [`rusqlite::Connection`] behind a mutex so the handle satisfies
//! the `Send + Sync` bound on [`Connection`]. Query results are buffered
//! into [`OwnedRow`]s before the statement is dropped; callers still
//! consume them through the forward-only [`Rows`](crate::Rows) cursor.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::params_from_iter;
use tracing::trace;

use crate::client::Connection;
use crate::error::{DbError, DbResult};
use crate::row::{BufferedRows, OwnedRow, Rows};
use crate::value::Value;

/// A SQLite connection usable as a [`Connection`].
pub struct SqliteConnection {
    inner: Mutex<rusqlite::Connection>,
}

impl SqliteConnection {
    /// Open (creating if needed) a database file.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let conn = rusqlite::Connection::open(path)?;
        Ok(Self {
            inner: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = rusqlite::Connection::open_in_memory()?;
        Ok(Self {
            inner: Mutex::new(conn),
        })
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, rusqlite::Connection>> {
        self.inner
            .lock()
            .map_err(|_| DbError::Other("sqlite connection mutex poisoned".into()))
    }
}

fn to_sqlite(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        // SQLite has no boolean affinity; store 0/1.
        Value::Bool(v) => rusqlite::types::Value::Integer(i64::from(*v)),
        Value::Integer(v) => rusqlite::types::Value::Integer(*v),
        Value::Real(v) => rusqlite::types::Value::Real(*v),
        Value::Text(v) => rusqlite::types::Value::Text(v.clone()),
        Value::Blob(v) => rusqlite::types::Value::Blob(v.clone()),
    }
}

fn from_sqlite(value: rusqlite::types::Value) -> Value {
    match value {
        rusqlite::types::Value::Null => Value::Null,
        rusqlite::types::Value::Integer(v) => Value::Integer(v),
        rusqlite::types::Value::Real(v) => Value::Real(v),
        rusqlite::types::Value::Text(v) => Value::Text(v),
        rusqlite::types::Value::Blob(v) => Value::Blob(v),
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(error: rusqlite::Error) -> Self {
        DbError::Driver(Box::new(error))
    }
}

impl Connection for SqliteConnection {
    fn execute(&self, sql: &str, params: &[Value]) -> DbResult<u64> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let affected = stmt.execute(params_from_iter(params.iter().map(to_sqlite)))?;
        Ok(affected as u64)
    }

    fn query(&self, sql: &str, params: &[Value]) -> DbResult<Box<dyn Rows>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let columns: std::sync::Arc<[String]> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let mut rows = stmt.query(params_from_iter(params.iter().map(to_sqlite)))?;
        let mut buffered = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(from_sqlite(row.get::<usize, rusqlite::types::Value>(i)?));
            }
            buffered.push(OwnedRow::new(columns.clone(), values));
        }
        trace!(rows = buffered.len(), "buffered sqlite result set");
        Ok(Box::new(BufferedRows::new(buffered)))
    }

    // Prepare once, bind per row.
    fn execute_batch(&self, sql: &str, rows: &[Vec<Value>]) -> DbResult<u64> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let mut affected = 0u64;
        for row in rows {
            affected += stmt.execute(params_from_iter(row.iter().map(to_sqlite)))? as u64;
        }
        Ok(affected)
    }

    fn execute_raw(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    fn auto_commit(&self) -> DbResult<bool> {
        Ok(self.lock()?.is_autocommit())
    }

    fn set_auto_commit(&self, enabled: bool) -> DbResult<()> {
        let conn = self.lock()?;
        // SQLite is in auto-commit mode exactly when no transaction is
        // open, so the toggle maps to BEGIN/COMMIT.
        if enabled {
            if !conn.is_autocommit() {
                conn.execute_batch("COMMIT")?;
            }
        } else if conn.is_autocommit() {
            conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }

    fn commit(&self) -> DbResult<()> {
        self.lock()?.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&self) -> DbResult<()> {
        self.lock()?.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Row;

    fn conn_with_rows() -> SqliteConnection {
        let conn = SqliteConnection::open_in_memory().unwrap();
        conn.execute_raw("CREATE TABLE t (id INTEGER, name TEXT)")
            .unwrap();
        conn.execute(
            "INSERT INTO t (id, name) VALUES (?, ?)",
            &[Value::Integer(1), Value::Text("a".into())],
        )
        .unwrap();
        conn
    }

    #[test]
    fn executes_with_positional_params() {
        let conn = conn_with_rows();
        let affected = conn
            .execute(
                "UPDATE t SET name = ? WHERE id = ?",
                &[Value::Text("b".into()), Value::Integer(1)],
            )
            .unwrap();
        assert_eq!(affected, 1);
    }

    #[test]
    fn query_buffers_rows_with_column_names() {
        let conn = conn_with_rows();
        let mut rows = conn.query("SELECT id, name FROM t", &[]).unwrap();
        let row = rows.next_row().unwrap().expect("one row");
        assert_eq!(row.get_i64("id").unwrap(), 1);
        assert_eq!(row.get_string("name").unwrap(), "a");
        assert!(rows.next_row().unwrap().is_none());
    }

    #[test]
    fn bools_round_trip_as_integers() {
        let conn = SqliteConnection::open_in_memory().unwrap();
        conn.execute_raw("CREATE TABLE f (flag INTEGER)").unwrap();
        conn.execute("INSERT INTO f (flag) VALUES (?)", &[Value::Bool(true)])
            .unwrap();
        let mut rows = conn.query("SELECT flag FROM f", &[]).unwrap();
        let row = rows.next_row().unwrap().unwrap();
        assert!(row.get_bool("flag").unwrap());
    }

    #[test]
    fn auto_commit_toggle_tracks_transaction_state() {
        let conn = SqliteConnection::open_in_memory().unwrap();
        assert!(conn.auto_commit().unwrap());
        conn.set_auto_commit(false).unwrap();
        assert!(!conn.auto_commit().unwrap());
        conn.rollback().unwrap();
        assert!(conn.auto_commit().unwrap());
    }
}
