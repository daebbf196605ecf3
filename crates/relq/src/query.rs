//! Fluent DML and SELECT builder scoped to one table.
//!
//! A [`TableQuery`] is configured through chained calls and executed against
//! a [`Connection`] exactly once per logical statement:
//!
//! ```no_run
//! use relq::{query, values, Dialect, Row};
//! # fn demo(conn: &dyn relq::Connection) -> relq::DbResult<()> {
//! query(Dialect::Sqlite, "users")
//!     .insert()
//!     .value("id", 1)
//!     .value("name", "alice")
//!     .execute(conn)?;
//!
//! let names = query(Dialect::Sqlite, "users")
//!     .where_("id > ?", values![0])
//!     .order_by("id", true)
//!     .select(conn, |row| row.get_string("name"))?;
//! # Ok(()) }
//! ```
//!
//! `WHERE` clauses are raw SQL fragments with `?` placeholders; their
//! parameters are always bound positionally, but the fragment text itself is
//! trusted as written. Builder state is single-use and not thread-safe.

use std::sync::Arc;

use tracing::debug;

use crate::client::Connection;
use crate::dialect::{Dialect, DmlVerb};
use crate::error::{DbError, DbResult};
use crate::row::Row;
use crate::sql::Sql;
use crate::value::Value;

/// The active DML operation. Selecting a new one overwrites the previous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DmlOp {
    Insert,
    Replace,
    Update,
    Delete,
}

impl DmlOp {
    fn name(self) -> &'static str {
        match self {
            DmlOp::Insert => "INSERT",
            DmlOp::Replace => "REPLACE",
            DmlOp::Update => "UPDATE",
            DmlOp::Delete => "DELETE",
        }
    }
}

/// Fluent builder for `INSERT`/`REPLACE`/`UPDATE`/`DELETE` and `SELECT`
/// against a single table.
#[derive(Debug, Clone)]
pub struct TableQuery {
    dialect: Dialect,
    table: String,
    op: DmlOp,
    values: Vec<(String, Value)>,
    where_clause: Option<String>,
    where_params: Vec<Value>,
    order_by: Option<(String, bool)>,
    limit: Option<u64>,
    offset: Option<u64>,
    defect: Option<String>,
}

/// Start a query against `table` in the given dialect.
pub fn query(dialect: Dialect, table: impl Into<String>) -> TableQuery {
    TableQuery {
        dialect,
        table: table.into(),
        op: DmlOp::Insert,
        values: Vec::new(),
        where_clause: None,
        where_params: Vec::new(),
        order_by: None,
        limit: None,
        offset: None,
        defect: None,
    }
}

impl TableQuery {
    /// Switch to `INSERT` mode (the default).
    pub fn insert(mut self) -> Self {
        self.op = DmlOp::Insert;
        self
    }

    /// Switch to the dialect's replace/upsert mode.
    pub fn replace(mut self) -> Self {
        self.op = DmlOp::Replace;
        self
    }

    /// Switch to `UPDATE` mode.
    pub fn update(mut self) -> Self {
        self.op = DmlOp::Update;
        self
    }

    /// Switch to `DELETE` mode.
    pub fn delete(mut self) -> Self {
        self.op = DmlOp::Delete;
        self
    }

    /// Bind a column value for `INSERT`/`REPLACE`/`UPDATE`.
    ///
    /// Insertion order is preserved and reused verbatim for both the column
    /// list and the placeholder list, so the two cannot drift apart.
    /// Re-binding an existing column updates it in place.
    pub fn value(mut self, column: &str, value: impl Into<Value>) -> Self {
        if column.trim().is_empty() {
            self.defect
                .get_or_insert_with(|| "column name must be non-blank".to_string());
            return self;
        }
        let value = value.into();
        if let Some(slot) = self.values.iter_mut().find(|(c, _)| c == column) {
            slot.1 = value;
        } else {
            self.values.push((column.to_string(), value));
        }
        self
    }

    /// Set the `WHERE` clause: a raw SQL fragment with `?` placeholders and
    /// its positional parameters. Replaces any previous clause. Absent means
    /// the whole table is affected; nothing guards against that.
    pub fn where_(mut self, clause: impl Into<String>, params: Vec<Value>) -> Self {
        self.where_clause = Some(clause.into());
        self.where_params = params;
        self
    }

    /// Order `SELECT` results by `column`, ascending or descending.
    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order_by = Some((column.into(), ascending));
        self
    }

    /// Cap the number of `SELECT` results.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first `offset` rows of a `SELECT`.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    // ==================== terminal operations ====================

    /// Execute the configured DML statement, returning affected rows.
    pub fn execute(&self, conn: &dyn Connection) -> DbResult<u64> {
        let (text, params) = self.build_dml()?.into_parts();
        debug!(table = %self.table, sql = %text, "executing statement");
        conn.execute(&text, &params)
            .map_err(|e| DbError::statement(self.op.name(), &self.table, e))
    }

    /// `SELECT COUNT(*)` with the configured `WHERE` clause.
    pub fn count(&self, conn: &dyn Connection) -> DbResult<u64> {
        self.check_defects()?;
        let mut stmt = Sql::new(format!("SELECT COUNT(*) AS row_count FROM {}", self.table));
        self.append_where(&mut stmt);
        let (text, params) = stmt.into_parts();
        debug!(table = %self.table, sql = %text, "executing count");
        let mut rows = conn
            .query(&text, &params)
            .map_err(|e| DbError::statement("COUNT", &self.table, e))?;
        match rows.next_row()? {
            Some(row) => {
                let n = row.get_i64("row_count")?;
                Ok(u64::try_from(n).unwrap_or(0))
            }
            None => Ok(0),
        }
    }

    /// Whether at least one row matches the configured `WHERE` clause.
    pub fn exists(&self, conn: &dyn Connection) -> DbResult<bool> {
        Ok(self.count(conn)? > 0)
    }

    /// `SELECT *` mapping each row through `mapper`, preserving cursor order.
    pub fn select<R, F>(&self, conn: &dyn Connection, mapper: F) -> DbResult<Vec<R>>
    where
        F: FnMut(&dyn Row) -> DbResult<R>,
    {
        self.select_columns(conn, &[], mapper)
    }

    /// `SELECT` specific columns mapping each row through `mapper`.
    ///
    /// A mapper failure aborts the iteration and discards rows already
    /// mapped; the error is wrapped with the table name.
    pub fn select_columns<R, F>(
        &self,
        conn: &dyn Connection,
        columns: &[&str],
        mut mapper: F,
    ) -> DbResult<Vec<R>>
    where
        F: FnMut(&dyn Row) -> DbResult<R>,
    {
        let (text, params) = self.build_select(columns)?.into_parts();
        debug!(table = %self.table, sql = %text, "executing select");
        let mut rows = conn
            .query(&text, &params)
            .map_err(|e| DbError::statement("SELECT", &self.table, e))?;
        let mut results = Vec::new();
        while let Some(row) = rows.next_row()? {
            let mapped = mapper(row).map_err(|e| DbError::Mapping {
                table: self.table.clone(),
                source: Box::new(e),
            })?;
            results.push(mapped);
        }
        Ok(results)
    }

    /// First matching row, or `None`. Equivalent to `limit(1)` + `select`.
    pub fn first<R, F>(&self, conn: &dyn Connection, mapper: F) -> DbResult<Option<R>>
    where
        F: FnMut(&dyn Row) -> DbResult<R>,
    {
        let limited = self.clone().limit(1);
        Ok(limited.select(conn, mapper)?.into_iter().next())
    }

    /// Render the configured DML statement without executing it.
    pub fn to_sql(&self) -> DbResult<String> {
        Ok(self.build_dml()?.to_sql())
    }

    /// Render the `SELECT` statement without executing it.
    pub fn to_select_sql(&self, columns: &[&str]) -> DbResult<String> {
        Ok(self.build_select(columns)?.to_sql())
    }

    // ==================== async wrappers ====================
    //
    // These run the synchronous terminal on the runtime's blocking pool;
    // no operation is natively non-blocking.

    /// Asynchronous [`TableQuery::execute`].
    pub async fn execute_async(self, conn: Arc<dyn Connection>) -> DbResult<u64> {
        run_blocking(move || self.execute(conn.as_ref())).await
    }

    /// Asynchronous [`TableQuery::count`].
    pub async fn count_async(self, conn: Arc<dyn Connection>) -> DbResult<u64> {
        run_blocking(move || self.count(conn.as_ref())).await
    }

    /// Asynchronous [`TableQuery::select`].
    pub async fn select_async<R, F>(self, conn: Arc<dyn Connection>, mapper: F) -> DbResult<Vec<R>>
    where
        R: Send + 'static,
        F: FnMut(&dyn Row) -> DbResult<R> + Send + 'static,
    {
        run_blocking(move || self.select(conn.as_ref(), mapper)).await
    }

    // ==================== statement assembly ====================

    fn check_defects(&self) -> DbResult<()> {
        if self.table.trim().is_empty() {
            return Err(DbError::validation("table name must be non-blank"));
        }
        if let Some(defect) = &self.defect {
            return Err(DbError::Validation(defect.clone()));
        }
        Ok(())
    }

    fn build_dml(&self) -> DbResult<Sql> {
        self.check_defects()?;
        match self.op {
            DmlOp::Insert => self.build_write(self.dialect.insert_verb()),
            DmlOp::Replace => self.build_write(self.dialect.replace_verb()?),
            DmlOp::Update => self.build_update(),
            DmlOp::Delete => Ok(self.build_delete()),
        }
    }

    fn build_write(&self, verb: DmlVerb) -> DbResult<Sql> {
        if self.values.is_empty() {
            return Err(DbError::validation(format!(
                "cannot build {} for '{}' with no values",
                self.op.name(),
                self.table
            )));
        }
        let mut stmt = Sql::new(format!("{} {} (", verb.prefix, self.table));
        for (i, (column, _)) in self.values.iter().enumerate() {
            if i > 0 {
                stmt.push(", ");
            }
            stmt.push(column);
        }
        stmt.push(") VALUES (");
        for (i, (_, value)) in self.values.iter().enumerate() {
            if i > 0 {
                stmt.push(", ");
            }
            stmt.push_bind(value.clone());
        }
        stmt.push(")");
        stmt.push(verb.tail);
        Ok(stmt)
    }

    fn build_update(&self) -> DbResult<Sql> {
        if self.values.is_empty() {
            return Err(DbError::validation(format!(
                "cannot build UPDATE for '{}' with no values",
                self.table
            )));
        }
        let mut stmt = Sql::new(format!("UPDATE {} SET ", self.table));
        for (i, (column, value)) in self.values.iter().enumerate() {
            if i > 0 {
                stmt.push(", ");
            }
            stmt.push(column);
            stmt.push(" = ");
            stmt.push_bind(value.clone());
        }
        self.append_where(&mut stmt);
        Ok(stmt)
    }

    fn build_delete(&self) -> Sql {
        let mut stmt = Sql::new(format!("DELETE FROM {}", self.table));
        self.append_where(&mut stmt);
        stmt
    }

    fn build_select(&self, columns: &[&str]) -> DbResult<Sql> {
        self.check_defects()?;
        let cols = if columns.is_empty() {
            "*".to_string()
        } else {
            columns.join(", ")
        };
        let mut stmt = Sql::new(format!("SELECT {cols} FROM {}", self.table));
        self.append_where(&mut stmt);
        if let Some((column, ascending)) = &self.order_by {
            stmt.push(" ORDER BY ");
            stmt.push(column);
            stmt.push(if *ascending { " ASC" } else { " DESC" });
        }
        if let Some(limit) = self.limit {
            stmt.push(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            stmt.push(&format!(" OFFSET {offset}"));
        }
        Ok(stmt)
    }

    fn append_where(&self, stmt: &mut Sql) {
        if let Some(clause) = &self.where_clause {
            if !clause.is_empty() {
                stmt.push(" WHERE ");
                stmt.push_raw_bind(clause, self.where_params.iter().cloned());
            }
        }
    }
}

pub(crate) async fn run_blocking<T, F>(task: F) -> DbResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> DbResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| DbError::Task(e.to_string()))?
}
