//! Row cursors and typed column access.

use std::sync::Arc;

use crate::error::{DbError, DbResult};
use crate::value::Value;

/// One positioned result row with typed accessors by column name.
///
/// Only [`Row::value`] is required; the typed accessors convert through
/// [`Value`] and report failures as
/// [`DbError::Decode`](crate::DbError::Decode).
pub trait Row {
    /// Raw value of the named column.
    fn value(&self, column: &str) -> DbResult<Value>;

    fn get_string(&self, column: &str) -> DbResult<String> {
        match self.value(column)? {
            Value::Text(v) => Ok(v),
            other => Err(decode_mismatch(column, "TEXT", &other)),
        }
    }

    fn get_i64(&self, column: &str) -> DbResult<i64> {
        let v = self.value(column)?;
        v.as_integer()
            .ok_or_else(|| decode_mismatch(column, "INTEGER", &v))
    }

    fn get_i32(&self, column: &str) -> DbResult<i32> {
        let wide = self.get_i64(column)?;
        i32::try_from(wide)
            .map_err(|_| DbError::decode(column, format!("value {wide} out of range for i32")))
    }

    fn get_f64(&self, column: &str) -> DbResult<f64> {
        let v = self.value(column)?;
        v.as_real()
            .ok_or_else(|| decode_mismatch(column, "REAL", &v))
    }

    fn get_bool(&self, column: &str) -> DbResult<bool> {
        let v = self.value(column)?;
        v.as_bool()
            .ok_or_else(|| decode_mismatch(column, "BOOL", &v))
    }

    /// Like [`Row::get_string`] but maps SQL `NULL` to `None`.
    fn get_string_opt(&self, column: &str) -> DbResult<Option<String>> {
        match self.value(column)? {
            Value::Null => Ok(None),
            Value::Text(v) => Ok(Some(v)),
            other => Err(decode_mismatch(column, "TEXT", &other)),
        }
    }
}

fn decode_mismatch(column: &str, wanted: &str, got: &Value) -> DbError {
    DbError::decode(column, format!("expected {wanted}, got {}", got.type_name()))
}

/// A forward-only cursor over query results.
///
/// `next_row` advances the cursor and yields a reference valid until the
/// next call; there is no rewind.
pub trait Rows {
    fn next_row(&mut self) -> DbResult<Option<&dyn Row>>;
}

/// A fully materialized row, for drivers that buffer their results.
#[derive(Debug, Clone)]
pub struct OwnedRow {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl OwnedRow {
    /// Pair a shared column-name header with one row of values.
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }
}

impl Row for OwnedRow {
    fn value(&self, column: &str) -> DbResult<Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
            .cloned()
            .ok_or_else(|| DbError::decode(column, "no such column in result row"))
    }
}

/// A [`Rows`] cursor over buffered [`OwnedRow`]s.
///
/// Buffering happens inside the driver; callers still see the forward-only
/// cursor contract.
pub struct BufferedRows {
    remaining: std::vec::IntoIter<OwnedRow>,
    current: Option<OwnedRow>,
}

impl BufferedRows {
    pub fn new(rows: Vec<OwnedRow>) -> Self {
        Self {
            remaining: rows.into_iter(),
            current: None,
        }
    }
}

impl Rows for BufferedRows {
    fn next_row(&mut self) -> DbResult<Option<&dyn Row>> {
        self.current = self.remaining.next();
        Ok(self.current.as_ref().map(|r| r as &dyn Row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cols: &[&str]) -> Arc<[String]> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn typed_accessors_convert_by_name() {
        let row = OwnedRow::new(
            header(&["id", "name", "score"]),
            vec![Value::Integer(3), Value::Text("a".into()), Value::Real(0.5)],
        );
        assert_eq!(row.get_i64("id").unwrap(), 3);
        assert_eq!(row.get_string("name").unwrap(), "a");
        assert_eq!(row.get_f64("score").unwrap(), 0.5);
    }

    #[test]
    fn unknown_column_is_a_decode_error() {
        let row = OwnedRow::new(header(&["id"]), vec![Value::Integer(1)]);
        let err = row.get_i64("missing").unwrap_err();
        assert!(matches!(err, DbError::Decode { .. }));
    }

    #[test]
    fn type_mismatch_reports_both_types() {
        let row = OwnedRow::new(header(&["id"]), vec![Value::Text("x".into())]);
        let err = row.get_i64("id").unwrap_err();
        assert!(err.to_string().contains("INTEGER"));
    }

    #[test]
    fn buffered_cursor_is_forward_only() {
        let mut rows = BufferedRows::new(vec![
            OwnedRow::new(header(&["n"]), vec![Value::Integer(1)]),
            OwnedRow::new(header(&["n"]), vec![Value::Integer(2)]),
        ]);
        let mut seen = Vec::new();
        while let Some(row) = rows.next_row().unwrap() {
            seen.push(row.get_i64("n").unwrap());
        }
        assert_eq!(seen, vec![1, 2]);
        assert!(rows.next_row().unwrap().is_none());
    }
}
