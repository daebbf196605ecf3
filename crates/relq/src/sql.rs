//! Parameter-safe dynamic SQL assembly.
//!
//! [`Sql`] stores SQL pieces and bound parameters separately and renders a
//! `?` placeholder per parameter, so the rendered placeholder order and the
//! parameter binding order cannot drift apart.

use crate::value::Value;

#[derive(Debug)]
enum SqlPart {
    Raw(String),
    Param,
}

/// A SQL statement under construction: raw text plus positional parameters.
#[derive(Debug)]
pub struct Sql {
    parts: Vec<SqlPart>,
    params: Vec<Value>,
}

/// Start building a SQL statement.
pub fn sql(initial_sql: impl Into<String>) -> Sql {
    Sql::new(initial_sql)
}

impl Sql {
    /// Create a new builder with an initial SQL fragment.
    pub fn new(initial_sql: impl Into<String>) -> Self {
        Self {
            parts: vec![SqlPart::Raw(initial_sql.into())],
            params: Vec::new(),
        }
    }

    /// Create an empty builder.
    pub fn empty() -> Self {
        Self {
            parts: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Append raw SQL (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }
        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(SqlPart::Raw(sql.to_string())),
        }
        self
    }

    /// Append a `?` placeholder and bind its value.
    pub fn push_bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.parts.push(SqlPart::Param);
        self.params.push(value.into());
        self
    }

    /// Append raw SQL that already contains `?` placeholders, binding its
    /// parameters in order.
    pub fn push_raw_bind(&mut self, sql: &str, params: impl IntoIterator<Item = Value>) -> &mut Self {
        self.push(sql);
        self.params.extend(params);
        self
    }

    /// Render the statement text with `?` placeholders.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                SqlPart::Raw(s) => out.push_str(s),
                SqlPart::Param => out.push('?'),
            }
        }
        out
    }

    /// Bound parameters in placeholder order.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Consume the builder into `(sql, params)`.
    pub fn into_parts(self) -> (String, Vec<Value>) {
        let text = self.to_sql();
        (text, self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_placeholders_in_order() {
        let mut q = sql("SELECT * FROM users WHERE a = ");
        q.push_bind(1).push(" AND b = ").push_bind("x");

        assert_eq!(q.to_sql(), "SELECT * FROM users WHERE a = ? AND b = ?");
        assert_eq!(
            q.params(),
            &[Value::Integer(1), Value::Text("x".into())]
        );
    }

    #[test]
    fn raw_bind_keeps_existing_placeholders() {
        let mut q = sql("DELETE FROM t WHERE ");
        q.push_raw_bind("id = ? AND kind = ?", vec![Value::Integer(5), Value::Text("a".into())]);

        assert_eq!(q.to_sql(), "DELETE FROM t WHERE id = ? AND kind = ?");
        assert_eq!(q.params().len(), 2);
    }

    #[test]
    fn adjacent_raw_parts_merge() {
        let mut q = Sql::empty();
        q.push("SELECT ").push("1");
        assert_eq!(q.to_sql(), "SELECT 1");
        assert!(q.params().is_empty());
    }
}
