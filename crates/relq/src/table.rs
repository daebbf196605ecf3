//! `CREATE TABLE` builder.
//!
//! Accumulates column definitions and constraint clauses, then emits one
//! `CREATE TABLE [IF NOT EXISTS] name (...)` statement with the dialect's
//! options suffix. Constraint clauses render after all columns in a fixed
//! order: primary key, foreign keys, unique constraints, check constraints.
//!
//! `CHECK` expressions and type/default literals are raw SQL text under the
//! caller's responsibility, like `WHERE` fragments in
//! [`TableQuery`](crate::TableQuery).

use std::collections::HashMap;

use tracing::debug;

use crate::client::Connection;
use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};

/// Fluent builder for table DDL.
#[derive(Debug, Clone)]
pub struct TableBuilder {
    dialect: Dialect,
    table: String,
    if_not_exists: bool,
    columns: Vec<String>,
    primary_keys: Vec<String>,
    foreign_keys: Vec<String>,
    unique_constraints: Vec<String>,
    check_constraints: Vec<String>,
    default_values: HashMap<String, String>,
    defect: Option<String>,
}

/// Start a `CREATE TABLE` builder for `table` in the given dialect.
pub fn create(dialect: Dialect, table: impl Into<String>) -> TableBuilder {
    TableBuilder {
        dialect,
        table: table.into(),
        if_not_exists: false,
        columns: Vec::new(),
        primary_keys: Vec::new(),
        foreign_keys: Vec::new(),
        unique_constraints: Vec::new(),
        check_constraints: Vec::new(),
        default_values: HashMap::new(),
        defect: None,
    }
}

impl TableBuilder {
    /// Add `IF NOT EXISTS`, making [`TableBuilder::execute`] idempotent.
    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    /// Define a column with a raw SQL type (e.g. `"INT"`, `"VARCHAR(32)"`).
    ///
    /// If a default was registered for this name via
    /// [`TableBuilder::default_value`] *before* this call, the definition
    /// gains `DEFAULT <literal>`. Registering the default afterwards has no
    /// effect on an already-declared column; that ordering dependency is
    /// part of the contract.
    pub fn column(mut self, name: &str, sql_type: &str) -> Self {
        if name.trim().is_empty() || sql_type.trim().is_empty() {
            self.defect
                .get_or_insert_with(|| "column name and type must be non-blank".to_string());
            return self;
        }
        let mut definition = format!("{name} {sql_type}");
        if let Some(default) = self.default_values.get(name) {
            definition.push_str(" DEFAULT ");
            definition.push_str(default);
        }
        self.columns.push(definition);
        self
    }

    /// Register a raw default literal for a column declared later.
    pub fn default_value(mut self, column: &str, literal: &str) -> Self {
        self.default_values
            .insert(column.to_string(), literal.to_string());
        self
    }

    /// Declare the primary key over one or more columns.
    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_keys
            .extend(columns.iter().map(|c| c.to_string()));
        self
    }

    /// Add a foreign key constraint.
    pub fn foreign_key(mut self, column: &str, references_table: &str, references_column: &str) -> Self {
        self.foreign_keys.push(format!(
            "FOREIGN KEY ({column}) REFERENCES {references_table} ({references_column})"
        ));
        self
    }

    /// Add a unique constraint over one or more columns.
    pub fn unique(mut self, columns: &[&str]) -> Self {
        self.unique_constraints
            .push(format!("UNIQUE ({})", columns.join(", ")));
        self
    }

    /// Add a `CHECK` constraint with a raw boolean expression.
    pub fn check(mut self, expression: &str) -> Self {
        self.check_constraints.push(format!("CHECK ({expression})"));
        self
    }

    /// Redefine `column` as the dialect's auto-increment primary key,
    /// dropping any earlier definition of it.
    pub fn auto_increment(mut self, column: &str) -> Self {
        let prefix = format!("{column} ");
        self.columns.retain(|def| !def.starts_with(&prefix));
        self.columns
            .push(format!("{column} {}", self.dialect.auto_increment_spec()));
        self
    }

    /// Render the `CREATE TABLE` statement without executing it.
    pub fn to_sql(&self) -> DbResult<String> {
        if self.table.trim().is_empty() {
            return Err(DbError::validation("table name must be non-blank"));
        }
        if let Some(defect) = &self.defect {
            return Err(DbError::Validation(defect.clone()));
        }
        if self.columns.is_empty() {
            return Err(DbError::validation(format!(
                "cannot create table '{}' with no columns",
                self.table
            )));
        }
        let mut sql = String::from("CREATE TABLE ");
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&self.table);
        sql.push_str(" (");
        sql.push_str(&self.columns.join(", "));
        if !self.primary_keys.is_empty() {
            sql.push_str(", PRIMARY KEY(");
            sql.push_str(&self.primary_keys.join(", "));
            sql.push(')');
        }
        for clause in self
            .foreign_keys
            .iter()
            .chain(&self.unique_constraints)
            .chain(&self.check_constraints)
        {
            sql.push_str(", ");
            sql.push_str(clause);
        }
        sql.push(')');
        sql.push_str(self.dialect.table_options_suffix());
        Ok(sql)
    }

    /// Assemble and run the `CREATE TABLE` statement.
    pub fn execute(&self, conn: &dyn Connection) -> DbResult<()> {
        let sql = self.to_sql()?;
        debug!(table = %self.table, sql = %sql, "creating table");
        conn.execute_raw(&sql)
            .map_err(|e| DbError::statement("CREATE TABLE", &self.table, e))
    }

    /// Immediately execute `DROP TABLE IF EXISTS`, independent of the
    /// deferred create flow.
    pub fn drop_if_exists(&self, conn: &dyn Connection) -> DbResult<()> {
        let sql = format!("DROP TABLE IF EXISTS {}", self.table);
        debug!(table = %self.table, "dropping table");
        conn.execute_raw(&sql)
            .map_err(|e| DbError::statement("DROP TABLE", &self.table, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_columns_and_constraints_in_order() {
        let sql = create(Dialect::Sqlite, "users")
            .if_not_exists()
            .column("id", "INT")
            .column("name", "TEXT")
            .primary_key(&["id"])
            .foreign_key("group_id", "groups", "id")
            .unique(&["name"])
            .check("id >= 0")
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS users (id INT, name TEXT, \
             PRIMARY KEY(id), FOREIGN KEY (group_id) REFERENCES groups (id), \
             UNIQUE (name), CHECK (id >= 0))"
        );
    }

    #[test]
    fn default_registered_before_column_is_applied() {
        let sql = create(Dialect::Sqlite, "t")
            .default_value("x", "5")
            .column("x", "INT")
            .to_sql()
            .unwrap();
        assert!(sql.contains("x INT DEFAULT 5"));
    }

    #[test]
    fn default_registered_after_column_is_dropped() {
        // Documented ordering quirk: defaults only attach to columns
        // declared after registration.
        let sql = create(Dialect::Sqlite, "t")
            .column("x", "INT")
            .default_value("x", "5")
            .to_sql()
            .unwrap();
        assert!(!sql.contains("DEFAULT"));
    }

    #[test]
    fn auto_increment_replaces_prior_definition() {
        let sql = create(Dialect::MySql, "t")
            .column("id", "INT")
            .column("name", "TEXT")
            .auto_increment("id")
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE t (name TEXT, id INT PRIMARY KEY AUTO_INCREMENT) \
             ENGINE=InnoDB DEFAULT CHARSET=utf8mb4"
        );
    }

    #[test]
    fn zero_columns_fail_fast() {
        let err = create(Dialect::Sqlite, "t").to_sql().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn blank_column_name_fails_fast() {
        let err = create(Dialect::Sqlite, "t")
            .column("", "INT")
            .column("ok", "INT")
            .to_sql()
            .unwrap_err();
        assert!(err.is_validation());
    }
}
