//! Per-dialect syntax tables.
//!
//! Everything that differs between supported engines is concentrated here as
//! a small strategy table: the DML verbs, the auto-increment column spec,
//! and the `CREATE TABLE` options suffix. The builders themselves are
//! dialect-independent.

use crate::error::{DbError, DbResult};

/// A SQL engine syntax variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    MySql,
    MariaDb,
    Sqlite,
    Postgres,
    H2,
}

/// A DML verb split into the statement prefix (before the table name) and a
/// tail appended after the VALUES list.
///
/// The tail exists for engines that express a behavior as a clause rather
/// than a verb, e.g. Postgres insert-ignore:
/// `INSERT INTO t (..) VALUES (..) ON CONFLICT DO NOTHING`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmlVerb {
    pub prefix: &'static str,
    pub tail: &'static str,
}

impl DmlVerb {
    const fn plain(prefix: &'static str) -> Self {
        Self { prefix, tail: "" }
    }
}

impl Dialect {
    /// Verb for a plain insert. Identical everywhere.
    pub fn insert_verb(self) -> DmlVerb {
        DmlVerb::plain("INSERT INTO")
    }

    /// Verb for an upsert-style replace.
    ///
    /// Postgres has no `REPLACE INTO`; it reports
    /// [`DbError::Unsupported`] and callers needing conflict resolution
    /// there should issue `ON CONFLICT` SQL through the raw escape hatch.
    pub fn replace_verb(self) -> DbResult<DmlVerb> {
        match self {
            Dialect::MySql | Dialect::MariaDb | Dialect::H2 => {
                Ok(DmlVerb::plain("REPLACE INTO"))
            }
            Dialect::Sqlite => Ok(DmlVerb::plain("INSERT OR REPLACE INTO")),
            Dialect::Postgres => Err(DbError::Unsupported(
                "PostgreSQL has no REPLACE INTO; use ON CONFLICT DO UPDATE via raw SQL".into(),
            )),
        }
    }

    /// Verb for an insert that skips conflicting rows.
    pub fn insert_ignore_verb(self) -> DmlVerb {
        match self {
            Dialect::MySql | Dialect::MariaDb | Dialect::H2 => {
                DmlVerb::plain("INSERT IGNORE INTO")
            }
            Dialect::Sqlite => DmlVerb::plain("INSERT OR IGNORE INTO"),
            Dialect::Postgres => DmlVerb {
                prefix: "INSERT INTO",
                tail: " ON CONFLICT DO NOTHING",
            },
        }
    }

    /// Full column spec replacing a column redefined as auto-increment.
    pub fn auto_increment_spec(self) -> &'static str {
        match self {
            Dialect::MySql | Dialect::MariaDb | Dialect::H2 => "INT PRIMARY KEY AUTO_INCREMENT",
            Dialect::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
            Dialect::Postgres => "SERIAL PRIMARY KEY",
        }
    }

    /// Options suffix appended after the closing parenthesis of
    /// `CREATE TABLE (...)`.
    pub fn table_options_suffix(self) -> &'static str {
        match self {
            Dialect::MySql | Dialect::MariaDb => " ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
            Dialect::Sqlite | Dialect::Postgres | Dialect::H2 => "",
        }
    }
}
