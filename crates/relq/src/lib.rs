//! Fluent, dialect-aware SQL statement builders over a pluggable
//! connection trait.
//!
//! relq renders parameterized DML/SELECT statements ([`TableQuery`]),
//! `CREATE TABLE` DDL ([`TableBuilder`]) and multi-row batches
//! ([`BatchQuery`]) for MySQL, MariaDB, SQLite, PostgreSQL and H2, then
//! executes them through whatever [`Connection`] the caller provides. A
//! bundled SQLite driver (feature `sqlite`, on by default) serves as the
//! reference implementation.
//!
//! ```no_run
//! use relq::{Database, Row, values};
//!
//! fn main() -> relq::DbResult<()> {
//!     let db = Database::sqlite_in_memory()?;
//!
//!     db.create("users")
//!         .if_not_exists()
//!         .column("id", "INTEGER")
//!         .column("name", "TEXT")
//!         .primary_key(&["id"])
//!         .execute(db.conn())?;
//!
//!     db.table("users")
//!         .insert()
//!         .value("id", 1)
//!         .value("name", "alice")
//!         .execute(db.conn())?;
//!
//!     let names = db
//!         .table("users")
//!         .order_by("id", true)
//!         .select(db.conn(), |row| row.get_string("name"))?;
//!     assert_eq!(names, vec!["alice"]);
//!     Ok(())
//! }
//! ```
//!
//! Column values are always bound positionally as [`Value`] parameters.
//! `WHERE` fragments and DDL type/default/`CHECK` text are raw SQL under
//! the caller's responsibility.

pub mod batch;
pub mod client;
pub mod db;
pub mod dialect;
pub mod error;
pub mod query;
pub mod row;
pub mod sql;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod table;
pub mod transaction;
pub mod value;

pub use batch::{batch, BatchQuery};
pub use client::Connection;
pub use db::Database;
pub use dialect::{Dialect, DmlVerb};
pub use error::{DbError, DbResult};
pub use query::{query, TableQuery};
pub use row::{BufferedRows, OwnedRow, Row, Rows};
pub use sql::{sql, Sql};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteConnection;
pub use table::{create, TableBuilder};
pub use transaction::{with_transaction, with_transaction_result};
pub use value::Value;
