//! Transaction envelope over a connection's auto-commit toggle.
//!
//! The unit of work runs with auto-commit disabled; a normal return commits,
//! any error rolls back and propagates wrapped as
//! [`DbError::Transaction`]. The connection's prior auto-commit mode is
//! restored on every path. Nested transactions are not arbitrated here;
//! starting one inside an open transaction is whatever the underlying
//! connection makes of it.

use tracing::warn;

use crate::client::Connection;
use crate::error::{DbError, DbResult};

/// Run `work` inside a transaction, discarding its result.
pub fn with_transaction<F>(conn: &dyn Connection, work: F) -> DbResult<()>
where
    F: FnOnce(&dyn Connection) -> DbResult<()>,
{
    with_transaction_result(conn, work)
}

/// Run `work` inside a transaction and propagate its return value through
/// the commit/rollback envelope.
///
/// A commit failure counts as a failure of the unit of work and triggers
/// the rollback path. If the rollback itself fails too, the original error
/// text is preserved with the rollback failure appended.
pub fn with_transaction_result<T, F>(conn: &dyn Connection, work: F) -> DbResult<T>
where
    F: FnOnce(&dyn Connection) -> DbResult<T>,
{
    let original = conn.auto_commit()?;
    conn.set_auto_commit(false)?;

    let outcome = work(conn).and_then(|value| conn.commit().map(|()| value));
    match outcome {
        Ok(value) => {
            conn.set_auto_commit(original)?;
            Ok(value)
        }
        Err(error) => {
            warn!(error = %error, "transaction failed, rolling back");
            let rollback = conn.rollback();
            if let Err(restore) = conn.set_auto_commit(original) {
                warn!(error = %restore, "failed to restore auto-commit after rollback");
            }
            match rollback {
                Ok(()) => Err(DbError::Transaction(Box::new(error))),
                Err(rollback_err) => Err(DbError::Other(format!(
                    "{error} (rollback failed: {rollback_err})"
                ))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Rows;
    use crate::value::Value;
    use std::sync::Mutex;

    /// Records the connection-control calls a transaction makes, in order.
    struct TraceConn {
        log: Mutex<Vec<String>>,
        auto_commit: Mutex<bool>,
        fail_commit: bool,
        fail_rollback: bool,
    }

    impl TraceConn {
        fn new() -> Self {
            Self {
                log: Mutex::new(Vec::new()),
                auto_commit: Mutex::new(true),
                fail_commit: false,
                fail_rollback: false,
            }
        }

        fn record(&self, event: &str) {
            self.log.lock().unwrap().push(event.to_string());
        }

        fn events(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    impl Connection for TraceConn {
        fn execute(&self, sql: &str, _params: &[Value]) -> DbResult<u64> {
            self.record(sql);
            Ok(1)
        }
        fn query(&self, _sql: &str, _params: &[Value]) -> DbResult<Box<dyn Rows>> {
            unimplemented!("not used in these tests")
        }
        fn execute_raw(&self, sql: &str) -> DbResult<()> {
            self.record(sql);
            Ok(())
        }
        fn auto_commit(&self) -> DbResult<bool> {
            Ok(*self.auto_commit.lock().unwrap())
        }
        fn set_auto_commit(&self, enabled: bool) -> DbResult<()> {
            self.record(&format!("auto_commit={enabled}"));
            *self.auto_commit.lock().unwrap() = enabled;
            Ok(())
        }
        fn commit(&self) -> DbResult<()> {
            self.record("commit");
            if self.fail_commit {
                Err(DbError::Other("commit refused".into()))
            } else {
                Ok(())
            }
        }
        fn rollback(&self) -> DbResult<()> {
            self.record("rollback");
            if self.fail_rollback {
                Err(DbError::Other("rollback refused".into()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn success_commits_and_restores_auto_commit() {
        let conn = TraceConn::new();
        let result = with_transaction_result(&conn, |c| {
            c.execute("INSERT 1", &[])?;
            Ok(42)
        })
        .unwrap();
        assert_eq!(result, 42);
        assert_eq!(
            conn.events(),
            vec!["auto_commit=false", "INSERT 1", "commit", "auto_commit=true"]
        );
        assert!(conn.auto_commit().unwrap());
    }

    #[test]
    fn failure_rolls_back_and_surfaces_original_error() {
        let conn = TraceConn::new();
        let err = with_transaction_result::<(), _>(&conn, |c| {
            c.execute("INSERT 1", &[])?;
            Err(DbError::Other("boom".into()))
        })
        .unwrap_err();

        assert!(err.is_transaction_failure());
        let source = std::error::Error::source(&err).expect("original cause preserved");
        assert!(source.to_string().contains("boom"));
        assert_eq!(
            conn.events(),
            vec![
                "auto_commit=false",
                "INSERT 1",
                "rollback",
                "auto_commit=true"
            ]
        );
        assert!(conn.auto_commit().unwrap());
    }

    #[test]
    fn commit_failure_triggers_rollback() {
        let mut conn = TraceConn::new();
        conn.fail_commit = true;
        let err = with_transaction_result(&conn, |_| Ok(1)).unwrap_err();
        assert!(err.is_transaction_failure());
        let events = conn.events();
        assert!(events.contains(&"commit".to_string()));
        assert!(events.contains(&"rollback".to_string()));
    }

    #[test]
    fn rollback_failure_keeps_original_error_text() {
        let mut conn = TraceConn::new();
        conn.fail_rollback = true;
        let err = with_transaction_result::<(), _>(&conn, |_| {
            Err(DbError::Other("primary failure".into()))
        })
        .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("primary failure"));
        assert!(text.contains("rollback failed"));
    }
}
