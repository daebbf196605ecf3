//! Error types for relq.

use thiserror::Error;

/// Result type alias for relq operations.
pub type DbResult<T> = Result<T, DbError>;

/// Error types for statement building and execution.
#[derive(Debug, Error)]
pub enum DbError {
    /// A caller-contract violation detected before any database round-trip
    /// (blank identifier, batch arity mismatch, DDL with no columns, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// A failure reported by the underlying driver.
    #[error("driver error: {0}")]
    Driver(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A statement failed during execution; the driver cause is preserved.
    #[error("{operation} failed on table '{table}'")]
    Statement {
        operation: &'static str,
        table: String,
        #[source]
        source: Box<DbError>,
    },

    /// The unit of work failed and its transaction was rolled back.
    #[error("transaction failed, rolled back")]
    Transaction(#[source] Box<DbError>),

    /// A column value could not be converted to the requested Rust type.
    #[error("decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// A row mapper failed mid-iteration; partial results are discarded.
    #[error("row mapping failed on table '{table}'")]
    Mapping {
        table: String,
        #[source]
        source: Box<DbError>,
    },

    /// The active dialect has no syntax for the requested operation.
    #[error("unsupported by dialect: {0}")]
    Unsupported(String),

    /// An asynchronous wrapper task failed to complete.
    #[error("async task failed: {0}")]
    Task(String),

    /// Other errors.
    #[error("{0}")]
    Other(String),
}

impl DbError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a decode error for a specific column.
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Wrap a failure with the operation and table it occurred on.
    pub fn statement(operation: &'static str, table: impl Into<String>, source: DbError) -> Self {
        Self::Statement {
            operation,
            table: table.into(),
            source: Box::new(source),
        }
    }

    /// Check if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error (or any error in its source chain) marks a
    /// rolled-back transaction.
    pub fn is_transaction_failure(&self) -> bool {
        matches!(self, Self::Transaction(_))
    }
}
