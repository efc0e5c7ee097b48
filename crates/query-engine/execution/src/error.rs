//! Errors that can arise while talking to the database.

use thiserror::Error;

/// Execution failures. Messages reported by the database are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("{0}")]
    Statement(String),
    #[error("unable to acquire a database connection: {0}")]
    Connection(String),
    #[error("unable to read the catalog: {0}")]
    Catalog(String),
    #[error("row {row} has {found} values but the result has {expected} columns")]
    RowArity {
        row: usize,
        found: usize,
        expected: usize,
    },
}

impl From<sqlx::Error> for Error {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::Database(database_error) => {
                Error::Statement(database_error.message().to_string())
            }
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::WorkerCrashed => Error::Connection(error.to_string()),
            other => Error::Statement(other.to_string()),
        }
    }
}

impl Error {
    /// Reinterpret a failure that happened while reading the catalog.
    pub fn into_catalog(self) -> Self {
        match self {
            Error::Statement(message) => Error::Catalog(message),
            other => other,
        }
    }
}
