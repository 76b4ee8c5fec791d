//! Common error types for RecordKeeper

use thiserror::Error;

/// Common result type for RecordKeeper operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the web service and the admin CLI
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Write rejected by a uniqueness constraint
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Connection to the store could not be established
    #[error("Database unavailable: {0}")]
    StoreUnavailable(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for Error {
    /// Sort sqlx failures into the store taxonomy.
    ///
    /// Uniqueness violations become `Conflict` and pool/connection failures
    /// become `StoreUnavailable`, so callers can tell "already exists" apart
    /// from "database down". Everything else stays a plain `Database` error.
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                Error::Conflict(db_err.message().to_string())
            }
            sqlx::Error::PoolTimedOut => {
                Error::StoreUnavailable("timed out waiting for a connection".to_string())
            }
            sqlx::Error::PoolClosed => {
                Error::StoreUnavailable("connection pool is closed".to_string())
            }
            sqlx::Error::Io(ref io) => Error::StoreUnavailable(io.to_string()),
            sqlx::Error::Tls(ref tls) => Error::StoreUnavailable(tls.to_string()),
            other => Error::Database(other),
        }
    }
}
