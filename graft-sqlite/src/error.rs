//! Error types for SQLite operations.

use graft_migrate::MigrationError;
use thiserror::Error;

/// Result type for SQLite operations.
pub type SqliteResult<T> = Result<T, SqliteError>;

/// Error type for SQLite operations.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite driver error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Ledger table holds a row that cannot be read back.
    #[error("Ledger error: {0}")]
    Ledger(String),
}

impl SqliteError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a ledger error.
    pub fn ledger(msg: impl Into<String>) -> Self {
        Self::Ledger(msg.into())
    }
}

impl From<SqliteError> for MigrationError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::Connection(msg) => MigrationError::connection(msg),
            SqliteError::Config(msg) => MigrationError::database(format!("config: {}", msg)),
            SqliteError::Sqlite(e) => MigrationError::database(e.to_string()),
            SqliteError::Ledger(msg) => MigrationError::database(format!("ledger: {}", msg)),
        }
    }
}
