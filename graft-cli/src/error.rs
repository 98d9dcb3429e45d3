//! CLI error types and result alias.

use graft_migrate::MigrationError;
use graft_sqlite::SqliteError;
use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(graft::io))]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(code(graft::config))]
    Config(String),

    /// Migration error
    #[error("{0}")]
    #[diagnostic(code(graft::migration))]
    Migration(#[from] MigrationError),

    /// Database error
    #[error("Database error: {0}")]
    #[diagnostic(code(graft::database))]
    Database(String),
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(format!("Failed to parse TOML: {}", err))
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(err: toml::ser::Error) -> Self {
        CliError::Config(format!("Failed to serialize TOML: {}", err))
    }
}

impl From<SqliteError> for CliError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::Config(msg) => CliError::Config(msg),
            other => CliError::Database(other.to_string()),
        }
    }
}
