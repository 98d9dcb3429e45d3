//! Error types for the migration engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::migration::MigrationId;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Coarse classification of a [`MigrationError`].
///
/// The kinds are stable and meant for callers that branch on the failure
/// class rather than on the exact variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input or configuration, rejected before any side effect.
    Configuration,
    /// The target database could not be reached.
    Connectivity,
    /// There was nothing to apply or roll back.
    NothingToDo,
    /// A SQL batch failed inside its transaction.
    Execution,
    /// The ledger references a migration that is missing on disk.
    Lookup,
    /// A filesystem operation failed.
    Io,
    /// The database collaborator failed outside a migration batch.
    Database,
}

/// Errors that can occur during migration operations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The migrations folder does not exist or cannot be listed.
    #[error("could not find dir {}", .0.display())]
    FolderNotFound(PathBuf),

    /// Connecting to the target database failed.
    #[error("connection to database failed, can not run migrations: {0}")]
    Connection(String),

    /// Database operation error.
    #[error("Database error: {0}")]
    Database(String),

    /// An artifact name carries a direction suffix but breaks the filename grammar.
    #[error("Invalid migration artifact '{file_name}': {reason}")]
    InvalidArtifact {
        /// Offending file name.
        file_name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A migration id failed validation.
    #[error("Invalid migration id '{0}': expected ASCII digits")]
    InvalidId(String),

    /// A migration name cannot be used in a file name.
    #[error("Invalid migration name '{0}'")]
    InvalidName(String),

    /// The artifact template is unusable.
    #[error("Invalid artifact template: {0}")]
    InvalidTemplate(String),

    /// Two discovered artifacts claim the same id for different units.
    #[error("Duplicate migration id '{id}': '{first}' conflicts with '{second}'")]
    DuplicateId {
        /// The shared id.
        id: MigrationId,
        /// File name seen first.
        first: String,
        /// File name that conflicts with it.
        second: String,
    },

    /// The migrations folder holds no migration units.
    #[error("no migrations to run")]
    NoMigrations,

    /// Every discovered migration is already recorded in the ledger.
    #[error("no pending migrations, database is up to date")]
    UpToDate,

    /// The ledger is empty.
    #[error("no migrations to roll back")]
    NothingToRollback,

    /// The ledger references a migration that is not on disk.
    #[error("Migration '{0}' is recorded as applied but was not found in the migrations folder")]
    NotFound(MigrationId),

    /// A migration batch failed and its transaction was rolled back.
    #[error("Migration '{id}' failed: {message}")]
    Execution {
        /// Migration whose batch failed.
        id: MigrationId,
        /// Driver message.
        message: String,
        /// Ids committed earlier in the same run, in application order.
        committed: Vec<MigrationId>,
    },
}

impl MigrationError {
    /// Create a database error.
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create an invalid artifact error.
    pub fn invalid_artifact(file_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArtifact {
            file_name: file_name.into(),
            reason: reason.into(),
        }
    }

    /// Create an execution error for a failed migration batch.
    pub fn execution(
        id: MigrationId,
        message: impl Into<String>,
        committed: Vec<MigrationId>,
    ) -> Self {
        Self::Execution {
            id,
            message: message.into(),
            committed,
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::FolderNotFound(_)
            | Self::InvalidArtifact { .. }
            | Self::InvalidId(_)
            | Self::InvalidName(_)
            | Self::InvalidTemplate(_)
            | Self::DuplicateId { .. } => ErrorKind::Configuration,
            Self::Connection(_) => ErrorKind::Connectivity,
            Self::NoMigrations | Self::UpToDate | Self::NothingToRollback => {
                ErrorKind::NothingToDo
            }
            Self::NotFound(_) => ErrorKind::Lookup,
            Self::Execution { .. } => ErrorKind::Execution,
            Self::Database(_) => ErrorKind::Database,
        }
    }

    /// Ids committed before the failure, if this error stopped a run midway.
    pub fn committed(&self) -> &[MigrationId] {
        match self {
            Self::Execution { committed, .. } => committed,
            _ => &[],
        }
    }

    /// Check if this is a recoverable error.
    ///
    /// Only connectivity failures qualify: migration creation degrades to an
    /// empty diff instead of aborting.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Connectivity)
    }
}
