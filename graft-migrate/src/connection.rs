//! Database collaborator interfaces.
//!
//! The engine never speaks SQL itself. A driver crate implements these traits
//! for one database: opening a connection, keeping the ledger table, and
//! running batches inside a transaction.

use crate::error::MigrateResult;
use crate::history::LedgerEntry;
use crate::migration::MigrationId;

/// Opens live connections to the target database.
pub trait ConnectionProvider {
    /// Connection type handed out.
    type Connection: Database;

    /// Open a connection. Failures should be reported as
    /// [`MigrationError::Connection`](crate::error::MigrationError::Connection).
    fn connect(&self) -> MigrateResult<Self::Connection>;
}

/// A live connection able to run migrations.
pub trait Database {
    /// Transaction type borrowed from this connection.
    type Transaction<'a>: Transaction
    where
        Self: 'a;

    /// Create the ledger table if it does not exist.
    fn ensure_ledger(&mut self) -> MigrateResult<()>;

    /// All ledger entries in application order, oldest first.
    fn ledger(&mut self) -> MigrateResult<Vec<LedgerEntry>>;

    /// Begin a transaction.
    fn begin(&mut self) -> MigrateResult<Self::Transaction<'_>>;
}

/// A transaction scoped to exactly one migration unit.
///
/// Dropping a transaction without committing must roll it back.
pub trait Transaction {
    /// Execute a batch of statements.
    fn execute_batch(&mut self, sql: &str) -> MigrateResult<()>;

    /// Add a ledger entry for `id`.
    fn record_applied(&mut self, id: &MigrationId, checksum: &str) -> MigrateResult<()>;

    /// Remove the ledger entry for `id`.
    fn remove_applied(&mut self, id: &MigrationId) -> MigrateResult<()>;

    /// Commit the transaction.
    fn commit(self) -> MigrateResult<()>;

    /// Roll the transaction back.
    fn rollback(self) -> MigrateResult<()>;
}
