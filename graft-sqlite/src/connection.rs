//! SQLite connection, ledger and transaction handling.

use std::time::Duration;

use chrono::{DateTime, Utc};
use graft_migrate::{
    ConnectionProvider, Database, LedgerEntry, MigrateResult, MigrationId, Transaction,
};
use rusqlite::{Connection, OpenFlags, TransactionBehavior, params};
use tracing::{debug, trace};

use crate::config::{DatabasePath, SqliteConfig};
use crate::error::{SqliteError, SqliteResult};
use crate::types::quote_ident;

/// Opens a fresh [`SqliteDatabase`] for every engine operation.
#[derive(Debug, Clone)]
pub struct SqliteProvider {
    config: SqliteConfig,
}

impl SqliteProvider {
    /// Create a provider from a configuration.
    pub fn new(config: SqliteConfig) -> Self {
        Self { config }
    }

    /// Create a provider from a database URL.
    pub fn from_url(url: impl AsRef<str>) -> SqliteResult<Self> {
        Ok(Self::new(SqliteConfig::from_url(url)?))
    }

    /// Get the configuration.
    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }
}

impl ConnectionProvider for SqliteProvider {
    type Connection = SqliteDatabase;

    fn connect(&self) -> MigrateResult<SqliteDatabase> {
        Ok(SqliteDatabase::open(&self.config)?)
    }
}

/// An open SQLite database.
pub struct SqliteDatabase {
    pub(crate) conn: Connection,
    ledger_table: String,
}

impl SqliteDatabase {
    /// Open a database and apply the connection pragmas.
    pub fn open(config: &SqliteConfig) -> SqliteResult<Self> {
        debug!(path = %config.path.display(), "Opening SQLite database");

        let conn = match &config.path {
            DatabasePath::Memory => Connection::open_in_memory(),
            DatabasePath::File(path) => {
                let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX;
                if config.create_if_missing {
                    flags |= OpenFlags::SQLITE_OPEN_CREATE;
                }
                Connection::open_with_flags(path, flags)
            }
        }
        .map_err(|e| SqliteError::connection(format!("{}: {}", config.path.display(), e)))?;

        Self::with_connection(conn, config)
    }

    /// Wrap an already open connection.
    pub fn with_connection(conn: Connection, config: &SqliteConfig) -> SqliteResult<Self> {
        if let Some(ms) = config.busy_timeout_ms {
            conn.busy_timeout(Duration::from_millis(u64::from(ms)))?;
        }
        conn.pragma_update(None, "foreign_keys", config.foreign_keys)?;
        if let Some(mode) = config.journal_mode {
            let applied: String =
                conn.pragma_update_and_check(None, "journal_mode", mode.as_pragma(), |row| {
                    row.get(0)
                })?;
            trace!(requested = mode.as_pragma(), applied = %applied, "journal_mode set");
        }

        Ok(Self {
            conn,
            ledger_table: config.ledger_table.clone(),
        })
    }

    /// Get the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Name of the ledger table.
    pub fn ledger_table(&self) -> &str {
        &self.ledger_table
    }

    fn read_ledger(&self) -> SqliteResult<Vec<LedgerEntry>> {
        let sql = format!(
            "SELECT id, checksum, applied_at FROM {} ORDER BY rowid",
            quote_ident(&self.ledger_table)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, checksum, applied_at) = row?;
            let id = MigrationId::parse(&id)
                .map_err(|_| SqliteError::ledger(format!("invalid migration id '{}'", id)))?;
            let applied_at = DateTime::parse_from_rfc3339(&applied_at)
                .map_err(|e| {
                    SqliteError::ledger(format!("invalid applied_at for {}: {}", id, e))
                })?
                .with_timezone(&Utc);
            entries.push(LedgerEntry {
                id,
                checksum,
                applied_at,
            });
        }
        Ok(entries)
    }
}

impl std::fmt::Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDatabase")
            .field("path", &self.conn.path())
            .field("ledger_table", &self.ledger_table)
            .finish()
    }
}

impl Database for SqliteDatabase {
    type Transaction<'a> = SqliteTransaction<'a>;

    fn ensure_ledger(&mut self) -> MigrateResult<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\
             id TEXT PRIMARY KEY NOT NULL, \
             checksum TEXT NOT NULL, \
             applied_at TEXT NOT NULL)",
            quote_ident(&self.ledger_table)
        );
        self.conn
            .execute_batch(&sql)
            .map_err(SqliteError::from)?;
        Ok(())
    }

    fn ledger(&mut self) -> MigrateResult<Vec<LedgerEntry>> {
        Ok(self.read_ledger()?)
    }

    fn begin(&mut self) -> MigrateResult<SqliteTransaction<'_>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(SqliteError::from)?;
        Ok(SqliteTransaction {
            tx,
            ledger_table: &self.ledger_table,
        })
    }
}

/// A transaction covering one migration's SQL and its ledger change.
///
/// Dropping it without calling `commit` rolls back.
pub struct SqliteTransaction<'a> {
    tx: rusqlite::Transaction<'a>,
    ledger_table: &'a str,
}

impl Transaction for SqliteTransaction<'_> {
    fn execute_batch(&mut self, sql: &str) -> MigrateResult<()> {
        self.tx.execute_batch(sql).map_err(SqliteError::from)?;
        Ok(())
    }

    fn record_applied(&mut self, id: &MigrationId, checksum: &str) -> MigrateResult<()> {
        let sql = format!(
            "INSERT INTO {} (id, checksum, applied_at) VALUES (?1, ?2, ?3)",
            quote_ident(self.ledger_table)
        );
        self.tx
            .execute(&sql, params![id.as_str(), checksum, Utc::now().to_rfc3339()])
            .map_err(SqliteError::from)?;
        Ok(())
    }

    fn remove_applied(&mut self, id: &MigrationId) -> MigrateResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", quote_ident(self.ledger_table));
        self.tx
            .execute(&sql, params![id.as_str()])
            .map_err(SqliteError::from)?;
        Ok(())
    }

    fn commit(self) -> MigrateResult<()> {
        self.tx.commit().map_err(SqliteError::from)?;
        Ok(())
    }

    fn rollback(self) -> MigrateResult<()> {
        self.tx.rollback().map_err(SqliteError::from)?;
        Ok(())
    }
}
