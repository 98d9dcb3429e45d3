//! Applied-migration ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::migration::MigrationId;

/// Default name of the ledger table.
pub const DEFAULT_LEDGER_TABLE: &str = "_graft_migrations";

/// A record of an applied migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Migration id.
    pub id: MigrationId,
    /// Checksum of the apply SQL when it ran.
    pub checksum: String,
    /// When the migration was applied.
    pub applied_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Create an entry applied now.
    pub fn new(id: MigrationId, checksum: impl Into<String>) -> Self {
        Self {
            id,
            checksum: checksum.into(),
            applied_at: Utc::now(),
        }
    }
}

/// The ledger's most recently applied entry.
///
/// Entries are expected in application order, as returned by
/// [`Database::ledger`](crate::connection::Database::ledger).
pub fn last_applied(entries: &[LedgerEntry]) -> Option<&LedgerEntry> {
    entries.last()
}
