//! Migration ids and units.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{MigrateResult, MigrationError};

/// Identifier of a migration unit.
///
/// Ids are non-empty runs of ASCII digits. They double as file name prefix and
/// ledger primary key, and compare numerically so that `9` sorts before `10`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MigrationId(String);

impl MigrationId {
    /// Validate and wrap a raw id.
    pub fn parse(raw: impl Into<String>) -> MigrateResult<Self> {
        let raw = raw.into();
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MigrationError::InvalidId(raw));
        }
        Ok(Self(raw))
    }

    /// Generate an id from a point in time (`YYYYMMDDHHMMSS`).
    pub fn from_timestamp(at: DateTime<Utc>) -> Self {
        Self(at.format("%Y%m%d%H%M%S").to_string())
    }

    /// Generate an id for the current time.
    pub fn generate() -> Self {
        Self::from_timestamp(Utc::now())
    }

    /// The next id in numeric order, when the id fits in a `u128`.
    pub fn successor(&self) -> Option<Self> {
        self.0
            .parse::<u128>()
            .ok()
            .and_then(|n| n.checked_add(1))
            .map(|n| Self(n.to_string()))
    }

    /// The raw id text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn significant(&self) -> &str {
        let trimmed = self.0.trim_start_matches('0');
        if trimmed.is_empty() { "0" } else { trimmed }
    }
}

impl Ord for MigrationId {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.significant(), other.significant());
        a.len()
            .cmp(&b.len())
            .then_with(|| a.cmp(b))
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for MigrationId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MigrationId {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MigrationId {
    type Error = MigrationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<MigrationId> for String {
    fn from(id: MigrationId) -> Self {
        id.0
    }
}

/// Direction of a migration artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Apply the migration (up).
    Up,
    /// Reverse the migration (down).
    Down,
}

impl Direction {
    /// Tag used in artifact file names.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    /// Parse a file name tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One logical migration: a forward and a backward SQL batch sharing an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationUnit {
    /// Migration id.
    pub id: MigrationId,
    /// Human readable label.
    pub name: String,
    /// SQL executed to move forward. May be empty.
    pub apply_sql: String,
    /// SQL executed to move backward. May be empty.
    pub rollback_sql: String,
    has_apply: bool,
    has_rollback: bool,
}

impl MigrationUnit {
    /// Create a unit with both halves present.
    pub fn new(
        id: MigrationId,
        name: impl Into<String>,
        apply_sql: impl Into<String>,
        rollback_sql: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            apply_sql: apply_sql.into(),
            rollback_sql: rollback_sql.into(),
            has_apply: true,
            has_rollback: true,
        }
    }

    /// Create a unit with neither half seen yet.
    pub(crate) fn empty(id: MigrationId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            apply_sql: String::new(),
            rollback_sql: String::new(),
            has_apply: false,
            has_rollback: false,
        }
    }

    /// Whether the half for `direction` was found.
    pub fn has(&self, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.has_apply,
            Direction::Down => self.has_rollback,
        }
    }

    /// Fill in one half. Returns `false` if that half was already set.
    pub(crate) fn set(&mut self, direction: Direction, sql: String) -> bool {
        let (slot, seen) = match direction {
            Direction::Up => (&mut self.apply_sql, &mut self.has_apply),
            Direction::Down => (&mut self.rollback_sql, &mut self.has_rollback),
        };
        if *seen {
            return false;
        }
        *slot = sql;
        *seen = true;
        true
    }

    /// SQL for a direction.
    pub fn sql(&self, direction: Direction) -> &str {
        match direction {
            Direction::Up => &self.apply_sql,
            Direction::Down => &self.rollback_sql,
        }
    }

    /// Both the apply and the rollback artifact exist.
    pub fn is_complete(&self) -> bool {
        self.has_apply && self.has_rollback
    }

    /// Checksum of the apply SQL, as stored in the ledger.
    pub fn checksum(&self) -> String {
        compute_checksum(&self.apply_sql)
    }
}

/// Hex encoded SHA-256 of migration content.
pub fn compute_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
