//! SQLite configuration.

use std::path::{Path, PathBuf};

use graft_migrate::DEFAULT_LEDGER_TABLE;

use crate::error::{SqliteError, SqliteResult};

/// SQLite database configuration.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Database path (or ":memory:" for in-memory).
    pub path: DatabasePath,
    /// Create the database file if it does not exist.
    pub create_if_missing: bool,
    /// Enable foreign keys.
    pub foreign_keys: bool,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: Option<u32>,
    /// Journal mode. `None` keeps the SQLite default.
    pub journal_mode: Option<JournalMode>,
    /// Name of the ledger table.
    pub ledger_table: String,
}

/// Database path configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DatabasePath {
    /// In-memory database.
    #[default]
    Memory,
    /// File-based database.
    File(PathBuf),
}

impl DatabasePath {
    /// Check if this is an in-memory database.
    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }

    /// Human readable form for logs and errors.
    pub fn display(&self) -> String {
        match self {
            Self::Memory => ":memory:".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

/// SQLite journal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalMode {
    /// DELETE - Default mode, deletes journal after transaction.
    Delete,
    /// TRUNCATE - Truncates journal instead of deleting.
    Truncate,
    /// PERSIST - Keep journal file, zero out on commit.
    Persist,
    /// MEMORY - Keep journal in memory.
    Memory,
    /// WAL - Write-Ahead Logging.
    Wal,
}

impl JournalMode {
    /// Get the SQLite pragma value.
    pub fn as_pragma(&self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Truncate => "TRUNCATE",
            Self::Persist => "PERSIST",
            Self::Memory => "MEMORY",
            Self::Wal => "WAL",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "delete" => Some(Self::Delete),
            "truncate" => Some(Self::Truncate),
            "persist" => Some(Self::Persist),
            "memory" => Some(Self::Memory),
            "wal" => Some(Self::Wal),
            _ => None,
        }
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: DatabasePath::Memory,
            create_if_missing: true,
            foreign_keys: true,
            busy_timeout_ms: Some(5000),
            journal_mode: None,
            ledger_table: DEFAULT_LEDGER_TABLE.to_string(),
        }
    }
}

impl SqliteConfig {
    /// Create a new configuration for an in-memory database.
    pub fn memory() -> Self {
        Self {
            path: DatabasePath::Memory,
            ..Default::default()
        }
    }

    /// Create a new configuration for a file-based database.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            path: DatabasePath::File(path.as_ref().to_path_buf()),
            ..Default::default()
        }
    }

    /// Parse a SQLite URL into configuration.
    ///
    /// Supported formats:
    /// - `sqlite::memory:` - In-memory database
    /// - `sqlite://path/to/db.sqlite` - File-based database
    /// - `sqlite:path/to/db.sqlite` - File-based database
    /// - `file:path/to/db.sqlite` - Alternative format
    /// - `path/to/db.sqlite` - Bare path
    ///
    /// Query options: `mode=memory`, `mode=rw` (do not create), `foreign_keys`,
    /// `busy_timeout`, `journal_mode`, `ledger_table`.
    pub fn from_url(url: impl AsRef<str>) -> SqliteResult<Self> {
        let url_str = url.as_ref().trim();

        if url_str.is_empty() {
            return Err(SqliteError::config("database url is empty"));
        }
        if url_str == "sqlite::memory:" || url_str == ":memory:" {
            return Ok(Self::memory());
        }

        let (location, query) = match url_str.split_once('?') {
            Some((location, query)) => (location, Some(query)),
            None => (url_str, None),
        };

        let path = if let Some(rest) = location.strip_prefix("sqlite://") {
            rest
        } else if let Some(rest) = location.strip_prefix("sqlite:") {
            rest
        } else if let Some(rest) = location.strip_prefix("file:") {
            rest
        } else {
            location
        };

        let mut config = match path {
            "" => return Err(SqliteError::config("database path is required")),
            ":memory:" => Self::memory(),
            path => Self::file(path),
        };

        for pair in query.into_iter().flat_map(|q| q.split('&')) {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            match key {
                "mode" => match value {
                    "memory" => config.path = DatabasePath::Memory,
                    "rw" => config.create_if_missing = false,
                    "rwc" => config.create_if_missing = true,
                    other => {
                        return Err(SqliteError::config(format!("unknown mode '{}'", other)));
                    }
                },
                "foreign_keys" => {
                    config.foreign_keys = value == "true" || value == "1";
                }
                "busy_timeout" => {
                    let ms = value.parse().map_err(|_| {
                        SqliteError::config(format!("invalid busy_timeout '{}'", value))
                    })?;
                    config.busy_timeout_ms = Some(ms);
                }
                "journal_mode" => {
                    let mode = JournalMode::parse(value).ok_or_else(|| {
                        SqliteError::config(format!("unknown journal_mode '{}'", value))
                    })?;
                    config.journal_mode = Some(mode);
                }
                "ledger_table" => {
                    config = config.ledger_table(value)?;
                }
                _ => {}
            }
        }

        Ok(config)
    }

    /// Enable or disable foreign keys.
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    /// Set the busy timeout in milliseconds.
    pub fn busy_timeout(mut self, ms: u32) -> Self {
        self.busy_timeout_ms = Some(ms);
        self
    }

    /// Set the journal mode.
    pub fn journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = Some(mode);
        self
    }

    /// Refuse to create a missing database file.
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Resolve a relative database file path against `base`.
    pub fn relative_to(mut self, base: &Path) -> Self {
        if let DatabasePath::File(path) = &self.path {
            if path.is_relative() {
                self.path = DatabasePath::File(base.join(path));
            }
        }
        self
    }

    /// Set the ledger table name. Only ASCII letters, digits and `_` are allowed.
    pub fn ledger_table(mut self, table: impl Into<String>) -> SqliteResult<Self> {
        let table = table.into();
        let valid = !table.is_empty()
            && !table.starts_with(|c: char| c.is_ascii_digit())
            && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(SqliteError::config(format!(
                "invalid ledger table name '{}'",
                table
            )));
        }
        self.ledger_table = table;
        Ok(self)
    }
}
