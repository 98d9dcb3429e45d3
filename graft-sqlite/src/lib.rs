//! SQLite driver for Graft migrations.
//!
//! Implements the `graft-migrate` collaborator traits on top of `rusqlite`:
//!
//! - [`SqliteProvider`] opens a connection per engine operation
//! - [`SqliteDatabase`] owns the ledger table and starts transactions
//! - [`SqliteTransaction`] runs one migration's SQL and ledger change atomically
//! - the [`DryRun`](graft_migrate::DryRun) impl reports additive DDL for declared models
//!
//! # Example
//!
//! ```rust,ignore
//! use graft_migrate::{MigrationConfig, MigrationEngine};
//! use graft_sqlite::SqliteProvider;
//!
//! let provider = SqliteProvider::from_url("sqlite://./app.db")?;
//! let engine = MigrationEngine::new(MigrationConfig::new(), provider);
//! engine.migrate()?;
//! ```

pub mod config;
pub mod connection;
pub mod dry_run;
pub mod error;
pub mod types;

pub use config::{DatabasePath, JournalMode, SqliteConfig};
pub use connection::{SqliteDatabase, SqliteProvider, SqliteTransaction};
pub use error::{SqliteError, SqliteResult};
