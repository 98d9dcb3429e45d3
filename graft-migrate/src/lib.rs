//! # graft-migrate
//!
//! Migration engine for Graft.
//!
//! This crate provides functionality for:
//! - Discovering migration artifacts on disk and pairing up/down halves
//! - Capturing the DDL implied by declared models through a driver dry run
//! - Tracking applied migrations in a ledger table inside the target database
//! - Applying and rolling back migrations, one transaction per migration
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌───────────────┐
//! │ Declared     │────▶│ Diff Capturer  │────▶│ Artifact      │
//! │ Models       │     │ (dry run)      │     │ Store (write) │
//! └──────────────┘     └────────────────┘     └───────────────┘
//!
//! ┌──────────────┐     ┌────────────────┐     ┌───────────────┐
//! │ Artifact     │────▶│ Pairer         │────▶│ Engine        │
//! │ Store (read) │     │ (by id)        │     │ + Ledger      │
//! └──────────────┘     └────────────────┘     └───────────────┘
//! ```
//!
//! The engine is synchronous. Database access goes through the
//! [`ConnectionProvider`], [`Database`] and [`Transaction`] traits, which a
//! driver crate such as `graft-sqlite` implements.
//!
//! ## Example
//!
//! ```rust,ignore
//! use graft_migrate::{MigrationConfig, MigrationEngine, Model, Field, FieldType};
//!
//! let config = MigrationConfig::new().migrations_dir("./migrations");
//! let engine = MigrationEngine::new(config, provider);
//!
//! let models = vec![
//!     Model::new("User")
//!         .field(Field::new("id", FieldType::BigInt).primary_key())
//!         .field(Field::new("email", FieldType::String).unique()),
//! ];
//! engine.create_migration("create_users", &models)?;
//!
//! let report = engine.migrate()?;
//! println!("{}", report.summary());
//!
//! engine.rollback_last()?;
//! ```
//!
//! ## Migration Files
//!
//! ```text
//! migrations/
//! ├── 20231215120000_create_users_up.sql
//! ├── 20231215120000_create_users_down.sql
//! ├── 20231216090000_add_posts_up.sql
//! └── 20231216090000_add_posts_down.sql
//! ```

pub mod connection;
pub mod diff;
pub mod engine;
pub mod error;
pub mod file;
pub mod history;
pub mod migration;
pub mod model;
pub mod pair;
pub mod template;

// Re-exports
pub use connection::{ConnectionProvider, Database, Transaction};
pub use diff::{
    Capture, ConnectFailurePolicy, DryRun, SchemaDiff, SchemaDiffCapturer, Statement,
    StatementSink, is_introspection,
};
pub use engine::{
    CreatedMigration, MigrationConfig, MigrationEngine, MigrationReport, MigrationStatus,
    RollbackReport,
};
pub use error::{ErrorKind, MigrateResult, MigrationError};
pub use file::{ArtifactName, ArtifactPaths, ArtifactStore, RawArtifact};
pub use history::{DEFAULT_LEDGER_TABLE, LedgerEntry};
pub use migration::{Direction, MigrationId, MigrationUnit, compute_checksum};
pub use model::{Field, FieldType, Model};
pub use pair::{MigrationSet, pair, pair_with_extension};
pub use template::ArtifactTemplate;
