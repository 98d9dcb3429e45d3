//! # Graft
//!
//! SQL migrations captured from declared models.
//!
//! Graft provides:
//! - Migration artifacts as plain `<id>_<name>_up.sql` / `<id>_<name>_down.sql` pairs
//! - Schema diff capture: the DDL a driver would run for your models, written
//!   into a new migration instead of being executed
//! - An applied-migration ledger inside the target database
//! - Apply and roll back, one transaction per migration
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use graft::prelude::*;
//!
//! let provider = SqliteProvider::from_url("sqlite://./app.db")?;
//! let config = MigrationConfig::new().migrations_dir("./migrations");
//! let engine = MigrationEngine::new(config, provider);
//!
//! let models = vec![
//!     Model::new("User")
//!         .field(Field::new("id", FieldType::BigInt).primary_key())
//!         .field(Field::new("email", FieldType::String).unique()),
//! ];
//!
//! engine.create_migration("create_users", &models)?;
//! let report = engine.migrate()?;
//! println!("{}", report.summary());
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Migration engine, artifacts and ledger.
pub mod migrate {
    pub use graft_migrate::*;
}

/// SQLite driver.
#[cfg(feature = "sqlite")]
pub mod sqlite {
    pub use graft_sqlite::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use graft_migrate::{
        ConnectFailurePolicy, Field, FieldType, MigrateResult, MigrationConfig, MigrationEngine,
        MigrationError, Model,
    };

    #[cfg(feature = "sqlite")]
    pub use graft_sqlite::{SqliteConfig, SqliteProvider};
}

// Re-export key types at the crate root
pub use graft_migrate::{MigrateResult, MigrationEngine, MigrationError};
