//! CLI configuration handling.

use serde::{Deserialize, Serialize};
use std::path::Path;

use graft_migrate::{ArtifactTemplate, ConnectFailurePolicy, MigrationConfig, Model};

use crate::error::{CliError, CliResult};

/// Default config file name (lives in project root)
pub const CONFIG_FILE_NAME: &str = "graft.toml";

/// Default migrations directory (relative to the config file)
pub const MIGRATIONS_DIR: &str = "migrations";

/// Default database URL written by `graft init`
pub const DEFAULT_DATABASE_URL: &str = "sqlite://graft.db";

/// Graft CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Migration configuration
    pub migrations: MigrationsConfig,

    /// Declared models used when creating migrations
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<Model>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("could not read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> CliResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Configuration written by `graft init`.
    pub fn starter() -> Self {
        Self {
            database: DatabaseConfig {
                url: Some(DEFAULT_DATABASE_URL.to_string()),
            },
            ..Self::default()
        }
    }

    /// Engine configuration. Relative directories resolve against `base`.
    pub fn migration_config(&self, base: &Path) -> CliResult<MigrationConfig> {
        let mut config = MigrationConfig::new()
            .migrations_dir(base.join(&self.migrations.directory))
            .extension(self.migrations.extension.as_str())
            .connect_failure(self.migrations.on_connect_failure);
        if let Some(template) = &self.migrations.template {
            config = config.template(ArtifactTemplate::new(template.as_str())?);
        }
        Ok(config)
    }

    /// Database URL, preferring `override_url` over the configured one.
    pub fn database_url(&self, override_url: Option<&str>) -> CliResult<String> {
        override_url
            .map(str::to_string)
            .or_else(|| self.database.url.clone())
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                CliError::Config(
                    "no database url: set [database] url or GRAFT_DATABASE_URL".to_string(),
                )
            })
    }
}

/// Database configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub url: Option<String>,
}

/// Migration configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationsConfig {
    /// Directory for migration files. Must already exist.
    pub directory: String,

    /// Artifact file extension
    pub extension: String,

    /// Tera template for artifact files; must render `{{ sql }}` once
    pub template: Option<String>,

    /// What `create` does when the database is unreachable
    pub on_connect_failure: ConnectFailurePolicy,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            directory: MIGRATIONS_DIR.to_string(),
            extension: graft_migrate::file::DEFAULT_EXTENSION.to_string(),
            template: None,
            on_connect_failure: ConnectFailurePolicy::default(),
        }
    }
}
