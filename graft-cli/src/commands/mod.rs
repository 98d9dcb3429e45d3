//! CLI command implementations.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::CliResult;

pub mod init;
pub mod migrate;

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    /// Path to the configuration file.
    pub config_path: PathBuf,
    /// Database URL given on the command line or through the environment.
    pub database_url: Option<String>,
}

impl Context {
    /// Load the configuration file.
    pub fn load_config(&self) -> CliResult<Config> {
        Config::load(&self.config_path)
    }

    /// Directory relative paths in the configuration resolve against.
    pub fn base_dir(&self) -> &Path {
        self.config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }
}
