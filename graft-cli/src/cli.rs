//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::Context;
use crate::config::CONFIG_FILE_NAME;

/// Graft CLI - SQL migrations from declared models
#[derive(Parser, Debug)]
#[command(name = "graft")]
#[command(version)]
#[command(about = "Graft CLI - SQL migrations from declared models", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Database URL, overrides `[database] url` from the configuration file
    #[arg(long, global = true, env = "GRAFT_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Global options shared by every command.
    pub fn context(&self) -> Context {
        Context {
            config_path: self.config.clone(),
            database_url: self.database_url.clone(),
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default configuration file
    Init(InitArgs),

    /// Create a new migration from the declared models
    Create(CreateArgs),

    /// Apply all pending migrations
    Up,

    /// Roll back the most recently applied migration
    Down,

    /// Show applied and pending migrations
    Status,
}

// =============================================================================
// Init Command
// =============================================================================

/// Arguments for the `init` command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration file
    #[arg(short, long)]
    pub force: bool,
}

// =============================================================================
// Create Command
// =============================================================================

/// Arguments for the `create` command
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Migration name (letters, digits, `_` and `-`)
    pub name: String,
}
