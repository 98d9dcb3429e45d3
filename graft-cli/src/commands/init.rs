//! `graft init` command - Write a starter configuration file.

use crate::cli::InitArgs;
use crate::commands::Context;
use crate::config::Config;
use crate::error::{CliError, CliResult};
use crate::output::{self, success};

/// Run the init command
pub fn run(ctx: &Context, args: InitArgs) -> CliResult<()> {
    output::header("Initialize Graft Project");

    let config_path = &ctx.config_path;
    if config_path.exists() && !args.force {
        return Err(CliError::Config(format!(
            "{} already exists, use --force to overwrite",
            config_path.display()
        )));
    }

    let config = Config::starter();
    config.save(config_path)?;
    success(&format!("Created {}", config_path.display()));

    output::newline();
    output::section("Next steps");
    let migrations_dir = ctx.base_dir().join(&config.migrations.directory);
    if !migrations_dir.is_dir() {
        output::list_item(&format!(
            "Create the migrations directory {}",
            migrations_dir.display()
        ));
    }
    output::list_item("Declare your models under [[models]]");
    output::list_item("Run `graft create <name>` to capture a migration");

    Ok(())
}
