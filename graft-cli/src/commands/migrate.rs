//! `graft create|up|down|status` commands - Migration management.

use graft_migrate::MigrationEngine;
use graft_sqlite::{SqliteConfig, SqliteProvider};

use crate::cli::CreateArgs;
use crate::commands::Context;
use crate::config::Config;
use crate::error::CliResult;
use crate::output::{self, MigrationState, success};

/// Run `graft create <name>` - capture a migration from the declared models
pub fn run_create(ctx: &Context, args: CreateArgs) -> CliResult<()> {
    output::header("Create Migration");

    let (config, engine) = open_engine(ctx)?;
    output::kv(
        "Migrations",
        &engine.config().migrations_dir.display().to_string(),
    );
    output::kv("Models", &config.models.len().to_string());
    output::newline();

    let created = engine.create_migration(&args.name, &config.models)?;
    for notice in &created.notices {
        output::info(notice);
    }

    success(&format!("Migration '{}' created successfully.", created.name));
    output::path(&created.paths.up);
    output::path(&created.paths.down);

    if !created.diff.up.is_empty() {
        output::newline();
        output::section("Apply SQL");
        output::sql(&created.diff.up);
    }

    Ok(())
}

/// Run `graft up` - apply all pending migrations
pub fn run_up(ctx: &Context) -> CliResult<()> {
    output::header("Apply Migrations");

    let (_, engine) = open_engine(ctx)?;
    match engine.migrate() {
        Ok(report) => {
            for id in &report.applied {
                output::migration(id, MigrationState::Applied, None);
            }
            output::newline();
            success(&format!("Migrations successful: {}", report.summary()));
            Ok(())
        }
        Err(e) => {
            for id in e.committed() {
                output::migration(id, MigrationState::Applied, None);
            }
            Err(e.into())
        }
    }
}

/// Run `graft down` - roll back the most recently applied migration
pub fn run_down(ctx: &Context) -> CliResult<()> {
    output::header("Roll Back Migration");

    let (_, engine) = open_engine(ctx)?;
    let report = engine.rollback_last()?;

    success(&format!(
        "Rolled back {}_{} in {}ms",
        report.id, report.name, report.duration_ms
    ));
    Ok(())
}

/// Run `graft status` - compare the migrations folder with the ledger
pub fn run_status(ctx: &Context) -> CliResult<()> {
    output::header("Migration Status");

    let (_, engine) = open_engine(ctx)?;
    let status = engine.status()?;

    output::kv("Applied", &status.applied.len().to_string());
    output::kv("Pending", &status.pending.len().to_string());
    output::newline();

    for entry in &status.applied {
        let state = if status.modified.contains(&entry.id) {
            MigrationState::Modified
        } else if status.missing.contains(&entry.id) {
            MigrationState::Missing
        } else {
            MigrationState::Applied
        };
        let applied_at = entry.applied_at.format("%Y-%m-%d %H:%M:%S").to_string();
        output::migration(&entry.id, state, Some(&applied_at));
    }
    for id in &status.pending {
        output::migration(id, MigrationState::Pending, None);
    }

    output::newline();
    if !status.modified.is_empty() {
        output::warn("Some applied migrations were edited after they ran");
    }
    if !status.missing.is_empty() {
        output::warn("Some applied migrations are missing from the migrations folder");
    }
    if status.is_up_to_date() {
        success("Database is up to date");
    } else {
        output::info(&format!("{} migration(s) pending", status.pending.len()));
    }

    Ok(())
}

fn open_engine(ctx: &Context) -> CliResult<(Config, MigrationEngine<SqliteProvider>)> {
    let config = ctx.load_config()?;
    let url = config.database_url(ctx.database_url.as_deref())?;
    let mut sqlite = SqliteConfig::from_url(&url)?;
    // A configured relative path is relative to the config file, like the
    // migrations folder; an override is relative to the working directory.
    if ctx.database_url.is_none() {
        sqlite = sqlite.relative_to(ctx.base_dir());
    }
    let provider = SqliteProvider::new(sqlite);
    let engine = MigrationEngine::new(config.migration_config(ctx.base_dir())?, provider);
    Ok((config, engine))
}
