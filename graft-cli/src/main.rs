//! Graft CLI - Command-line interface for Graft migrations.

use clap::Parser;

use graft_cli::cli::{Cli, Command};
use graft_cli::commands;
use graft_cli::error::CliResult;
use graft_cli::{logging, output};

fn main() {
    logging::init();

    if let Err(e) = run() {
        output::newline();
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let ctx = cli.context();

    match cli.command {
        Command::Init(args) => commands::init::run(&ctx, args),
        Command::Create(args) => commands::migrate::run_create(&ctx, args),
        Command::Up => commands::migrate::run_up(&ctx),
        Command::Down => commands::migrate::run_down(&ctx),
        Command::Status => commands::migrate::run_status(&ctx),
    }
}
