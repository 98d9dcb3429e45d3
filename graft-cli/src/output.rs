//! Terminal output for graft commands.
//!
//! Command results go to stdout; errors go to stderr.

use std::fmt;
use std::path::Path;

use owo_colors::OwoColorize;

/// Command banner, e.g. `graft ▸ Apply Migrations`.
pub fn header(text: &str) {
    println!();
    println!("{} {}", "graft ▸".dimmed(), text.bold().cyan());
    println!();
}

pub fn section(text: &str) {
    println!("{}", text.bold().white());
}

/// Aligned `key: value` line.
pub fn kv(key: &str, value: &str) {
    let key = format!("{:<11}", format!("{}:", key));
    println!("  {}{}", key.dimmed(), value);
}

pub fn success(text: &str) {
    println!("{} {}", "✔".green().bold(), text.green());
}

/// Informational line, used for capture notices.
pub fn info(text: &str) {
    println!("{} {}", "ℹ".blue().bold(), text);
}

pub fn warn(text: &str) {
    println!("{} {}", "⚠".yellow().bold(), text.yellow());
}

/// Error line on stderr.
pub fn error(text: &str) {
    eprintln!("{} {}", "✖".red().bold(), text.red());
}

pub fn list_item(text: &str) {
    println!("  {} {}", "•".dimmed(), text);
}

/// A file written or read by the command.
pub fn path(path: &Path) {
    println!("  {} {}", "→".dimmed(), path.display());
}

pub fn newline() {
    println!();
}

/// SQL body with a gutter, skipping blank lines.
pub fn sql(body: &str) {
    for line in body.lines().filter(|l| !l.trim().is_empty()) {
        println!("  {} {}", "│".dimmed(), line.bright_white());
    }
}

/// Where a migration stands relative to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    Applied,
    Pending,
    Modified,
    Missing,
}

impl MigrationState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Pending => "pending",
            Self::Modified => "modified",
            Self::Missing => "missing",
        }
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = self.label();
        match self {
            Self::Applied => write!(f, "{}", label.green()),
            Self::Pending => write!(f, "{}", label.yellow()),
            Self::Modified | Self::Missing => write!(f, "{}", label.red()),
        }
    }
}

/// One migration row: `• <id> <state> <detail>`.
pub fn migration(id: &dyn fmt::Display, state: MigrationState, detail: Option<&str>) {
    match detail {
        Some(detail) => println!("  {} {} {} {}", "•".dimmed(), id, state, detail.dimmed()),
        None => println!("  {} {} {}", "•".dimmed(), id, state),
    }
}
