//! Graft CLI - Command-line interface for Graft migrations.
//!
//! This crate provides the `graft` binary: project configuration,
//! migration creation from declared models, and applying, rolling back
//! and inspecting migrations against a SQLite database.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
