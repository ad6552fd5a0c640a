//! CLI module for the Isekai API
//!
//! Provides command-line interface for:
//! - serve: Connect to the database and serve HTTP
//! - check-config: Print the effective configuration

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{check_config, load_config, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
