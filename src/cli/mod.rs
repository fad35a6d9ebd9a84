//! Command-line interface: argument parsing and subcommand execution.

pub mod commands;
pub mod parser;

pub use parser::{Cli, Command};
