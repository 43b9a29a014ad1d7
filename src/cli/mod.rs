//! CLI module for the stackplan tool.
//!
//! This module provides the command-line interface for checking
//! deployments and planning stack changes.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;
