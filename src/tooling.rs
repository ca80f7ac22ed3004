//! Tooling
//!
//! Command-line entry points and their text output.

pub mod cli;
pub mod format;

pub use cli::{AgentCommands, Cli, CliContext, Commands};
