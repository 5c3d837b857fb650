//! Tooling & Integration Layer
//!
//! Command-line surface over the daemon and its configuration.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
