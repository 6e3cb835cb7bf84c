//! CLI Tooling
//!
//! Command-line front end for the canopy engine, operating on a
//! JSON-serialized tree file.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
