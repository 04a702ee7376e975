//! # Repo Fleet CLI
//!
//! This is the binary entry point for the `repo-fleet` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Building and executing a run from the parsed arguments.
//! - Handling top-level application errors and translating them into
//!   user-friendly output.
//!
//! The core orchestration logic lives in the library crate, ensuring that
//! the binary is a thin wrapper around reusable functionality.

mod cli;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
