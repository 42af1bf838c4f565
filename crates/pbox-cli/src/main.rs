//! # experiment CLI
//!
//! Command-line interface for packing-box experiments.
//!
//! This binary provides human-friendly access to `pbox-core` functionality.
//! Run `experiment --help` for usage information.

mod cli;
mod ui;

use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run()
}
