//! Color mode detection for CLI output.
//!
//! See https://no-color.org/ for the `NO_COLOR` convention.

use std::io::IsTerminal;

use clap::ValueEnum;

/// Color output mode, selected with `--color`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorMode {
    /// Colors even when stdout is not a terminal.
    Always,
    /// No colors.
    Never,
    /// Colors on a terminal unless `NO_COLOR` is set.
    #[default]
    Auto,
}

impl ColorMode {
    /// Check if colors should be used.
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal(),
        }
    }
}
