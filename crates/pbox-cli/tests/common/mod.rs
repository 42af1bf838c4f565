//! Shared test utilities for pbox-cli integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;

/// Get a Command for the experiment binary, isolated in `home`.
///
/// # Panics
///
/// Panics if the experiment binary cannot be found.
#[allow(deprecated)]
pub fn experiment_cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("experiment").expect("experiment binary should exist");
    cmd.env("PBOX_HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("PBOX_CONFIG")
        .env_remove("HISTFILE")
        .env_remove("VISUAL")
        .env_remove("EDITOR");
    cmd
}

/// Create a pbox home with global definitions for `packers` and `detectors`.
pub fn create_home(root: &Path) -> PathBuf {
    let home = root.join(".pbox");
    fs::create_dir_all(home.join("conf")).expect("create conf dir");
    fs::write(home.join("conf/packers.yml"), "upx:\n  status: ok\n").expect("write packers");
    fs::write(home.join("conf/detectors.yml"), "die: {}\n").expect("write detectors");
    home
}
