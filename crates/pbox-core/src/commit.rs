//! Recording shell commands into an experiment's `commands.rc`.
//!
//! The most recent pbox-related command of the shell history is appended to
//! the experiment's commands document, unless it is already its last line.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::constants::COMMIT_VALID_COMMANDS;
use crate::errors::PboxResult;
use crate::resolver::{touch, Experiment};

// ============================================================================
// Boundaries
// ============================================================================

/// A source of shell history lines, oldest first.
pub trait HistorySource {
    /// Read every history line.
    fn lines(&self) -> PboxResult<Vec<String>>;
}

/// Shell history read from a file. A missing file yields no lines.
///
/// Zsh extended-history entries (`: <start>:<elapsed>;<command>`) are
/// reduced to their command.
#[derive(Debug, Clone)]
pub struct FileHistory {
    path: PathBuf,
}

impl FileHistory {
    /// Read history from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The history file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistorySource for FileHistory {
    fn lines(&self) -> PboxResult<Vec<String>> {
        if !self.path.is_file() {
            tracing::debug!("History file {} not found", self.path.display());
            return Ok(Vec::new());
        }
        let bytes = fs::read(&self.path)?;
        Ok(String::from_utf8_lossy(&bytes)
            .lines()
            .map(|line| strip_zsh_timestamp(line).to_string())
            .collect())
    }
}

fn strip_zsh_timestamp(line: &str) -> &str {
    let Some(rest) = line.strip_prefix(": ") else {
        return line;
    };
    match rest.split_once(';') {
        Some((stamp, command))
            if !stamp.is_empty() && stamp.chars().all(|c| c.is_ascii_digit() || c == ':') =>
        {
            command
        }
        _ => line,
    }
}

impl HistorySource for Vec<String> {
    fn lines(&self) -> PboxResult<Vec<String>> {
        Ok(self.clone())
    }
}

/// Asks the user a yes/no question.
pub trait Confirm {
    /// Returns `true` if the user accepted.
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

// ============================================================================
// Commit
// ============================================================================

/// Result of a commit attempt. None of these is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The command was appended to `commands.rc`.
    Committed(String),
    /// No eligible command, or it is already the last committed one.
    NothingToCommit,
    /// The user declined the confirmation.
    Declined,
}

/// Check whether a history line is a command worth committing.
pub fn is_committable(line: &str) -> bool {
    COMMIT_VALID_COMMANDS
        .iter()
        .any(|cmd| line.strip_prefix(cmd).is_some_and(|rest| rest.starts_with(' ')))
}

/// Append the last committable history command to the experiment's
/// `commands.rc`.
///
/// Trailing history entries that are not pbox-related commands are skipped.
/// Without `force`, `confirm` is asked before writing.
pub fn commit(
    experiment: &Experiment,
    history: &dyn HistorySource,
    confirm: &mut dyn Confirm,
    force: bool,
) -> PboxResult<CommitOutcome> {
    let commands = experiment.commands_path();
    touch(&commands)?;
    let content = fs::read_to_string(&commands)?;
    let last_line = content.lines().last().unwrap_or_default();

    let entry = history
        .lines()?
        .into_iter()
        .rev()
        .find(|line| is_committable(line));

    let Some(entry) = entry else {
        tracing::warn!("Nothing to commit");
        return Ok(CommitOutcome::NothingToCommit);
    };
    let entry = entry.trim().to_string();
    if entry == last_line.trim() {
        tracing::warn!("Nothing to commit");
        return Ok(CommitOutcome::NothingToCommit);
    }

    if !force && !confirm.confirm(&format!("Commit \"{}\"?", entry)) {
        return Ok(CommitOutcome::Declined);
    }

    let mut file = fs::OpenOptions::new().append(true).open(&commands)?;
    if !content.is_empty() && !content.ends_with('\n') {
        file.write_all(b"\n")?;
    }
    writeln!(file, "{}", entry)?;
    tracing::debug!("Committed `{}` to {}", entry, commands.display());

    Ok(CommitOutcome::Committed(entry))
}
