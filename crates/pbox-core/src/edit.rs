//! Editing experiment documents and configuration overrides.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::GlobalConfig;
use crate::errors::{PboxError, PboxResult};
use crate::resolver::{touch, Experiment};
use crate::workspace::Workspace;

const DEFAULT_EDITOR: &str = "vi";

/// Opens a file for interactive editing.
pub trait Editor {
    /// Edit `path`, returning once the user is done.
    fn edit(&self, path: &Path) -> PboxResult<()>;
}

/// Runs an external editor command on the file.
///
/// The command may carry arguments (`"code --wait"`); the path is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemEditor {
    command: String,
}

impl SystemEditor {
    /// Use an explicit editor command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Pick the editor from the configuration, then `$VISUAL`, then
    /// `$EDITOR`, then `vi`.
    pub fn from_config(config: &GlobalConfig) -> Self {
        let configured = config
            .editor
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string);
        let command = configured
            .or_else(|| env_non_empty("VISUAL"))
            .or_else(|| env_non_empty("EDITOR"))
            .unwrap_or_else(|| DEFAULT_EDITOR.to_string());
        Self { command }
    }

    /// The editor command line.
    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Editor for SystemEditor {
    fn edit(&self, path: &Path) -> PboxResult<()> {
        let mut parts = self.command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| PboxError::Editor("no editor command configured".to_string()))?;

        tracing::debug!("Running `{}` on {}", self.command, path.display());
        let status = Command::new(program)
            .args(parts)
            .arg(path)
            .status()
            .map_err(|e| PboxError::Editor(format!("cannot run `{}`: {}", program, e)))?;

        if !status.success() {
            return Err(PboxError::Editor(format!(
                "`{}` exited with {}",
                self.command, status
            )));
        }
        Ok(())
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Experiment {
    /// Edit a configuration kind or a reserved document.
    ///
    /// A configuration kind is promoted to a local override first, so the
    /// global definition is never modified. Reserved documents are edited in
    /// place. Returns the edited path.
    ///
    /// # Errors
    ///
    /// Returns [`PboxError::NotFound`] for any other target, or
    /// [`PboxError::Editor`] if the editor fails.
    pub fn edit(
        &self,
        workspace: &mut Workspace,
        target: &str,
        editor: &dyn Editor,
    ) -> PboxResult<PathBuf> {
        let path = if workspace.registry().is_kind(target) {
            self.promote(workspace, target)?
        } else if let Some(path) = self.document_path(target) {
            touch(&path)?;
            path
        } else {
            return Err(PboxError::NotFound(target.to_string()));
        };

        editor.edit(&path)?;
        Ok(path)
    }
}
