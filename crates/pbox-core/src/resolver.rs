//! Experiment folders and layered name resolution.
//!
//! An [`Experiment`] overlays the global workspace: a logical name is
//! answered by the experiment-local artifact when there is one, and by the
//! global one otherwise. Names are resolved by an ordered list of
//! [`Strategy`] values; the first match wins:
//!
//! 1. [`Strategy::ReservedDocument`]: `README`/`README.md`, `commands`/`commands.rc`
//! 2. [`Strategy::ConfigKind`]: `conf/<kind>.conf`, else the global definition
//! 3. [`Strategy::DatasetScan`]: a child of `datasets/` with that stem
//! 4. [`Strategy::ModelScan`]: a child of `models/` with that stem

use std::fs;
use std::path::{Path, PathBuf};

use crate::artifact::{stem_of, DatasetHandle, ModelHandle};
use crate::constants::{
    COMMANDS_FILENAME, CONFIG_EXTENSION, CONF_DIR, DATASETS_DIR, MODELS_DIR, README_FILENAME,
    REQUIRED_SUBFOLDERS,
};
use crate::errors::{PboxError, PboxResult};
use crate::registry::{ConfigEntry, ConfigState};
use crate::types::ExperimentName;
use crate::validator::sorted_entries;
use crate::workspace::Workspace;

// ============================================================================
// Artifact
// ============================================================================

/// What a logical name resolves to.
#[derive(Debug)]
pub enum Artifact {
    /// A reserved document at the experiment root.
    Document(PathBuf),
    /// The effective file of a configuration kind.
    Config(ConfigEntry),
    /// An opened experiment-local dataset.
    Dataset(Box<dyn DatasetHandle>),
    /// An opened experiment-local model.
    Model(Box<dyn ModelHandle>),
}

impl Artifact {
    /// The path on disk answering the name.
    pub fn path(&self) -> &Path {
        match self {
            Self::Document(path) => path,
            Self::Config(entry) => entry.path(),
            Self::Dataset(dataset) => dataset.path(),
            Self::Model(model) => model.path(),
        }
    }
}

// ============================================================================
// Strategy
// ============================================================================

/// One category of logical names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Notes and commands-history documents.
    ReservedDocument,
    /// Recognized configuration kinds.
    ConfigKind,
    /// Experiment-local datasets.
    DatasetScan,
    /// Experiment-local models.
    ModelScan,
}

impl Strategy {
    /// Resolution order.
    pub const ORDER: [Strategy; 4] = [
        Strategy::ReservedDocument,
        Strategy::ConfigKind,
        Strategy::DatasetScan,
        Strategy::ModelScan,
    ];

    /// Try to resolve `name`; `Ok(None)` hands over to the next strategy.
    pub fn resolve(
        self,
        experiment: &Experiment,
        workspace: &Workspace,
        name: &str,
    ) -> PboxResult<Option<Artifact>> {
        match self {
            Self::ReservedDocument => match experiment.document_path(name) {
                Some(path) => {
                    touch(&path)?;
                    Ok(Some(Artifact::Document(path)))
                }
                None => Ok(None),
            },
            Self::ConfigKind => Ok(experiment
                .config_state(workspace, name)
                .map(|state| {
                    Artifact::Config(ConfigEntry {
                        kind: name.to_string(),
                        state,
                    })
                })),
            Self::DatasetScan => match scan(&experiment.datasets_dir(), name)? {
                Some(path) => Ok(Some(Artifact::Dataset(
                    workspace.dataset_loader().open(&path)?,
                ))),
                None => Ok(None),
            },
            Self::ModelScan => match scan(&experiment.models_dir(), name)? {
                Some(path) => Ok(Some(Artifact::Model(workspace.model_loader().open(&path)?))),
                None => Ok(None),
            },
        }
    }
}

// ============================================================================
// Experiment
// ============================================================================

/// A named experiment folder under the workspace's experiments directory.
///
/// Folder structure:
///
/// ```text
/// <name>/
///   conf/          configuration overrides (<kind>.conf)
///   datasets/      datasets specific to the experiment
///   models/        models specific to the experiment
///   scripts/       additional scripts (optional)
///   README.md      notes explaining the experiment
///   commands.rc    committed commands
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Experiment {
    name: ExperimentName,
    path: PathBuf,
}

impl Experiment {
    /// Bind to the experiment `name` of `workspace`.
    ///
    /// The experiments directory is created if absent. With `setup`, the
    /// mandatory subfolders and `README.md` are created if missing, the
    /// experiment becomes the workspace's active one, and each local
    /// configuration file is registered as an override.
    ///
    /// # Errors
    ///
    /// Returns [`PboxError::InvalidName`] if `name` breaks the naming policy.
    pub fn new(workspace: &mut Workspace, name: &str, setup: bool) -> PboxResult<Self> {
        let name = ExperimentName::try_new(name)?;
        let experiments_dir = std::path::absolute(workspace.experiments_dir())?;
        fs::create_dir_all(&experiments_dir)?;

        let experiment = Self {
            path: experiments_dir.join(name.as_str()),
            name,
        };

        if setup {
            experiment.setup(workspace)?;
        }

        Ok(experiment)
    }

    /// Bind to the workspace's active experiment, if any, without setup.
    pub fn active(workspace: &Workspace) -> PboxResult<Option<Self>> {
        let Some(root) = workspace.active_experiment() else {
            return Ok(None);
        };
        Self::from_root(stem_of_dir(root), root).map(Some)
    }

    /// Bind to an existing experiment folder without touching the workspace.
    pub fn from_root(name: &str, root: &Path) -> PboxResult<Self> {
        Ok(Self {
            name: ExperimentName::try_new(name)?,
            path: root.to_path_buf(),
        })
    }

    fn setup(&self, workspace: &mut Workspace) -> PboxResult<()> {
        for sub in REQUIRED_SUBFOLDERS {
            let dir = self.path.join(sub);
            if !dir.is_dir() {
                tracing::debug!("Creating {}", dir.display());
                fs::create_dir_all(&dir)?;
            }
        }
        touch(&self.readme_path())?;
        workspace.open_experiment(&self.path)?;
        workspace.register_overrides(&self.conf_dir())
    }

    /// The experiment name.
    pub fn name(&self) -> &ExperimentName {
        &self.name
    }

    /// Absolute path of the experiment folder.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The `conf/` subfolder.
    pub fn conf_dir(&self) -> PathBuf {
        self.path.join(CONF_DIR)
    }

    /// The `datasets/` subfolder.
    pub fn datasets_dir(&self) -> PathBuf {
        self.path.join(DATASETS_DIR)
    }

    /// The `models/` subfolder.
    pub fn models_dir(&self) -> PathBuf {
        self.path.join(MODELS_DIR)
    }

    /// The notes document.
    pub fn readme_path(&self) -> PathBuf {
        self.path.join(README_FILENAME)
    }

    /// The commands-history document.
    pub fn commands_path(&self) -> PathBuf {
        self.path.join(COMMANDS_FILENAME)
    }

    /// Path of the local override of `kind` (whether or not it exists).
    pub fn override_path(&self, kind: &str) -> PathBuf {
        self.conf_dir().join(format!("{kind}.{CONFIG_EXTENSION}"))
    }

    /// Fixed path of a reserved document name.
    pub fn document_path(&self, name: &str) -> Option<PathBuf> {
        match name {
            "README" | "README.md" => Some(self.readme_path()),
            "commands" | "commands.rc" => Some(self.commands_path()),
            _ => None,
        }
    }

    /// State of configuration `kind` for this experiment, or `None` if the
    /// kind is not recognized.
    pub fn config_state(&self, workspace: &Workspace, kind: &str) -> Option<ConfigState> {
        let global = workspace.registry().global_path(kind)?;
        let local = self.override_path(kind);
        if local.is_file() {
            Some(ConfigState::Overridden(local))
        } else {
            Some(ConfigState::Inherited(global.to_path_buf()))
        }
    }

    /// Kinds with a local override, sorted.
    pub fn overridden_kinds(&self, workspace: &Workspace) -> Vec<String> {
        workspace
            .registry()
            .kinds()
            .filter(|kind| self.override_path(kind).is_file())
            .map(str::to_string)
            .collect()
    }

    /// Resolve a logical name to the artifact answering it.
    ///
    /// # Errors
    ///
    /// Returns [`PboxError::NotFound`] if no strategy matches.
    pub fn get(&self, workspace: &Workspace, name: &str) -> PboxResult<Artifact> {
        for strategy in Strategy::ORDER {
            if let Some(artifact) = strategy.resolve(self, workspace, name)? {
                tracing::debug!(
                    "Resolved `{}` via {:?} to {}",
                    name,
                    strategy,
                    artifact.path().display()
                );
                return Ok(artifact);
            }
        }
        Err(PboxError::NotFound(name.to_string()))
    }

    /// Resolve a logical name to a path without opening datasets or models.
    pub fn path_of(&self, workspace: &Workspace, name: &str) -> PboxResult<PathBuf> {
        if let Some(path) = self.document_path(name) {
            touch(&path)?;
            return Ok(path);
        }
        if let Some(state) = self.config_state(workspace, name) {
            return Ok(state.path().to_path_buf());
        }
        for dir in [self.datasets_dir(), self.models_dir()] {
            if let Some(path) = scan(&dir, name)? {
                return Ok(path);
            }
        }
        Err(PboxError::NotFound(name.to_string()))
    }

    /// Make sure edits of `kind` land in the local override.
    ///
    /// If the effective file is not already `conf/<kind>.conf` (same-file
    /// check on canonical paths), the global file is copied there byte for
    /// byte and registered as the override. Returns the local path.
    ///
    /// # Errors
    ///
    /// Returns [`PboxError::UnknownConfigKind`] if `kind` is not recognized.
    pub fn promote(&self, workspace: &mut Workspace, kind: &str) -> PboxResult<PathBuf> {
        let state = self
            .config_state(workspace, kind)
            .ok_or_else(|| PboxError::UnknownConfigKind(kind.to_string()))?;
        let local = self.override_path(kind);

        if !same_file(state.path(), &local) {
            tracing::debug!(
                "copying configuration file from '{}'...",
                state.path().display()
            );
            fs::create_dir_all(self.conf_dir())?;
            if state.path().is_file() {
                fs::copy(state.path(), &local)?;
            } else {
                tracing::warn!(
                    "Global definition {} does not exist, starting from an empty override",
                    state.path().display()
                );
                fs::write(&local, "")?;
            }
        }

        workspace.registry_mut().set_override(kind, &local)?;
        Ok(local)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Create `path` empty if it does not exist; never truncates.
pub(crate) fn touch(path: &Path) -> std::io::Result<()> {
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(|_| ())
}

/// Find the child of `dir` whose stem is exactly `name`.
///
/// Children are visited by file name, so with duplicate stems the
/// lexicographically smallest name (a bare folder before `name.ext`) wins.
fn scan(dir: &Path, name: &str) -> std::io::Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }
    Ok(sorted_entries(dir)?
        .into_iter()
        .find(|entry| stem_of(entry) == name))
}

/// Same-file identity on canonical paths. A missing path is never the same.
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn stem_of_dir(root: &Path) -> &str {
    root.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GlobalConfig;
    use crate::constants::METADATA_FILENAME;
    use tempfile::TempDir;

    fn workspace(temp: &TempDir) -> Workspace {
        let home = temp.path().join("home");
        let conf = home.join("conf");
        fs::create_dir_all(&conf).unwrap();
        fs::write(conf.join("packers.yml"), "upx:\n  status: ok\n").unwrap();
        fs::write(conf.join("detectors.yml"), "die: {}\n").unwrap();
        Workspace::new(GlobalConfig::for_home(home))
    }

    #[test]
    fn test_setup_creates_structure() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(&temp);
        let exp = Experiment::new(&mut ws, "exp", true).unwrap();

        assert!(exp.conf_dir().is_dir());
        assert!(exp.datasets_dir().is_dir());
        assert!(exp.models_dir().is_dir());
        assert!(exp.readme_path().is_file());
        assert_eq!(ws.active_experiment(), Some(exp.path()));
        assert!(ws.validator().check(exp.path()));
    }

    #[test]
    fn test_without_setup_nothing_is_created() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(&temp);
        let exp = Experiment::new(&mut ws, "exp", false).unwrap();
        assert!(!exp.path().exists());
        assert!(ws.experiments_dir().is_dir());
        assert!(ws.active_experiment().is_none());
    }

    #[test]
    fn test_setup_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(&temp);
        let exp = Experiment::new(&mut ws, "exp", true).unwrap();
        fs::write(exp.readme_path(), "my notes").unwrap();
        fs::write(exp.override_path("packers"), "local").unwrap();

        let again = Experiment::new(&mut ws, "exp", true).unwrap();
        assert_eq!(again, exp);
        assert_eq!(fs::read_to_string(exp.readme_path()).unwrap(), "my notes");
        assert_eq!(
            fs::read_to_string(exp.override_path("packers")).unwrap(),
            "local"
        );
    }

    #[test]
    fn test_setup_registers_overrides() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(&temp);
        let exp = Experiment::new(&mut ws, "exp", true).unwrap();
        fs::write(exp.override_path("detectors"), "local").unwrap();

        Experiment::new(&mut ws, "exp", true).unwrap();
        assert_eq!(
            ws.registry().effective_path("detectors"),
            Some(exp.override_path("detectors").as_path())
        );
        assert_eq!(ws.registry().overridden_kinds(), vec!["detectors"]);
    }

    #[test]
    fn test_invalid_name() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(&temp);
        let result = Experiment::new(&mut ws, "bad name", true);
        assert!(matches!(result, Err(PboxError::InvalidName(_))));
    }

    #[test]
    fn test_get_reserved_documents() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(&temp);
        let exp = Experiment::new(&mut ws, "exp", true).unwrap();

        let readme = exp.get(&ws, "README").unwrap();
        assert_eq!(readme.path(), exp.readme_path());
        let readme = exp.get(&ws, "README.md").unwrap();
        assert_eq!(readme.path(), exp.readme_path());

        assert!(!exp.commands_path().exists());
        let first = exp.get(&ws, "commands").unwrap().path().to_path_buf();
        let second = exp.get(&ws, "commands.rc").unwrap().path().to_path_buf();
        assert_eq!(first, second);
        assert!(first.starts_with(exp.path()));
        assert!(first.is_file());
    }

    #[test]
    fn test_get_config_falls_back_to_global() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(&temp);
        let exp = Experiment::new(&mut ws, "exp", true).unwrap();

        match exp.get(&ws, "packers").unwrap() {
            Artifact::Config(entry) => {
                assert_eq!(entry.kind, "packers");
                assert_eq!(
                    entry.state,
                    ConfigState::Inherited(ws.registry().global_path("packers").unwrap().to_path_buf())
                );
            }
            other => panic!("Expected Config, got {:?}", other),
        }
    }

    #[test]
    fn test_promote_then_get_returns_local() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(&temp);
        let exp = Experiment::new(&mut ws, "exp", true).unwrap();
        let global = ws.registry().global_path("packers").unwrap().to_path_buf();

        let local = exp.promote(&mut ws, "packers").unwrap();
        assert_eq!(local, exp.override_path("packers"));
        assert_eq!(fs::read(&local).unwrap(), fs::read(&global).unwrap());

        match exp.get(&ws, "packers").unwrap() {
            Artifact::Config(entry) => {
                assert_eq!(entry.state, ConfigState::Overridden(local.clone()))
            }
            other => panic!("Expected Config, got {:?}", other),
        }

        // Editing the local file never alters the global one
        fs::write(&local, "edited").unwrap();
        assert_eq!(
            fs::read_to_string(&global).unwrap(),
            "upx:\n  status: ok\n"
        );

        // Promoting again keeps the edited override
        exp.promote(&mut ws, "packers").unwrap();
        assert_eq!(fs::read_to_string(&local).unwrap(), "edited");
    }

    #[test]
    fn test_promote_unknown_kind() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(&temp);
        let exp = Experiment::new(&mut ws, "exp", true).unwrap();
        let result = exp.promote(&mut ws, "README");
        assert!(matches!(result, Err(PboxError::UnknownConfigKind(_))));
    }

    #[test]
    fn test_get_dataset_and_model() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(&temp);
        let exp = Experiment::new(&mut ws, "exp", true).unwrap();
        let ds = exp.datasets_dir().join("upx-only");
        fs::create_dir_all(&ds).unwrap();
        fs::write(ds.join(METADATA_FILENAME), "{}").unwrap();
        fs::write(exp.models_dir().join("rf.joblib"), "model").unwrap();

        assert!(matches!(
            exp.get(&ws, "upx-only").unwrap(),
            Artifact::Dataset(d) if d.name() == "upx-only"
        ));
        assert!(matches!(
            exp.get(&ws, "rf").unwrap(),
            Artifact::Model(m) if m.name() == "rf"
        ));
    }

    #[test]
    fn test_config_kind_wins_over_dataset() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(&temp);
        let exp = Experiment::new(&mut ws, "exp", true).unwrap();
        let ds = exp.datasets_dir().join("packers");
        fs::create_dir_all(&ds).unwrap();
        fs::write(ds.join(METADATA_FILENAME), "{}").unwrap();

        assert!(matches!(exp.get(&ws, "packers").unwrap(), Artifact::Config(_)));
    }

    #[test]
    fn test_duplicate_stem_tie_break() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(&temp);
        let exp = Experiment::new(&mut ws, "exp", true).unwrap();
        fs::write(exp.models_dir().join("rf.pkl"), "b").unwrap();
        fs::write(exp.models_dir().join("rf.joblib"), "a").unwrap();

        let path = exp.path_of(&ws, "rf").unwrap();
        assert!(path.ends_with("rf.joblib"));

        let folder = exp.models_dir().join("rf");
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join(METADATA_FILENAME), "{}").unwrap();

        let path = exp.path_of(&ws, "rf").unwrap();
        assert_eq!(path.file_name().unwrap(), "rf");
        assert!(path.is_dir());
    }

    #[test]
    fn test_get_not_found() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(&temp);
        let exp = Experiment::new(&mut ws, "exp", true).unwrap();
        let result = exp.get(&ws, "nothing");
        assert!(matches!(result, Err(PboxError::NotFound(name)) if name == "nothing"));
    }

    #[test]
    fn test_active_experiment() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(&temp);
        assert!(Experiment::active(&ws).unwrap().is_none());
        let exp = Experiment::new(&mut ws, "exp", true).unwrap();
        assert_eq!(Experiment::active(&ws).unwrap(), Some(exp));
    }
}
