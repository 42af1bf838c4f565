//! The global workspace context.
//!
//! [`Workspace`] is the context object threaded through every operation:
//! it knows where the global workspace and its experiments live, owns the
//! [`ConfigRegistry`], holds the active-experiment marker, and carries the
//! dataset and model loaders. Nothing here is process-global; callers pass
//! the workspace explicitly.
//!
//! The active-experiment marker is persisted to `<home>/state.json` so that
//! an experiment opened by one CLI invocation is still active in the next.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::artifact::{DatasetLoader, FsDatasetLoader, FsModelLoader, ModelLoader};
use crate::config::GlobalConfig;
use crate::constants::{CONFIG_EXTENSION, CONF_DIR, DATASETS_DIR, MODELS_DIR};
use crate::errors::PboxError;
use crate::registry::ConfigRegistry;
use crate::validator::{sorted_entries, Validator};

// ============================================================================
// ActiveContext
// ============================================================================

/// Persisted form of the active-experiment marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveContext {
    /// Root of the active experiment, if any.
    #[serde(default)]
    pub experiment: Option<PathBuf>,
}

impl ActiveContext {
    /// Read the context from `path`. A missing file is an empty context.
    pub fn load(path: &Path) -> Result<Self, PboxError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the context to `path`, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<(), PboxError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

// ============================================================================
// Workspace
// ============================================================================

/// The global workspace an experiment overlays.
#[derive(Debug)]
pub struct Workspace {
    config: GlobalConfig,
    experiments_dir: PathBuf,
    registry: ConfigRegistry,
    active: Option<PathBuf>,
    datasets: Box<dyn DatasetLoader>,
    models: Box<dyn ModelLoader>,
}

impl Workspace {
    /// Create a workspace from a configuration, ignoring any persisted context.
    ///
    /// Uses the filesystem loaders for datasets and models. The experiments
    /// directory is made absolute against the current directory.
    pub fn new(config: GlobalConfig) -> Self {
        let experiments_dir = config.experiments_dir();
        let experiments_dir = std::path::absolute(&experiments_dir).unwrap_or(experiments_dir);
        let registry = config.registry();
        Self {
            config,
            experiments_dir,
            registry,
            active: None,
            datasets: Box::new(FsDatasetLoader),
            models: Box::new(FsModelLoader),
        }
    }

    /// Create a workspace and restore the persisted active experiment.
    ///
    /// The marker is kept as long as the recorded folder exists; stray files
    /// under its `conf` are skipped as during setup. A marker pointing at a
    /// missing folder is dropped with a warning. An unreadable state file is
    /// reset to an empty context, also with a warning.
    pub fn load(config: GlobalConfig) -> Result<Self, PboxError> {
        let mut workspace = Self::new(config);
        let state_path = workspace.config.state_path();
        let context = match ActiveContext::load(&state_path) {
            Ok(context) => context,
            Err(PboxError::Json(e)) => {
                tracing::warn!(
                    "Unreadable workspace state {} ({}), resetting it",
                    state_path.display(),
                    e
                );
                workspace.persist()?;
                ActiveContext::default()
            }
            Err(e) => return Err(e),
        };

        if let Some(root) = context.experiment {
            if root.is_dir() {
                tracing::debug!("Restoring active experiment {}", root.display());
                workspace.register_overrides(&root.join(CONF_DIR))?;
                workspace.active = Some(root);
            } else {
                tracing::warn!(
                    "Active experiment {} no longer exists, closing it",
                    root.display()
                );
                workspace.persist()?;
            }
        }

        Ok(workspace)
    }

    /// Replace the dataset and model loaders.
    pub fn with_loaders(
        mut self,
        datasets: Box<dyn DatasetLoader>,
        models: Box<dyn ModelLoader>,
    ) -> Self {
        self.datasets = datasets;
        self.models = models;
        self
    }

    /// The configuration this workspace was built from.
    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// Root of the global workspace.
    pub fn home(&self) -> &Path {
        &self.config.home
    }

    /// Directory holding every experiment.
    pub fn experiments_dir(&self) -> &Path {
        &self.experiments_dir
    }

    /// The configuration registry.
    pub fn registry(&self) -> &ConfigRegistry {
        &self.registry
    }

    /// Mutable access to the configuration registry.
    pub fn registry_mut(&mut self) -> &mut ConfigRegistry {
        &mut self.registry
    }

    /// A validator for this workspace's experiments and configuration kinds.
    pub fn validator(&self) -> Validator {
        Validator::new(&self.experiments_dir, self.registry.kinds())
    }

    /// The dataset loader.
    pub fn dataset_loader(&self) -> &dyn DatasetLoader {
        self.datasets.as_ref()
    }

    /// The model loader.
    pub fn model_loader(&self) -> &dyn ModelLoader {
        self.models.as_ref()
    }

    /// Root of the active experiment, if any.
    pub fn active_experiment(&self) -> Option<&Path> {
        self.active.as_deref()
    }

    /// The active experiment root, or the global home when none is open.
    ///
    /// Collaborators resolve datasets and models against this root.
    pub fn effective_root(&self) -> &Path {
        self.active.as_deref().unwrap_or(&self.config.home)
    }

    /// Datasets folder of the effective root.
    pub fn datasets_dir(&self) -> PathBuf {
        self.effective_root().join(DATASETS_DIR)
    }

    /// Models folder of the effective root.
    pub fn models_dir(&self) -> PathBuf {
        self.effective_root().join(MODELS_DIR)
    }

    /// Record `root` as the active experiment and persist the marker.
    ///
    /// Overrides registered for a previously active experiment are dropped;
    /// a second open replaces the context.
    pub fn open_experiment(&mut self, root: &Path) -> Result<(), PboxError> {
        if let Some(previous) = &self.active {
            if previous != root {
                tracing::debug!("Replacing active experiment {}", previous.display());
            }
        }
        self.registry.clear_overrides();
        self.active = Some(root.to_path_buf());
        self.persist()
    }

    /// Clear the active-experiment marker.
    ///
    /// Returns `false` when no experiment was active (no-op). Files on disk
    /// are left untouched.
    pub fn close_experiment(&mut self) -> Result<bool, PboxError> {
        let Some(root) = self.active.take() else {
            tracing::debug!("No active experiment to close");
            return Ok(false);
        };
        tracing::debug!("Closing experiment {}", root.display());
        self.registry.clear_overrides();
        self.persist()?;
        Ok(true)
    }

    /// Register every `conf/<kind>.conf` under `conf_dir` as an override.
    ///
    /// Files not matching a recognized kind are skipped with a warning.
    pub(crate) fn register_overrides(&mut self, conf_dir: &Path) -> Result<(), PboxError> {
        if !conf_dir.is_dir() {
            return Ok(());
        }
        for entry in sorted_entries(conf_dir)? {
            let kind = entry.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            let is_conf = entry.extension().and_then(|e| e.to_str()) == Some(CONFIG_EXTENSION);
            if entry.is_file() && is_conf && self.registry.is_kind(kind) {
                let kind = kind.to_string();
                self.registry.set_override(&kind, entry)?;
            } else {
                tracing::warn!("Skipping unknown configuration file {}", entry.display());
            }
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), PboxError> {
        let context = ActiveContext {
            experiment: self.active.clone(),
        };
        context.save(&self.config.state_path())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::REQUIRED_SUBFOLDERS;
    use tempfile::TempDir;

    fn make_experiment(workspace: &Workspace, name: &str) -> PathBuf {
        let root = workspace.experiments_dir().join(name);
        for sub in REQUIRED_SUBFOLDERS {
            fs::create_dir_all(root.join(sub)).unwrap();
        }
        root
    }

    #[test]
    fn test_effective_root_defaults_to_home() {
        let temp = TempDir::new().unwrap();
        let workspace = Workspace::new(GlobalConfig::for_home(temp.path()));
        assert!(workspace.active_experiment().is_none());
        assert_eq!(workspace.effective_root(), temp.path());
        assert_eq!(workspace.datasets_dir(), temp.path().join("datasets"));
    }

    #[test]
    fn test_relative_home_gives_absolute_experiments_dir() {
        let workspace = Workspace::new(GlobalConfig::for_home("relative-home"));
        assert!(workspace.experiments_dir().is_absolute());
        assert!(workspace.experiments_dir().ends_with("relative-home/experiments"));
    }

    #[test]
    fn test_open_and_close_persist() {
        let temp = TempDir::new().unwrap();
        let mut workspace = Workspace::new(GlobalConfig::for_home(temp.path()));
        let root = make_experiment(&workspace, "exp");

        workspace.open_experiment(&root).unwrap();
        assert_eq!(workspace.effective_root(), root.as_path());
        assert_eq!(workspace.models_dir(), root.join("models"));

        let context = ActiveContext::load(&workspace.config().state_path()).unwrap();
        assert_eq!(context.experiment.as_deref(), Some(root.as_path()));

        assert!(workspace.close_experiment().unwrap());
        let context = ActiveContext::load(&workspace.config().state_path()).unwrap();
        assert!(context.experiment.is_none());
    }

    #[test]
    fn test_close_without_active_is_noop() {
        let temp = TempDir::new().unwrap();
        let mut workspace = Workspace::new(GlobalConfig::for_home(temp.path()));
        assert!(!workspace.close_experiment().unwrap());
        assert!(!workspace.close_experiment().unwrap());
    }

    #[test]
    fn test_load_restores_active_and_overrides() {
        let temp = TempDir::new().unwrap();
        let mut workspace = Workspace::new(GlobalConfig::for_home(temp.path()));
        let root = make_experiment(&workspace, "exp");
        fs::write(root.join("conf/packers.conf"), "upx: {}").unwrap();
        workspace.open_experiment(&root).unwrap();

        let restored = Workspace::load(GlobalConfig::for_home(temp.path())).unwrap();
        assert_eq!(restored.active_experiment(), Some(root.as_path()));
        assert_eq!(
            restored.registry().effective_path("packers"),
            Some(root.join("conf/packers.conf").as_path())
        );
    }

    #[test]
    fn test_load_drops_stale_context() {
        let temp = TempDir::new().unwrap();
        let mut workspace = Workspace::new(GlobalConfig::for_home(temp.path()));
        let root = make_experiment(&workspace, "exp");
        workspace.open_experiment(&root).unwrap();
        fs::remove_dir_all(&root).unwrap();

        let restored = Workspace::load(GlobalConfig::for_home(temp.path())).unwrap();
        assert!(restored.active_experiment().is_none());
        let context = ActiveContext::load(&restored.config().state_path()).unwrap();
        assert!(context.experiment.is_none());
    }

    #[test]
    fn test_load_keeps_context_with_stray_conf_file() {
        let temp = TempDir::new().unwrap();
        let mut workspace = Workspace::new(GlobalConfig::for_home(temp.path()));
        let root = make_experiment(&workspace, "exp");
        fs::write(root.join("conf/packers.conf"), "").unwrap();
        fs::write(root.join("conf/notes.txt"), "").unwrap();
        workspace.open_experiment(&root).unwrap();

        let restored = Workspace::load(GlobalConfig::for_home(temp.path())).unwrap();
        assert_eq!(restored.active_experiment(), Some(root.as_path()));
        assert_eq!(restored.registry().overridden_kinds(), vec!["packers"]);
    }

    #[test]
    fn test_load_resets_corrupt_state() {
        let temp = TempDir::new().unwrap();
        let config = GlobalConfig::for_home(temp.path());
        let state_path = config.state_path();
        fs::write(&state_path, "{ not json").unwrap();

        let restored = Workspace::load(config).unwrap();
        assert!(restored.active_experiment().is_none());
        let context = ActiveContext::load(&state_path).unwrap();
        assert_eq!(context, ActiveContext::default());
    }

    #[test]
    fn test_open_replaces_previous_overrides() {
        let temp = TempDir::new().unwrap();
        let mut workspace = Workspace::new(GlobalConfig::for_home(temp.path()));
        let first = make_experiment(&workspace, "first");
        let second = make_experiment(&workspace, "second");
        fs::write(first.join("conf/packers.conf"), "").unwrap();

        workspace.open_experiment(&first).unwrap();
        workspace.register_overrides(&first.join("conf")).unwrap();
        assert_eq!(workspace.registry().overridden_kinds(), vec!["packers"]);

        workspace.open_experiment(&second).unwrap();
        assert!(workspace.registry().overridden_kinds().is_empty());
        assert_eq!(workspace.active_experiment(), Some(second.as_path()));
    }
}
