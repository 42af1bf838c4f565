//! Experiment report and dataset compression.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::artifact::ArtifactSummary;
use crate::errors::PboxResult;
use crate::registry::ConfigEntry;
use crate::resolver::Experiment;
use crate::validator::sorted_entries;
use crate::workspace::Workspace;

/// Everything an experiment holds, for display or JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentReport {
    pub name: String,
    pub path: PathBuf,
    pub datasets: Vec<ArtifactSummary>,
    pub models: Vec<ArtifactSummary>,
    /// State of every recognized configuration kind.
    pub configs: Vec<ConfigEntry>,
}

impl Experiment {
    /// Describe the experiment's datasets, models and configuration states.
    ///
    /// Entries the loaders do not recognize are left out.
    pub fn report(&self, workspace: &Workspace) -> PboxResult<ExperimentReport> {
        let mut datasets = Vec::new();
        for path in loadable(&self.datasets_dir(), |p| workspace.dataset_loader().check(p))? {
            datasets.push(workspace.dataset_loader().open(&path)?.summary()?);
        }

        let mut models = Vec::new();
        for path in loadable(&self.models_dir(), |p| workspace.model_loader().check(p))? {
            models.push(workspace.model_loader().open(&path)?.summary()?);
        }

        let configs = workspace
            .registry()
            .kinds()
            .filter_map(|kind| {
                self.config_state(workspace, kind).map(|state| ConfigEntry {
                    kind: kind.to_string(),
                    state,
                })
            })
            .collect();

        Ok(ExperimentReport {
            name: self.name().to_string(),
            path: self.path().to_path_buf(),
            datasets,
            models,
            configs,
        })
    }

    /// Convert every loadable dataset of the experiment to fileless form.
    ///
    /// Returns the names of the converted datasets.
    pub fn compress(&self, workspace: &Workspace) -> PboxResult<Vec<String>> {
        let paths = loadable(&self.datasets_dir(), |p| workspace.dataset_loader().check(p))?;
        if paths.is_empty() {
            tracing::warn!("No dataset to be converted");
            return Ok(Vec::new());
        }

        let mut converted = Vec::with_capacity(paths.len());
        for path in paths {
            let mut dataset = workspace.dataset_loader().open(&path)?;
            tracing::debug!("Converting dataset {}", dataset.name());
            dataset.convert()?;
            converted.push(dataset.name().to_string());
        }
        Ok(converted)
    }
}

/// Children of `dir` accepted by `check`, sorted by file name.
pub(crate) fn loadable(dir: &Path, check: impl Fn(&Path) -> bool) -> PboxResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    Ok(sorted_entries(dir)?.into_iter().filter(|p| check(p)).collect())
}
