//! Enumeration of the valid experiments of a workspace.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::PboxResult;
use crate::resolver::Experiment;
use crate::show::loadable;
use crate::validator::sorted_entries;
use crate::workspace::Workspace;

/// One row of the experiment listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentSummary {
    pub name: String,
    pub path: PathBuf,
    /// Loadable datasets under `datasets/`.
    pub datasets: usize,
    /// Loadable models under `models/`.
    pub models: usize,
    /// Configuration kinds with a local override, sorted.
    pub overrides: Vec<String>,
    /// Last modification time of the experiment folder.
    pub modified: Option<DateTime<Utc>>,
}

/// List every valid experiment, sorted by name.
///
/// Folders failing validation are silently left out. Nothing is created and
/// the active experiment is not changed.
pub fn list_experiments(workspace: &Workspace) -> PboxResult<Vec<ExperimentSummary>> {
    let dir = workspace.experiments_dir();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let validator = workspace.validator();
    let mut rows = Vec::new();

    for folder in sorted_entries(dir)? {
        if !validator.check(&folder) {
            tracing::debug!("Skipping invalid experiment {}", folder.display());
            continue;
        }
        let Some(name) = folder.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Ok(experiment) = Experiment::from_root(name, &folder) else {
            tracing::debug!("Skipping experiment with invalid name `{}`", name);
            continue;
        };

        rows.push(ExperimentSummary {
            name: name.to_string(),
            datasets: loadable(&experiment.datasets_dir(), |p| {
                workspace.dataset_loader().check(p)
            })?
            .len(),
            models: loadable(&experiment.models_dir(), |p| workspace.model_loader().check(p))?
                .len(),
            overrides: experiment.overridden_kinds(workspace),
            modified: modified_time(&folder),
            path: folder,
        });
    }

    Ok(rows)
}

fn modified_time(path: &Path) -> Option<DateTime<Utc>> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GlobalConfig;
    use crate::constants::METADATA_FILENAME;
    use tempfile::TempDir;

    #[test]
    fn test_list_filters_invalid_and_sorts() {
        let temp = TempDir::new().unwrap();
        let mut ws = Workspace::new(GlobalConfig::for_home(temp.path()));

        let beta = Experiment::new(&mut ws, "beta", true).unwrap();
        Experiment::new(&mut ws, "alpha", true).unwrap();
        fs::create_dir_all(ws.experiments_dir().join("broken/conf")).unwrap();

        let ds = beta.datasets_dir().join("upx-only");
        fs::create_dir_all(&ds).unwrap();
        fs::write(ds.join(METADATA_FILENAME), "{}").unwrap();
        fs::create_dir_all(beta.datasets_dir().join("junk")).unwrap();
        fs::write(beta.models_dir().join("rf.joblib"), "m").unwrap();
        fs::write(beta.override_path("packers"), "").unwrap();

        let rows = list_experiments(&ws).unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);

        let beta_row = &rows[1];
        assert_eq!(beta_row.datasets, 1);
        assert_eq!(beta_row.models, 1);
        assert_eq!(beta_row.overrides, vec!["packers"]);
        assert!(beta_row.modified.is_some());
        assert_eq!(rows[0].datasets, 0);
    }

    #[test]
    fn test_list_does_not_change_active() {
        let temp = TempDir::new().unwrap();
        let mut ws = Workspace::new(GlobalConfig::for_home(temp.path()));
        let exp = Experiment::new(&mut ws, "one", true).unwrap();

        list_experiments(&ws).unwrap();
        assert_eq!(ws.active_experiment(), Some(exp.path()));
    }

    #[test]
    fn test_list_without_experiments_dir() {
        let temp = TempDir::new().unwrap();
        let ws = Workspace::new(GlobalConfig::for_home(temp.path()));
        assert!(list_experiments(&ws).unwrap().is_empty());
    }
}
