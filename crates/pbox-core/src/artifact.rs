//! Dataset and model loading boundary.
//!
//! The internal formats of datasets and models are opaque to this crate.
//! They are reached through the [`DatasetLoader`] and [`ModelLoader`] traits;
//! [`FsDatasetLoader`] and [`FsModelLoader`] are the default filesystem
//! implementations.
//!
//! # Default Layout
//!
//! ```text
//! datasets/
//!   my-dataset/
//!     metadata.json
//!     files/          # absent once the dataset is fileless
//! models/
//!   my-model/
//!     metadata.json
//!   dumped-model.joblib
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::constants::{DATASET_FILES_DIR, METADATA_FILENAME};
use crate::errors::PboxError;

// ============================================================================
// Handles
// ============================================================================

/// Summary of an opened dataset or model, for listings and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactSummary {
    /// Artifact name (the file stem).
    pub name: String,
    /// Location on disk.
    pub path: PathBuf,
    /// Number of regular files the artifact holds.
    pub files: u64,
    /// Total size in bytes.
    pub size_bytes: u64,
    /// Whether the dataset has been converted to fileless form.
    pub fileless: bool,
}

/// An opened dataset.
pub trait DatasetHandle: std::fmt::Debug {
    /// Dataset name.
    fn name(&self) -> &str;

    /// Location on disk.
    fn path(&self) -> &Path;

    /// Describe the dataset.
    fn summary(&self) -> Result<ArtifactSummary, PboxError>;

    /// Convert the dataset to fileless form. Converting a fileless dataset
    /// is a no-op.
    fn convert(&mut self) -> Result<(), PboxError>;
}

/// An opened model.
pub trait ModelHandle: std::fmt::Debug {
    /// Model name.
    fn name(&self) -> &str;

    /// Location on disk.
    fn path(&self) -> &Path;

    /// Describe the model.
    fn summary(&self) -> Result<ArtifactSummary, PboxError>;
}

// ============================================================================
// Loaders
// ============================================================================

/// Opens datasets found in a `datasets/` folder.
pub trait DatasetLoader: std::fmt::Debug {
    /// Check whether `path` holds a loadable dataset.
    fn check(&self, path: &Path) -> bool;

    /// Open the dataset at `path`.
    fn open(&self, path: &Path) -> Result<Box<dyn DatasetHandle>, PboxError>;
}

/// Opens models found in a `models/` folder.
pub trait ModelLoader: std::fmt::Debug {
    /// Check whether `path` holds a loadable model.
    fn check(&self, path: &Path) -> bool;

    /// Open the model at `path`.
    fn open(&self, path: &Path) -> Result<Box<dyn ModelHandle>, PboxError>;
}

/// Default loader for datasets stored as folders with a `metadata.json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsDatasetLoader;

/// Default loader for models stored as folders with a `metadata.json`, or
/// dumped as a single file.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsModelLoader;

impl DatasetLoader for FsDatasetLoader {
    fn check(&self, path: &Path) -> bool {
        path.is_dir() && path.join(METADATA_FILENAME).is_file()
    }

    fn open(&self, path: &Path) -> Result<Box<dyn DatasetHandle>, PboxError> {
        if !self.check(path) {
            return Err(PboxError::ArtifactOpen {
                path: path.to_path_buf(),
                reason: format!("not a dataset folder (missing {})", METADATA_FILENAME),
            });
        }
        Ok(Box::new(FsDataset {
            name: stem_of(path),
            path: path.to_path_buf(),
        }))
    }
}

impl ModelLoader for FsModelLoader {
    fn check(&self, path: &Path) -> bool {
        path.is_file() || (path.is_dir() && path.join(METADATA_FILENAME).is_file())
    }

    fn open(&self, path: &Path) -> Result<Box<dyn ModelHandle>, PboxError> {
        if !self.check(path) {
            return Err(PboxError::ArtifactOpen {
                path: path.to_path_buf(),
                reason: format!("not a model (missing {})", METADATA_FILENAME),
            });
        }
        Ok(Box::new(FsModel {
            name: stem_of(path),
            path: path.to_path_buf(),
        }))
    }
}

// ============================================================================
// Filesystem handles
// ============================================================================

#[derive(Debug)]
struct FsDataset {
    name: String,
    path: PathBuf,
}

impl DatasetHandle for FsDataset {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn summary(&self) -> Result<ArtifactSummary, PboxError> {
        let (files, size_bytes) = measure(&self.path)?;
        Ok(ArtifactSummary {
            name: self.name.clone(),
            path: self.path.clone(),
            files,
            size_bytes,
            fileless: !self.path.join(DATASET_FILES_DIR).exists(),
        })
    }

    fn convert(&mut self) -> Result<(), PboxError> {
        let files_dir = self.path.join(DATASET_FILES_DIR);
        if !files_dir.exists() {
            tracing::debug!("Dataset {} is already fileless", self.name);
            return Ok(());
        }
        tracing::debug!("Removing {}", files_dir.display());
        fs::remove_dir_all(&files_dir)?;
        Ok(())
    }
}

#[derive(Debug)]
struct FsModel {
    name: String,
    path: PathBuf,
}

impl ModelHandle for FsModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn summary(&self) -> Result<ArtifactSummary, PboxError> {
        let (files, size_bytes) = measure(&self.path)?;
        Ok(ArtifactSummary {
            name: self.name.clone(),
            path: self.path.clone(),
            files,
            size_bytes,
            fileless: false,
        })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// The stem of a path as an owned string (empty if not UTF-8).
pub(crate) fn stem_of(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Count regular files and their total size under `path` (recursive).
fn measure(path: &Path) -> Result<(u64, u64), PboxError> {
    if path.is_file() {
        return Ok((1, fs::metadata(path)?.len()));
    }
    let mut files = 0;
    let mut size = 0;
    let mut stack = vec![path.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                stack.push(entry.path());
            } else if file_type.is_file() {
                files += 1;
                size += entry.metadata()?.len();
            }
        }
    }
    Ok((files, size))
}
