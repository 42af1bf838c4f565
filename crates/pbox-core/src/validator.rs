//! Structural validation of experiment folders.
//!
//! The [`Validator`] certifies that a folder is a well-formed experiment:
//! the mandatory subfolders exist and every file under `conf` is the
//! override of a recognized configuration kind. An optional advisory pass
//! reports unexpected entries without changing the outcome.
//!
//! Validation is read-only.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    CONFIG_EXTENSION, CONF_DIR, KNOWN_ROOT_FILES, KNOWN_SUBFOLDERS, REQUIRED_SUBFOLDERS,
};
use crate::errors::InvalidExperiment;

// ============================================================================
// Warnings
// ============================================================================

/// Advisory finding of the validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// A subfolder other than `conf`, `datasets`, `models` or `scripts`.
    UnknownSubfolder(PathBuf),
    /// A root file other than `commands.rc` or `README.md`.
    UnknownFile(PathBuf),
}

impl ValidationWarning {
    /// The offending path.
    pub fn path(&self) -> &Path {
        match self {
            Self::UnknownSubfolder(path) | Self::UnknownFile(path) => path,
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownSubfolder(path) => write!(f, "Unknown subfolder '{}'", path.display()),
            Self::UnknownFile(path) => write!(f, "Unknown file '{}'", path.display()),
        }
    }
}

/// Receiver of advisory findings.
pub trait WarningSink {
    /// Report one finding.
    fn warn(&mut self, warning: ValidationWarning);
}

impl WarningSink for Vec<ValidationWarning> {
    fn warn(&mut self, warning: ValidationWarning) {
        self.push(warning);
    }
}

/// Sink failing on the first finding (strict mode).
#[derive(Debug, Default)]
struct StrictSink {
    first: Option<PathBuf>,
}

impl WarningSink for StrictSink {
    fn warn(&mut self, warning: ValidationWarning) {
        if self.first.is_none() {
            self.first = Some(warning.path().to_path_buf());
        }
    }
}

// ============================================================================
// Validator
// ============================================================================

/// Validates candidate experiment folders.
#[derive(Debug, Clone)]
pub struct Validator {
    experiments_dir: PathBuf,
    kinds: BTreeSet<String>,
}

impl Validator {
    /// Create a validator resolving folders against `experiments_dir` and
    /// accepting the given configuration kinds.
    pub fn new<I, S>(experiments_dir: impl Into<PathBuf>, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            experiments_dir: experiments_dir.into(),
            kinds: kinds.into_iter().map(Into::into).collect(),
        }
    }

    /// The directory folders are resolved against.
    pub fn experiments_dir(&self) -> &Path {
        &self.experiments_dir
    }

    /// Validate `folder`, returning its canonical path.
    ///
    /// # Errors
    ///
    /// The first failing rule, in order: [`InvalidExperiment::NotFound`],
    /// [`InvalidExperiment::NotADirectory`], [`InvalidExperiment::MissingSubfolder`]
    /// (checked as `conf`, `datasets`, `models`), [`InvalidExperiment::UnknownConfig`].
    pub fn validate(&self, folder: impl AsRef<Path>) -> Result<PathBuf, InvalidExperiment> {
        self.validate_structure(folder.as_ref())
    }

    /// Validate `folder` and report advisory findings to `sink`.
    pub fn validate_with(
        &self,
        folder: impl AsRef<Path>,
        sink: &mut dyn WarningSink,
    ) -> Result<PathBuf, InvalidExperiment> {
        let path = self.validate_structure(folder.as_ref())?;
        self.advise(&path, sink)?;
        Ok(path)
    }

    /// Validate `folder`, treating the first advisory finding as an error.
    ///
    /// # Errors
    ///
    /// As [`Validator::validate`], plus [`InvalidExperiment::UnexpectedEntry`].
    pub fn validate_strict(&self, folder: impl AsRef<Path>) -> Result<PathBuf, InvalidExperiment> {
        let mut sink = StrictSink::default();
        let path = self.validate_with(folder, &mut sink)?;
        match sink.first {
            Some(entry) => Err(InvalidExperiment::UnexpectedEntry(entry)),
            None => Ok(path),
        }
    }

    /// Non-raising wrapper around [`Validator::validate`].
    pub fn check(&self, folder: impl AsRef<Path>) -> bool {
        self.validate(folder).is_ok()
    }

    fn validate_structure(&self, folder: &Path) -> Result<PathBuf, InvalidExperiment> {
        let path = self.experiments_dir.join(folder);

        if !path.exists() {
            return Err(InvalidExperiment::NotFound(path));
        }
        if !path.is_dir() {
            return Err(InvalidExperiment::NotADirectory(path));
        }
        for &subfolder in REQUIRED_SUBFOLDERS {
            if !path.join(subfolder).is_dir() {
                return Err(InvalidExperiment::MissingSubfolder { path, subfolder });
            }
        }

        for entry in sorted_entries(&path.join(CONF_DIR))? {
            if !self.is_config_override(&entry) {
                return Err(InvalidExperiment::UnknownConfig(entry));
            }
        }

        Ok(path.canonicalize()?)
    }

    fn is_config_override(&self, entry: &Path) -> bool {
        let stem_ok = entry
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|stem| self.kinds.contains(stem));
        let ext_ok = entry.extension().and_then(|e| e.to_str()) == Some(CONFIG_EXTENSION);
        stem_ok && ext_ok && entry.is_file()
    }

    fn advise(&self, path: &Path, sink: &mut dyn WarningSink) -> Result<(), InvalidExperiment> {
        for entry in sorted_entries(path)? {
            // Names that are not UTF-8 are never in the allow-lists.
            let name = entry.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if entry.is_dir() {
                if !KNOWN_SUBFOLDERS.contains(&name) {
                    sink.warn(ValidationWarning::UnknownSubfolder(entry));
                }
            } else if !KNOWN_ROOT_FILES.contains(&name) {
                sink.warn(ValidationWarning::UnknownFile(entry));
            }
        }
        Ok(())
    }
}

/// List the immediate children of `dir`, sorted by file name.
pub(crate) fn sorted_entries(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(entries)
}

// ============================================================================
// Tests
// ============================================================================
