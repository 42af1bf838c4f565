//! Error types for pbox-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for pbox-core operations.
pub type PboxResult<T> = Result<T, PboxError>;

/// Structural reasons a folder is not a valid experiment.
///
/// Returned by the [`Validator`](crate::validator::Validator). The first
/// failing rule is reported; findings are never aggregated.
#[derive(Error, Debug)]
pub enum InvalidExperiment {
    /// The folder does not exist.
    #[error("Experiment folder `{}` does not exist", .0.display())]
    NotFound(PathBuf),

    /// The path exists but is not a directory.
    #[error("`{}` is not a folder", .0.display())]
    NotADirectory(PathBuf),

    /// One of the mandatory subfolders is missing.
    #[error("Experiment `{}` does not have `{subfolder}`", .path.display())]
    MissingSubfolder {
        /// The experiment folder.
        path: PathBuf,
        /// The first missing subfolder (`conf`, `datasets` or `models`).
        subfolder: &'static str,
    },

    /// A file under `conf` is not a recognized configuration override.
    #[error("Unknown configuration file `{}`", .0.display())]
    UnknownConfig(PathBuf),

    /// An unexpected entry was found while validating in strict mode.
    #[error("Unexpected entry `{}`", .0.display())]
    UnexpectedEntry(PathBuf),

    /// The folder could not be inspected.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Domain-specific errors for experiment operations.
#[derive(Error, Debug)]
pub enum PboxError {
    /// A logical name matched no reserved document, config kind, dataset or model.
    #[error("`{0}` not found in the experiment")]
    NotFound(String),

    /// The folder failed structural validation.
    #[error("Invalid experiment: {0}")]
    InvalidExperiment(#[from] InvalidExperiment),

    /// A name does not satisfy the naming policy.
    #[error("Invalid name `{0}`: names must start with an alphanumeric character and contain only alphanumeric characters, hyphens, underscores and periods.")]
    InvalidName(String),

    /// The name is not one of the recognized configuration kinds.
    #[error("`{0}` is not a recognized configuration kind")]
    UnknownConfigKind(String),

    /// Global configuration file not found.
    #[error("Global config not found at {0}")]
    MissingGlobalConfig(String),

    /// Global configuration file is invalid.
    #[error("Global config invalid: {0}")]
    InvalidGlobalConfig(String),

    /// A configuration value is invalid.
    #[error("Invalid configuration: {message}. {hint}")]
    InvalidConfiguration {
        /// Description of the invalid configuration.
        message: String,
        /// Actionable hint on how to fix it.
        hint: String,
    },

    /// A dataset or model could not be opened.
    #[error("Failed to open `{}`: {reason}", .path.display())]
    ArtifactOpen {
        /// Path of the artifact.
        path: PathBuf,
        /// Why it could not be opened.
        reason: String,
    },

    /// The external editor failed.
    #[error("Editor failed: {0}")]
    Editor(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
