//! # pbox-core
//!
//! **Packing-box experiments** – core library.
//!
//! An experiment is a self-contained folder that overlays the global
//! workspace: it may hold local configuration overrides, datasets, models and
//! notes, and a logical name resolves to the experiment-local artifact when
//! one exists, to the global one otherwise.
//!
//! ## Main Types
//!
//! - [`Workspace`] – the global workspace context (registry, active experiment, loaders)
//! - [`Experiment`] – an experiment folder and its layered lookup
//! - [`Validator`] – structural validation of experiment folders
//! - [`PboxError`] – domain-specific error type
//!
//! ## Modules
//!
//! - [`config`] – global configuration (`config.yaml`)
//! - [`registry`] – configuration kinds and their effective files
//! - [`validator`] – folder validation and advisory warnings
//! - [`resolver`] – experiment setup, lookup and shadow promotion
//! - [`artifact`] – dataset and model loader boundary
//! - [`commit`] – recording shell commands into `commands.rc`
//! - [`listing`] – enumeration of valid experiments
//! - [`show`] – experiment report and dataset compression
//! - [`edit`] – editor boundary and the edit workflow
//! - [`workspace`] – the workspace context and its persisted state
//!
//! ## Example
//!
//! ```no_run
//! use pbox_core::{Experiment, GlobalConfig, Workspace};
//!
//! # fn main() -> Result<(), pbox_core::PboxError> {
//! let config = GlobalConfig::load_default()?;
//! let mut workspace = Workspace::load(config)?;
//!
//! // Create (if needed) and open the experiment
//! let experiment = Experiment::new(&mut workspace, "upx-study", true)?;
//!
//! // Local override if present, global definition otherwise
//! let packers = experiment.path_of(&workspace, "packers")?;
//! println!("packers: {}", packers.display());
//! # Ok(())
//! # }
//! ```

// Modules
pub mod artifact;
pub mod commit;
pub mod config;
pub mod constants;
pub mod edit;
pub mod errors;
pub mod listing;
pub mod registry;
pub mod resolver;
pub mod show;
pub mod types;
pub mod validator;
pub mod workspace;

// Re-exports for convenience
pub use artifact::{
    ArtifactSummary, DatasetHandle, DatasetLoader, FsDatasetLoader, FsModelLoader, ModelHandle,
    ModelLoader,
};
pub use commit::{commit, CommitOutcome, Confirm, FileHistory, HistorySource};
pub use config::GlobalConfig;
pub use edit::{Editor, SystemEditor};
pub use errors::{InvalidExperiment, PboxError, PboxResult};
pub use listing::{list_experiments, ExperimentSummary};
pub use registry::{ConfigEntry, ConfigRegistry, ConfigState};
pub use resolver::{Artifact, Experiment, Strategy};
pub use show::ExperimentReport;
pub use types::{is_valid_name, ExperimentName};
pub use validator::{ValidationWarning, Validator, WarningSink};
pub use workspace::{ActiveContext, Workspace};
