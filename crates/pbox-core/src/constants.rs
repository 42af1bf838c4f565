//! Centralized constants for the experiment layout and the global workspace.
//!
//! This module is the single source of truth for folder names, reserved
//! documents, environment variables, and the built-in configuration kinds.

// ============================================================================
// Global workspace
// ============================================================================

/// Name of the pbox home directory under the user's home (`~/.pbox`).
pub const PBOX_HOME_DIR: &str = ".pbox";

/// Global configuration filename (`~/.pbox/config.yaml`).
pub const GLOBAL_CONFIG_FILENAME: &str = "config.yaml";

/// Persisted workspace context filename (`~/.pbox/state.json`).
pub const STATE_FILENAME: &str = "state.json";

/// Default experiments directory name under the pbox home.
pub const EXPERIMENTS_DIR: &str = "experiments";

/// Directory holding the global definition files (`~/.pbox/conf`).
pub const GLOBAL_CONF_DIR: &str = "conf";

/// Extension of the global definition files.
pub const GLOBAL_CONF_EXTENSION: &str = "yml";

/// Environment variable overriding the pbox home directory.
pub const PBOX_HOME_ENV: &str = "PBOX_HOME";

/// Environment variable overriding the global configuration file.
pub const PBOX_CONFIG_ENV: &str = "PBOX_CONFIG";

// ============================================================================
// Experiment layout
// ============================================================================

/// Subfolder holding experiment-local configuration overrides.
pub const CONF_DIR: &str = "conf";

/// Subfolder holding experiment-local datasets.
pub const DATASETS_DIR: &str = "datasets";

/// Subfolder holding experiment-local models.
pub const MODELS_DIR: &str = "models";

/// Optional subfolder for user scripts (tolerated, not managed).
pub const SCRIPTS_DIR: &str = "scripts";

/// Mandatory subfolders, in the order they are checked.
pub const REQUIRED_SUBFOLDERS: &[&str] = &[CONF_DIR, DATASETS_DIR, MODELS_DIR];

/// Subfolders that do not raise an advisory warning.
pub const KNOWN_SUBFOLDERS: &[&str] = &[CONF_DIR, DATASETS_DIR, MODELS_DIR, SCRIPTS_DIR];

/// Reserved extension of configuration overrides (`conf/<kind>.conf`).
pub const CONFIG_EXTENSION: &str = "conf";

/// Notes document at the experiment root.
pub const README_FILENAME: &str = "README.md";

/// Commands-history document at the experiment root.
pub const COMMANDS_FILENAME: &str = "commands.rc";

/// Files that do not raise an advisory warning at the experiment root.
pub const KNOWN_ROOT_FILES: &[&str] = &[COMMANDS_FILENAME, README_FILENAME];

// ============================================================================
// Configuration kinds
// ============================================================================

/// Configuration kinds recognized out of the box.
///
/// The global configuration may add more through its `definitions` section.
pub const DEFAULT_CONFIG_KINDS: &[&str] = &[
    "algorithms",
    "alterations",
    "analyzers",
    "detectors",
    "features",
    "packers",
    "scenarios",
    "unpackers",
];

// ============================================================================
// Commit
// ============================================================================

/// Command verbs whose history entries may be committed to `commands.rc`.
pub const COMMIT_VALID_COMMANDS: &[&str] = &[
    // OS commands
    "cd",
    "cp",
    "mkdir",
    "mv",
    // packing-box commands
    "dataset",
    "detector",
    "model",
    "packer",
    "unpacker",
    "visualizer",
];

/// Default shell history file, relative to the user's home.
pub const DEFAULT_HISTORY_FILENAME: &str = ".bash_history";

// ============================================================================
// Artifacts
// ============================================================================

/// Marker file identifying a dataset or model directory.
pub const METADATA_FILENAME: &str = "metadata.json";

/// Subfolder of a dataset holding the raw sample files.
pub const DATASET_FILES_DIR: &str = "files";

/// Check whether a configuration file stem is a well-formed kind identifier.
///
/// Kind identifiers are lowercase ASCII words, optionally with `_` or `-`.
pub fn is_valid_kind_name(kind: &str) -> bool {
    !kind.is_empty()
        && kind
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}
