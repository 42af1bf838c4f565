//! Common types shared across pbox-core.
//!
//! The naming policy here is shared by every named folder-resource of the
//! workspace (experiments, datasets, models).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::PboxError;

/// Names that cannot be used for a folder-resource.
const RESERVED_NAMES: &[&str] = &["all", "none"];

/// Check if a string is a valid folder-resource name.
///
/// Valid names:
/// - Must be non-empty
/// - Must start with an ASCII alphanumeric character
/// - Can only contain alphanumeric characters, hyphens, underscores and periods
/// - Cannot be one of the reserved words `all` or `none` (any case)
pub fn is_valid_name(name: &str) -> bool {
    let Some(first) = name.chars().next() else {
        return false;
    };
    if !first.is_ascii_alphanumeric() {
        return false;
    }
    if RESERVED_NAMES.contains(&name.to_ascii_lowercase().as_str()) {
        return false;
    }
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

// ============================================================================
// ExperimentName
// ============================================================================

/// The name of an experiment folder.
///
/// Only the basename of the supplied value is kept, so `path/to/exp` and
/// `exp` name the same experiment.
///
/// # Example
///
/// ```
/// use pbox_core::ExperimentName;
///
/// assert_eq!(ExperimentName::try_new("runs/my-exp").unwrap().as_str(), "my-exp");
/// assert!(ExperimentName::try_new("bad name").is_err());
/// assert!(ExperimentName::try_new("ALL").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Create a new experiment name with validation.
    ///
    /// # Errors
    ///
    /// Returns [`PboxError::InvalidName`] if the basename breaks the naming policy.
    pub fn try_new(name: impl AsRef<str>) -> Result<Self, PboxError> {
        let raw = name.as_ref();
        let base = Path::new(raw)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(raw);
        if is_valid_name(base) {
            Ok(Self(base.to_string()))
        } else {
            Err(PboxError::InvalidName(raw.to_string()))
        }
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ExperimentName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
