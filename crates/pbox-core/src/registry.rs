//! Configuration registry: which file answers each configuration kind.
//!
//! Every kind is backed by exactly one effective file at any time: the
//! global definition, or an experiment-local override shadowing it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::errors::PboxError;

// ============================================================================
// ConfigState
// ============================================================================

/// Where the effective file of a configuration kind comes from.
///
/// Promotion (`Inherited` → `Overridden`) is the only transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "path", rename_all = "lowercase")]
pub enum ConfigState {
    /// No local override: the global definition file answers.
    Inherited(PathBuf),
    /// The experiment-local `conf/<kind>.conf` answers.
    Overridden(PathBuf),
}

impl ConfigState {
    /// The effective file path.
    pub fn path(&self) -> &Path {
        match self {
            Self::Inherited(path) | Self::Overridden(path) => path,
        }
    }

    /// Check if a local override is in effect.
    pub fn is_overridden(&self) -> bool {
        matches!(self, Self::Overridden(_))
    }
}

/// A configuration kind together with its resolved state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigEntry {
    /// The configuration kind identifier.
    pub kind: String,
    /// Where its effective file comes from.
    #[serde(flatten)]
    pub state: ConfigState,
}

impl ConfigEntry {
    /// The effective file path.
    pub fn path(&self) -> &Path {
        self.state.path()
    }
}

// ============================================================================
// ConfigRegistry
// ============================================================================

/// Mapping from configuration kind to its effective file.
///
/// The set of kinds is fixed at construction; only overrides change.
#[derive(Debug, Clone, Default)]
pub struct ConfigRegistry {
    globals: BTreeMap<String, PathBuf>,
    overrides: BTreeMap<String, PathBuf>,
}

impl ConfigRegistry {
    /// Create a registry from the global definition file of each kind.
    pub fn new(globals: BTreeMap<String, PathBuf>) -> Self {
        Self {
            globals,
            overrides: BTreeMap::new(),
        }
    }

    /// All recognized configuration kinds, sorted.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.globals.keys().map(String::as_str)
    }

    /// Check if `name` is a recognized configuration kind.
    pub fn is_kind(&self, name: &str) -> bool {
        self.globals.contains_key(name)
    }

    /// The global definition file of a kind, ignoring overrides.
    pub fn global_path(&self, kind: &str) -> Option<&Path> {
        self.globals.get(kind).map(PathBuf::as_path)
    }

    /// The file currently answering a kind.
    pub fn effective_path(&self, kind: &str) -> Option<&Path> {
        self.overrides
            .get(kind)
            .or_else(|| self.globals.get(kind))
            .map(PathBuf::as_path)
    }

    /// The state of a kind, or `None` if it is not recognized.
    pub fn state(&self, kind: &str) -> Option<ConfigState> {
        if let Some(local) = self.overrides.get(kind) {
            return Some(ConfigState::Overridden(local.clone()));
        }
        self.globals
            .get(kind)
            .map(|global| ConfigState::Inherited(global.clone()))
    }

    /// Register `path` as the override of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`PboxError::UnknownConfigKind`] if `kind` is not recognized.
    pub fn set_override(&mut self, kind: &str, path: impl Into<PathBuf>) -> Result<(), PboxError> {
        if !self.is_kind(kind) {
            return Err(PboxError::UnknownConfigKind(kind.to_string()));
        }
        let path = path.into();
        tracing::debug!("Override registered: {} -> {}", kind, path.display());
        self.overrides.insert(kind.to_string(), path);
        Ok(())
    }

    /// Drop every override, falling back to the global definitions.
    pub fn clear_overrides(&mut self) {
        self.overrides.clear();
    }

    /// Kinds currently answered by an override, sorted.
    pub fn overridden_kinds(&self) -> Vec<&str> {
        self.overrides.keys().map(String::as_str).collect()
    }
}
