//! Global configuration for the pbox workspace.
//!
//! [`GlobalConfig`] is loaded from `~/.pbox/config.yaml` (or an explicit path)
//! and locates the experiments directory and the global definition file of
//! every configuration kind.
//!
//! # Example YAML
//!
//! ```yaml
//! experiments: /mnt/share/experiments
//! definitions:
//!   packers: /opt/pbox/conf/packers.yml
//!   custom-kind: /opt/pbox/conf/custom.yml
//! editor: nano
//! historyFile: /home/user/.zsh_history
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    is_valid_kind_name, DEFAULT_CONFIG_KINDS, DEFAULT_HISTORY_FILENAME, EXPERIMENTS_DIR,
    GLOBAL_CONFIG_FILENAME, GLOBAL_CONF_DIR, GLOBAL_CONF_EXTENSION, PBOX_HOME_DIR, PBOX_HOME_ENV,
    STATE_FILENAME,
};
use crate::errors::PboxError;
use crate::registry::ConfigRegistry;

// ============================================================================
// GlobalConfig
// ============================================================================

/// Global (user-level) configuration.
///
/// Every field is optional in the YAML file; missing values fall back to
/// locations under the pbox home directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfig {
    /// Root of the global workspace. Not read from YAML: set by the loader.
    #[serde(skip)]
    pub home: PathBuf,

    /// Directory holding every experiment folder.
    #[serde(default)]
    pub experiments: Option<PathBuf>,

    /// Definition file per configuration kind. Overrides built-in kinds and
    /// may add new ones.
    #[serde(default)]
    pub definitions: BTreeMap<String, PathBuf>,

    /// Editor command used by `edit` (falls back to `$VISUAL`/`$EDITOR`).
    #[serde(default)]
    pub editor: Option<String>,

    /// Shell history file scraped by `commit`.
    #[serde(default)]
    pub history_file: Option<PathBuf>,
}

impl GlobalConfig {
    /// Load the global configuration from the default location.
    ///
    /// The home is `$PBOX_HOME` if set, else `~/.pbox`. A missing file yields
    /// the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PboxError::InvalidGlobalConfig`] if the file exists but cannot be parsed.
    pub fn load_default() -> Result<Self, PboxError> {
        let home = Self::default_home().ok_or_else(|| {
            PboxError::InvalidGlobalConfig("could not determine the home directory".to_string())
        })?;
        Self::load_from_home(&home)
    }

    /// Load the configuration stored in `<home>/config.yaml`.
    pub fn load_from_home(home: &Path) -> Result<Self, PboxError> {
        let mut config = Self::from_path(&home.join(GLOBAL_CONFIG_FILENAME))?;
        config.home = home.to_path_buf();
        Ok(config)
    }

    /// Load the global configuration from a specific path.
    ///
    /// If the file does not exist, returns a default configuration. The home
    /// is left empty; callers set it (see [`GlobalConfig::load_from_home`]).
    ///
    /// # Errors
    ///
    /// Returns [`PboxError::InvalidGlobalConfig`] if the file exists but cannot be parsed.
    /// Returns [`PboxError::InvalidConfiguration`] if validation fails.
    pub fn from_path(path: &Path) -> Result<Self, PboxError> {
        if !path.exists() {
            tracing::debug!(
                "Global config not found at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            PboxError::InvalidGlobalConfig(format!("Failed to read {}: {}", path.display(), e))
        })?;

        // An empty file is a valid, empty configuration.
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&content).map_err(|e| {
                PboxError::InvalidGlobalConfig(format!("Failed to parse {}: {}", path.display(), e))
            })?
        };

        let warnings = config.validate()?;
        for warning in warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(config)
    }

    /// Load a configuration file given explicitly (CLI flag or environment).
    ///
    /// Unlike [`GlobalConfig::from_path`], the file must exist.
    ///
    /// # Errors
    ///
    /// Returns [`PboxError::MissingGlobalConfig`] if the file does not exist.
    pub fn from_explicit_path(path: &Path, home: &Path) -> Result<Self, PboxError> {
        if !path.is_file() {
            return Err(PboxError::MissingGlobalConfig(path.display().to_string()));
        }
        let mut config = Self::from_path(path)?;
        config.home = home.to_path_buf();
        Ok(config)
    }

    /// Get the default pbox home (`$PBOX_HOME`, else `~/.pbox`).
    pub fn default_home() -> Option<PathBuf> {
        if let Ok(home) = std::env::var(PBOX_HOME_ENV) {
            if !home.is_empty() {
                return Some(PathBuf::from(home));
            }
        }
        dirs::home_dir().map(|h| h.join(PBOX_HOME_DIR))
    }

    /// Create a configuration rooted at `home` without touching the filesystem.
    pub fn for_home(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            ..Self::default()
        }
    }

    /// The directory holding every experiment.
    ///
    /// A relative `experiments` value is taken relative to the home.
    pub fn experiments_dir(&self) -> PathBuf {
        match &self.experiments {
            Some(dir) if dir.is_relative() => self.home.join(dir),
            Some(dir) => dir.clone(),
            None => self.home.join(EXPERIMENTS_DIR),
        }
    }

    /// Path of the persisted workspace context.
    pub fn state_path(&self) -> PathBuf {
        self.home.join(STATE_FILENAME)
    }

    /// Path of the shell history file used by `commit`.
    ///
    /// Precedence: configured `historyFile`, `$HISTFILE`, `~/.bash_history`.
    pub fn history_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.history_file {
            return Some(path.clone());
        }
        if let Ok(histfile) = std::env::var("HISTFILE") {
            if !histfile.is_empty() {
                return Some(PathBuf::from(histfile));
            }
        }
        dirs::home_dir().map(|h| h.join(DEFAULT_HISTORY_FILENAME))
    }

    /// Build the configuration registry: built-in kinds located under
    /// `<home>/conf/<kind>.yml`, then the `definitions` entries.
    pub fn registry(&self) -> ConfigRegistry {
        let conf_dir = self.home.join(GLOBAL_CONF_DIR);
        let mut globals: BTreeMap<String, PathBuf> = DEFAULT_CONFIG_KINDS
            .iter()
            .map(|kind| {
                (
                    kind.to_string(),
                    conf_dir.join(format!("{kind}.{GLOBAL_CONF_EXTENSION}")),
                )
            })
            .collect();
        for (kind, path) in &self.definitions {
            let path = if path.is_relative() {
                self.home.join(path)
            } else {
                path.clone()
            };
            globals.insert(kind.clone(), path);
        }
        ConfigRegistry::new(globals)
    }

    /// Validates the configuration, returning collected warnings.
    ///
    /// # Errors
    ///
    /// Returns [`PboxError::InvalidConfiguration`] when a definition uses a
    /// kind identifier that could never match a `conf/<kind>.conf` file.
    pub fn validate(&self) -> Result<Vec<String>, PboxError> {
        let mut warnings = Vec::new();

        for (kind, path) in &self.definitions {
            if !is_valid_kind_name(kind) {
                return Err(PboxError::InvalidConfiguration {
                    message: format!("definition kind `{}` is not a valid identifier", kind),
                    hint: "Use lowercase letters, digits, `_` or `-`".to_string(),
                });
            }
            if path.is_absolute() && !path.exists() {
                warnings.push(format!(
                    "definition file for `{}` does not exist: {}",
                    kind,
                    path.display()
                ));
            }
        }

        if let Some(editor) = &self.editor {
            if editor.trim().is_empty() {
                warnings.push("`editor` is empty and will be ignored".to_string());
            }
        }

        Ok(warnings)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_global_config_default_paths() {
        let config = GlobalConfig::for_home("/opt/pbox");
        assert_eq!(config.experiments_dir(), PathBuf::from("/opt/pbox/experiments"));
        assert_eq!(config.state_path(), PathBuf::from("/opt/pbox/state.json"));
    }

    #[test]
    fn test_global_config_from_yaml() {
        let yaml = r#"
experiments: /mnt/share/experiments
definitions:
  packers: /opt/conf/packers.yml
  custom-kind: conf/custom.yml
editor: nano
historyFile: /tmp/history
"#;
        let config: GlobalConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.experiments_dir(),
            PathBuf::from("/mnt/share/experiments")
        );
        assert_eq!(config.editor.as_deref(), Some("nano"));
        assert_eq!(config.history_path(), Some(PathBuf::from("/tmp/history")));
        assert_eq!(config.definitions.len(), 2);
    }

    #[test]
    fn test_global_config_missing_file() {
        let temp = TempDir::new().unwrap();
        let config = GlobalConfig::load_from_home(temp.path()).unwrap();
        assert_eq!(config.home, temp.path());
        assert!(config.definitions.is_empty());
    }

    #[test]
    fn test_global_config_invalid_yaml() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(GLOBAL_CONFIG_FILENAME), "not: [valid: yaml").unwrap();
        let result = GlobalConfig::load_from_home(temp.path());
        assert!(matches!(
            result.unwrap_err(),
            PboxError::InvalidGlobalConfig(_)
        ));
    }

    #[test]
    fn test_global_config_invalid_kind() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(GLOBAL_CONFIG_FILENAME),
            "definitions:\n  Bad Kind: /tmp/x.yml\n",
        )
        .unwrap();
        let result = GlobalConfig::load_from_home(temp.path());
        assert!(matches!(
            result.unwrap_err(),
            PboxError::InvalidConfiguration { .. }
        ));
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let temp = TempDir::new().unwrap();
        let result = GlobalConfig::from_explicit_path(&temp.path().join("nope.yaml"), temp.path());
        assert!(matches!(
            result.unwrap_err(),
            PboxError::MissingGlobalConfig(_)
        ));
    }

    #[test]
    fn test_validate_warns_missing_definition() {
        let mut config = GlobalConfig::for_home("/opt/pbox");
        config
            .definitions
            .insert("packers".to_string(), PathBuf::from("/nonexistent/packers.yml"));
        let warnings = config.validate().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("packers"));
    }

    #[test]
    fn test_registry_defaults_and_definitions() {
        let mut config = GlobalConfig::for_home("/opt/pbox");
        config
            .definitions
            .insert("custom".to_string(), PathBuf::from("extra/custom.yml"));
        let registry = config.registry();

        assert!(registry.is_kind("packers"));
        assert!(registry.is_kind("custom"));
        assert_eq!(
            registry.global_path("packers"),
            Some(Path::new("/opt/pbox/conf/packers.yml"))
        );
        assert_eq!(
            registry.global_path("custom"),
            Some(Path::new("/opt/pbox/extra/custom.yml"))
        );
        assert_eq!(registry.kinds().count(), DEFAULT_CONFIG_KINDS.len() + 1);
    }
}
