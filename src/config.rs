// User configuration
// Optional defaults read from <config dir>/verity/config.toml; CLI flags win

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::hash::error::HashUtilityError;
use crate::hash::HashRegistry;

/// Defaults applied when the matching CLI flag is absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Algorithm used when the manifest extension does not name one
    pub algorithm: Option<String>,
    /// Worker threads; unset means one per CPU
    pub threads: Option<usize>,
    /// Semicolon-separated include globs
    pub include: Option<String>,
    /// Semicolon-separated exclude globs
    pub exclude: Option<String>,
}

impl Settings {
    /// `<config dir>/verity/config.toml`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("verity").join("config.toml"))
    }

    /// Load the default config file; a missing file gives default settings
    pub fn load() -> Result<Self, HashUtilityError> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, HashUtilityError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| HashUtilityError::from_io_error(e, "reading config", Some(path.to_path_buf())))?;
        let settings: Settings = toml::from_str(&contents).map_err(|e| HashUtilityError::InvalidConfig {
            message: format!("failed to parse {}: {}", path.display(), e),
        })?;
        settings.validate()?;

        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), HashUtilityError> {
        if let Some(algorithm) = &self.algorithm {
            if HashRegistry::canonical_name(algorithm).is_none() {
                return Err(HashUtilityError::UnsupportedAlgorithm {
                    algorithm: algorithm.clone(),
                });
            }
        }
        if self.threads == Some(0) {
            return Err(HashUtilityError::InvalidConfig {
                message: "threads must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
