//! Saved credentials
//!
//! The settings file is plain JSON. It is validated on every load, so a file
//! edited by hand is held to the same rules as `set-config` input.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ConfigError;

const SETTINGS_FILE: &str = "sandbox.json";

/// Immutable credential triple used by the apptainer commands
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// The access key id used by the apptainer subcommand
    pub aws_access_key_id: String,

    /// The secret access key used by the apptainer subcommand
    pub aws_secret_access_key: String,

    /// The public registry to publish to (registry id, alias or URI)
    pub aws_ecr_public_registry: String,
}

impl Settings {
    /// Validate and build settings
    pub fn new(
        aws_access_key_id: impl Into<String>,
        aws_secret_access_key: impl Into<String>,
        aws_ecr_public_registry: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Self {
            aws_access_key_id: aws_access_key_id.into().trim().to_string(),
            aws_secret_access_key: aws_secret_access_key.into().trim().to_string(),
            aws_ecr_public_registry: aws_ecr_public_registry.into().trim().to_string(),
        }
        .validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        debug!("Validating settings");

        let missing: Vec<&str> = [
            ("aws_access_key_id", &self.aws_access_key_id),
            ("aws_secret_access_key", &self.aws_secret_access_key),
            ("aws_ecr_public_registry", &self.aws_ecr_public_registry),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if !missing.is_empty() {
            return Err(ConfigError::Invalid {
                message: format!("empty value for {}", missing.join(", ")),
            });
        }

        Ok(self)
    }

    /// Settings rendered for display, with the secret masked
    pub fn to_masked_json(&self) -> Result<String, ConfigError> {
        let mut shown = self.clone();
        shown.aws_secret_access_key = mask(&self.aws_secret_access_key);
        serde_json::to_string_pretty(&shown).map_err(|e| ConfigError::Invalid {
            message: e.to_string(),
        })
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("aws_access_key_id", &self.aws_access_key_id)
            .field("aws_secret_access_key", &"<redacted>")
            .field("aws_ecr_public_registry", &self.aws_ecr_public_registry)
            .finish()
    }
}

fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    let visible = chars.len().saturating_sub(4);
    let tail: String = chars[visible..].iter().collect();
    format!("{}{}", "*".repeat(visible), tail)
}

/// Location of the settings file inside the cache directory
pub fn settings_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(SETTINGS_FILE)
}

/// Load and validate saved settings
pub fn load_settings(cache_dir: &Path) -> Result<Settings, ConfigError> {
    let path = settings_path(cache_dir);
    debug!("Loading settings from {}", path.display());

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::SettingsMissing { path });
        }
        Err(source) => return Err(ConfigError::Io { path, source }),
    };

    let settings: Settings =
        serde_json::from_str(&content).map_err(|e| ConfigError::Invalid {
            message: format!("{} in {}", e, path.display()),
        })?;

    settings.validated()
}

/// Save settings, replacing any previous file
pub fn dump_settings(cache_dir: &Path, settings: &Settings) -> Result<PathBuf, ConfigError> {
    let path = settings_path(cache_dir);
    debug!("Saving settings to {}", path.display());

    let content = serde_json::to_string(settings).map_err(|e| ConfigError::Invalid {
        message: e.to_string(),
    })?;
    std::fs::write(&path, content).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;

    Ok(path)
}

/// Remove saved settings; a missing file is not an error
pub fn clear_settings(cache_dir: &Path) -> Result<(), ConfigError> {
    let path = settings_path(cache_dir);
    debug!("Removing saved settings at {}", path.display());

    match std::fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ConfigError::Io { path, source }),
    }
}
