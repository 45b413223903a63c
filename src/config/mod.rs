mod general;
mod media;
mod paths;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use general::GeneralConfig;
pub use media::MediaConfig;
pub use paths::ConfigPaths;

use crate::core::{DesklinkError, Result};

#[cfg(test)]
mod tests;

/// Main configuration structure for desklink.
///
/// Every section is optional in the TOML file; missing sections fall back
/// to their defaults so an empty or absent file is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// General application settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Media bridge settings.
    #[serde(default)]
    pub media: MediaConfig,
}

impl Config {
    /// Load configuration from the given file, or from the default
    /// location when `path` is None. A missing file yields defaults.
    ///
    /// # Errors
    /// Returns `DesklinkError::TomlParse` if the file exists but cannot be
    /// parsed, or `DesklinkError::Io` if it exists but cannot be read.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => ConfigPaths::main_config(),
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)?;
        toml::from_str(&contents).map_err(|e| DesklinkError::toml_parse(e, &path))
    }
}
