//! TOML configuration of the command-line program

use std::fs;
use std::path::Path;

use railcurves_core::SpeedProfileOptions;
use serde::Deserialize;

use crate::error::CliError;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub pretty: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub output: OutputConfig,
    /// Base options, refined per path by its vehicle defaults
    pub profile: SpeedProfileOptions,
    /// Worker threads for batch evaluation, all cores when unset
    pub threads: Option<usize>,
}

impl AppConfig {
    /// Reads `path`, or the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, CliError> {
        let config: Self = toml::from_str(text)?;
        config.profile.validate()?;
        Ok(config)
    }
}
