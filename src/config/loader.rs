//! Locating and parsing the relay's TOML settings.

use std::path::{Path, PathBuf};

use super::ServerConfig;

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".build-relay.toml";

/// Settings together with the file they were read from.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: ServerConfig,
    /// `None` when no file was found and defaults apply.
    pub source: Option<PathBuf>,
}

/// Finds the relay settings file.
///
/// Without an explicit path the working directory wins over the user
/// config directory (`<config_dir>/build-relay/config.toml`).
#[derive(Debug)]
pub struct ConfigLoader {
    candidates: Vec<PathBuf>,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        let mut candidates = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("build-relay").join("config.toml"));
        }
        Self { candidates }
    }

    /// Only consult `path`, as `--config` does.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            candidates: vec![path],
        }
    }

    /// First candidate that exists on disk.
    #[must_use]
    pub fn find_config_file(&self) -> Option<&Path> {
        self.candidates
            .iter()
            .map(PathBuf::as_path)
            .find(|p| p.exists())
    }

    /// Read the first existing candidate, or fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let Some(path) = self.find_config_file() else {
            tracing::debug!(candidates = ?self.candidates, "No relay config file, using defaults");
            return Ok(LoadedConfig {
                config: ServerConfig::default(),
                source: None,
            });
        };

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(LoadedConfig {
            config,
            source: Some(path.to_path_buf()),
        })
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}
