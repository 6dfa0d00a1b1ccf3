//! Per-request build configuration and the generated `build.config` file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::BuildDefaults;
use crate::shell::EnvOverlay;

/// Environment key carrying the application source directory.
pub const APP_DIR_KEY: &str = "APP_DIR";
/// Environment key carrying the output artifact name.
pub const OUT_NAME_KEY: &str = "OUT_NAME";

/// Errors raised while validating or persisting a build configuration.
#[derive(thiserror::Error, Debug)]
pub enum BuildConfigError {
    /// The request body is not a JSON object of the expected shape.
    #[error("Invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A field contains characters that cannot be written as a config line.
    #[error("Invalid value for {field}: control characters are not allowed")]
    InvalidValue { field: &'static str },

    /// Writing the configuration file failed.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Raw build request body as sent by the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    pub app_dir: Option<String>,
    pub out_name: Option<String>,
}

impl BuildRequest {
    /// Parse a request body. An empty or whitespace-only body means "all defaults".
    ///
    /// # Errors
    ///
    /// Returns `BuildConfigError::InvalidJson` for malformed JSON or a body of
    /// the wrong shape.
    pub fn parse(body: &[u8]) -> Result<Self, BuildConfigError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        Ok(serde_json::from_slice(body)?)
    }
}

/// Validated configuration for one build run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    app_dir: String,
    out_name: String,
}

impl BuildConfig {
    /// Apply defaulting rules: missing, empty or blank fields take the default.
    ///
    /// # Errors
    ///
    /// Returns `BuildConfigError::InvalidValue` if a field contains control
    /// characters.
    pub fn from_request(
        request: BuildRequest,
        defaults: &BuildDefaults,
    ) -> Result<Self, BuildConfigError> {
        Ok(Self {
            app_dir: normalize("appDir", request.app_dir, &defaults.app_dir)?,
            out_name: normalize("outName", request.out_name, &defaults.out_name)?,
        })
    }

    #[must_use]
    pub fn app_dir(&self) -> &str {
        &self.app_dir
    }

    #[must_use]
    pub fn out_name(&self) -> &str {
        &self.out_name
    }

    /// Contents of the `KEY=VALUE` configuration file.
    #[must_use]
    pub fn render(&self) -> String {
        [
            "# Build config".to_string(),
            "# Generated by build-relay".to_string(),
            String::new(),
            format!("{APP_DIR_KEY}={}", self.app_dir),
            format!("{OUT_NAME_KEY}={}", self.out_name),
            String::new(),
        ]
        .join("\n")
    }

    /// Environment overlay handed to the build script.
    #[must_use]
    pub fn env_overlay(&self) -> EnvOverlay {
        EnvOverlay::from([
            (APP_DIR_KEY.to_string(), self.app_dir.clone()),
            (OUT_NAME_KEY.to_string(), self.out_name.clone()),
        ])
    }

    /// Overwrite the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `BuildConfigError::Write` if the file cannot be written.
    pub async fn write(&self, path: &Path) -> Result<(), BuildConfigError> {
        tokio::fs::write(path, self.render())
            .await
            .map_err(|source| BuildConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!(path = %path.display(), app_dir = %self.app_dir, out_name = %self.out_name, "Wrote build config");
        Ok(())
    }
}

fn normalize(
    field: &'static str,
    value: Option<String>,
    default: &str,
) -> Result<String, BuildConfigError> {
    let trimmed = value.as_deref().map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Ok(default.to_string());
    }
    if trimmed.chars().any(char::is_control) {
        return Err(BuildConfigError::InvalidValue { field });
    }
    Ok(trimmed.to_string())
}
