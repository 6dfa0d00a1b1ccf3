//! Configuration types.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default port for the configurator server.
pub const DEFAULT_PORT: u16 = 4173;

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Project root containing the build scripts.
    pub project_root: PathBuf,
    /// Directory with the configurator UI, relative to the project root.
    pub public_dir: PathBuf,
    /// Generated build configuration file, relative to the project root.
    pub config_file: PathBuf,
    /// Whether to send permissive CORS headers.
    pub cors_permissive: bool,
    pub scripts: ScriptsConfig,
    pub shell: ShellConfig,
    pub defaults: BuildDefaults,
    /// Files whose presence makes up the status probe.
    pub prerequisites: Vec<Prerequisite>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            project_root: PathBuf::from("."),
            public_dir: PathBuf::from("configurator"),
            config_file: PathBuf::from("build.config"),
            cors_permissive: true,
            scripts: ScriptsConfig::default(),
            shell: ShellConfig::default(),
            defaults: BuildDefaults::default(),
            prerequisites: Prerequisite::defaults(),
        }
    }
}

impl ServerConfig {
    /// Get the configured address as a string.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Absolute-or-relative path of the UI directory.
    #[must_use]
    pub fn public_path(&self) -> PathBuf {
        self.project_root.join(&self.public_dir)
    }

    /// Path of the generated build configuration file.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.project_root.join(&self.config_file)
    }
}

/// Build scripts, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    /// Script run by `POST /api/build`.
    pub build: PathBuf,
    /// Script run by `POST /api/bootstrap`.
    pub bootstrap: PathBuf,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            build: PathBuf::from("scripts/build_with_config"),
            bootstrap: PathBuf::from("scripts/bootstrap_deps"),
        }
    }
}

/// Interpreter discovery settings for Windows-class hosts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Timeout for the subsystem status probe, in milliseconds.
    pub probe_timeout_ms: u64,
    /// Installed shells checked in order after the subsystem.
    pub known_locations: Vec<PathBuf>,
    /// Executable looked up on PATH as a last resort.
    pub fallback: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 3000,
            known_locations: vec![
                PathBuf::from(r"C:\Program Files\Git\bin\bash.exe"),
                PathBuf::from(r"C:\Program Files (x86)\Git\bin\bash.exe"),
                PathBuf::from(r"C:\Windows\System32\bash.exe"),
            ],
            fallback: "bash".to_string(),
        }
    }
}

impl ShellConfig {
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// Values used when a build request leaves a field empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildDefaults {
    pub app_dir: String,
    pub out_name: String,
}

impl Default for BuildDefaults {
    fn default() -> Self {
        Self {
            app_dir: "app".to_string(),
            out_name: "minirend".to_string(),
        }
    }
}

/// One named entry of the status probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prerequisite {
    /// Key reported in the status response.
    pub name: String,
    /// Satisfied when any of these paths exists under the project root.
    pub paths: Vec<PathBuf>,
    /// Whether the entry counts towards `ready`.
    #[serde(default = "default_required")]
    pub required: bool,
}

const fn default_required() -> bool {
    true
}

impl Prerequisite {
    fn new(name: &str, paths: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            paths: paths.iter().map(PathBuf::from).collect(),
            required: true,
        }
    }

    /// Toolchain, runtime sources, shim sources and platform glue.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(
                "toolchain",
                &[
                    "third_party/cosmocc/bin/cosmocc",
                    "third_party/cosmocc/bin/cosmocc.exe",
                ],
            ),
            Self::new("runtime", &["third_party/quickjs/quickjs.c"]),
            Self::new("shims", &["third_party/sokol/sokol_app.h"]),
            Self::new("platform", &["src/platform/sokol_cosmo.c"]),
        ]
    }

    /// Whether any of the listed paths exists under `root`.
    #[must_use]
    pub fn is_present(&self, root: &Path) -> bool {
        self.paths.iter().any(|p| root.join(p).exists())
    }
}
