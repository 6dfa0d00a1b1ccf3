//! Per-platform resolution of the build script invocation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use super::{
    is_drive_absolute, to_subsystem_path, EnvOverlay, HostProbe, InvocationPlan, PathMode,
    ResolveError,
};
use crate::config::ShellConfig;

/// Interpreter token used when the subsystem layer is selected.
pub const SUBSYSTEM_PROGRAM: &str = "wsl";

/// Operating system family of the host running the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HostPlatform {
    Windows,
    MacOs,
    Linux,
    /// Any other POSIX-like system.
    Unix,
}

impl HostPlatform {
    /// Platform of the running process.
    #[must_use]
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` style identifier to a platform.
    #[must_use]
    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" | "win32" => Self::Windows,
            "macos" | "darwin" => Self::MacOs,
            "linux" => Self::Linux,
            _ => Self::Unix,
        }
    }

    #[must_use]
    pub fn is_windows(self) -> bool {
        matches!(self, Self::Windows)
    }

    /// Human-readable label for the host metadata probe.
    #[must_use]
    pub fn os_label(self) -> &'static str {
        match self {
            Self::Windows => "Windows",
            Self::MacOs => "macOS",
            Self::Linux | Self::Unix => "Linux/Unix",
        }
    }
}

/// Interpreter chosen on a Windows-class host.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Interpreter {
    Subsystem,
    Shell(PathBuf),
}

/// Decides how a build script is run on this host.
#[derive(Clone)]
pub struct ShellResolver {
    platform: HostPlatform,
    probe: Arc<dyn HostProbe>,
    config: ShellConfig,
}

impl std::fmt::Debug for ShellResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellResolver")
            .field("platform", &self.platform)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ShellResolver {
    #[must_use]
    pub fn new(platform: HostPlatform, probe: Arc<dyn HostProbe>, config: ShellConfig) -> Self {
        Self {
            platform,
            probe,
            config,
        }
    }

    #[must_use]
    pub fn platform(&self) -> HostPlatform {
        self.platform
    }

    /// Produce the invocation for `script`, taken relative to `root` unless
    /// it is already absolute.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::InterpreterNotFound` when a Windows-class host
    /// has no usable shell, and `ScriptNotFound`/`ScriptNotExecutable` when
    /// the script itself cannot be run.
    pub async fn resolve(
        &self,
        root: &Path,
        script: &Path,
        env: EnvOverlay,
    ) -> Result<InvocationPlan, ResolveError> {
        let host_script = script_location(root, script);

        if !self.platform.is_windows() {
            if !self.probe.is_file(&host_script) {
                return Err(ResolveError::ScriptNotFound(host_script));
            }
            if !self.probe.is_executable(&host_script) {
                return Err(ResolveError::ScriptNotExecutable(host_script));
            }
            return Ok(InvocationPlan::new(
                host_script,
                Vec::new(),
                root,
                env,
                PathMode::None,
            ));
        }

        let interpreter = self.find_interpreter().await?;
        if !self.probe.is_file(&host_script) {
            return Err(ResolveError::ScriptNotFound(host_script));
        }

        let plan = match interpreter {
            Interpreter::Subsystem => {
                let root_posix = to_subsystem_path(&root.to_string_lossy());
                let script_posix = to_subsystem_path(&host_script.to_string_lossy());
                let args = vec![
                    "--cd".to_string(),
                    root_posix,
                    "bash".to_string(),
                    script_posix,
                ];
                InvocationPlan::new(
                    SUBSYSTEM_PROGRAM,
                    args,
                    root,
                    with_wslenv(env),
                    PathMode::PosixSubsystem,
                )
            }
            Interpreter::Shell(shell) => InvocationPlan::new(
                shell,
                vec![host_script.display().to_string()],
                root,
                env,
                PathMode::None,
            ),
        };

        tracing::debug!(command = %plan.display_command(), "Resolved build invocation");
        Ok(plan)
    }

    /// Probe interpreters in priority order; the first hit wins.
    async fn find_interpreter(&self) -> Result<Interpreter, ResolveError> {
        if self
            .probe
            .subsystem_available(self.config.probe_timeout())
            .await
        {
            tracing::info!("Using Linux subsystem for builds");
            return Ok(Interpreter::Subsystem);
        }

        for location in &self.config.known_locations {
            if self.probe.is_file(location) {
                tracing::info!(shell = %location.display(), "Using installed shell");
                return Ok(Interpreter::Shell(location.clone()));
            }
        }

        if let Some(found) = self.probe.find_in_path(&self.config.fallback) {
            tracing::info!(shell = %found.display(), "Using shell from PATH");
            return Ok(Interpreter::Shell(found));
        }

        let mut searched = vec![SUBSYSTEM_PROGRAM.to_string()];
        searched.extend(
            self.config
                .known_locations
                .iter()
                .map(|p| p.display().to_string()),
        );
        searched.push(self.config.fallback.clone());
        Err(ResolveError::InterpreterNotFound { searched })
    }
}

/// Host path of the script. Drive-letter paths count as absolute on any
/// host so Windows-style configs resolve the same everywhere.
fn script_location(root: &Path, script: &Path) -> PathBuf {
    if script.is_absolute() || is_drive_absolute(&script.to_string_lossy()) {
        script.to_path_buf()
    } else {
        root.join(script)
    }
}

/// Forward overlay keys into the subsystem through `WSLENV`.
fn with_wslenv(mut env: EnvOverlay) -> EnvOverlay {
    if env.is_empty() {
        return env;
    }
    let mut entries: Vec<String> = std::env::var("WSLENV")
        .ok()
        .filter(|v| !v.is_empty())
        .into_iter()
        .collect();
    entries.extend(env.keys().map(|k| format!("{k}/u")));
    env.insert("WSLENV".to_string(), entries.join(":"));
    env
}
