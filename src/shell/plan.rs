//! Resolved invocation of a build script.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Environment variables layered over the inherited host environment.
///
/// Keys present here win over the host's values; everything else is
/// inherited unchanged.
pub type EnvOverlay = BTreeMap<String, String>;

/// How host paths embedded in the invocation are expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathMode {
    /// Paths are passed through as host paths.
    #[default]
    None,
    /// Paths were rewritten to the subsystem mount convention.
    PosixSubsystem,
}

/// A fully resolved way to run one build script.
///
/// Produced once per request by the resolver and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationPlan {
    program: PathBuf,
    args: Vec<String>,
    working_dir: PathBuf,
    env: EnvOverlay,
    path_mode: PathMode,
}

impl InvocationPlan {
    /// Create a plan running `program` with `args` inside `working_dir`.
    #[must_use]
    pub fn new(
        program: impl Into<PathBuf>,
        args: Vec<String>,
        working_dir: impl Into<PathBuf>,
        env: EnvOverlay,
        path_mode: PathMode,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: working_dir.into(),
            env,
            path_mode,
        }
    }

    /// The interpreter (or the script itself on POSIX hosts).
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Environment overlay applied on top of the host environment.
    #[must_use]
    pub fn env(&self) -> &EnvOverlay {
        &self.env
    }

    #[must_use]
    pub fn path_mode(&self) -> PathMode {
        self.path_mode
    }

    /// Human-readable command line for logs.
    #[must_use]
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_command() {
        let plan = InvocationPlan::new(
            "wsl",
            vec!["bash".to_string(), "/mnt/c/proj/build".to_string()],
            "C:/proj",
            EnvOverlay::new(),
            PathMode::PosixSubsystem,
        );
        assert_eq!(plan.display_command(), "wsl bash /mnt/c/proj/build");
        assert_eq!(plan.path_mode(), PathMode::PosixSubsystem);
    }

    #[test]
    fn test_path_mode_serialization() {
        let json = serde_json::to_string(&PathMode::PosixSubsystem).unwrap();
        assert_eq!(json, "\"posix-subsystem\"");
        assert_eq!(PathMode::default(), PathMode::None);
    }
}
