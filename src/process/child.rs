//! Build process spawning and control.
//!
//! A `BuildProcess` wraps one child started from an `InvocationPlan`, with
//! both output streams piped and stdin closed.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, ChildStderr, ChildStdout, Command};

use crate::shell::InvocationPlan;

/// Default timeout for graceful process termination.
pub const DEFAULT_TERMINATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Error type for process spawning operations.
#[derive(thiserror::Error, Debug)]
pub enum SpawnError {
    /// The program was not found.
    #[error("Program not found: {0}")]
    NotFound(String),
    /// Permission denied when spawning.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpawnError {
    /// Create a `SpawnError` from an I/O error, classifying common cases.
    fn from_io(err: std::io::Error, program: &str) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(program.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(program.to_string()),
            _ => Self::Io(err),
        }
    }
}

/// Exit code reported for a status, `-1` when terminated by a signal.
#[must_use]
pub fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

/// A running build process.
#[derive(Debug)]
pub struct BuildProcess {
    child: Child,
}

impl BuildProcess {
    /// Spawn the process described by `plan`.
    ///
    /// The plan's environment overlay is merged over the inherited host
    /// environment. On Unix the child leads its own process group so the
    /// whole script tree can be signalled on cancellation.
    ///
    /// # Errors
    ///
    /// Returns `SpawnError` if the process fails to spawn.
    pub fn spawn(plan: &InvocationPlan) -> Result<Self, SpawnError> {
        let mut cmd = Command::new(plan.program());
        cmd.args(plan.args())
            .current_dir(plan.working_dir())
            .envs(plan.env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        let program = plan.program().display().to_string();
        let child = cmd
            .spawn()
            .map_err(|e| SpawnError::from_io(e, &program))?;

        Ok(Self { child })
    }

    /// Take ownership of the stdout handle.
    ///
    /// This can only be called once; subsequent calls return `None`.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Take ownership of the stderr handle.
    ///
    /// This can only be called once; subsequent calls return `None`.
    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }

    /// Get the process ID, if still running.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Wait for the process to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if waiting fails.
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Forcefully kill the process.
    ///
    /// # Errors
    ///
    /// Returns an error if the kill signal cannot be sent.
    pub async fn kill(&mut self) -> std::io::Result<()> {
        self.child.kill().await
    }

    /// Attempt graceful termination with a timeout.
    ///
    /// On Unix, sends SIGTERM to the process group first, then SIGKILL after
    /// the timeout. On other platforms, falls back to immediate kill.
    ///
    /// # Errors
    ///
    /// Returns an error if termination fails.
    pub async fn graceful_terminate(&mut self, timeout: Duration) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            self.graceful_terminate_unix(timeout).await
        }

        #[cfg(not(unix))]
        {
            let _ = timeout;
            self.kill().await
        }
    }

    #[cfg(unix)]
    async fn graceful_terminate_unix(&mut self, timeout: Duration) -> std::io::Result<()> {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let Some(pid) = self.id() else {
            // Process already exited
            return Ok(());
        };
        let group = Pid::from_raw(i32::try_from(pid).unwrap_or(i32::MAX));

        if let Err(e) = killpg(group, Signal::SIGTERM) {
            tracing::debug!(pid, error = %e, "SIGTERM to process group failed");
        }

        match tokio::time::timeout(timeout, self.child.wait()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                tracing::warn!(pid, "Build process ignored SIGTERM, killing");
                let _ = killpg(group, Signal::SIGKILL);
                self.child.kill().await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::shell::{EnvOverlay, PathMode};

    fn plan(program: &str, args: &[&str]) -> InvocationPlan {
        InvocationPlan::new(
            program,
            args.iter().map(|s| (*s).to_string()).collect(),
            std::env::temp_dir(),
            EnvOverlay::new(),
            PathMode::None,
        )
    }

    #[test]
    fn test_spawn_error_classification() {
        let err = SpawnError::from_io(
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            "bash",
        );
        assert!(matches!(err, SpawnError::NotFound(_)));
        assert_eq!(err.to_string(), "Program not found: bash");

        let err = SpawnError::from_io(
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            "build",
        );
        assert!(matches!(err, SpawnError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_spawn_missing_program() {
        let missing = PathBuf::from("/definitely/not/here/build");
        let err = BuildProcess::spawn(&plan(&missing.display().to_string(), &[])).unwrap_err();
        assert!(matches!(err, SpawnError::NotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_spawn_and_wait() {
        let mut process = BuildProcess::spawn(&plan("sh", &["-c", "exit 3"])).unwrap();
        assert!(process.id().is_some());

        let status = process.wait().await.unwrap();
        assert_eq!(exit_code(status), 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_take_stdout_once() {
        let mut process = BuildProcess::spawn(&plan("sh", &["-c", "echo hi"])).unwrap();
        assert!(process.take_stdout().is_some());
        assert!(process.take_stdout().is_none());
        assert!(process.take_stderr().is_some());
        process.wait().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_graceful_terminate_stops_sleep() {
        let mut process = BuildProcess::spawn(&plan("sh", &["-c", "sleep 30"])).unwrap();
        process
            .graceful_terminate(Duration::from_secs(2))
            .await
            .unwrap();
        let status = process.wait().await.unwrap();
        assert!(!status.success());
        assert_eq!(exit_code(status), -1);
    }
}
