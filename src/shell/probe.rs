//! Host capability probes used by the resolver.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

/// Queries the resolver makes about the host.
///
/// The production implementation touches the real system; tests substitute
/// a fake so Windows-class resolution can be exercised on any host.
#[async_trait]
pub trait HostProbe: Send + Sync {
    /// Whether the Linux-compatible subsystem answers a status probe in time.
    async fn subsystem_available(&self, timeout: Duration) -> bool;

    /// Whether `path` names an existing regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Whether `path` is a file the current user may execute.
    fn is_executable(&self, path: &Path) -> bool;

    /// Resolve `name` against the executable search path.
    fn find_in_path(&self, name: &str) -> Option<PathBuf>;
}

/// Probe backed by the real operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

#[async_trait]
impl HostProbe for SystemProbe {
    async fn subsystem_available(&self, timeout: Duration) -> bool {
        let mut cmd = Command::new("wsl");
        cmd.arg("--status")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match tokio::time::timeout(timeout, cmd.status()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "Subsystem probe could not start");
                false
            }
            Err(_) => {
                tracing::debug!(timeout_ms = timeout.as_millis(), "Subsystem probe timed out");
                false
            }
        }
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    #[cfg(unix)]
    fn is_executable(&self, path: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;

        std::fs::metadata(path)
            .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    fn is_executable(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn find_in_path(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }
}
