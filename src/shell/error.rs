//! Shell resolution error types.

use std::path::PathBuf;

/// Errors that can occur while resolving how to run a build script.
#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    /// No usable shell or interpreter was located.
    #[error("No shell interpreter found (searched: {})", searched.join(", "))]
    InterpreterNotFound {
        /// Everything that was probed, in order.
        searched: Vec<String>,
    },

    /// The build script does not exist under the project root.
    #[error("Build script not found: {0}")]
    ScriptNotFound(PathBuf),

    /// The build script exists but cannot be executed directly.
    #[error("Build script is not executable: {0}")]
    ScriptNotExecutable(PathBuf),
}

impl ResolveError {
    /// Remediation hint shown to the user alongside the error.
    #[must_use]
    pub fn hint(&self) -> &'static str {
        match self {
            Self::InterpreterNotFound { .. } => {
                "Install WSL (wsl --install) or Git for Windows, or put bash on PATH"
            }
            Self::ScriptNotFound(_) => "Check the project root and the [scripts] configuration",
            Self::ScriptNotExecutable(_) => "Mark the script executable (chmod +x)",
        }
    }
}
