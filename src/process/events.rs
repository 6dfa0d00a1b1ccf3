//! Events produced while supervising a build process.

use serde::{Deserialize, Serialize};

/// Which child output stream a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputChannel {
    Stdout,
    Stderr,
}

impl std::fmt::Display for OutputChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

/// One chunk of child output.
///
/// Chunks follow read boundaries, not line boundaries. `index` is the
/// arrival order across both channels of the same run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputEvent {
    pub channel: OutputChannel,
    pub text: String,
    pub index: u64,
}

/// How a supervised run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The process ran and exited with this code (`-1` if killed by a signal).
    Exited(i32),
    /// The process could not be spawned at all.
    StartFailed(String),
}

impl Completion {
    /// Exit code to report; start failures report `-1`.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Exited(code) => *code,
            Self::StartFailed(_) => -1,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Exited(0))
    }
}

/// Incremental event from a supervised process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    Output(OutputEvent),
    /// Always the last event of a run, delivered exactly once.
    Completed(Completion),
}

/// Live state of a supervised process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    Exited(i32),
    Failed(String),
}

/// Final outcome of a run, returned whole to non-streaming clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResult {
    pub ok: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// Set only when the process could not be started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BuildResult {
    /// Assemble the result from accumulated output and the completion status.
    #[must_use]
    pub fn new(completion: &Completion, stdout: String, stderr: String) -> Self {
        let error = match completion {
            Completion::StartFailed(message) => Some(message.clone()),
            Completion::Exited(_) => None,
        };
        Self {
            ok: completion.is_success(),
            exit_code: completion.exit_code(),
            stdout,
            stderr,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_exit_codes() {
        assert_eq!(Completion::Exited(0).exit_code(), 0);
        assert!(Completion::Exited(0).is_success());
        assert!(!Completion::Exited(2).is_success());
        assert_eq!(Completion::StartFailed("nope".into()).exit_code(), -1);
        assert!(!Completion::StartFailed("nope".into()).is_success());
    }

    #[test]
    fn test_build_result_serialization() {
        let result = BuildResult::new(&Completion::Exited(0), "ok\n".into(), String::new());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"ok": true, "exitCode": 0, "stdout": "ok\n", "stderr": ""})
        );
    }

    #[test]
    fn test_build_result_start_failure() {
        let result = BuildResult::new(
            &Completion::StartFailed("No such file".into()),
            String::new(),
            String::new(),
        );
        assert!(!result.ok);
        assert_eq!(result.exit_code, -1);
        assert_eq!(result.error.as_deref(), Some("No such file"));

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"error\":\"No such file\""));
    }

    #[test]
    fn test_channel_display() {
        assert_eq!(OutputChannel::Stdout.to_string(), "stdout");
        assert_eq!(
            serde_json::to_string(&OutputChannel::Stderr).unwrap(),
            "\"stderr\""
        );
    }
}
