//! Stage vocabulary.

use serde::{Deserialize, Serialize};

/// Coarse build stage, in expected forward order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Checking,
    DownloadingToolchain,
    ExtractingToolchain,
    CloningDependencies,
    CompilingRuntime,
    CompilingShims,
    CompilingApplication,
    Linking,
    Packaging,
    Done,
    Error,
}

impl Stage {
    /// Every stage, in forward order with `Error` last.
    pub const ALL: [Self; 11] = [
        Self::Checking,
        Self::DownloadingToolchain,
        Self::ExtractingToolchain,
        Self::CloningDependencies,
        Self::CompilingRuntime,
        Self::CompilingShims,
        Self::CompilingApplication,
        Self::Linking,
        Self::Packaging,
        Self::Done,
        Self::Error,
    ];

    /// Display label for the progress indicator.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Checking => "Checking dependencies...",
            Self::DownloadingToolchain => "Downloading Cosmopolitan toolchain (~14MB)...",
            Self::ExtractingToolchain => "Extracting toolchain...",
            Self::CloningDependencies => "Cloning dependencies...",
            Self::CompilingRuntime => "Compiling QuickJS...",
            Self::CompilingShims => "Compiling sokol shims...",
            Self::CompilingApplication => "Compiling application...",
            Self::Linking => "Linking executable...",
            Self::Packaging => "Creating distribution package...",
            Self::Done => "Build complete!",
            Self::Error => "Build failed",
        }
    }

    /// Fill level of the progress bar, in percent.
    #[must_use]
    pub fn progress(self) -> u8 {
        match self {
            Self::Checking => 5,
            Self::DownloadingToolchain => 15,
            Self::ExtractingToolchain => 25,
            Self::CloningDependencies => 35,
            Self::CompilingRuntime => 45,
            Self::CompilingShims => 60,
            Self::CompilingApplication => 75,
            Self::Linking => 85,
            Self::Packaging => 95,
            Self::Done => 100,
            Self::Error => 0,
        }
    }

    /// Whether the stage has no meaningful percentage and should render
    /// as an animated indicator.
    #[must_use]
    pub fn is_indeterminate(self) -> bool {
        matches!(self, Self::DownloadingToolchain)
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    /// Snapshot suitable for sending to a client.
    #[must_use]
    pub fn info(self) -> StageInfo {
        StageInfo {
            stage: self,
            label: self.label(),
            progress: self.progress(),
            indeterminate: self.is_indeterminate(),
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Serializable description of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageInfo {
    pub stage: Stage,
    pub label: &'static str,
    pub progress: u8,
    pub indeterminate: bool,
}
