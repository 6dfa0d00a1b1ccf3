//! Display-side stage tracking across a build run.

use super::{classify, Stage};

/// Tracks the stage shown for a single build run.
///
/// The most recently classified stage wins, with one exception: once
/// `Error` is displayed only `Done` can replace it.
#[derive(Debug, Clone)]
pub struct StageTracker {
    current: Stage,
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StageTracker {
    /// Start a run in the `Checking` stage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Stage::Checking,
        }
    }

    #[must_use]
    pub fn current(&self) -> Stage {
        self.current
    }

    /// Classify `chunk` and apply the result.
    ///
    /// Returns the new stage if the displayed stage changed.
    pub fn observe(&mut self, chunk: &str) -> Option<Stage> {
        classify(chunk).and_then(|stage| self.apply(stage))
    }

    /// Apply a stage reported by the terminal completion status.
    pub fn finish(&mut self, success: bool) -> Option<Stage> {
        let stage = if success { Stage::Done } else { Stage::Error };
        self.apply(stage)
    }

    fn apply(&mut self, stage: Stage) -> Option<Stage> {
        if stage == self.current {
            return None;
        }
        if self.current == Stage::Error && stage != Stage::Done {
            return None;
        }
        tracing::debug!(from = ?self.current, to = ?stage, "Stage transition");
        self.current = stage;
        Some(stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_checking() {
        assert_eq!(StageTracker::new().current(), Stage::Checking);
    }

    #[test]
    fn test_transitions_report_changes_only() {
        let mut tracker = StageTracker::new();
        assert_eq!(tracker.observe("plain output"), None);
        assert_eq!(tracker.observe("[STAGE] Cloning dependencies"), Some(Stage::CloningDependencies));
        assert_eq!(tracker.observe("git clone lexbor"), None);
        assert_eq!(tracker.observe("[STAGE] Linking executable"), Some(Stage::Linking));
        assert_eq!(tracker.current(), Stage::Linking);
    }

    #[test]
    fn test_error_latches() {
        let mut tracker = StageTracker::new();
        assert_eq!(tracker.observe("foo.c:1: error: bad"), Some(Stage::Error));
        assert_eq!(tracker.observe("[STAGE] Linking executable"), None);
        assert_eq!(tracker.observe("Compiling quickjs"), None);
        assert_eq!(tracker.current(), Stage::Error);
    }

    #[test]
    fn test_done_overrides_error() {
        let mut tracker = StageTracker::new();
        tracker.observe("ld: cannot find crt1.o");
        assert_eq!(tracker.observe("[STAGE] Build complete"), Some(Stage::Done));
        assert_eq!(tracker.current(), Stage::Done);
    }

    #[test]
    fn test_finish() {
        let mut tracker = StageTracker::new();
        tracker.observe("[STAGE] Creating distribution");
        assert_eq!(tracker.finish(false), Some(Stage::Error));
        assert_eq!(tracker.finish(true), Some(Stage::Done));
        assert_eq!(tracker.finish(true), None);
    }
}
