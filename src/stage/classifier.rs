//! Output chunk → stage classification.

use super::Stage;

/// Prefix build scripts use to announce a stage explicitly.
pub const STAGE_MARKER: &str = "[STAGE] ";

/// Explicit markers, checked in this order; the first present wins.
const MARKERS: &[(&str, Stage)] = &[
    ("Checking dependencies", Stage::Checking),
    ("Downloading cosmocc", Stage::DownloadingToolchain),
    ("Extracting", Stage::ExtractingToolchain),
    ("Cloning dependencies", Stage::CloningDependencies),
    ("Compiling QuickJS", Stage::CompilingRuntime),
    ("Compiling sokol", Stage::CompilingShims),
    ("Compiling application", Stage::CompilingApplication),
    ("Linking executable", Stage::Linking),
    ("Creating distribution", Stage::Packaging),
    ("Build complete", Stage::Done),
    ("Dependencies ready", Stage::Done),
    ("Build failed", Stage::Error),
];

/// Keyword rule over lowercased text.
struct Heuristic {
    /// Must also be present when set.
    subject: Option<&'static str>,
    /// Any one of these must be present.
    any: &'static [&'static str],
    stage: Stage,
}

const HEURISTICS: &[Heuristic] = &[
    Heuristic {
        subject: None,
        any: &["downloading cosmocc", "not found; downloading"],
        stage: Stage::DownloadingToolchain,
    },
    Heuristic {
        subject: None,
        any: &["extracting", "unzip", "expand-archive"],
        stage: Stage::ExtractingToolchain,
    },
    Heuristic {
        subject: None,
        any: &["cloning quickjs", "cloning lexbor", "git clone"],
        stage: Stage::CloningDependencies,
    },
    Heuristic {
        subject: Some("quickjs"),
        any: &["compiling", ".o:"],
        stage: Stage::CompilingRuntime,
    },
    Heuristic {
        subject: Some("sokol"),
        any: &["building", "compiling", ".o:"],
        stage: Stage::CompilingShims,
    },
    Heuristic {
        subject: None,
        any: &["running make", "building minirend"],
        stage: Stage::CompilingApplication,
    },
    Heuristic {
        subject: None,
        any: &["linking", "-o minirend", "apelink"],
        stage: Stage::Linking,
    },
    Heuristic {
        subject: None,
        any: &["creating app.zip", "embedding", "dist/"],
        stage: Stage::Packaging,
    },
    Heuristic {
        subject: None,
        any: &["build complete", "built single-file"],
        stage: Stage::Done,
    },
    Heuristic {
        subject: None,
        any: &["error:", "failed", "cannot find"],
        stage: Stage::Error,
    },
];

impl Heuristic {
    fn matches(&self, lower: &str) -> bool {
        self.subject.is_none_or(|s| lower.contains(s)) && self.any.iter().any(|k| lower.contains(k))
    }
}

/// Classify one raw output chunk.
///
/// Explicit `[STAGE]` markers take precedence over keyword heuristics.
/// Returns `None` when nothing recognisable is present; heuristic matches
/// are best-effort and only drive a progress indicator.
#[must_use]
pub fn classify(text: &str) -> Option<Stage> {
    classify_marker(text).or_else(|| classify_heuristic(text))
}

/// Match only explicit, case-sensitive `[STAGE] <phrase>` markers.
#[must_use]
pub fn classify_marker(text: &str) -> Option<Stage> {
    let announced: Vec<&str> = text
        .match_indices(STAGE_MARKER)
        .map(|(idx, _)| &text[idx + STAGE_MARKER.len()..])
        .collect();
    if announced.is_empty() {
        return None;
    }

    MARKERS
        .iter()
        .find(|(phrase, _)| announced.iter().any(|rest| rest.starts_with(phrase)))
        .map(|(_, stage)| *stage)
}

/// Case-insensitive keyword fallback.
#[must_use]
pub fn classify_heuristic(text: &str) -> Option<Stage> {
    let lower = text.to_lowercase();
    HEURISTICS
        .iter()
        .find(|rule| rule.matches(&lower))
        .map(|rule| rule.stage)
}
