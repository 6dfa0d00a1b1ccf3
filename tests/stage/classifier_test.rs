//! Classifier and tracker behaviour over realistic build logs.

use build_relay::stage::{classify, filter_noise, Stage, StageTracker};

#[test]
fn test_marker_beats_conflicting_heuristic() {
    let chunk = "cloning quickjs into third_party\n[STAGE] Linking executable\nerror: nothing";
    assert_eq!(classify(chunk), Some(Stage::Linking));
}

#[test]
fn test_unclassified_output_yields_none() {
    assert_eq!(classify("just some compiler chatter"), None);
    assert_eq!(classify(""), None);
}

#[test]
fn test_full_build_log_progression() {
    let log = [
        "[STAGE] Checking dependencies",
        "cosmocc not found; downloading",
        "Extracting cosmocc.zip",
        "git clone https://github.com/bellard/quickjs",
        "compiling quickjs/quickjs.c",
        "[STAGE] Compiling sokol",
        "[STAGE] Compiling application",
        "apelink -o minirend.com",
        "Creating app.zip",
        "[STAGE] Build complete",
    ];

    let mut tracker = StageTracker::new();
    let seen: Vec<Stage> = log.iter().filter_map(|line| tracker.observe(line)).collect();

    assert_eq!(
        seen,
        vec![
            Stage::DownloadingToolchain,
            Stage::ExtractingToolchain,
            Stage::CloningDependencies,
            Stage::CompilingRuntime,
            Stage::CompilingShims,
            Stage::CompilingApplication,
            Stage::Linking,
            Stage::Packaging,
            Stage::Done,
        ]
    );

    let progress: Vec<u8> = seen.iter().map(|stage| stage.progress()).collect();
    assert!(progress.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(tracker.finish(true), None);
}

#[test]
fn test_failure_sticks_until_done() {
    let mut tracker = StageTracker::new();
    tracker.observe("[STAGE] Compiling application");
    assert_eq!(tracker.observe("app.c:3: error: expected ';'"), Some(Stage::Error));
    assert_eq!(tracker.observe("[STAGE] Linking executable"), None);
    assert_eq!(tracker.current(), Stage::Error);
    assert_eq!(tracker.finish(false), None);
}

#[test]
fn test_noise_filter_keeps_content() {
    assert_eq!(
        filter_noise("45.2%\n\nBuilding app.c\n####\n"),
        "Building app.c"
    );
    assert_eq!(
        filter_noise("  10%\r  20%\r 100%\nDone.\n"),
        "Done."
    );
}
