//! Progress-bar noise removal for the human-readable build log.

use std::sync::LazyLock;

use regex::Regex;

/// Line shapes that carry no information once rendered in a log.
static NOISE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // 45.2%
        r"^\d+\.\d+%\s*$",
        // ####, ====, ----, OOOO
        r"^[#O=-]+\s*$",
        // 45, 45%, 45.2
        r"^\s*\d+(\.\d+)?%?\s*$",
        // curl/wget bar fragments: "##=>  -  O"
        r"^[\s#=\->O]+$",
        // curl bar with trailing percentage: "######   42.0%"
        r"^[#=>O-]+\s+\d+(\.\d+)?%$",
        // spinner frames
        r"^[|/\\⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏-]$",
    ]
    .into_iter()
    .filter_map(|pattern| match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(error = %e, pattern, "Failed to compile noise pattern");
            None
        }
    })
    .collect()
});

/// Whether a single (already trimmed) line is pure progress noise.
#[must_use]
pub fn is_noise_line(line: &str) -> bool {
    line.is_empty() || NOISE_PATTERNS.iter().any(|re| re.is_match(line))
}

/// Strip blank and progress-only lines from `text`.
///
/// Carriage returns count as line breaks so downloader redraw sequences are
/// filtered segment by segment. Retained lines keep their original order and
/// are joined with `\n`.
#[must_use]
pub fn filter_noise(text: &str) -> String {
    text.split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !is_noise_line(line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_chunk() {
        assert_eq!(
            filter_noise("45.2%\n\nBuilding app.c\n####\n"),
            "Building app.c"
        );
    }

    #[test]
    fn test_percentage_shapes() {
        for line in ["45.2%", "100%", "  7%  ", "12", "3.5"] {
            assert_eq!(filter_noise(line), "", "{line:?}");
        }
    }

    #[test]
    fn test_bar_shapes() {
        for line in ["####", "=====", "---", "OOO", "##=>  ", "#######    42.0%", "|", "⠋"] {
            assert_eq!(filter_noise(line), "", "{line:?}");
        }
    }

    #[test]
    fn test_carriage_return_redraws() {
        let chunk = "Downloading cosmocc\r##      12.0%\r####    40.5%\r########  100.0%\nDone\n";
        assert_eq!(filter_noise(chunk), "Downloading cosmocc\nDone");
    }

    #[test]
    fn test_content_preserved_in_order() {
        let chunk = "  cc -c a.c\n50%\ncc -c b.c\n\n\nlink\n";
        assert_eq!(filter_noise(chunk), "cc -c a.c\ncc -c b.c\nlink");
    }

    #[test]
    fn test_lines_mentioning_percent_kept() {
        assert_eq!(
            filter_noise("Downloaded 45% of cosmocc.zip"),
            "Downloaded 45% of cosmocc.zip"
        );
        assert_eq!(filter_noise("-o minirend"), "-o minirend");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(filter_noise(""), "");
        assert_eq!(filter_noise("\n\n  \r\n"), "");
    }
}
