//! Colored terminal output for the relay server.
//!
//! Run lifecycle lines are printed next to the tracing output so a user
//! watching the terminal sees each build start and finish.

use std::io::{self, Write};
use std::path::Path;

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::process::BuildResult;
use crate::stage::filter_noise;

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Maximum length of a command or output excerpt.
const DEFAULT_MAX_LEN: usize = 120;

/// Truncate a string to at most `max_len` characters, adding ellipsis if truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{kept}...")
    }
}

/// Last meaningful line of build output, skipping progress noise.
#[must_use]
pub fn last_output_line(output: &str) -> Option<String> {
    filter_noise(output)
        .lines()
        .last()
        .map(|line| truncate(line, DEFAULT_MAX_LEN))
}

/// Print the startup banner.
pub fn print_banner(address: &str, root: &Path, os_label: &str) {
    println!(
        "{} {} listening on {} (root={}, host={})",
        timestamp().dimmed(),
        "[RELAY]".blue().bold(),
        format!("http://{address}/").cyan(),
        root.display(),
        os_label.dimmed()
    );
    let _ = io::stdout().flush();
}

/// Print the start of a build or bootstrap run.
pub fn print_run_start(job: &str, run_id: &str, command: &str) {
    println!(
        "{} {} {} {} {}",
        timestamp().dimmed(),
        format!("[{}]", job.to_uppercase()).yellow().bold(),
        "started".cyan(),
        truncate(command, DEFAULT_MAX_LEN),
        format!("run={run_id}").dimmed()
    );
    let _ = io::stdout().flush();
}

/// Print the outcome of a run.
pub fn print_run_end(job: &str, run_id: &str, result: &BuildResult) {
    let ts = timestamp();
    let tag = format!("[{}]", job.to_uppercase());
    if result.ok {
        println!(
            "{} {} {} {}",
            ts.dimmed(),
            tag.green().bold(),
            "succeeded".green(),
            format!("run={run_id}").dimmed()
        );
    } else if let Some(error) = &result.error {
        println!(
            "{} {} {} {} {}",
            ts.dimmed(),
            tag.red().bold(),
            "could not start:".red(),
            truncate(error, DEFAULT_MAX_LEN),
            format!("run={run_id}").dimmed()
        );
    } else {
        println!(
            "{} {} {} {}",
            ts.dimmed(),
            tag.red().bold(),
            format!("failed (exit code {})", result.exit_code).red(),
            format!("run={run_id}").dimmed()
        );
        let excerpt = last_output_line(&result.stderr).or_else(|| last_output_line(&result.stdout));
        if let Some(line) = excerpt {
            println!("{} {} {}", ts.dimmed(), "[ERROR]".red().bold(), line.red());
        }
    }
    let _ = io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_exact_length() {
        assert_eq!(truncate("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_very_short_max() {
        assert_eq!(truncate("hello", 3), "...");
        assert_eq!(truncate("hello", 0), "...");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("ééééé", 4), "é...");
    }

    #[test]
    fn test_last_output_line_skips_noise() {
        let output = "cc -c app.c\nerror: undefined symbol main\n 45.2%\n####\n";
        assert_eq!(
            last_output_line(output).as_deref(),
            Some("error: undefined symbol main")
        );
    }

    #[test]
    fn test_last_output_line_empty() {
        assert_eq!(last_output_line(""), None);
        assert_eq!(last_output_line("\n\n50%\n"), None);
    }
}
