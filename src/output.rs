//! CLI output formatting for every command.
//!
//! # Output Format
//!
//! ## Generate
//!
//! ```text
//! My Cool App (cache my-cool-app-v1)
//!     manifest.json → dist/manifest.json
//!     sw.js → dist/sw.js
//!     index.html → dist/index.html
//!
//! Precache
//! 001 /
//! 002 /index.html
//!
//! Generated 3 files
//! ```
//!
//! ## Validate
//!
//! One `✖ <message>` line per problem on stderr, or the single success line
//! on stdout.
//!
//! ## Simulate
//!
//! ```text
//! Worker my-cool-app-v1
//!     Precached: 5 entries
//!
//! Requests (offline)
//! 001 /styles/main.css → cache 200 (1204 bytes)
//! 002 /deep/link → offline fallback 200 (512 bytes)
//! 003 data:text/plain,hi → passed through
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to the terminal. Format
//! functions are pure: no I/O, no side effects.

use crate::config::{DEFAULT_NAME, WorkerSettings};
use crate::manifest::or_default;
use crate::naming::cache_name;
use crate::simulate::SimulationReport;
use crate::types::AppConfig;
use crate::validate::{SUCCESS_MESSAGE, ValidationReport};
use crate::worker::ResponseSource;
use std::path::PathBuf;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

fn source_label(source: ResponseSource) -> &'static str {
    match source {
        ResponseSource::Network => "network",
        ResponseSource::Cache => "cache",
        ResponseSource::OfflineFallback => "offline fallback",
        ResponseSource::OfflinePlaceholder => "offline placeholder",
    }
}

// ============================================================================
// Generate
// ============================================================================

pub fn format_generate_output(
    app: &AppConfig,
    worker: &WorkerSettings,
    written: &[PathBuf],
) -> Vec<String> {
    let mut lines = vec![format!(
        "{} (cache {})",
        or_default(&app.name, DEFAULT_NAME),
        cache_name(&app.short_name, worker.cache_version)
    )];
    for path in written {
        let file = path.file_name().map(|f| f.to_string_lossy()).unwrap_or_default();
        lines.push(format!("{}{} → {}", indent(1), file, path.display()));
    }

    lines.push(String::new());
    lines.push("Precache".to_string());
    for (i, path) in worker.app_shell.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), path));
    }

    lines.push(String::new());
    lines.push(format!("Generated {}", plural(written.len(), "file", "files")));
    lines
}

pub fn print_generate_output(app: &AppConfig, worker: &WorkerSettings, written: &[PathBuf]) {
    for line in format_generate_output(app, worker, written) {
        println!("{}", line);
    }
}

// ============================================================================
// Validate
// ============================================================================

/// Failure lines, one per issue. Empty for a valid manifest.
pub fn format_validation_failures(report: &ValidationReport) -> Vec<String> {
    report.issues.iter().map(|issue| format!("✖ {issue}")).collect()
}

pub fn format_validation_success() -> String {
    format!("✓ {SUCCESS_MESSAGE}")
}

/// Print the report: failures to stderr, or the success line to stdout.
/// Returns whether the manifest passed.
pub fn print_validation_report(report: &ValidationReport) -> bool {
    if report.is_valid() {
        println!("{}", format_validation_success());
        return true;
    }
    for line in format_validation_failures(report) {
        eprintln!("{}", line);
    }
    false
}

// ============================================================================
// Simulate
// ============================================================================

pub fn format_simulation_report(report: &SimulationReport, offline: bool) -> Vec<String> {
    let mut lines = vec![
        format!("Worker {}", report.cache_name),
        format!(
            "{}Precached: {}",
            indent(1),
            plural(report.precached, "entry", "entries")
        ),
    ];
    if let Some(reason) = &report.precache_error {
        lines.push(format!("{}Precache failed: {}", indent(1), reason));
    }
    for name in &report.deleted {
        lines.push(format!("{}Deleted: {}", indent(1), name));
    }

    lines.push(String::new());
    lines.push(if offline {
        "Requests (offline)".to_string()
    } else {
        "Requests".to_string()
    });
    for (i, fetch) in report.fetches.iter().enumerate() {
        let outcome = match fetch.source {
            Some(source) => format!(
                "{} {} ({})",
                source_label(source),
                fetch.status,
                plural(fetch.bytes, "byte", "bytes")
            ),
            None => "passed through".to_string(),
        };
        let stored = if fetch.cached { ", stored" } else { "" };
        lines.push(format!(
            "{} {} → {}{}",
            format_index(i + 1),
            fetch.path,
            outcome,
            stored
        ));
    }
    lines
}

pub fn print_simulation_report(report: &SimulationReport, offline: bool) {
    for line in format_simulation_report(report, offline) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
