//! Detection of the installed marimo version.

use std::path::Path;
use std::process::Command;

/// Version reported by the `marimo` executable on `PATH`, if any.
pub fn detect() -> Option<String> {
    let marimo = which::which("marimo").ok()?;
    let version = query_version(&marimo);
    match &version {
        Some(v) => tracing::debug!("Detected marimo {} at {}", v, marimo.display()),
        None => tracing::debug!("Could not read version from {}", marimo.display()),
    }
    version
}

fn query_version(marimo: &Path) -> Option<String> {
    let output = Command::new(marimo).arg("--version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    parse_version(&String::from_utf8_lossy(&output.stdout))
}

/// Last whitespace-separated token of the first line, e.g. `0.10.9` from
/// either `0.10.9` or `marimo 0.10.9`.
fn parse_version(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .next()?
        .split_whitespace()
        .last()
        .map(str::to_string)
}
