//! Inline script manifest codec (PEP 723).
//!
//! The manifest lives in comments, outside the syntax tree:
//!
//! ```text
//! # /// script
//! # requires-python = ">=3.12"
//! # dependencies = [
//! #     "polars",
//! # ]
//! # ///
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::ir::{ScriptMetadata, bare_name};
use crate::syntax::quote;

static BLOCK: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"(?m)^# /// script\s*\n((?:#[^\n]*\n)*?)# ///$"));

/// Fields read from the manifest table. Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ManifestTable {
    requires_python: Option<String>,
    #[serde(default)]
    dependencies: Vec<String>,
}

/// Read the first manifest block in `source`.
///
/// A source without a block yields default metadata.
pub fn parse_manifest(source: &str) -> Result<ScriptMetadata> {
    let block = BLOCK
        .as_ref()
        .map_err(|e| Error::Manifest(format!("block pattern: {e}")))?;
    let Some(captures) = block.captures(source) else {
        return Ok(ScriptMetadata::default());
    };
    let body = captures.get(1).map(|m| m.as_str()).unwrap_or_default();

    let toml_text: Vec<&str> = body
        .lines()
        .map(|line| {
            line.strip_prefix("# ")
                .or_else(|| line.strip_prefix('#'))
                .unwrap_or(line)
        })
        .collect();

    let table: ManifestTable =
        toml::from_str(&toml_text.join("\n")).map_err(|e| Error::Manifest(e.to_string()))?;

    Ok(ScriptMetadata {
        requires_python: table.requires_python,
        dependencies: table.dependencies,
    })
}

/// Render metadata as a manifest block, or nothing for empty metadata.
pub fn generate_manifest(metadata: &ScriptMetadata) -> String {
    if metadata.is_empty() {
        return String::new();
    }

    let mut lines = vec!["# /// script".to_string()];
    if let Some(requires) = &metadata.requires_python {
        lines.push(format!("# requires-python = {}", quote(requires)));
    }
    if !metadata.dependencies.is_empty() {
        lines.push("# dependencies = [".to_string());
        for dep in &metadata.dependencies {
            lines.push(format!("#     {},", quote(dep)));
        }
        lines.push("# ]".to_string());
    }
    lines.push("# ///".to_string());
    lines.join("\n") + "\n"
}

/// Swap the framework dependency `from` for `to`.
///
/// Specifiers whose bare name is `from` are removed; a bare `to` is
/// prepended unless some specifier already names it.
pub fn transform_dependencies(deps: &[String], from: &str, to: &str) -> Vec<String> {
    let mut result: Vec<String> = deps
        .iter()
        .filter(|dep| bare_name(dep) != from)
        .cloned()
        .collect();

    if !result.iter().any(|dep| bare_name(dep) == to) {
        result.insert(0, to.to_string());
    }
    result
}

/// Append `name` unless a specifier with that bare name exists.
pub fn ensure_dependency(deps: &mut Vec<String>, name: &str) {
    if !deps.iter().any(|dep| bare_name(dep) == name) {
        deps.push(name.to_string());
    }
}
