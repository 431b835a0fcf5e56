//! Conversion commands for the mardag CLI.

use std::fs;
use std::path::Path;

use anyhow::Context;
use mardag_core::{ConvertOptions, Dialect, convert};

use crate::marimo_version;

/// Execute the `to-dagster` command.
pub fn to_dagster(input: &str, output: &str) -> anyhow::Result<()> {
    run(input, output, Dialect::Marimo, Dialect::Dagster, ConvertOptions::default())
}

/// Execute the `to-marimo` command.
///
/// An explicit version wins over the installed marimo's.
pub fn to_marimo(input: &str, output: &str, generated_with: Option<String>) -> anyhow::Result<()> {
    let mut options = ConvertOptions::default();
    options.generated_with = generated_with.or_else(marimo_version::detect);
    run(input, output, Dialect::Dagster, Dialect::Marimo, options)
}

fn run(
    input: &str,
    output: &str,
    from: Dialect,
    to: Dialect,
    options: ConvertOptions,
) -> anyhow::Result<()> {
    let input_path = Path::new(input);
    if !input_path.exists() {
        anyhow::bail!("Input not found: {}", input);
    }

    let source = fs::read_to_string(input_path)
        .with_context(|| format!("Failed to read {}", input_path.display()))?;

    let converted = convert(&source, from, to, &options)?;

    fs::write(output, converted).with_context(|| format!("Failed to write {}", output))?;

    tracing::info!("Converted {} source to {}", from, to);
    println!("Converted {} -> {}", input, output);
    Ok(())
}
