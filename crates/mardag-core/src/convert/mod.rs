//! Conversion pipelines between the two dialects.
//!
//! Every pipeline is parse, adjust the IR, generate. Nothing here touches
//! the filesystem or the environment.

mod sql;

pub use sql::{DATAFRAME_LIBRARY, ENGINE, rewrite_embedded_queries};

use std::fmt;

use crate::dagster::{self, generate_dagster, parse_dagster};
use crate::error::{Error, Result};
use crate::ir::{CellType, NotebookIR};
use crate::manifest::transform_dependencies;
use crate::marimo::{self, generate_marimo, parse_marimo};
use crate::options::ConvertOptions;

/// A source dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// marimo notebook.
    Marimo,
    /// dagster asset module.
    Dagster,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Marimo => f.write_str("marimo"),
            Dialect::Dagster => f.write_str("dagster"),
        }
    }
}

/// Convert a marimo notebook into a dagster asset module.
pub fn marimo_to_dagster(source: &str) -> Result<String> {
    let mut ir = parse_marimo(source)?;
    if ir.count_of(CellType::Sql) > 0 {
        rewrite_embedded_queries(&mut ir)?;
    }
    // after the rewrite, so a manifest it creates still names the framework
    swap_framework_dependency(&mut ir, marimo::FRAMEWORK_MODULE, dagster::FRAMEWORK_MODULE);
    log_summary(&ir, Dialect::Marimo);
    Ok(generate_dagster(&ir))
}

/// Convert a dagster asset module into a marimo notebook, stamped with the
/// fallback marimo version.
pub fn dagster_to_marimo(source: &str) -> Result<String> {
    dagster_to_marimo_with(source, &ConvertOptions::default())
}

/// Convert a dagster asset module into a marimo notebook.
pub fn dagster_to_marimo_with(source: &str, options: &ConvertOptions) -> Result<String> {
    let mut ir = parse_dagster(source)?;
    swap_framework_dependency(&mut ir, dagster::FRAMEWORK_MODULE, marimo::FRAMEWORK_MODULE);
    log_summary(&ir, Dialect::Dagster);
    Ok(generate_marimo(&ir, options))
}

/// Convert `source` from one dialect to the other.
pub fn convert(
    source: &str,
    from: Dialect,
    to: Dialect,
    options: &ConvertOptions,
) -> Result<String> {
    match (from, to) {
        (Dialect::Marimo, Dialect::Dagster) => marimo_to_dagster(source),
        (Dialect::Dagster, Dialect::Marimo) => dagster_to_marimo_with(source, options),
        _ => Err(Error::NotImplemented(format!("conversion from {from} to {to}"))),
    }
}

/// Swap the framework dependency, leaving an absent manifest absent.
fn swap_framework_dependency(ir: &mut NotebookIR, from: &str, to: &str) {
    if ir.metadata.is_empty() {
        return;
    }
    ir.metadata.dependencies = transform_dependencies(&ir.metadata.dependencies, from, to);
}

fn log_summary(ir: &NotebookIR, from: Dialect) {
    tracing::info!(
        "Read {} cells and {} imports from {} source ({} diagnostics)",
        ir.cells.len(),
        ir.imports.len(),
        from,
        ir.diagnostics.len()
    );
}
