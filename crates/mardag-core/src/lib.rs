//! Structural translator between marimo notebooks and dagster asset modules.
//!
//! Both dialects are Python modules whose functions are units of
//! computation; only the declarative scaffolding around them differs. Each
//! reader lowers its dialect into a shared [`NotebookIR`] and each writer
//! renders the IR back out.
//!
//! # Architecture
//!
//! ```text
//! notebook.py ──► parse_marimo ──┐                    ┌──► generate_dagster ──► assets.py
//!                                ├──► NotebookIR ──┬──┤
//! assets.py ───► parse_dagster ──┘        │        │  └──► generate_marimo ───► notebook.py
//!                                         ▼        ▼
//!                                   dependency   embedded-query
//!                                      swap        rewrite
//! ```
//!
//! Dependencies between cells are nominal: an input name matches another
//! cell's output name. Cell order is source order in both directions.

mod convert;
mod dagster;
mod error;
mod imports;
mod ir;
mod manifest;
mod marimo;
mod options;
mod syntax;

pub use convert::{
    DATAFRAME_LIBRARY, Dialect, ENGINE, convert, dagster_to_marimo, dagster_to_marimo_with,
    marimo_to_dagster, rewrite_embedded_queries,
};
pub use dagster::{NodeMarker, generate_dagster, parse_dagster};
pub use error::{Error, Result};
pub use ir::{
    CellNode, CellType, Diagnostic, DiagnosticKind, ImportItem, NotebookIR, ScriptMetadata,
    bare_name,
};
pub use manifest::{ensure_dependency, generate_manifest, parse_manifest, transform_dependencies};
pub use marimo::{generate_marimo, parse_marimo};
pub use options::{ConvertOptions, FALLBACK_MARIMO_VERSION};
pub use syntax::{Statement, StatementKind};
