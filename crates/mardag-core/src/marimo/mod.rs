//! marimo notebook dialect.
//!
//! A marimo notebook is a module of `@app.cell` functions. Each cell takes
//! the names it reads as parameters and returns the names it defines, so the
//! parameter and return lists are the dependency graph.

mod generator;
mod parser;

pub use generator::generate_marimo;
pub use parser::parse_marimo;

pub(crate) use parser::is_framework_call;

/// Module name of the framework, filtered out of notebook imports.
pub const FRAMEWORK_MODULE: &str = "marimo";

/// Conventional alias of the framework, injected into cells as a parameter.
pub const FRAMEWORK_PARAM: &str = "mo";

/// Attributes of `mo` that make a cell a UI cell.
const UI_ATTRIBUTES: &[&str] = &["ui", "accordion", "hstack", "vstack", "tabs", "icon"];
