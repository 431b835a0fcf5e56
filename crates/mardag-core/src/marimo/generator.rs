//! Writes marimo notebooks from the IR.
//!
//! A cell keeps its outputs but not its name. The reader names a cell after
//! its first output, so a multi-asset comes back under that output's name.

use super::{FRAMEWORK_MODULE, FRAMEWORK_PARAM};
use crate::ir::{CellNode, CellType, ImportItem, NotebookIR};
use crate::manifest::generate_manifest;
use crate::options::ConvertOptions;
use crate::syntax::{docstring_literal, quote};

const INDENT: &str = "    ";

/// Generate marimo notebook source.
///
/// Only CODE cells become executable cells; a cell docstring becomes a
/// hidden markdown cell placed just before its code cell.
pub fn generate_marimo(ir: &NotebookIR, options: &ConvertOptions) -> String {
    let mut sections: Vec<String> = Vec::new();

    if let Some(doc) = &ir.module_docstring {
        sections.push(docstring_literal(doc, ""));
    }

    let manifest = generate_manifest(&ir.metadata);
    if !manifest.is_empty() {
        sections.push(manifest.trim_end_matches('\n').to_string());
    }

    sections.push(format!("import {FRAMEWORK_MODULE}"));
    sections.push(format!(
        "__generated_with = {}\napp = {FRAMEWORK_MODULE}.App(width=\"medium\")",
        quote(options.marimo_version())
    ));
    sections.push(import_cell(&ir.imports));

    let mut skipped = 0;
    for cell in &ir.cells {
        if cell.cell_type != CellType::Code {
            skipped += 1;
            continue;
        }
        if let Some(doc) = &cell.docstring {
            sections.push(markdown_cell(doc));
        }
        sections.push(code_cell(cell));
    }
    if skipped > 0 {
        tracing::info!("Skipped {} non-code cells", skipped);
    }

    sections.push("if __name__ == \"__main__\":\n    app.run()".to_string());
    sections.join("\n\n\n") + "\n"
}

/// The cell that binds `mo` and every notebook import.
fn import_cell(imports: &[ImportItem]) -> String {
    let mut lines = vec![
        "@app.cell".to_string(),
        "def _():".to_string(),
        format!("{INDENT}import {FRAMEWORK_MODULE} as {FRAMEWORK_PARAM}"),
    ];

    let mut exported = vec![FRAMEWORK_PARAM.to_string()];
    for import in imports {
        lines.push(format!("{INDENT}{}", import.to_source()));
        for name in import.bound_names() {
            if !exported.contains(&name) {
                exported.push(name);
            }
        }
    }

    lines.push(format!("{INDENT}{}", return_tuple(&exported)));
    lines.join("\n")
}

fn markdown_cell(doc: &str) -> String {
    let escaped = doc.replace('\\', "\\\\").replace('"', "\\\"");
    let indented: Vec<String> = escaped
        .split('\n')
        .map(|line| {
            if line.trim().is_empty() {
                line.to_string()
            } else {
                format!("{INDENT}{line}")
            }
        })
        .collect();

    format!(
        "@app.cell(hide_code=True)\ndef _({FRAMEWORK_PARAM}):\n{INDENT}{FRAMEWORK_PARAM}.md(r\"\"\"\n{}\n{INDENT}\"\"\")\n{INDENT}return",
        indented.join("\n")
    )
}

fn code_cell(cell: &CellNode) -> String {
    let mut lines = vec![
        "@app.cell".to_string(),
        format!("def _({}):", cell.inputs.join(", ")),
    ];
    lines.extend(cell.body.iter().map(|stmt| stmt.render(INDENT)));
    lines.push(format!("{INDENT}{}", return_tuple(&cell.outputs)));
    lines.join("\n")
}

/// `return (a,)`, `return (a, b)`, or a bare `return`.
fn return_tuple(names: &[String]) -> String {
    match names {
        [] => "return".to_string(),
        [only] => format!("return ({only},)"),
        _ => format!("return ({})", names.join(", ")),
    }
}
