//! Writes dagster asset modules from the IR.

use super::{ASSET, ASSET_OUT, CANONICAL_ALIAS, FRAMEWORK_MODULE, MULTI_ASSET};
use crate::ir::{CellNode, CellType, NotebookIR};
use crate::manifest::generate_manifest;
use crate::syntax::{docstring_literal, quote};

const INDENT: &str = "    ";

/// Generate dagster asset module source.
///
/// Cells with more than one output use the multi-asset form. Cells that are
/// not CODE have no asset representation and are dropped.
pub fn generate_dagster(ir: &NotebookIR) -> String {
    let mut sections: Vec<String> = Vec::new();

    if let Some(doc) = &ir.module_docstring {
        sections.push(docstring_literal(doc, ""));
    }

    let manifest = generate_manifest(&ir.metadata);
    if !manifest.is_empty() {
        sections.push(manifest.trim_end_matches('\n').to_string());
    }

    let mut imports = vec![format!("import {FRAMEWORK_MODULE} as {CANONICAL_ALIAS}")];
    imports.extend(ir.imports.iter().map(|i| i.to_source()));
    sections.push(imports.join("\n"));

    let mut skipped = 0;
    for cell in &ir.cells {
        if cell.cell_type != CellType::Code {
            skipped += 1;
            continue;
        }
        if cell.is_fan_out() {
            sections.push(multi_asset_function(cell));
        } else {
            sections.push(asset_function(cell));
        }
    }
    if skipped > 0 {
        tracing::info!("Dropped {} non-code cells with no asset form", skipped);
    }

    sections.join("\n\n\n") + "\n"
}

fn asset_function(cell: &CellNode) -> String {
    let decorator = if cell.decorator_kwargs.is_empty() {
        format!("@{CANONICAL_ALIAS}.{ASSET}")
    } else {
        let kwargs: Vec<String> = cell
            .decorator_kwargs
            .iter()
            .map(|(key, value)| format!("{key}={}", quote(value)))
            .collect();
        format!("@{CANONICAL_ALIAS}.{ASSET}({})", kwargs.join(", "))
    };

    let returns = cell
        .return_type_annotation
        .as_ref()
        .map(|ann| format!(" -> {ann}"))
        .unwrap_or_default();

    let mut lines = vec![
        decorator,
        format!("def {}({}){returns}:", cell.name, cell.inputs.join(", ")),
    ];
    let signature_len = lines.len();
    push_docstring_and_body(&mut lines, cell);
    if let Some(output) = cell.outputs.first() {
        lines.push(format!("{INDENT}return {output}"));
    }
    if lines.len() == signature_len {
        lines.push(format!("{INDENT}pass"));
    }
    lines.join("\n")
}

fn multi_asset_function(cell: &CellNode) -> String {
    let mut lines = vec![
        format!("@{CANONICAL_ALIAS}.{MULTI_ASSET}("),
        format!("{INDENT}outs={{"),
    ];
    for output in &cell.outputs {
        lines.push(format!(
            "{INDENT}{INDENT}{}: {CANONICAL_ALIAS}.{ASSET_OUT}(),",
            quote(output)
        ));
    }
    lines.push(format!("{INDENT}}},"));
    for (key, value) in &cell.decorator_kwargs {
        lines.push(format!("{INDENT}{key}={},", quote(value)));
    }
    lines.push(")".to_string());

    lines.push(format!("def {}({}):", cell.name, cell.inputs.join(", ")));
    push_docstring_and_body(&mut lines, cell);
    lines.push(format!("{INDENT}return {}", cell.outputs.join(", ")));
    lines.join("\n")
}

fn push_docstring_and_body(lines: &mut Vec<String>, cell: &CellNode) {
    if let Some(doc) = &cell.docstring {
        lines.push(format!("{INDENT}{}", docstring_literal(doc, INDENT)));
    }
    lines.extend(cell.body.iter().map(|stmt| stmt.render(INDENT)));
}
