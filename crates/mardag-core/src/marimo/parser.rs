//! Reads marimo notebooks into the IR.

use tree_sitter::Node;

use super::{FRAMEWORK_MODULE, FRAMEWORK_PARAM, UI_ATTRIBUTES};
use crate::error::Result;
use crate::imports::{is_within_package, read_import};
use crate::ir::{CellNode, CellType, DiagnosticKind, NotebookIR};
use crate::manifest::parse_manifest;
use crate::syntax::{
    BodyStatement, Definition, SyntaxTree, block_statements, code_children, descendants, docstring,
    is_attribute, normalize_newlines, positional_parameters, text, unwrap_parens,
};

/// Parse a marimo notebook.
///
/// Cells whose body is only imports are folded into the notebook imports and
/// produce no cell. Unnamed cells are called `cell_<n>`, where `n` counts the
/// cells emitted so far.
pub fn parse_marimo(source: &str) -> Result<NotebookIR> {
    let source = normalize_newlines(source);
    let source: &str = &source;

    let tree = SyntaxTree::parse(source)?;
    let root = tree.root();

    let mut ir = NotebookIR {
        metadata: parse_manifest(source)?,
        module_docstring: docstring(root, source).map(|(doc, _)| doc),
        ..NotebookIR::default()
    };

    for statement in code_children(root) {
        let Some(definition) = Definition::from_statement(statement, source) else {
            continue;
        };
        if !definition.is_function()
            || !definition
                .decorators
                .iter()
                .any(|d| d.is_attribute("app", "cell"))
        {
            continue;
        }
        read_cell(definition.node, source, &mut ir);
    }

    tracing::debug!(
        cells = ir.cells.len(),
        imports = ir.imports.len(),
        "parsed marimo notebook"
    );
    Ok(ir)
}

fn read_cell(function: Node<'_>, source: &str, ir: &mut NotebookIR) {
    let inputs: Vec<String> = function
        .child_by_field_name("parameters")
        .map(|params| positional_parameters(params, source))
        .unwrap_or_default()
        .into_iter()
        .map(|p| p.name)
        .filter(|name| name != FRAMEWORK_PARAM)
        .collect();

    let mut body = function
        .child_by_field_name("body")
        .map(|block| block_statements(block, source))
        .unwrap_or_default();

    let mut outputs = Vec::new();
    let mut dropped = Vec::new();
    if let Some(last) = body.iter().rposition(|s| !s.is_comment()) {
        if body[last].node.kind() == "return_statement" {
            outputs = return_outputs(body[last].node, source, &mut dropped);
            body.remove(last);
        }
    }

    let code: Vec<Node<'_>> = body
        .iter()
        .filter(|s| !s.is_comment())
        .map(|s| s.node)
        .collect();
    let cell_type = classify(&code, &outputs, source);

    if cell_type == CellType::ImportOnly {
        for node in code {
            collect_imports(node, source, ir);
        }
        return;
    }

    let name = outputs
        .iter()
        .find(|o| !o.starts_with('_'))
        .cloned()
        .unwrap_or_else(|| format!("cell_{}", ir.cells.len()));
    for (kind, message) in dropped {
        ir.note(kind, &name, message);
    }

    let statements = body.into_iter().map(|s: BodyStatement<'_>| s.statement).collect();
    ir.cells
        .push(CellNode::new(name, statements, inputs, outputs).with_cell_type(cell_type));
}

/// Names returned by a cell's trailing return.
fn return_outputs(
    ret: Node<'_>,
    source: &str,
    dropped: &mut Vec<(DiagnosticKind, String)>,
) -> Vec<String> {
    let Some(value) = code_children(ret).into_iter().next() else {
        return Vec::new();
    };
    let value = unwrap_parens(value);

    match value.kind() {
        "identifier" => vec![text(value, source).to_string()],
        "tuple" | "expression_list" => {
            let mut names = Vec::new();
            for element in code_children(value) {
                let element = unwrap_parens(element);
                if element.kind() == "identifier" {
                    names.push(text(element, source).to_string());
                } else {
                    dropped.push((
                        DiagnosticKind::DroppedOutput,
                        format!("returned element `{}` is not a name", text(element, source)),
                    ));
                }
            }
            names
        }
        _ => {
            dropped.push((
                DiagnosticKind::UnsupportedReturn,
                format!("return of `{}` names no outputs", text(value, source)),
            ));
            Vec::new()
        }
    }
}

fn classify(code: &[Node<'_>], outputs: &[String], source: &str) -> CellType {
    if code.is_empty() {
        return CellType::Code;
    }
    if code.iter().all(|n| is_import(*n)) {
        return CellType::ImportOnly;
    }

    if let [only] = code {
        let expr = (only.kind() == "expression_statement")
            .then(|| code_children(*only))
            .and_then(|children| match children.as_slice() {
                [expr] => Some(*expr),
                _ => None,
            });
        if outputs.is_empty() {
            if let Some(expr) = expr {
                if expr.kind() == "identifier" {
                    return CellType::DisplayOnly;
                }
                if is_framework_call(expr, source, "md") {
                    return CellType::Markdown;
                }
            }
        }
    }

    let nodes: Vec<Node<'_>> = code.iter().flat_map(|n| descendants(*n)).collect();
    if nodes.iter().any(|n| is_framework_call(*n, source, "sql")) {
        return CellType::Sql;
    }
    if outputs.is_empty()
        && nodes.iter().any(|n| {
            UI_ATTRIBUTES
                .iter()
                .any(|attr| is_attribute(*n, source, FRAMEWORK_PARAM, attr))
        })
    {
        return CellType::Ui;
    }
    CellType::Code
}

fn is_import(node: Node<'_>) -> bool {
    matches!(
        node.kind(),
        "import_statement" | "import_from_statement" | "future_import_statement"
    )
}

/// Whether `node` is a call of `mo.<function>(...)`.
pub(crate) fn is_framework_call(node: Node<'_>, source: &str, function: &str) -> bool {
    node.kind() == "call"
        && node
            .child_by_field_name("function")
            .is_some_and(|f| is_attribute(f, source, FRAMEWORK_PARAM, function))
}

fn collect_imports(node: Node<'_>, source: &str, ir: &mut NotebookIR) {
    for import in read_import(node, source, ir) {
        if !is_within_package(&import.module, FRAMEWORK_MODULE) {
            ir.add_import(import);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> NotebookIR {
        parse_marimo(source).unwrap()
    }

    const NOTEBOOK: &str = r##""""Sales dashboard."""

import marimo

__generated_with = "0.10.0"
app = marimo.App(width="medium")


@app.cell
def _():
    import marimo as mo
    import polars as pl
    from pathlib import Path
    return mo, pl, Path


@app.cell
def _(pl):
    raw = pl.read_csv("sales.csv")
    return (raw,)


@app.cell
def _(mo):
    mo.md("# Sales")
    return


@app.cell
def _(raw):
    summary = raw.describe()
    total = raw["amount"].sum()
    return summary, total


@app.cell
def _(summary):
    summary
    return


if __name__ == "__main__":
    app.run()
"##;

    #[test]
    fn test_parse_notebook_structure() {
        let ir = parse(NOTEBOOK);
        assert_eq!(ir.module_docstring.as_deref(), Some("Sales dashboard."));
        assert_eq!(ir.cell_names(), vec!["raw", "cell_1", "summary", "cell_3"]);

        let imports: Vec<String> = ir.imports.iter().map(|i| i.to_source()).collect();
        assert_eq!(imports, vec!["import polars as pl", "from pathlib import Path"]);
    }

    #[test]
    fn test_cell_types() {
        let ir = parse(NOTEBOOK);
        let types: Vec<CellType> = ir.cells.iter().map(|c| c.cell_type).collect();
        assert_eq!(
            types,
            vec![
                CellType::Code,
                CellType::Markdown,
                CellType::Code,
                CellType::DisplayOnly
            ]
        );
    }

    #[test]
    fn test_markdown_heading_kept_verbatim() {
        let ir = parse(NOTEBOOK);
        let markdown = &ir.cells[1];
        assert_eq!(markdown.body.len(), 1);
        assert_eq!(markdown.body[0].text(), "mo.md(\"# Sales\")");
    }

    #[test]
    fn test_inputs_and_outputs() {
        let ir = parse(NOTEBOOK);
        let summary = &ir.cells[2];
        assert_eq!(summary.inputs, vec!["raw"]);
        assert_eq!(summary.outputs, vec!["summary", "total"]);
        assert_eq!(summary.body.len(), 2);
        // markdown cell takes only the framework parameter
        assert!(ir.cells[1].inputs.is_empty());
    }

    #[test]
    fn test_cell_call_form_and_async() {
        let source = "@app.cell(hide_code=True)\nasync def _():\n    x = 1\n    return (x,)\n";
        let ir = parse(source);
        assert_eq!(ir.cell_names(), vec!["x"]);
    }

    #[test]
    fn test_non_name_tuple_elements_dropped() {
        let source = "@app.cell\ndef _():\n    a = 1\n    return (a, 1 + 2, b.c)\n";
        let ir = parse(source);
        assert_eq!(ir.cells[0].outputs, vec!["a"]);
        assert_eq!(ir.diagnostics.len(), 2);
        assert!(ir
            .diagnostics
            .iter()
            .all(|d| d.kind == DiagnosticKind::DroppedOutput));
    }

    #[test]
    fn test_literal_return_yields_no_outputs() {
        let source = "@app.cell\ndef _():\n    work()\n    return 42\n";
        let ir = parse(source);
        assert!(ir.cells[0].outputs.is_empty());
        assert_eq!(ir.cells[0].name, "cell_0");
        assert_eq!(ir.diagnostics[0].kind, DiagnosticKind::UnsupportedReturn);
    }

    #[test]
    fn test_underscore_outputs_get_synthetic_name() {
        let source = "@app.cell\ndef _():\n    _tmp = 1\n    return (_tmp,)\n";
        let ir = parse(source);
        assert_eq!(ir.cells[0].name, "cell_0");
        assert_eq!(ir.cells[0].outputs, vec!["_tmp"]);
    }

    #[test]
    fn test_cell_index_skips_import_cells() {
        let source = "@app.cell\ndef _():\n    import os\n    return (os,)\n\n\n@app.cell\ndef _():\n    print('hi')\n    return\n";
        let ir = parse(source);
        assert_eq!(ir.cell_names(), vec!["cell_0"]);
    }

    #[test]
    fn test_sql_and_ui_cells() {
        let source = r#"@app.cell
def _(mo):
    result = mo.sql(f"SELECT 1", output=False)
    return (result,)


@app.cell
def _(mo):
    slider = mo.ui.slider(1, 10)
    slider
    return


@app.cell
def _(mo):
    mo.hstack([1, 2])
    return
"#;
        let ir = parse(source);
        let types: Vec<CellType> = ir.cells.iter().map(|c| c.cell_type).collect();
        assert_eq!(types, vec![CellType::Sql, CellType::Ui, CellType::Ui]);
    }

    #[test]
    fn test_empty_cell_is_code() {
        let ir = parse("@app.cell\ndef _():\n    return\n");
        assert_eq!(ir.cells[0].cell_type, CellType::Code);
        assert!(ir.cells[0].body.is_empty());
    }

    #[test]
    fn test_undecorated_functions_ignored() {
        let ir = parse("def helper():\n    return 1\n\n\n@other.cell\ndef _():\n    return\n");
        assert!(ir.cells.is_empty());
    }

    #[test]
    fn test_framework_and_relative_imports_filtered() {
        let source = "@app.cell\ndef _():\n    import marimo as mo\n    from marimo._utils import x\n    from . import sibling\n    import numpy as np\n    return (mo, np)\n";
        let ir = parse(source);
        assert!(ir.cells.is_empty());
        let imports: Vec<String> = ir.imports.iter().map(|i| i.to_source()).collect();
        assert_eq!(imports, vec!["import numpy as np"]);
    }

    #[test]
    fn test_syntax_error_aborts() {
        assert!(parse_marimo("@app.cell\ndef _(:\n    return\n").is_err());
    }
}
