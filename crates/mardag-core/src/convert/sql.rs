//! Embedded-query rewrite for SQL cells.
//!
//! `mo.sql(query, output=False)` only runs inside a notebook. The asset form
//! is `duckdb.sql(query).pl()`, which yields a polars frame.

use tree_sitter::Node;

use crate::error::Result;
use crate::ir::{CellType, ImportItem, NotebookIR};
use crate::manifest::ensure_dependency;
use crate::marimo::is_framework_call;
use crate::syntax::{Statement, SyntaxTree, code_children, text};

/// Engine module substituted for the notebook query call.
pub const ENGINE: &str = "duckdb";

/// Dataframe library the query result is converted to.
pub const DATAFRAME_LIBRARY: &str = "polars";

const QUERY_FUNCTION: &str = "sql";
const DROPPED_KEYWORD: &str = "output";

/// Rewrite every `mo.sql(...)` call in SQL cells and reclassify those
/// cells as CODE.
///
/// Returns the number of calls rewritten. A notebook without SQL cells is
/// left untouched.
pub fn rewrite_embedded_queries(ir: &mut NotebookIR) -> Result<usize> {
    if ir.count_of(CellType::Sql) == 0 {
        return Ok(0);
    }

    let mut rewritten = 0;
    for cell in ir.cells.iter_mut().filter(|c| c.cell_type == CellType::Sql) {
        let mut body = Vec::with_capacity(cell.body.len());
        for stmt in &cell.body {
            body.push(rewrite_statement(stmt, &mut rewritten)?);
        }
        cell.body = body;
        cell.cell_type = CellType::Code;
        tracing::debug!("Rewrote embedded queries in cell {}", cell.name);
    }

    if !ir.imports.iter().any(|i| i.is_plain_import_of(ENGINE)) {
        ir.imports.push(ImportItem::module(ENGINE, None));
    }
    ensure_dependency(&mut ir.metadata.dependencies, ENGINE);
    ensure_dependency(&mut ir.metadata.dependencies, DATAFRAME_LIBRARY);

    tracing::info!("Rewrote {} embedded queries for {}", rewritten, ENGINE);
    Ok(rewritten)
}

fn rewrite_statement(stmt: &Statement, count: &mut usize) -> Result<Statement> {
    if stmt.is_comment() {
        return Ok(stmt.clone());
    }

    let source = stmt.text();
    let tree = SyntaxTree::parse(source)?;
    let before = *count;
    let rendered = render(tree.root(), source, count);
    if *count == before {
        return Ok(stmt.clone());
    }
    Statement::parse(&rendered)
}

/// Re-emit `node`, copying the source between children verbatim.
fn render(node: Node<'_>, source: &str, count: &mut usize) -> String {
    if is_framework_call(node, source, QUERY_FUNCTION) {
        return engine_call(node, source, count);
    }
    if node.child_count() == 0 {
        return text(node, source).to_string();
    }

    let mut out = String::new();
    let mut last = node.start_byte();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        out.push_str(&source[last..child.start_byte()]);
        out.push_str(&render(child, source, count));
        last = child.end_byte();
    }
    out.push_str(&source[last..node.end_byte()]);
    out
}

/// `duckdb.sql(<arguments without output=>).pl()`
fn engine_call(call: Node<'_>, source: &str, count: &mut usize) -> String {
    *count += 1;
    let arguments: Vec<String> = call
        .child_by_field_name("arguments")
        .map(code_children)
        .unwrap_or_default()
        .into_iter()
        .filter(|arg| !is_dropped_keyword(*arg, source))
        .map(|arg| render(arg, source, count))
        .collect();
    format!("{ENGINE}.{QUERY_FUNCTION}({}).pl()", arguments.join(", "))
}

fn is_dropped_keyword(arg: Node<'_>, source: &str) -> bool {
    arg.kind() == "keyword_argument"
        && arg
            .child_by_field_name("name")
            .is_some_and(|name| text(name, source) == DROPPED_KEYWORD)
}
