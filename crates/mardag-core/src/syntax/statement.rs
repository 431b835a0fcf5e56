//! Function-body statements held as dedented source text.
//!
//! Statements are sliced out of the parsed source rather than re-printed, so
//! formatting and comments survive conversion. Lines that continue a
//! multi-line string literal are tracked separately and never re-indented,
//! which keeps string contents byte-for-byte intact.

use tree_sitter::Node;

use super::tree::{SyntaxTree, call_chain_root, code_children, descendants, is_identifier, text};
use crate::error::{Error, Result};

/// Coarse shape of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Import,
    ImportFrom,
    Return { has_value: bool },
    Assignment,
    Expression,
    Comment,
    Other,
}

/// One statement of a function body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Source text with the block indentation removed.
    text: String,
    kind: StatementKind,
    /// Zero-based line offsets that sit inside a multi-line string literal.
    literal_lines: Vec<usize>,
    /// Root name of a bare call or of a call assigned to `_`.
    effect_root: Option<String>,
}

impl Statement {
    /// Build a statement from a parsed statement node.
    pub fn from_node(node: Node<'_>, source: &str) -> Self {
        let start = node.start_position();

        let mut literal_lines = Vec::new();
        for string in descendants(node)
            .into_iter()
            .filter(|n| n.kind() == "string")
        {
            let (first, last) = (string.start_position().row, string.end_position().row);
            for row in first + 1..=last {
                literal_lines.push(row - start.row);
            }
        }
        literal_lines.sort_unstable();
        literal_lines.dedup();

        Self {
            text: dedent(text(node, source), start.column, &literal_lines),
            kind: classify(node),
            literal_lines,
            effect_root: effect_root(node, source).map(str::to_string),
        }
    }

    /// Parse standalone source text holding exactly one statement.
    pub fn parse(source: &str) -> Result<Self> {
        let tree = SyntaxTree::parse(source)?;
        let mut statements = block_statements(tree.root(), source);
        if statements.len() != 1 {
            return Err(Error::Syntax {
                line: 1,
                column: 1,
                message: format!("expected one statement, found {}", statements.len()),
            });
        }
        Ok(statements.remove(0).statement)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn is_comment(&self) -> bool {
        self.kind == StatementKind::Comment
    }

    /// Root name of the call this statement exists to perform, if any.
    ///
    /// `context.log.info(...)` and `_ = database.query(...)` both report
    /// their chain root; assignments to real names report nothing.
    pub fn effect_root(&self) -> Option<&str> {
        self.effect_root.as_deref()
    }

    /// Render with `indent` before every line not inside a string literal.
    pub fn render(&self, indent: &str) -> String {
        self.text
            .split('\n')
            .enumerate()
            .map(|(i, line)| {
                if self.literal_lines.contains(&i) || line.is_empty() {
                    line.to_string()
                } else {
                    format!("{indent}{line}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn append_trailing_comment(&mut self, comment: &str) {
        self.text.push_str("  ");
        self.text.push_str(comment);
    }

    /// Expression of a `return` statement, including any trailing comment.
    fn returned_value(&self) -> &str {
        self.text
            .strip_prefix("return")
            .unwrap_or(&self.text)
            .trim_start_matches([' ', '\t'])
    }

    /// Replace the leading `return` keyword with an assignment to `name`.
    fn into_assignment(self, name: &str) -> Self {
        let value = self.returned_value();
        Self {
            text: format!("{name} = {value}"),
            kind: StatementKind::Assignment,
            literal_lines: self.literal_lines,
            effect_root: None,
        }
    }
}

/// A statement paired with the node it was read from.
pub struct BodyStatement<'t> {
    pub node: Node<'t>,
    pub statement: Statement,
}

impl BodyStatement<'_> {
    pub fn is_comment(&self) -> bool {
        self.statement.is_comment()
    }
}

/// Statements of a block or module in source order.
///
/// A comment sharing a line with the statement before it is folded into that
/// statement. Comments indented less than the block belong to the enclosing
/// scope and are left out.
pub fn block_statements<'t>(block: Node<'t>, source: &str) -> Vec<BodyStatement<'t>> {
    let mut cursor = block.walk();
    let children: Vec<Node<'t>> = block.named_children(&mut cursor).collect();

    let block_column = children
        .iter()
        .filter(|n| n.kind() != "comment")
        .map(|n| n.start_position().column)
        .min()
        .unwrap_or(0);

    let mut out: Vec<BodyStatement<'t>> = Vec::with_capacity(children.len());
    for child in children {
        if child.kind() == "comment" {
            if let Some(previous) = out.last_mut() {
                if previous.node.end_position().row == child.start_position().row {
                    previous.statement.append_trailing_comment(text(child, source));
                    continue;
                }
            }
            if child.start_position().column < block_column {
                continue;
            }
        }
        out.push(BodyStatement {
            node: child,
            statement: Statement::from_node(child, source),
        });
    }
    out
}

/// Rewrite a terminal `return <expr>` as `name = <expr>`.
///
/// A terminal bare `return` is dropped, and so is `return <name>`, which
/// would only assign the name to itself. Comments after the last code
/// statement are kept in place. The input is not modified.
pub fn rewrite_terminal_return_as_assignment(
    statements: &[Statement],
    name: &str,
) -> Vec<Statement> {
    let mut out = statements.to_vec();
    let Some(last) = out.iter().rposition(|s| !s.is_comment()) else {
        return out;
    };

    match out[last].kind {
        StatementKind::Return { has_value: true } if out[last].returned_value() == name => {
            out.remove(last);
        }
        StatementKind::Return { has_value: true } => {
            let terminal = out.remove(last);
            out.insert(last, terminal.into_assignment(name));
        }
        StatementKind::Return { has_value: false } => {
            out.remove(last);
        }
        _ => {}
    }
    out
}

fn classify(node: Node<'_>) -> StatementKind {
    match node.kind() {
        "import_statement" => StatementKind::Import,
        "import_from_statement" | "future_import_statement" => StatementKind::ImportFrom,
        "return_statement" => StatementKind::Return {
            has_value: !code_children(node).is_empty(),
        },
        "comment" => StatementKind::Comment,
        "expression_statement" => match code_children(node).first().map(|n| n.kind()) {
            Some("assignment" | "augmented_assignment") => StatementKind::Assignment,
            _ => StatementKind::Expression,
        },
        _ => StatementKind::Other,
    }
}

fn effect_root<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    if node.kind() != "expression_statement" {
        return None;
    }
    let children = code_children(node);
    let call = match children.as_slice() {
        [expr] if expr.kind() == "call" => *expr,
        [expr] if expr.kind() == "assignment" => {
            let left = expr.child_by_field_name("left")?;
            let right = expr.child_by_field_name("right")?;
            if !is_identifier(left, source, "_") || right.kind() != "call" {
                return None;
            }
            right
        }
        _ => return None,
    };
    call_chain_root(call.child_by_field_name("function")?, source)
}

fn dedent(raw: &str, column: usize, literal_lines: &[usize]) -> String {
    raw.split('\n')
        .enumerate()
        .map(|(i, line)| {
            if i == 0 || literal_lines.contains(&i) {
                line
            } else {
                let indent = line.len() - line.trim_start_matches([' ', '\t']).len();
                &line[indent.min(column)..]
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function_body(source: &str) -> Vec<Statement> {
        let tree = SyntaxTree::parse(source).unwrap();
        let func = code_children(tree.root())[0];
        let block = func.child_by_field_name("body").unwrap();
        block_statements(block, source)
            .into_iter()
            .map(|b| b.statement)
            .collect()
    }

    #[test]
    fn test_statements_are_dedented() {
        let body = function_body(
            "def f():\n    if x:\n        y = 1\n    total = sum(\n        [1, 2],\n    )\n",
        );
        assert_eq!(body.len(), 2);
        assert_eq!(body[0].text(), "if x:\n    y = 1");
        assert_eq!(body[0].kind(), StatementKind::Other);
        assert_eq!(body[1].text(), "total = sum(\n    [1, 2],\n)");
        assert_eq!(body[1].kind(), StatementKind::Assignment);
    }

    #[test]
    fn test_multiline_string_lines_untouched() {
        let source = "def f():\n    q = \"\"\"\n  SELECT 1\n        FROM t\n    \"\"\"\n";
        let body = function_body(source);
        assert_eq!(body[0].text(), "q = \"\"\"\n  SELECT 1\n        FROM t\n    \"\"\"");
        assert_eq!(
            body[0].render("        "),
            "        q = \"\"\"\n  SELECT 1\n        FROM t\n    \"\"\""
        );
    }

    #[test]
    fn test_trailing_comment_folds_into_statement() {
        let body = function_body("def f():\n    x = 1  # why\n    # standalone\n    return x\n");
        assert_eq!(body.len(), 3);
        assert_eq!(body[0].text(), "x = 1  # why");
        assert!(body[1].is_comment());
        assert_eq!(body[2].kind(), StatementKind::Return { has_value: true });
    }

    #[test]
    fn test_effect_roots() {
        let body = function_body(
            "def f(context, db):\n    context.log.info('hi')\n    _ = db.query('x')\n    rows = db.query('y')\n",
        );
        assert_eq!(body[0].effect_root(), Some("context"));
        assert_eq!(body[1].effect_root(), Some("db"));
        assert_eq!(body[2].effect_root(), None);
    }

    #[test]
    fn test_rewrite_terminal_return() {
        let body = function_body("def f():\n    df = load()\n    return df.dropna()\n");
        let rewritten = rewrite_terminal_return_as_assignment(&body, "clean");
        assert_eq!(rewritten[1].text(), "clean = df.dropna()");
        assert_eq!(rewritten[1].kind(), StatementKind::Assignment);
        // the input sequence is left as it was
        assert_eq!(body[1].text(), "return df.dropna()");
    }

    #[test]
    fn test_rewrite_drops_bare_return() {
        let body = function_body("def f():\n    work()\n    return\n");
        let rewritten = rewrite_terminal_return_as_assignment(&body, "f");
        assert_eq!(rewritten.len(), 1);
        assert_eq!(rewritten[0].text(), "work()");
    }

    #[test]
    fn test_rewrite_drops_return_of_own_name() {
        let body = function_body("def f():\n    raw = load()\n    return raw\n");
        let rewritten = rewrite_terminal_return_as_assignment(&body, "raw");
        assert_eq!(rewritten.len(), 1);
        assert_eq!(rewritten[0].text(), "raw = load()");

        // another name is still assigned
        let rewritten = rewrite_terminal_return_as_assignment(&body, "clean");
        assert_eq!(rewritten[1].text(), "clean = raw");
    }

    #[test]
    fn test_parse_single_statement() {
        let stmt = Statement::parse("x = duckdb.sql(q).pl()").unwrap();
        assert_eq!(stmt.kind(), StatementKind::Assignment);
        assert!(Statement::parse("a = 1\nb = 2\n").is_err());
    }
}
