//! Python syntax trees backed by tree-sitter.

use std::borrow::Cow;

use tree_sitter::{Node, Parser, Tree};

use crate::error::{Error, Result};

/// A parsed Python module with no syntax errors.
pub struct SyntaxTree {
    tree: Tree,
}

impl SyntaxTree {
    /// Parse Python source, rejecting any input with error or missing nodes.
    pub fn parse(source: &str) -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| Error::Grammar(e.to_string()))?;

        let tree = parser.parse(source, None).ok_or_else(|| Error::Syntax {
            line: 1,
            column: 1,
            message: "parser produced no tree".to_string(),
        })?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(syntax_error(root, source));
        }

        Ok(Self { tree })
    }

    /// The `module` node.
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }
}

/// Locate the first error or missing node and describe it.
fn syntax_error(root: Node<'_>, source: &str) -> Error {
    let offending = descendants(root)
        .into_iter()
        .find(|n| n.is_error() || n.is_missing())
        .unwrap_or(root);

    let position = offending.start_position();
    let message = if offending.is_missing() {
        format!("missing `{}`", offending.kind())
    } else {
        let snippet: String = text(offending, source)
            .lines()
            .next()
            .unwrap_or_default()
            .chars()
            .take(40)
            .collect();
        format!("invalid syntax near `{}`", snippet.trim())
    };

    Error::Syntax {
        line: position.row + 1,
        column: position.column + 1,
        message,
    }
}

/// Convert CRLF line endings so row arithmetic sees one terminator.
pub fn normalize_newlines(source: &str) -> Cow<'_, str> {
    if source.contains('\r') {
        Cow::Owned(source.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(source)
    }
}

/// Source text covered by a node.
pub fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    &source[node.byte_range()]
}

/// Named children, skipping comments.
pub fn code_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// All nodes under `node` (inclusive) in pre-order.
pub fn descendants(node: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        out.push(current);
        let mut cursor = current.walk();
        let children: Vec<Node<'_>> = current.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    out
}

/// Whether `node` is the identifier `name`.
pub fn is_identifier(node: Node<'_>, source: &str, name: &str) -> bool {
    node.kind() == "identifier" && text(node, source) == name
}

/// Whether `node` is the attribute access `root.attr`.
pub fn is_attribute(node: Node<'_>, source: &str, root: &str, attr: &str) -> bool {
    node.kind() == "attribute"
        && node
            .child_by_field_name("object")
            .is_some_and(|object| is_identifier(object, source, root))
        && node
            .child_by_field_name("attribute")
            .is_some_and(|a| text(a, source) == attr)
}

/// Strip any number of redundant parentheses around an expression.
pub fn unwrap_parens(mut node: Node<'_>) -> Node<'_> {
    while node.kind() == "parenthesized_expression" {
        match code_children(node).as_slice() {
            [inner] => node = *inner,
            _ => break,
        }
    }
    node
}

/// Base name of an attribute chain such as `context.log.info`.
///
/// Returns `None` when the chain passes through anything other than
/// attribute access, e.g. `make()[0].method`.
pub fn call_chain_root<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    match node.kind() {
        "identifier" => Some(text(node, source)),
        "attribute" => call_chain_root(node.child_by_field_name("object")?, source),
        _ => None,
    }
}

/// A function parameter that can be bound positionally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub annotation: Option<String>,
}

/// Parameters before any `*`, `*args` or `**kwargs` marker.
pub fn positional_parameters(parameters: Node<'_>, source: &str) -> Vec<Parameter> {
    let mut out = Vec::new();
    for param in code_children(parameters) {
        let (name, annotation) = match param.kind() {
            "identifier" => (Some(param), None),
            "typed_parameter" => (
                code_children(param)
                    .into_iter()
                    .next()
                    .filter(|n| n.kind() == "identifier"),
                param.child_by_field_name("type"),
            ),
            "default_parameter" => (param.child_by_field_name("name"), None),
            "typed_default_parameter" => (
                param.child_by_field_name("name"),
                param.child_by_field_name("type"),
            ),
            "positional_separator" => continue,
            _ => break,
        };

        match name {
            Some(name) if name.kind() == "identifier" => out.push(Parameter {
                name: text(name, source).to_string(),
                annotation: annotation.map(|a| text(a, source).to_string()),
            }),
            // splat inside an annotation, e.g. `*args: int`
            _ => break,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_function(tree: &SyntaxTree) -> Node<'_> {
        code_children(tree.root())
            .into_iter()
            .find(|n| n.kind() == "function_definition")
            .unwrap()
    }

    #[test]
    fn test_parse_valid_module() {
        let tree = SyntaxTree::parse("x = 1\n").unwrap();
        assert_eq!(tree.root().kind(), "module");
    }

    #[test]
    fn test_parse_reports_position() {
        let err = SyntaxTree::parse("x = 1\ndef broken(:\n    pass\n").err().unwrap();
        match err {
            Error::Syntax { line, .. } => assert_eq!(line, 2),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_positional_parameters() {
        let source = "def f(a, b: int, c=1, d: str = 'x', *rest, e, **kw):\n    pass\n";
        let tree = SyntaxTree::parse(source).unwrap();
        let params = first_function(&tree).child_by_field_name("parameters").unwrap();

        let parsed = positional_parameters(params, source);
        let names: Vec<_> = parsed.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
        assert_eq!(parsed[1].annotation.as_deref(), Some("int"));
        assert_eq!(parsed[3].annotation.as_deref(), Some("str"));
    }

    #[test]
    fn test_keyword_only_marker_stops_collection() {
        let source = "def f(a, *, b):\n    pass\n";
        let tree = SyntaxTree::parse(source).unwrap();
        let params = first_function(&tree).child_by_field_name("parameters").unwrap();
        let names: Vec<_> = positional_parameters(params, source)
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["a"]);
    }

    #[test]
    fn test_call_chain_root() {
        let source = "context.log.info('x')\nmake()[0].method()\n";
        let tree = SyntaxTree::parse(source).unwrap();
        let roots: Vec<_> = code_children(tree.root())
            .into_iter()
            .map(|stmt| {
                let call = code_children(stmt)[0];
                call_chain_root(call.child_by_field_name("function").unwrap(), source)
            })
            .collect();
        assert_eq!(roots, vec![Some("context"), None]);
    }

    #[test]
    fn test_normalize_newlines() {
        assert_eq!(normalize_newlines("a\r\nb\r\n"), "a\nb\n");
        assert!(matches!(normalize_newlines("a\nb"), Cow::Borrowed(_)));
    }
}
