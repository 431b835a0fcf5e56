//! String literal evaluation and quoting.

use tree_sitter::Node;

use super::tree::{code_children, text};

/// Value of a plain string literal, or of an implicit concatenation of them.
///
/// Formatted and bytes literals have no static value and yield `None`.
pub fn string_value(node: Node<'_>, source: &str) -> Option<String> {
    match node.kind() {
        "string" => literal_value(text(node, source)),
        "concatenated_string" => code_children(node)
            .into_iter()
            .map(|part| string_value(part, source))
            .collect(),
        _ => None,
    }
}

fn literal_value(literal: &str) -> Option<String> {
    let prefix_len = literal.find(['"', '\''])?;
    let prefix = literal[..prefix_len].to_ascii_lowercase();
    if prefix.contains(['f', 'b', 't']) {
        return None;
    }

    let rest = &literal[prefix_len..];
    let delimiter = if rest.starts_with("\"\"\"") || rest.starts_with("'''") {
        3
    } else {
        1
    };
    if rest.len() < delimiter * 2 {
        return None;
    }
    let body = &rest[delimiter..rest.len() - delimiter];

    if prefix.contains('r') {
        Some(body.to_string())
    } else {
        Some(unescape(body))
    }
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        match next {
            '\n' => {}
            '\\' | '\'' | '"' => out.push(next),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut digits = String::from(next);
                while digits.len() < 3 {
                    match chars.peek() {
                        Some(d @ '0'..='7') => {
                            digits.push(*d);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                push_code_point(&mut out, u32::from_str_radix(&digits, 8).ok(), &digits, "\\");
            }
            'x' | 'u' | 'U' => {
                let width = match next {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let mut digits = String::new();
                while digits.len() < width {
                    match chars.peek() {
                        Some(d) if d.is_ascii_hexdigit() => {
                            digits.push(*d);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                let value = if digits.len() == width {
                    u32::from_str_radix(&digits, 16).ok()
                } else {
                    None
                };
                push_code_point(&mut out, value, &digits, &format!("\\{next}"));
            }
            // unknown escapes (including \N{...}) keep their backslash
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}

fn push_code_point(out: &mut String, value: Option<u32>, digits: &str, lead: &str) {
    match value.and_then(char::from_u32) {
        Some(c) => out.push(c),
        None => {
            out.push_str(lead);
            out.push_str(digits);
        }
    }
}

/// Docstring of a module or block: the cleaned value of a leading string
/// expression statement, together with that statement.
pub fn docstring<'t>(body: Node<'t>, source: &str) -> Option<(String, Node<'t>)> {
    let first = code_children(body).into_iter().next()?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let children = code_children(first);
    let [literal] = children.as_slice() else {
        return None;
    };
    let value = string_value(*literal, source)?;
    Some((clean_docstring(&value), first))
}

/// Normalize docstring indentation the way Python's `inspect.cleandoc` does.
pub fn clean_docstring(raw: &str) -> String {
    let expanded = expand_tabs(raw);
    let lines: Vec<&str> = expanded.split('\n').collect();

    let margin = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<&str> = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            cleaned.push(line.trim_start());
        } else {
            let indent = line.len() - line.trim_start_matches(' ').len();
            cleaned.push(&line[indent.min(margin)..]);
        }
    }

    while cleaned.last().is_some_and(|line| line.trim().is_empty()) {
        cleaned.pop();
    }
    let leading = cleaned
        .iter()
        .take_while(|line| line.trim().is_empty())
        .count();

    cleaned[leading..].join("\n")
}

fn expand_tabs(raw: &str) -> String {
    if !raw.contains('\t') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut column = 0;
    for c in raw.chars() {
        match c {
            '\t' => {
                let pad = 8 - column % 8;
                out.extend(std::iter::repeat_n(' ', pad));
                column += pad;
            }
            '\n' => {
                out.push(c);
                column = 0;
            }
            _ => {
                out.push(c);
                column += 1;
            }
        }
    }
    out
}

/// Double-quoted Python literal for `value`.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Triple-quoted docstring literal; continuation lines get `indent`.
pub fn docstring_literal(doc: &str, indent: &str) -> String {
    let mut escaped = doc.replace('\\', "\\\\");
    if escaped.contains("\"\"\"") || escaped.ends_with('"') {
        escaped = escaped.replace('"', "\\\"");
    }

    let body: Vec<String> = escaped
        .split('\n')
        .enumerate()
        .map(|(i, line)| {
            if i == 0 || line.is_empty() {
                line.to_string()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect();

    format!("\"\"\"{}\"\"\"", body.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SyntaxTree;

    fn first_expression(source: &str) -> Option<String> {
        let tree = SyntaxTree::parse(source).unwrap();
        let stmt = code_children(tree.root())[0];
        string_value(code_children(stmt)[0], source)
    }

    #[test]
    fn test_string_value_forms() {
        assert_eq!(first_expression("'plain'\n").as_deref(), Some("plain"));
        assert_eq!(first_expression("\"a\\tb\"\n").as_deref(), Some("a\tb"));
        assert_eq!(first_expression("r'a\\tb'\n").as_deref(), Some("a\\tb"));
        assert_eq!(first_expression("'ab' \"cd\"\n").as_deref(), Some("abcd"));
        assert_eq!(first_expression("'\\x41\\u00e9'\n").as_deref(), Some("Aé"));
        assert_eq!(first_expression("f'{x}'\n"), None);
        assert_eq!(first_expression("b'raw'\n"), None);
        assert_eq!(first_expression("42\n"), None);
    }

    #[test]
    fn test_clean_docstring() {
        let raw = "Summary line.\n\n        Details indented.\n          More.\n    ";
        assert_eq!(
            clean_docstring(raw),
            "Summary line.\n\nDetails indented.\n  More."
        );
        assert_eq!(clean_docstring("\n    Only body.\n    "), "Only body.");
    }

    #[test]
    fn test_docstring_of_function_body() {
        let source = "def f():\n    \"\"\"Load the thing.\"\"\"\n    return 1\n";
        let tree = SyntaxTree::parse(source).unwrap();
        let func = code_children(tree.root())[0];
        let body = func.child_by_field_name("body").unwrap();
        let (doc, node) = docstring(body, source).unwrap();
        assert_eq!(doc, "Load the thing.");
        assert_eq!(node.kind(), "expression_statement");
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote("say \"hi\"\n"), "\"say \\\"hi\\\"\\n\"");
    }

    #[test]
    fn test_docstring_literal_indents_continuation() {
        assert_eq!(
            docstring_literal("First.\n\nSecond.", "    "),
            "\"\"\"First.\n\n    Second.\"\"\""
        );
        assert_eq!(docstring_literal("ends with \"", ""), "\"\"\"ends with \\\"\"\"\"");
    }
}
