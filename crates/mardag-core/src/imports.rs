//! Import statements shared by both dialect readers.

use tree_sitter::Node;

use crate::ir::{DiagnosticKind, ImportItem, NotebookIR};
use crate::syntax::{code_children, text};

/// Import items of one import statement.
///
/// Relative imports are skipped. `from __future__` imports cannot be moved
/// into generated code and are dropped with a diagnostic.
pub fn read_import(node: Node<'_>, source: &str, ir: &mut NotebookIR) -> Vec<ImportItem> {
    match node.kind() {
        "import_statement" => {
            let mut cursor = node.walk();
            let items: Vec<ImportItem> = node
                .children_by_field_name("name", &mut cursor)
                .filter_map(|name| match name.kind() {
                    "dotted_name" => Some(ImportItem::module(text(name, source), None)),
                    "aliased_import" => {
                        let module = name.child_by_field_name("name")?;
                        let alias = name.child_by_field_name("alias")?;
                        Some(ImportItem::module(
                            text(module, source),
                            Some(text(alias, source).to_string()),
                        ))
                    }
                    _ => None,
                })
                .collect();
            items
        }
        "import_from_statement" => {
            let Some(module) = node.child_by_field_name("module_name") else {
                return Vec::new();
            };
            if module.kind() != "dotted_name" {
                return Vec::new();
            }

            let names = if code_children(node)
                .iter()
                .any(|n| n.kind() == "wildcard_import")
            {
                vec![("*".to_string(), None)]
            } else {
                let mut cursor = node.walk();
                let names: Vec<_> = node
                    .children_by_field_name("name", &mut cursor)
                    .filter_map(|name| imported_name(name, source))
                    .collect();
                names
            };
            vec![ImportItem::from(text(module, source), names)]
        }
        "future_import_statement" => {
            ir.note(
                DiagnosticKind::DroppedImport,
                "<module>",
                format!("`{}` must stay first in its module", text(node, source)),
            );
            Vec::new()
        }
        _ => Vec::new(),
    }
}

/// Whether `module` is `package` itself or one of its submodules.
pub fn is_within_package(module: &str, package: &str) -> bool {
    module == package
        || module
            .strip_prefix(package)
            .is_some_and(|rest| rest.starts_with('.'))
}

fn imported_name(name: Node<'_>, source: &str) -> Option<(String, Option<String>)> {
    match name.kind() {
        "dotted_name" => Some((text(name, source).to_string(), None)),
        "aliased_import" => Some((
            text(name.child_by_field_name("name")?, source).to_string(),
            Some(text(name.child_by_field_name("alias")?, source).to_string()),
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SyntaxTree;

    fn read(source: &str) -> (Vec<String>, NotebookIR) {
        let tree = SyntaxTree::parse(source).unwrap();
        let mut ir = NotebookIR::default();
        let mut items = Vec::new();
        for stmt in code_children(tree.root()) {
            items.extend(read_import(stmt, source, &mut ir));
        }
        (items.iter().map(|i| i.to_source()).collect(), ir)
    }

    #[test]
    fn test_plain_imports_split_per_name() {
        let (items, _) = read("import os, numpy as np\n");
        assert_eq!(items, vec!["import os", "import numpy as np"]);
    }

    #[test]
    fn test_from_imports() {
        let (items, _) = read("from a.b import c, d as e\nfrom x import *\nfrom . import y\n");
        assert_eq!(items, vec!["from a.b import c, d as e", "from x import *"]);
    }

    #[test]
    fn test_future_import_dropped_with_diagnostic() {
        let (items, ir) = read("from __future__ import annotations\n");
        assert!(items.is_empty());
        assert_eq!(ir.diagnostics[0].kind, DiagnosticKind::DroppedImport);
    }

    #[test]
    fn test_package_membership() {
        assert!(is_within_package("dagster", "dagster"));
        assert!(is_within_package("dagster._core.definitions", "dagster"));
        assert!(!is_within_package("dagster_duckdb", "dagster"));
        assert!(!is_within_package("marimo", "dagster"));
    }
}
