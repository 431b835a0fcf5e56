//! Reads dagster asset modules into the IR.

use rustc_hash::FxHashSet;
use tree_sitter::Node;

use super::decorator::{FrameworkAliases, NodeMarker, find_marker, keyword_value, string_kwargs};
use super::{CONTEXT_TYPE, FRAMEWORK_MODULE};
use crate::error::Result;
use crate::imports::{is_within_package, read_import};
use crate::ir::{CellNode, DiagnosticKind, ImportItem, NotebookIR};
use crate::manifest::parse_manifest;
use crate::syntax::{
    DecoratorShape, Definition, Statement, StatementKind, SyntaxTree, block_statements,
    code_children, docstring, normalize_newlines, positional_parameters,
    rewrite_terminal_return_as_assignment, string_value, text,
};

/// Module-level state of one parse.
struct ModuleReader<'s> {
    source: &'s str,
    aliases: FrameworkAliases,
    /// Names of classes deriving from a resource base.
    resource_types: Vec<String>,
    ir: NotebookIR,
}

/// Parse a dagster asset module.
///
/// Assets become CODE cells; resource classes only feed parameter
/// filtering; every other definition is ignored.
pub fn parse_dagster(source: &str) -> Result<NotebookIR> {
    let source = normalize_newlines(source);
    let source: &str = &source;

    let tree = SyntaxTree::parse(source)?;
    let root = tree.root();

    let mut reader = ModuleReader {
        source,
        aliases: FrameworkAliases::default(),
        resource_types: Vec::new(),
        ir: NotebookIR {
            metadata: parse_manifest(source)?,
            module_docstring: docstring(root, source).map(|(doc, _)| doc),
            ..NotebookIR::default()
        },
    };

    for statement in code_children(root) {
        match statement.kind() {
            "import_statement" | "import_from_statement" | "future_import_statement" => {
                reader.read_import(statement);
            }
            _ => {
                if let Some(definition) = Definition::from_statement(statement, source) {
                    reader.read_definition(&definition);
                }
            }
        }
    }

    tracing::debug!(
        assets = reader.ir.cells.len(),
        imports = reader.ir.imports.len(),
        resources = reader.resource_types.len(),
        "parsed dagster module"
    );
    Ok(reader.ir)
}

impl<'s> ModuleReader<'s> {
    fn read_import(&mut self, node: Node<'_>) {
        for import in read_import(node, self.source, &mut self.ir) {
            if !is_within_package(&import.module, FRAMEWORK_MODULE) {
                self.ir.add_import(import);
                continue;
            }
            let ImportItem { names, alias, .. } = import;
            match names {
                // dropped; the writer emits its own canonical alias
                None => {
                    if let Some(alias) = alias {
                        self.aliases.roots.insert(alias);
                    }
                }
                Some(names) => {
                    for (name, local) in names {
                        let local = local.as_deref().unwrap_or(&name);
                        if !self.aliases.record(&name, local) {
                            tracing::debug!("dropping framework import `{}`", name);
                        }
                    }
                }
            }
        }
    }

    fn read_definition(&mut self, definition: &Definition<'_>) {
        let Some(name) = definition.name(self.source) else {
            return;
        };

        if definition.is_class() {
            let derives_resource = definition
                .node
                .child_by_field_name("superclasses")
                .map(code_children)
                .unwrap_or_default()
                .into_iter()
                .any(|base| self.aliases.is_resource_base(base, self.source));
            if derives_resource {
                self.resource_types.push(name.to_string());
            }
            return;
        }

        match find_marker(&definition.decorators, &self.aliases) {
            Some((NodeMarker::Asset, shape)) => {
                let cell = self.read_asset(definition.node, name, shape);
                self.ir.cells.push(cell);
            }
            Some((NodeMarker::MultiAsset, shape)) => {
                let cell = self.read_multi_asset(definition.node, name, shape);
                self.ir.cells.push(cell);
            }
            None => tracing::debug!("ignoring non-asset function `{}`", name),
        }
    }

    fn is_framework_param(&self, annotation: Option<&str>) -> bool {
        annotation.is_some_and(|ann| {
            ann.contains(CONTEXT_TYPE)
                || self.resource_types.iter().any(|r| ann.contains(r.as_str()))
        })
    }

    /// Split parameters into data inputs and framework-injected names.
    fn split_parameters(&self, function: Node<'_>) -> (Vec<String>, Vec<String>) {
        let params = function
            .child_by_field_name("parameters")
            .map(|p| positional_parameters(p, self.source))
            .unwrap_or_default();

        let mut inputs = Vec::new();
        let mut injected = Vec::new();
        for param in params {
            if self.is_framework_param(param.annotation.as_deref()) {
                injected.push(param.name);
            } else {
                inputs.push(param.name);
            }
        }
        (inputs, injected)
    }

    /// Body statements without the docstring, plus the docstring.
    fn body(&self, function: Node<'_>) -> (Vec<Statement>, Option<String>) {
        let Some(block) = function.child_by_field_name("body") else {
            return (Vec::new(), None);
        };
        let doc = docstring(block, self.source);
        let doc_id = doc.as_ref().map(|(_, node)| node.id());

        let statements = block_statements(block, self.source)
            .into_iter()
            .filter(|s| Some(s.node.id()) != doc_id)
            .map(|s| s.statement)
            .collect();
        (statements, doc.map(|(value, _)| value))
    }

    fn read_asset(
        &mut self,
        function: Node<'_>,
        name: &str,
        marker: &DecoratorShape<'_>,
    ) -> CellNode {
        let (inputs, injected) = self.split_parameters(function);
        let kwargs = marker
            .arguments()
            .map(|args| string_kwargs(args, self.source))
            .unwrap_or_default();
        let (statements, doc) = self.body(function);
        let docstring = doc.or_else(|| kwargs.get("description").cloned());
        let return_type = function
            .child_by_field_name("return_type")
            .map(|t| text(t, self.source).to_string());

        let body = rewrite_terminal_return_as_assignment(&statements, name);
        let body = self.strip_framework_calls(body, &injected, name);

        CellNode::new(name, body, inputs, vec![name.to_string()])
            .with_docstring(docstring)
            .with_return_type(return_type)
            .with_decorator_kwargs(kwargs)
    }

    fn read_multi_asset(
        &mut self,
        function: Node<'_>,
        name: &str,
        marker: &DecoratorShape<'_>,
    ) -> CellNode {
        let (inputs, injected) = self.split_parameters(function);
        let arguments = marker.arguments();
        let kwargs = arguments
            .map(|args| string_kwargs(args, self.source))
            .unwrap_or_default();
        let outputs = arguments
            .and_then(|args| keyword_value(args, self.source, "outs"))
            .map(|outs| self.outs_keys(outs, name))
            .unwrap_or_default();

        let (mut statements, doc) = self.body(function);
        if let Some(last) = statements.iter().rposition(|s| !s.is_comment()) {
            if matches!(statements[last].kind(), StatementKind::Return { .. }) {
                statements.remove(last);
            }
        }
        let body = self.strip_framework_calls(statements, &injected, name);

        CellNode::new(name, body, inputs, outputs)
            .with_docstring(doc)
            .with_decorator_kwargs(kwargs)
    }

    /// String keys of a literal `outs` mapping, in order.
    fn outs_keys(&mut self, outs: Node<'_>, cell: &str) -> Vec<String> {
        if outs.kind() != "dictionary" {
            self.ir.note(
                DiagnosticKind::DynamicOutsKey,
                cell,
                format!("`outs={}` is not a literal mapping", text(outs, self.source)),
            );
            return Vec::new();
        }

        let mut keys = Vec::new();
        for entry in code_children(outs) {
            let key = (entry.kind() == "pair")
                .then(|| entry.child_by_field_name("key"))
                .flatten();
            match key.and_then(|k| string_value(k, self.source)) {
                Some(key) => keys.push(key),
                None => self.ir.note(
                    DiagnosticKind::DynamicOutsKey,
                    cell,
                    format!("skipping non-literal outs entry `{}`", text(entry, self.source)),
                ),
            }
        }
        keys
    }

    /// Drop bare or discarded calls rooted at an injected parameter.
    fn strip_framework_calls(
        &mut self,
        body: Vec<Statement>,
        injected: &[String],
        cell: &str,
    ) -> Vec<Statement> {
        if injected.is_empty() {
            return body;
        }
        let injected: FxHashSet<&str> = injected.iter().map(String::as_str).collect();

        let mut kept = Vec::with_capacity(body.len());
        for statement in body {
            match statement.effect_root() {
                Some(root) if injected.contains(root) => {
                    self.ir.note(
                        DiagnosticKind::StrippedCall,
                        cell,
                        format!("removed `{}`", statement.text()),
                    );
                }
                _ => kept.push(statement),
            }
        }
        kept
    }
}
