//! Asset decorator recognition.

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use tree_sitter::Node;

use super::{ASSET, MULTI_ASSET, QUALIFIED_ROOTS, RESOURCE_BASES};
use crate::syntax::{DecoratorShape, code_children, string_value, text};

/// Which asset form a decorator declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeMarker {
    /// `@dg.asset`, one output named after the function.
    Asset,
    /// `@dg.multi_asset(outs={...})`, one output per `outs` key.
    MultiAsset,
}

/// Local names under which the framework is reachable, gathered while
/// walking the module.
#[derive(Debug, Clone)]
pub struct FrameworkAliases {
    /// Roots for qualified access such as `dg.asset`.
    pub roots: FxHashSet<String>,
    /// Bare names bound to the asset decorator.
    pub asset: FxHashSet<String>,
    /// Bare names bound to the multi-asset decorator.
    pub multi_asset: FxHashSet<String>,
    /// Bare names bound to a resource base class.
    pub resource_bases: FxHashSet<String>,
}

impl Default for FrameworkAliases {
    fn default() -> Self {
        Self {
            roots: QUALIFIED_ROOTS.iter().map(|r| r.to_string()).collect(),
            asset: FxHashSet::default(),
            multi_asset: FxHashSet::default(),
            resource_bases: FxHashSet::default(),
        }
    }
}

impl FrameworkAliases {
    /// Record one name of a `from dagster import ...` statement.
    ///
    /// Returns whether the name was one of the tracked framework symbols.
    pub fn record(&mut self, imported: &str, local: &str) -> bool {
        let set = match imported {
            ASSET => &mut self.asset,
            MULTI_ASSET => &mut self.multi_asset,
            name if RESOURCE_BASES.contains(&name) => &mut self.resource_bases,
            _ => return false,
        };
        set.insert(local.to_string());
        true
    }

    /// Whether `root.attr` is qualified access to a framework symbol.
    fn is_qualified(&self, root: &str, attr: &str, symbol: &str) -> bool {
        attr == symbol && self.roots.contains(root)
    }

    /// Whether a class base expression names a resource base class.
    pub fn is_resource_base(&self, base: Node<'_>, source: &str) -> bool {
        match base.kind() {
            "identifier" => self.resource_bases.contains(text(base, source)),
            "attribute" => {
                let object = base.child_by_field_name("object");
                let attr = base.child_by_field_name("attribute");
                match (object, attr) {
                    (Some(object), Some(attr)) if object.kind() == "identifier" => {
                        self.roots.contains(text(object, source))
                            && RESOURCE_BASES.contains(&text(attr, source))
                    }
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

/// Classify one decorator against the recorded aliases.
pub fn classify(shape: &DecoratorShape<'_>, aliases: &FrameworkAliases) -> Option<NodeMarker> {
    match shape {
        DecoratorShape::Name(name) if aliases.asset.contains(name) => Some(NodeMarker::Asset),
        DecoratorShape::CallName { name, .. } if aliases.asset.contains(name) => {
            Some(NodeMarker::Asset)
        }
        DecoratorShape::CallName { name, .. } if aliases.multi_asset.contains(name) => {
            Some(NodeMarker::MultiAsset)
        }
        DecoratorShape::Attribute { root, attr } | DecoratorShape::CallAttribute { root, attr, .. }
            if aliases.is_qualified(root, attr, ASSET) =>
        {
            Some(NodeMarker::Asset)
        }
        DecoratorShape::CallAttribute { root, attr, .. }
            if aliases.is_qualified(root, attr, MULTI_ASSET) =>
        {
            Some(NodeMarker::MultiAsset)
        }
        _ => None,
    }
}

/// The first decorator that marks an asset, if any.
pub fn find_marker<'a, 't>(
    decorators: &'a [DecoratorShape<'t>],
    aliases: &FrameworkAliases,
) -> Option<(NodeMarker, &'a DecoratorShape<'t>)> {
    decorators
        .iter()
        .find_map(|shape| classify(shape, aliases).map(|marker| (marker, shape)))
}

/// String-literal keyword arguments of a call, in source order.
pub fn string_kwargs(arguments: Node<'_>, source: &str) -> IndexMap<String, String> {
    code_children(arguments)
        .into_iter()
        .filter(|arg| arg.kind() == "keyword_argument")
        .filter_map(|arg| {
            let name = arg.child_by_field_name("name")?;
            let value = string_value(arg.child_by_field_name("value")?, source)?;
            Some((text(name, source).to_string(), value))
        })
        .collect()
}

/// Value of the keyword argument `name`.
pub fn keyword_value<'t>(arguments: Node<'t>, source: &str, name: &str) -> Option<Node<'t>> {
    code_children(arguments)
        .into_iter()
        .filter(|arg| arg.kind() == "keyword_argument")
        .find(|arg| {
            arg.child_by_field_name("name")
                .is_some_and(|n| text(n, source) == name)
        })
        .and_then(|arg| arg.child_by_field_name("value"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{Definition, SyntaxTree};

    fn markers(source: &str, aliases: &FrameworkAliases) -> Vec<Option<NodeMarker>> {
        let tree = SyntaxTree::parse(source).unwrap();
        let stmt = code_children(tree.root())[0];
        let def = Definition::from_statement(stmt, source).unwrap();
        def.decorators.iter().map(|d| classify(d, aliases)).collect()
    }

    #[test]
    fn test_qualified_forms() {
        let source = "@dg.asset\n@dagster.asset(group_name='g')\n@dg.multi_asset(outs={})\n@dg.multi_asset\n@other.asset\ndef f():\n    pass\n";
        assert_eq!(
            markers(source, &FrameworkAliases::default()),
            vec![
                Some(NodeMarker::Asset),
                Some(NodeMarker::Asset),
                Some(NodeMarker::MultiAsset),
                None,
                None
            ]
        );
    }

    #[test]
    fn test_bare_forms_need_recorded_alias() {
        let source = "@asset\n@my_asset()\n@multi_asset(outs={})\ndef f():\n    pass\n";
        assert_eq!(
            markers(source, &FrameworkAliases::default()),
            vec![None, None, None]
        );

        let mut aliases = FrameworkAliases::default();
        assert!(aliases.record("asset", "asset"));
        assert!(aliases.record("asset", "my_asset"));
        assert!(aliases.record("multi_asset", "multi_asset"));
        assert!(!aliases.record("Definitions", "Definitions"));
        assert_eq!(
            markers(source, &aliases),
            vec![
                Some(NodeMarker::Asset),
                Some(NodeMarker::Asset),
                Some(NodeMarker::MultiAsset)
            ]
        );
    }

    #[test]
    fn test_string_kwargs_skip_non_literals() {
        let source = "f(group_name='raw', deps=[a], description=\"Load.\", code=f'{x}')\n";
        let tree = SyntaxTree::parse(source).unwrap();
        let call = code_children(code_children(tree.root())[0])[0];
        let args = call.child_by_field_name("arguments").unwrap();

        let kwargs = string_kwargs(args, source);
        let pairs: Vec<(&str, &str)> = kwargs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(pairs, vec![("group_name", "raw"), ("description", "Load.")]);
        assert_eq!(keyword_value(args, source, "deps").unwrap().kind(), "list");
        assert!(keyword_value(args, source, "outs").is_none());
    }
}
