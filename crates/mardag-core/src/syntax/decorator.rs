//! Decorator shapes of top-level definitions.

use tree_sitter::Node;

use super::tree::{code_children, text};

/// Syntactic shape of a decorator expression.
#[derive(Debug, Clone)]
pub enum DecoratorShape<'t> {
    /// `@name`
    Name(String),
    /// `@root.attr`
    Attribute { root: String, attr: String },
    /// `@name(...)`
    CallName { name: String, arguments: Node<'t> },
    /// `@root.attr(...)`
    CallAttribute {
        root: String,
        attr: String,
        arguments: Node<'t>,
    },
    /// Anything else, e.g. `@a.b.c` or `@factory()()`.
    Other,
}

impl<'t> DecoratorShape<'t> {
    /// Classify the expression of a `decorator` node.
    pub fn of(decorator: Node<'t>, source: &str) -> Self {
        let Some(expr) = code_children(decorator).into_iter().next() else {
            return Self::Other;
        };
        match expr.kind() {
            "call" => {
                let (Some(function), Some(arguments)) = (
                    expr.child_by_field_name("function"),
                    expr.child_by_field_name("arguments"),
                ) else {
                    return Self::Other;
                };
                match Self::callee(function, source) {
                    Self::Name(name) => Self::CallName { name, arguments },
                    Self::Attribute { root, attr } => Self::CallAttribute {
                        root,
                        attr,
                        arguments,
                    },
                    _ => Self::Other,
                }
            }
            _ => Self::callee(expr, source),
        }
    }

    fn callee(expr: Node<'t>, source: &str) -> Self {
        match expr.kind() {
            "identifier" => Self::Name(text(expr, source).to_string()),
            "attribute" => {
                let (Some(object), Some(attr)) = (
                    expr.child_by_field_name("object"),
                    expr.child_by_field_name("attribute"),
                ) else {
                    return Self::Other;
                };
                if object.kind() != "identifier" {
                    return Self::Other;
                }
                Self::Attribute {
                    root: text(object, source).to_string(),
                    attr: text(attr, source).to_string(),
                }
            }
            _ => Self::Other,
        }
    }

    /// Whether this is `@root.attr` or `@root.attr(...)`.
    pub fn is_attribute(&self, root: &str, attr: &str) -> bool {
        match self {
            Self::Attribute { root: r, attr: a } | Self::CallAttribute { root: r, attr: a, .. } => {
                r == root && a == attr
            }
            _ => false,
        }
    }

    /// Argument list of the call forms.
    pub fn arguments(&self) -> Option<Node<'t>> {
        match self {
            Self::CallName { arguments, .. } | Self::CallAttribute { arguments, .. } => {
                Some(*arguments)
            }
            _ => None,
        }
    }
}

/// A top-level function or class definition with its decorators.
pub struct Definition<'t> {
    pub node: Node<'t>,
    pub decorators: Vec<DecoratorShape<'t>>,
}

impl<'t> Definition<'t> {
    /// Unwrap a module-level statement into a definition, if it is one.
    pub fn from_statement(statement: Node<'t>, source: &str) -> Option<Self> {
        match statement.kind() {
            "function_definition" | "class_definition" => Some(Self {
                node: statement,
                decorators: Vec::new(),
            }),
            "decorated_definition" => {
                let node = statement.child_by_field_name("definition")?;
                let decorators = code_children(statement)
                    .into_iter()
                    .filter(|n| n.kind() == "decorator")
                    .map(|n| DecoratorShape::of(n, source))
                    .collect();
                Some(Self { node, decorators })
            }
            _ => None,
        }
    }

    pub fn is_function(&self) -> bool {
        self.node.kind() == "function_definition"
    }

    pub fn is_class(&self) -> bool {
        self.node.kind() == "class_definition"
    }

    /// Declared name of the function or class.
    pub fn name<'s>(&self, source: &'s str) -> Option<&'s str> {
        self.node
            .child_by_field_name("name")
            .map(|n| text(n, source))
    }
}
