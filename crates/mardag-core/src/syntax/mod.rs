//! Python syntax layer.
//!
//! Parsing is delegated to tree-sitter. On top of it this module provides
//! just what the dialect readers and writers need: node helpers, string
//! literal evaluation, decorator shapes, and [`Statement`], the text-based
//! statement representation stored in cell bodies.

mod decorator;
mod literal;
mod statement;
mod tree;

pub use decorator::{Definition, DecoratorShape};
pub use literal::{docstring, docstring_literal, quote, string_value};
pub use statement::{
    BodyStatement, Statement, StatementKind, block_statements,
    rewrite_terminal_return_as_assignment,
};
pub use tree::{
    SyntaxTree, code_children, descendants, is_attribute, normalize_newlines,
    positional_parameters, text, unwrap_parens,
};
