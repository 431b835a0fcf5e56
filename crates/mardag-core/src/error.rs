//! Error types for mardag-core.

use thiserror::Error;

/// Result type for mardag-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mardag-core.
#[derive(Debug, Error)]
pub enum Error {
    /// Source text is not valid Python.
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// Inline script manifest could not be decoded.
    #[error("invalid script manifest: {0}")]
    Manifest(String),

    /// Conversion direction that does not exist.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// The Python grammar could not be loaded into the parser.
    #[error("grammar error: {0}")]
    Grammar(String),
}

impl Error {
    /// Render the error followed by a short recovery hint.
    pub fn with_hint(&self) -> String {
        let hint = match self {
            Error::Syntax { .. } => "check that the input is a complete, valid Python module",
            Error::Manifest(_) => {
                "fix the `# /// script` block so its body is valid TOML with string fields"
            }
            Error::NotImplemented(_) => "use `to-dagster` or `to-marimo` to pick a direction",
            Error::Grammar(_) => "rebuild mardag against a compatible tree-sitter-python grammar",
        };
        format!("{}\n  hint: {}", self, hint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_message_carries_position() {
        let err = Error::Syntax {
            line: 3,
            column: 7,
            message: "invalid syntax".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "syntax error at line 3, column 7: invalid syntax"
        );
    }

    #[test]
    fn test_with_hint_appends_hint_line() {
        let err = Error::NotImplemented("marimo -> marimo".to_string());
        let rendered = err.with_hint();
        assert!(rendered.starts_with("not implemented: marimo -> marimo"));
        assert!(rendered.contains("\n  hint: "));
    }
}
