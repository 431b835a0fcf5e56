//! Intermediate representation shared by both dialects.
//!
//! Dependencies between cells are nominal: a cell's `inputs` are matched
//! against other cells' `outputs` by name. There is no separate edge list,
//! and no ordering beyond the order cells appeared in the source.

use indexmap::IndexMap;

use crate::syntax::Statement;

/// One import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportItem {
    /// Dotted module path.
    pub module: String,
    /// Imported names with optional local aliases; `None` for `import module`.
    pub names: Option<Vec<(String, Option<String>)>>,
    /// Local alias of a whole-module import.
    pub alias: Option<String>,
}

impl ImportItem {
    /// `import module [as alias]`
    pub fn module(module: impl Into<String>, alias: Option<String>) -> Self {
        Self {
            module: module.into(),
            names: None,
            alias,
        }
    }

    /// `from module import name [as alias], ...`
    pub fn from(module: impl Into<String>, names: Vec<(String, Option<String>)>) -> Self {
        Self {
            module: module.into(),
            names: Some(names),
            alias: None,
        }
    }

    /// Canonical source text.
    pub fn to_source(&self) -> String {
        match (&self.names, &self.alias) {
            (Some(names), _) => {
                let parts: Vec<String> = names
                    .iter()
                    .map(|(name, alias)| match alias {
                        Some(alias) => format!("{name} as {alias}"),
                        None => name.clone(),
                    })
                    .collect();
                format!("from {} import {}", self.module, parts.join(", "))
            }
            (None, Some(alias)) => format!("import {} as {}", self.module, alias),
            (None, None) => format!("import {}", self.module),
        }
    }

    /// Local names this import binds.
    pub fn bound_names(&self) -> Vec<String> {
        match (&self.names, &self.alias) {
            (Some(names), _) => names
                .iter()
                .filter(|(name, _)| name != "*")
                .map(|(name, alias)| alias.clone().unwrap_or_else(|| name.clone()))
                .collect(),
            (None, Some(alias)) => vec![alias.clone()],
            (None, None) => self
                .module
                .split('.')
                .next()
                .map(|root| vec![root.to_string()])
                .unwrap_or_default(),
        }
    }

    /// Whether this is an unaliased `import module`.
    pub fn is_plain_import_of(&self, module: &str) -> bool {
        self.names.is_none() && self.alias.is_none() && self.module == module
    }
}

/// Classification of a notebook cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    Code,
    ImportOnly,
    Markdown,
    Sql,
    Ui,
    DisplayOnly,
}

impl CellType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellType::Code => "code",
            CellType::ImportOnly => "import",
            CellType::Markdown => "markdown",
            CellType::Sql => "sql",
            CellType::Ui => "ui",
            CellType::DisplayOnly => "display",
        }
    }
}

impl std::fmt::Display for CellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named unit of computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellNode {
    pub name: String,
    /// Body without docstring and without the terminal return.
    pub body: Vec<Statement>,
    /// Parameters that are data dependencies.
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub cell_type: CellType,
    pub docstring: Option<String>,
    pub return_type_annotation: Option<String>,
    /// String-literal keyword arguments of the declaring decorator.
    pub decorator_kwargs: IndexMap<String, String>,
}

impl CellNode {
    pub fn new(
        name: impl Into<String>,
        body: Vec<Statement>,
        inputs: Vec<String>,
        outputs: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            body,
            inputs,
            outputs,
            cell_type: CellType::Code,
            docstring: None,
            return_type_annotation: None,
            decorator_kwargs: IndexMap::new(),
        }
    }

    pub fn with_cell_type(mut self, cell_type: CellType) -> Self {
        self.cell_type = cell_type;
        self
    }

    pub fn with_docstring(mut self, docstring: Option<String>) -> Self {
        self.docstring = docstring;
        self
    }

    pub fn with_return_type(mut self, annotation: Option<String>) -> Self {
        self.return_type_annotation = annotation;
        self
    }

    pub fn with_decorator_kwargs(mut self, kwargs: IndexMap<String, String>) -> Self {
        self.decorator_kwargs = kwargs;
        self
    }

    /// Whether this cell produces more than one named output.
    pub fn is_fan_out(&self) -> bool {
        self.outputs.len() > 1
    }
}

/// Inline script manifest contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptMetadata {
    pub requires_python: Option<String>,
    pub dependencies: Vec<String>,
}

impl ScriptMetadata {
    pub fn is_empty(&self) -> bool {
        self.requires_python.is_none() && self.dependencies.is_empty()
    }
}

/// Why a piece of source was left out of the IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Non-name element in a returned tuple.
    DroppedOutput,
    /// Return shape that names no outputs.
    UnsupportedReturn,
    /// Non-literal key in a multi-asset `outs` mapping.
    DynamicOutsKey,
    /// Framework side-effect call removed with its parameter.
    StrippedCall,
    /// Import that cannot be relocated, such as `from __future__`.
    DroppedImport,
}

/// A lossy but deliberate decision taken while reading a dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Cell or function the decision applies to.
    pub cell: String,
    pub message: String,
}

/// Root aggregate of one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotebookIR {
    /// Non-framework imports in order of first appearance.
    pub imports: Vec<ImportItem>,
    /// Cells in source order.
    pub cells: Vec<CellNode>,
    pub metadata: ScriptMetadata,
    pub module_docstring: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl NotebookIR {
    /// Append an import unless an identical one is already present.
    pub fn add_import(&mut self, import: ImportItem) {
        if !self.imports.contains(&import) {
            self.imports.push(import);
        }
    }

    /// Record a dropped shape and log it.
    pub fn note(&mut self, kind: DiagnosticKind, cell: &str, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(?kind, cell, "{}", message);
        self.diagnostics.push(Diagnostic {
            kind,
            cell: cell.to_string(),
            message,
        });
    }

    /// Names of all cells, in order.
    pub fn cell_names(&self) -> Vec<&str> {
        self.cells.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn count_of(&self, cell_type: CellType) -> usize {
        self.cells.iter().filter(|c| c.cell_type == cell_type).count()
    }
}

/// Package name of a dependency specifier, before any of `> < = ! ~ [`.
pub fn bare_name(specifier: &str) -> &str {
    specifier
        .split(['>', '<', '=', '!', '~', '['])
        .next()
        .unwrap_or_default()
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_to_source() {
        assert_eq!(ImportItem::module("pandas", None).to_source(), "import pandas");
        assert_eq!(
            ImportItem::module("numpy", Some("np".into())).to_source(),
            "import numpy as np"
        );
        assert_eq!(
            ImportItem::from(
                "pathlib",
                vec![("Path".into(), None), ("PurePath".into(), Some("PP".into()))]
            )
            .to_source(),
            "from pathlib import Path, PurePath as PP"
        );
    }

    #[test]
    fn test_bound_names() {
        assert_eq!(ImportItem::module("os.path", None).bound_names(), vec!["os"]);
        assert_eq!(
            ImportItem::module("numpy", Some("np".into())).bound_names(),
            vec!["np"]
        );
        assert_eq!(
            ImportItem::from("m", vec![("a".into(), None), ("b".into(), Some("c".into()))])
                .bound_names(),
            vec!["a", "c"]
        );
        assert!(ImportItem::from("m", vec![("*".into(), None)]).bound_names().is_empty());
    }

    #[test]
    fn test_bare_name_tolerates_qualifiers() {
        assert_eq!(bare_name("dagster>=1.9.0"), "dagster");
        assert_eq!(bare_name("polars[pyarrow]"), "polars");
        assert_eq!(bare_name("marimo ~= 0.10"), "marimo");
        assert_eq!(bare_name("duckdb!=1.0"), "duckdb");
        assert_eq!(bare_name("pandas"), "pandas");
    }

    #[test]
    fn test_cell_defaults() {
        let cell = CellNode::new("x", Vec::new(), vec![], vec!["x".into()]);
        assert_eq!(cell.cell_type, CellType::Code);
        assert!(!cell.is_fan_out());
        assert!(cell.decorator_kwargs.is_empty());
    }

    #[test]
    fn test_add_import_deduplicates() {
        let mut ir = NotebookIR::default();
        ir.add_import(ImportItem::module("pandas", None));
        ir.add_import(ImportItem::module("pandas", None));
        ir.add_import(ImportItem::module("pandas", Some("pd".into())));
        assert_eq!(ir.imports.len(), 2);
    }

    #[test]
    fn test_empty_metadata() {
        assert!(ScriptMetadata::default().is_empty());
        let meta = ScriptMetadata {
            requires_python: Some(">=3.12".into()),
            dependencies: vec![],
        };
        assert!(!meta.is_empty());
    }
}
