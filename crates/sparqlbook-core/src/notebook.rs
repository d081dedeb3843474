//! Notebook data model.
//!
//! A [`Notebook`] is an ordered sequence of [`Cell`]s. Cells have no identity
//! beyond their position; they are rebuilt on every load and discarded on save.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::output::CellOutput;

/// Language id used for markup cells.
pub const MARKDOWN_LANGUAGE: &str = "markdown";

/// Kind of cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    /// Narrative markdown text
    Markup,
    /// Executable query or validation text
    Code,
}

/// Languages the execution pipeline knows how to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryLanguage {
    /// SPARQL query, sent to the endpoint's query operation.
    Sparql,
    /// SHACL shapes graph in Turtle, sent to the endpoint's validate operation.
    Shacl,
}

impl QueryLanguage {
    /// Lower-case language tag as used in fences and notebook files.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryLanguage::Sparql => "sparql",
            QueryLanguage::Shacl => "shacl",
        }
    }

    /// Parse a language tag, ignoring case. Returns `None` for anything
    /// other than `sparql` or `shacl`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        if tag.eq_ignore_ascii_case("sparql") {
            Some(QueryLanguage::Sparql)
        } else if tag.eq_ignore_ascii_case("shacl") {
            Some(QueryLanguage::Shacl)
        } else {
            None
        }
    }
}

impl fmt::Display for QueryLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| format!("unsupported cell language: {s}"))
    }
}

/// Metadata attached to a cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellMetadata {
    /// Relative path of the file the cell was imported from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Keys this crate does not interpret, kept for round-trip.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CellMetadata {
    /// Whether there is nothing to persist.
    pub fn is_empty(&self) -> bool {
        self.file.is_none() && self.extra.is_empty()
    }
}

/// A single notebook cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Cell kind
    pub kind: CellKind,

    /// Raw cell text, preserved byte for byte
    pub content: String,

    /// Declared language (code cells only)
    pub language: Option<QueryLanguage>,

    /// Optional metadata
    pub metadata: CellMetadata,

    /// Outputs of the last execution
    pub outputs: Vec<CellOutput>,
}

impl Cell {
    /// Create a markup cell.
    pub fn markup(content: impl Into<String>) -> Self {
        Self {
            kind: CellKind::Markup,
            content: content.into(),
            language: None,
            metadata: CellMetadata::default(),
            outputs: Vec::new(),
        }
    }

    /// Create a code cell.
    pub fn code(language: QueryLanguage, content: impl Into<String>) -> Self {
        Self {
            kind: CellKind::Code,
            content: content.into(),
            language: Some(language),
            metadata: CellMetadata::default(),
            outputs: Vec::new(),
        }
    }

    /// Set the metadata.
    pub fn with_metadata(mut self, metadata: CellMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Whether this is an executable cell.
    pub fn is_code(&self) -> bool {
        self.kind == CellKind::Code
    }

    /// Language used to execute and serialize a code cell.
    ///
    /// An unset language falls back to SPARQL.
    pub fn code_language(&self) -> QueryLanguage {
        self.language.unwrap_or(QueryLanguage::Sparql)
    }

    /// Language id of the cell, `markdown` for markup cells.
    pub fn language_id(&self) -> &'static str {
        match self.kind {
            CellKind::Markup => MARKDOWN_LANGUAGE,
            CellKind::Code => self.code_language().as_str(),
        }
    }
}

/// An ordered sequence of cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Notebook {
    /// Cells in document order
    pub cells: Vec<Cell>,
}

impl Notebook {
    /// Create a notebook from cells.
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the notebook has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Indices of all code cells, in document order.
    pub fn code_cell_indices(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_code())
            .map(|(index, _)| index)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_tags_are_case_insensitive() {
        assert_eq!(QueryLanguage::from_tag("SPARQL"), Some(QueryLanguage::Sparql));
        assert_eq!(QueryLanguage::from_tag("Shacl"), Some(QueryLanguage::Shacl));
        assert_eq!(QueryLanguage::from_tag("python"), None);
        assert_eq!(QueryLanguage::from_tag(""), None);
    }

    #[test]
    fn test_code_language_defaults_to_sparql() {
        let mut cell = Cell::code(QueryLanguage::Shacl, "ex:S a sh:NodeShape .");
        assert_eq!(cell.code_language(), QueryLanguage::Shacl);

        cell.language = None;
        assert_eq!(cell.code_language(), QueryLanguage::Sparql);
        assert_eq!(cell.language_id(), "sparql");
    }

    #[test]
    fn test_markup_language_id() {
        assert_eq!(Cell::markup("# Title").language_id(), "markdown");
    }

    #[test]
    fn test_code_cell_indices() {
        let notebook = Notebook::new(vec![
            Cell::markup("intro"),
            Cell::code(QueryLanguage::Sparql, "ASK {}"),
            Cell::markup("outro"),
            Cell::code(QueryLanguage::Shacl, ""),
        ]);
        assert_eq!(notebook.code_cell_indices(), vec![1, 3]);
    }
}
