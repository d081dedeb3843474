//! Native `.sparqlbook` notebook files.
//!
//! A `.sparqlbook` file is a JSON array of raw cells:
//!
//! ```json
//! [
//!   { "kind": 1, "language": "markdown", "value": "# Title" },
//!   { "kind": 2, "language": "sparql", "value": "ASK {}", "metadata": { "file": "q.rq" } }
//! ]
//! ```
//!
//! `kind` is 1 for markup and 2 for code.

use serde::{Deserialize, Serialize};
use sparqlbook_core::{Cell, CellKind, CellMetadata, Notebook, QueryLanguage};

use crate::error::{SyncError, SyncResult};

const MARKUP_KIND: u8 = 1;
const CODE_KIND: u8 = 2;

/// A cell as stored in a `.sparqlbook` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCell {
    /// 1 = markup, 2 = code
    pub kind: u8,

    /// Language id
    #[serde(default)]
    pub language: String,

    /// Cell text
    #[serde(default)]
    pub value: String,

    /// Cell metadata
    #[serde(default, skip_serializing_if = "CellMetadata::is_empty")]
    pub metadata: CellMetadata,
}

impl RawCell {
    fn from_cell(cell: &Cell) -> Self {
        Self {
            kind: match cell.kind {
                CellKind::Markup => MARKUP_KIND,
                CellKind::Code => CODE_KIND,
            },
            language: cell.language_id().to_string(),
            value: cell.content.clone(),
            metadata: cell.metadata.clone(),
        }
    }

    fn into_cell(self, index: usize) -> SyncResult<Cell> {
        let cell = match self.kind {
            MARKUP_KIND => Cell::markup(self.value),
            CODE_KIND => {
                let language = QueryLanguage::from_tag(&self.language);
                if language.is_none() {
                    tracing::debug!(
                        "Cell {} has language '{}', executing as sparql",
                        index,
                        self.language
                    );
                }
                Cell {
                    language,
                    ..Cell::code(QueryLanguage::Sparql, self.value)
                }
            }
            other => {
                return Err(SyncError::InvalidNotebook(format!(
                    "cell {index} has unknown kind {other}"
                )));
            }
        };
        Ok(cell.with_metadata(self.metadata))
    }
}

/// Decode a `.sparqlbook` file. Empty input yields an empty notebook.
pub fn deserialize_native(bytes: &[u8]) -> SyncResult<Notebook> {
    let text = String::from_utf8_lossy(bytes);
    if text.trim().is_empty() {
        return Ok(Notebook::default());
    }

    let raw: Vec<RawCell> = serde_json::from_str(&text)?;
    let cells = raw
        .into_iter()
        .enumerate()
        .map(|(index, cell)| cell.into_cell(index))
        .collect::<SyncResult<Vec<_>>>()?;

    Ok(Notebook::new(cells))
}

/// Encode a notebook as a `.sparqlbook` file.
pub fn serialize_native(notebook: &Notebook) -> SyncResult<Vec<u8>> {
    let raw: Vec<RawCell> = notebook.cells.iter().map(RawCell::from_cell).collect();
    let json = serde_json::to_string_pretty(&raw)?;
    Ok(json.into_bytes())
}
