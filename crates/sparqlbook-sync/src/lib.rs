//! Sync engine for SPARQL notebooks.
//!
//! Converts between markdown documents, `.sparqlbook` files and in-memory
//! [`Notebook`]s.
//!
//! # Architecture
//!
//! ```text
//! notes.md ─────► parse_sections ─────► Notebook ─────► serialize_markdown ─────► notes.md
//!                                          ▲  │
//! notes.sparqlbook ─► deserialize_native ──┘  └──► serialize_native ──► notes.sparqlbook
//!
//! queries/q.rq ─────► import_query_file ─────► Cell
//! ```

mod error;
mod import;
mod markdown;
mod native;

pub use error::{SyncError, SyncResult};
pub use import::{import_query_file, language_for_file};
pub use markdown::{Section, deserialize_markdown, parse_sections, serialize_markdown};
pub use native::{RawCell, deserialize_native, serialize_native};

use std::fs;
use std::path::{Path, PathBuf};

use sparqlbook_core::{Notebook, Settings};

/// On-disk notebook formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotebookFormat {
    /// `.md` / `.markdown` document with fenced query blocks
    Markdown,
    /// `.sparqlbook` JSON file
    Native,
}

impl NotebookFormat {
    /// Detect the format from a file extension.
    pub fn detect(path: impl AsRef<Path>) -> SyncResult<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("md" | "markdown") => Ok(NotebookFormat::Markdown),
            Some("sparqlbook") => Ok(NotebookFormat::Native),
            _ => Err(SyncError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Extension written for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            NotebookFormat::Markdown => "md",
            NotebookFormat::Native => "sparqlbook",
        }
    }

    /// Decode file contents.
    pub fn deserialize(&self, bytes: &[u8]) -> SyncResult<Notebook> {
        match self {
            NotebookFormat::Markdown => Ok(deserialize_markdown(bytes)),
            NotebookFormat::Native => deserialize_native(bytes),
        }
    }

    /// Encode a notebook.
    pub fn serialize(&self, notebook: &Notebook) -> SyncResult<Vec<u8>> {
        match self {
            NotebookFormat::Markdown => Ok(serialize_markdown(notebook)),
            NotebookFormat::Native => serialize_native(notebook),
        }
    }
}

/// Open a notebook file.
///
/// Markdown files are refused when `markdownIntegration.enabled` is off.
pub fn open_notebook(path: impl AsRef<Path>, settings: &Settings) -> SyncResult<Notebook> {
    let path = path.as_ref();
    let format = NotebookFormat::detect(path)?;

    if format == NotebookFormat::Markdown && !settings.markdown_integration_enabled {
        return Err(SyncError::MarkdownIntegrationDisabled(path.to_path_buf()));
    }

    let bytes = fs::read(path).map_err(|e| SyncError::ReadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let notebook = format.deserialize(&bytes)?;
    tracing::debug!("Opened {} ({} cells)", path.display(), notebook.len());
    Ok(notebook)
}

/// Write a notebook in the format named by the path's extension.
pub fn save_notebook(path: impl AsRef<Path>, notebook: &Notebook) -> SyncResult<()> {
    let path = path.as_ref();
    let bytes = NotebookFormat::detect(path)?.serialize(notebook)?;

    fs::write(path, bytes).map_err(|e| SyncError::WriteError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Convert a notebook file between formats. Returns the number of cells.
pub fn convert_notebook(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    settings: &Settings,
) -> SyncResult<usize> {
    let input = input.as_ref();
    let output = output.as_ref();

    let notebook = open_notebook(input, settings)?;
    save_notebook(output, &notebook)?;

    tracing::info!(
        "Converted {} → {} ({} cells)",
        input.display(),
        output.display(),
        notebook.len()
    );

    Ok(notebook.len())
}

/// Get the default conversion target: markdown becomes `.sparqlbook` and
/// vice versa.
pub fn default_converted_path(path: impl AsRef<Path>) -> SyncResult<PathBuf> {
    let path = path.as_ref();
    let target = match NotebookFormat::detect(path)? {
        NotebookFormat::Markdown => NotebookFormat::Native,
        NotebookFormat::Native => NotebookFormat::Markdown,
    };
    Ok(path.with_extension(target.extension()))
}
