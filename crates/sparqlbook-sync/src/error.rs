//! Error types for the sync engine.

use std::path::PathBuf;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Failed to read source file.
    #[error("Failed to read file {path}: {message}")]
    ReadError { path: PathBuf, message: String },

    /// Failed to write output file.
    #[error("Failed to write file {path}: {message}")]
    WriteError { path: PathBuf, message: String },

    /// Failed to serialize/deserialize JSON.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid notebook structure.
    #[error("Invalid notebook: {0}")]
    InvalidNotebook(String),

    /// Markdown files may not be opened as notebooks.
    #[error("Markdown integration is disabled (markdownIntegration.enabled = false): {0}")]
    MarkdownIntegrationDisabled(PathBuf),

    /// File extension does not name a notebook format.
    #[error("Unsupported notebook format: {0} (expected .md, .markdown or .sparqlbook)")]
    UnsupportedFormat(PathBuf),
}
