//! Import a query or shapes file as a code cell.

use std::fs;
use std::path::{Component, Path, PathBuf};

use sparqlbook_core::{Cell, CellMetadata, QueryLanguage};

use crate::error::{SyncError, SyncResult};

/// Language of an imported file, from its extension.
///
/// `.shacl` and `.ttl` files are shapes graphs; anything else is a query.
pub fn language_for_file(path: &Path) -> QueryLanguage {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("shacl") || ext.eq_ignore_ascii_case("ttl") => {
            QueryLanguage::Shacl
        }
        _ => QueryLanguage::Sparql,
    }
}

/// Build a code cell from the contents of `file`.
///
/// The cell starts with a `# from file <path>` comment, where `<path>` is
/// `file` relative to `notebook_dir` with `/` separators; the same path is
/// recorded in the cell metadata.
pub fn import_query_file(notebook_dir: impl AsRef<Path>, file: impl AsRef<Path>) -> SyncResult<Cell> {
    let notebook_dir = notebook_dir.as_ref();
    let file = file.as_ref();

    let content = fs::read_to_string(file).map_err(|e| SyncError::ReadError {
        path: file.to_path_buf(),
        message: e.to_string(),
    })?;

    let relative = relative_display(notebook_dir, file);
    let language = language_for_file(file);
    tracing::debug!("Importing {} as {} cell", relative, language);

    let metadata = CellMetadata {
        file: Some(relative.clone()),
        ..Default::default()
    };
    Ok(Cell::code(language, format!("# from file {relative}\n{content}")).with_metadata(metadata))
}

/// `file` relative to `dir`, joined with `/`.
fn relative_display(dir: &Path, file: &Path) -> String {
    let dir = absolute(dir);
    let file = absolute(file);
    let relative = relative_path(&dir, &file);

    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn absolute(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn relative_path(from_dir: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component<'_>> = from_dir.components().collect();
    let to: Vec<Component<'_>> = to.components().collect();

    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut relative = PathBuf::new();
    for _ in common..from.len() {
        relative.push("..");
    }
    for component in &to[common..] {
        relative.push(component.as_os_str());
    }
    relative
}
