//! Add-file command implementation for sparqlbook CLI.
//!
//! Imports a query or shapes file into a notebook as a code cell.

use std::path::Path;

use sparqlbook_core::{Notebook, Settings};
use sparqlbook_sync::{import_query_file, open_notebook, save_notebook};

use crate::colors;

/// Execute the add-file command.
pub fn execute(
    notebook_path: &Path,
    file: &Path,
    replace: Option<usize>,
    settings: &Settings,
) -> anyhow::Result<()> {
    let mut notebook = if notebook_path.exists() {
        open_notebook(notebook_path, settings)?
    } else {
        Notebook::default()
    };

    let notebook_dir = notebook_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let cell = import_query_file(notebook_dir, file)?;
    let language = cell.language_id();

    let index = match replace {
        Some(index) => {
            let Some(slot) = notebook.cells.get_mut(index) else {
                anyhow::bail!(
                    "Cell {} does not exist (notebook has {} cells)",
                    index,
                    notebook.len()
                );
            };
            *slot = cell;
            index
        }
        None => {
            notebook.cells.push(cell);
            notebook.len() - 1
        }
    };

    save_notebook(notebook_path, &notebook)?;

    println!(
        "{}✓{} {} {} as {} cell {}",
        colors::GREEN,
        colors::RESET,
        if replace.is_some() { "Replaced with" } else { "Added" },
        file.display(),
        language,
        index
    );

    Ok(())
}
