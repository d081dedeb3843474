//! Cells command implementation for sparqlbook CLI.
//!
//! Lists the cells of a notebook and, for code cells, the endpoint a run
//! would send them to.

use std::path::Path;

use sparqlbook_core::{Settings, resolve_endpoint};
use sparqlbook_sync::open_notebook;

use crate::colors;
use crate::session::{self, EndpointArgs};

/// Execute the cells command.
pub fn execute(notebook_path: &Path, settings: &Settings, target: &EndpointArgs) -> anyhow::Result<()> {
    let notebook = open_notebook(notebook_path, settings)?;
    let active = session::active_connection(settings, target)?;

    println!(
        "\n{}sparqlbook{} - Cells of {}{}{}",
        colors::BOLD,
        colors::RESET,
        colors::CYAN,
        notebook_path.display(),
        colors::RESET
    );
    println!("{}", "─".repeat(50));

    if notebook.is_empty() {
        println!("{}(empty notebook){}", colors::YELLOW, colors::RESET);
        return Ok(());
    }

    for (index, cell) in notebook.cells.iter().enumerate() {
        println!(
            "{:>3}  {:<8} {}",
            index,
            cell.language_id(),
            first_line(&cell.content)
        );

        if !cell.is_code() {
            continue;
        }
        match resolve_endpoint(&cell.content, active.as_ref()) {
            Some(resolved) => println!("       {}→ {}{}", colors::DIM, resolved, colors::RESET),
            None => println!(
                "       {}→ not connected{}",
                colors::YELLOW,
                colors::RESET
            ),
        }
        if let Some(file) = &cell.metadata.file {
            println!("       {}from {}{}", colors::DIM, file, colors::RESET);
        }
    }

    Ok(())
}

fn first_line(content: &str) -> String {
    const MAX: usize = 60;
    let line = content.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    if line.chars().count() > MAX {
        format!("{}…", line.chars().take(MAX).collect::<String>())
    } else {
        line.to_string()
    }
}
