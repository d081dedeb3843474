//! Run command implementation for sparqlbook CLI.
//!
//! Executes the code cells of a notebook against their endpoints.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use sparqlbook_core::{CellExecutor, HttpEndpointFactory, NotebookController, Settings};
use sparqlbook_sync::open_notebook;

use crate::colors;
use crate::output::{print_outputs, summary_json};
use crate::session::{self, EndpointArgs};

/// Options of the run command.
pub struct RunOptions {
    /// Cell indices to run; empty runs every code cell
    pub cells: Vec<usize>,
    pub target: EndpointArgs,
    pub no_namespaces: bool,
    pub json: bool,
}

/// Execute a notebook.
pub async fn execute(
    notebook_path: &Path,
    settings: &Settings,
    options: &RunOptions,
) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut notebook = open_notebook(notebook_path, settings)?;
    let active = session::active_connection(settings, &options.target)?;

    for &index in &options.cells {
        match notebook.cells.get(index) {
            Some(cell) if cell.is_code() => {}
            Some(_) => anyhow::bail!("Cell {} is not a code cell", index),
            None => anyhow::bail!(
                "Cell {} does not exist (notebook has {} cells)",
                index,
                notebook.len()
            ),
        }
    }

    let mut executor = CellExecutor::with_settings(Arc::new(HttpEndpointFactory::new()), settings);
    if options.no_namespaces {
        executor = executor.use_namespaces(false);
    }
    let controller = NotebookController::new(executor);

    if !options.json {
        println!(
            "\n{}sparqlbook{} - Running {}{}{}",
            colors::BOLD,
            colors::RESET,
            colors::CYAN,
            notebook_path.display(),
            colors::RESET
        );
        println!("{}", "─".repeat(50));
    }

    let indices = (!options.cells.is_empty()).then_some(options.cells.as_slice());
    if indices.is_none() && notebook.code_cell_indices().is_empty() {
        if !options.json {
            println!(
                "\n{}No code cells found in notebook.{}",
                colors::YELLOW,
                colors::RESET
            );
            println!("Code cells are ```sparql or ```shacl fenced blocks");
        } else {
            println!("[]");
        }
        return Ok(());
    }

    let summaries = controller
        .run_notebook(&mut notebook, indices, active.as_ref())
        .await;
    let failed = summaries.iter().filter(|s| !s.succeeded()).count();

    if options.json {
        let value: Vec<_> = summaries.iter().map(summary_json).collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        for summary in &summaries {
            let language = notebook.cells[summary.cell_index].language_id();
            let (mark, color) = if summary.succeeded() {
                ("✓", colors::GREEN)
            } else {
                ("✗", colors::RED)
            };
            let millis = summary
                .duration
                .map(|d| d.as_secs_f64() * 1000.0)
                .unwrap_or_default();

            println!(
                "\n{}[{}]{} cell {} ({}) {}{}{} {}({:.2}ms){}",
                colors::BOLD,
                summary.execution_order,
                colors::RESET,
                summary.cell_index,
                language,
                color,
                mark,
                colors::RESET,
                colors::DIM,
                millis,
                colors::RESET
            );
            print_outputs(summary);
        }

        println!("\n{}", "─".repeat(50));
        let (label, color) = if failed == 0 {
            ("Completed", colors::GREEN)
        } else {
            ("Finished with errors", colors::RED)
        };
        println!(
            "{}{}{} {} cells in {:.2}s",
            color,
            label,
            colors::RESET,
            summaries.len(),
            start.elapsed().as_secs_f64()
        );
    }

    if failed > 0 {
        anyhow::bail!("{} of {} cells failed", failed, summaries.len());
    }

    Ok(())
}
