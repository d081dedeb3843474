//! Convert command implementation for sparqlbook CLI.
//!
//! Converts markdown notebooks to `.sparqlbook` files and back.

use std::path::Path;
use std::time::Instant;

use sparqlbook_core::Settings;
use sparqlbook_sync::{convert_notebook, default_converted_path};

use crate::colors;

/// Execute the convert command.
pub fn execute(input: &Path, output: Option<&Path>, settings: &Settings) -> anyhow::Result<()> {
    if !input.exists() {
        anyhow::bail!("Notebook not found: {}", input.display());
    }

    let output = match output {
        Some(path) => path.to_path_buf(),
        None => default_converted_path(input)?,
    };

    let start = Instant::now();
    print!(
        "  {} → {} ... ",
        input.file_name().unwrap_or_default().to_string_lossy(),
        output.file_name().unwrap_or_default().to_string_lossy()
    );
    colors::flush_stdout();

    match convert_notebook(input, &output, settings) {
        Ok(count) => {
            println!(
                "{}✓{} {} cells ({:.2}ms)",
                colors::GREEN,
                colors::RESET,
                count,
                start.elapsed().as_secs_f64() * 1000.0
            );
            Ok(())
        }
        Err(e) => {
            println!("{}✗{}", colors::RED, colors::RESET);
            Err(e.into())
        }
    }
}
