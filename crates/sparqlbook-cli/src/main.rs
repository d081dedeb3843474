//! sparqlbook CLI - SPARQL and SHACL notebooks from the command line.

mod add_file;
mod cells;
mod colors;
mod convert;
mod output;
mod run;
mod session;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sparqlbook")]
#[command(about = "SPARQL and SHACL notebooks backed by markdown documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (defaults to $SPARQLBOOK_CONFIG, then the per-user settings)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute the code cells of a notebook
    Run {
        /// Path to the notebook (.md or .sparqlbook)
        notebook: PathBuf,

        /// Run only the cell at this index (repeatable)
        #[arg(long = "cell")]
        cells: Vec<usize>,

        #[command(flatten)]
        target: session::EndpointArgs,

        /// Do not abbreviate result URIs with the query's prefixes
        #[arg(long)]
        no_namespaces: bool,

        /// Print outputs as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert between markdown and .sparqlbook
    Convert {
        /// Notebook to convert
        input: PathBuf,

        /// Output path (defaults to the input with the other extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the cells of a notebook and where each query would be sent
    Cells {
        /// Path to the notebook
        notebook: PathBuf,

        #[command(flatten)]
        target: session::EndpointArgs,
    },

    /// Add a query or shapes file to a notebook as a code cell
    AddFile {
        /// Path to the notebook
        notebook: PathBuf,

        /// Query (.rq, .sparql) or shapes (.ttl, .shacl) file
        file: PathBuf,

        /// Replace the cell at this index instead of appending
        #[arg(long)]
        replace: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Helper to format sparqlbook-core errors with recovery hints
    let format_error = |err: anyhow::Error| -> anyhow::Error {
        if let Some(core_err) = err.downcast_ref::<sparqlbook_core::Error>() {
            anyhow::anyhow!("{}", core_err.with_hint())
        } else {
            err
        }
    };

    let settings = session::load_settings(cli.config.as_deref()).map_err(format_error)?;

    match cli.command {
        Commands::Run {
            notebook,
            cells,
            target,
            no_namespaces,
            json,
        } => {
            let options = run::RunOptions {
                cells,
                target,
                no_namespaces,
                json,
            };
            run::execute(&notebook, &settings, &options)
                .await
                .map_err(format_error)?;
        }

        Commands::Convert { input, output } => {
            convert::execute(&input, output.as_deref(), &settings).map_err(format_error)?;
        }

        Commands::Cells { notebook, target } => {
            cells::execute(&notebook, &settings, &target).map_err(format_error)?;
        }

        Commands::AddFile {
            notebook,
            file,
            replace,
        } => {
            add_file::execute(&notebook, &file, replace, &settings).map_err(format_error)?;
        }
    }

    Ok(())
}
