//! Core engine for SPARQL notebooks.
//!
//! This crate provides:
//! - The notebook data model (cells, outputs)
//! - Settings shared by the converter and the pipeline
//! - The cell execution pipeline: endpoint resolution, dispatch,
//!   response classification and output construction

pub mod config;
pub mod error;
pub mod execute;
pub mod notebook;
pub mod output;

pub use config::{EndpointConnection, Settings};
pub use error::{EndpointError, Error, Result};
pub use execute::{
    CellExecution, CellExecutor, Endpoint, EndpointFactory, EndpointResponse, ExecutionHandle,
    ExecutionSummary, HttpEndpointFactory, NotebookController, ResolvedEndpoint, resolve_endpoint,
};
pub use notebook::{Cell, CellKind, CellMetadata, Notebook, QueryLanguage};
pub use output::{CellOutput, OutputItem};
