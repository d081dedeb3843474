//! Per-cell execution pipeline.
//!
//! Resolves the endpoint of a cell, dispatches its text, classifies the
//! response and writes exactly one output back through the execution handle.
//! Every failure ends up as an error output; nothing propagates to the caller.

use std::sync::Arc;

use super::context::ExecutionHandle;
use super::endpoint::{Endpoint, EndpointFactory, EndpointResponse};
use super::namespaces::{Namespaces, rewrite_bindings};
use super::resolve::resolve_endpoint;
use super::response::ResponseKind;
use crate::config::{EndpointConnection, Settings};
use crate::error::{EndpointError, Error};
use crate::notebook::{Cell, QueryLanguage};
use crate::output::CellOutput;

/// Runs single cells against their endpoints.
#[derive(Clone)]
pub struct CellExecutor {
    /// Builds a fresh endpoint for every execution
    factory: Arc<dyn EndpointFactory>,
    /// Rewrite SELECT bindings with the query's prefixes
    use_namespaces: bool,
}

impl CellExecutor {
    /// Create an executor with namespace rewriting enabled.
    pub fn new(factory: Arc<dyn EndpointFactory>) -> Self {
        Self {
            factory,
            use_namespaces: true,
        }
    }

    /// Create an executor configured from settings.
    pub fn with_settings(factory: Arc<dyn EndpointFactory>, settings: &Settings) -> Self {
        Self::new(factory).use_namespaces(settings.use_namespaces)
    }

    /// Enable or disable namespace rewriting.
    pub fn use_namespaces(mut self, enabled: bool) -> Self {
        self.use_namespaces = enabled;
        self
    }

    /// Execute one cell.
    ///
    /// `active` is the ambient connection used when the cell carries no
    /// endpoint directive. The execution is ended unless it was cancelled.
    pub async fn execute_cell(
        &self,
        cell: &Cell,
        active: Option<&EndpointConnection>,
        execution: &dyn ExecutionHandle,
    ) {
        if !cell.is_code() {
            let err = Error::InvalidOperation("markup cells cannot be executed".to_string());
            commit(execution, CellOutput::error(err.to_string()), false);
            return;
        }

        let text = cell.content.as_str();

        let Some(resolved) = resolve_endpoint(text, active) else {
            tracing::warn!("No endpoint for cell, not connected");
            commit(execution, CellOutput::error(Error::NotConnected.to_string()), false);
            return;
        };
        tracing::debug!("Executing {} cell against {}", cell.code_language(), resolved);

        let response = match self.factory.connect(&resolved.connection) {
            Ok(endpoint) => dispatch(endpoint.as_ref(), cell.code_language(), text, execution).await,
            Err(e) => Err(e),
        };

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                let message = e.diagnostic();
                tracing::error!("SPARQL execution error: {}", message);
                commit(execution, CellOutput::error(message), false);
                return;
            }
        };

        let (output, success) = self.render(ResponseKind::classify(response), text);
        if !success {
            tracing::warn!("Cell execution failed: {:?}", output.error_message());
        }
        commit(execution, output, success);
    }

    /// Turn a classified response into the cell output and success flag.
    fn render(&self, kind: ResponseKind, query: &str) -> (CellOutput, bool) {
        let success = kind.is_success();
        let output = match kind {
            ResponseKind::Boolean(results) => CellOutput::sparql_json(results),
            ResponseKind::Bindings(mut results) => {
                if self.use_namespaces {
                    let namespaces = Namespaces::from_query(query);
                    let rewritten = rewrite_bindings(&mut results, &namespaces);
                    tracing::debug!("Rewrote {} URIs with {} namespaces", rewritten, namespaces.len());
                }
                CellOutput::sparql_json(results)
            }
            ResponseKind::Turtle(turtle) => CellOutput::turtle(&turtle),
            ResponseKind::ApplicationError(message) => CellOutput::error(message),
            ResponseKind::Malformed {
                content_type,
                error,
                body,
            } => CellOutput::error(format!(
                "Error: Invalid {content_type} response ({error})\n\n{body}"
            )),
            ResponseKind::Unexpected { content_type, body } => {
                CellOutput::error(format!("Error: Unknown content type {content_type}\n\n{body}"))
            }
        };
        (output, success)
    }
}

/// Send the cell text to the operation matching its language.
async fn dispatch(
    endpoint: &dyn Endpoint,
    language: QueryLanguage,
    text: &str,
    execution: &dyn ExecutionHandle,
) -> Result<EndpointResponse, EndpointError> {
    match language {
        QueryLanguage::Sparql => endpoint.query(text, Some(execution)).await,
        QueryLanguage::Shacl => endpoint.validate(text, Some(execution)).await,
    }
}

/// Replace the cell's outputs and end the execution, unless it was cancelled.
fn commit(execution: &dyn ExecutionHandle, output: CellOutput, success: bool) {
    if execution.is_cancelled() {
        tracing::debug!("Execution cancelled, dropping output");
        return;
    }
    execution.replace_output(vec![output]);
    execution.end(success);
}
