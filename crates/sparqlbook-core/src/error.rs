//! Error types for sparqlbook-core.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for sparqlbook-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sparqlbook-core.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to load or interpret the settings file.
    #[error("configuration error{}: {message}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    Config {
        path: Option<PathBuf>,
        message: String,
    },

    /// No endpoint could be determined for a cell.
    #[error("Not connected to a SPARQL Endpoint")]
    NotConnected,

    /// Invalid operation (e.g., executing a markup cell).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

impl Error {
    /// Format the error with a recovery hint where one is known.
    pub fn with_hint(&self) -> String {
        match self {
            Error::NotConnected => format!(
                "{self}\n  hint: add a `# [endpoint=<url>]` comment to the cell, \
                 pass --endpoint, or set `activeConnection` in the settings file"
            ),
            Error::Config { .. } => {
                format!("{self}\n  hint: check the JSON syntax of the settings file")
            }
            _ => self.to_string(),
        }
    }
}

/// A transport or dispatch failure reported by an [`Endpoint`](crate::execute::Endpoint).
///
/// Carries the error's own message plus, when the server answered with an
/// error status, the response body as a nested diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointError {
    /// The error's own message.
    pub message: String,
    /// Body of the failed response, if one was received.
    pub response_body: Option<String>,
}

impl EndpointError {
    /// Create an error without a response body.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            response_body: None,
        }
    }

    /// Attach the body of the failed response.
    pub fn with_response_body(mut self, body: impl Into<String>) -> Self {
        self.response_body = Some(body.into());
        self
    }

    /// Message shown to the user: the error message, then the response body on its own line.
    pub fn diagnostic(&self) -> String {
        match &self.response_body {
            Some(body) => format!("{}\n{}", self.message, body),
            None => self.message.clone(),
        }
    }
}

impl fmt::Display for EndpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.diagnostic())
    }
}

impl std::error::Error for EndpointError {}
