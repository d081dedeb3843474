//! Endpoint resolution for a cell.
//!
//! A comment line such as `# [endpoint=https://example.org/sparql]` selects
//! the endpoint for that cell only. Without one, the ambient connection is
//! used.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::EndpointConnection;

/// Marker that starts a comment line in SPARQL and Turtle.
const COMMENT_MARKER: char = '#';

static ENDPOINT_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[endpoint=(.*)\]").expect("endpoint directive regex"));

/// Where a resolved endpoint came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointSource {
    /// An `[endpoint=...]` directive inside the cell.
    Document,
    /// The ambient connection, by name.
    Connection(String),
}

/// Connection parameters chosen for one cell execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    /// Parameters used to build the endpoint
    pub connection: EndpointConnection,
    /// Origin of the parameters
    pub source: EndpointSource,
}

impl fmt::Display for ResolvedEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            EndpointSource::Document => {
                write!(f, "document endpoint {}", self.connection.endpoint_url)
            }
            EndpointSource::Connection(name) => {
                write!(f, "connection {} ({})", name, self.connection.endpoint_url)
            }
        }
    }
}

/// Extract the first endpoint directive from the comment lines of a cell.
///
/// Only lines whose trimmed text starts with `#` are considered; the first
/// match from the top wins. Surrounding quotes around the value are removed
/// and an empty value counts as no directive.
pub fn endpoint_directive(cell_text: &str) -> Option<String> {
    cell_text
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with(COMMENT_MARKER))
        .find_map(|line| ENDPOINT_DIRECTIVE.captures(line))
        .and_then(|caps| caps.get(1))
        .map(|m| unquote(m.as_str().trim()).to_string())
        .filter(|value| !value.is_empty())
}

/// Choose the endpoint for a cell.
///
/// A directive in the cell takes precedence over the ambient connection.
/// Returns `None` when neither is available.
pub fn resolve_endpoint(
    cell_text: &str,
    active: Option<&EndpointConnection>,
) -> Option<ResolvedEndpoint> {
    if let Some(url) = endpoint_directive(cell_text) {
        return Some(ResolvedEndpoint {
            connection: EndpointConnection::anonymous(url),
            source: EndpointSource::Document,
        });
    }

    active.map(|connection| ResolvedEndpoint {
        connection: connection.clone(),
        source: EndpointSource::Connection(connection.name.clone()),
    })
}

fn unquote(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
