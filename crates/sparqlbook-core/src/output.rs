//! Cell outputs.
//!
//! Every successful result is written as a single [`CellOutput`] holding
//! several representations of the same payload; every failure is written as
//! a single output holding one structured error item.

use serde::{Deserialize, Serialize};

/// SPARQL 1.1 query results JSON.
pub const SPARQL_RESULTS_JSON_MIME: &str = "application/sparql-results+json";
/// Pretty-printed JSON shown as text.
pub const TEXT_JSON_MIME: &str = "text/x-json";
/// Markdown rendering.
pub const MARKDOWN_MIME: &str = "text/markdown";
/// Plain text.
pub const PLAIN_TEXT_MIME: &str = "text/plain";
/// Structured error carrying `{name, message}`.
pub const ERROR_MIME: &str = "application/vnd.code.notebook.error";

/// Name given to every error output written by the pipeline.
pub const SPARQL_ERROR_NAME: &str = "SPARQL error";

/// One representation of an output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    /// Text payload with its mime type.
    Text { mime: String, text: String },

    /// JSON payload with its mime type.
    Json {
        mime: String,
        value: serde_json::Value,
    },

    /// Structured error.
    Error { name: String, message: String },
}

impl OutputItem {
    /// Mime type of this item.
    pub fn mime(&self) -> &str {
        match self {
            OutputItem::Text { mime, .. } | OutputItem::Json { mime, .. } => mime,
            OutputItem::Error { .. } => ERROR_MIME,
        }
    }

    fn text(text: impl Into<String>, mime: &str) -> Self {
        OutputItem::Text {
            mime: mime.to_string(),
            text: text.into(),
        }
    }
}

/// Output of one cell execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellOutput {
    /// Alternative representations, richest last
    pub items: Vec<OutputItem>,
}

impl CellOutput {
    /// Create an output from items.
    pub fn new(items: Vec<OutputItem>) -> Self {
        Self { items }
    }

    /// Output for a SPARQL JSON result (ASK or SELECT).
    ///
    /// Holds the pretty-printed document as `text/x-json` and the value
    /// itself as `application/sparql-results+json`.
    pub fn sparql_json(results: serde_json::Value) -> Self {
        Self::new(vec![
            OutputItem::text(pretty_json(&results), TEXT_JSON_MIME),
            OutputItem::Json {
                mime: SPARQL_RESULTS_JSON_MIME.to_string(),
                value: results,
            },
        ])
    }

    /// Output for a Turtle document (CONSTRUCT/DESCRIBE results, validation reports).
    pub fn turtle(turtle: &str) -> Self {
        Self::new(vec![
            OutputItem::text(turtle, PLAIN_TEXT_MIME),
            OutputItem::text(format!("```turtle\n{turtle}\n```"), MARKDOWN_MIME),
        ])
    }

    /// Output for an error.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(vec![OutputItem::Error {
            name: SPARQL_ERROR_NAME.to_string(),
            message: message.into(),
        }])
    }

    /// The item with the given mime type, if present.
    pub fn item(&self, mime: &str) -> Option<&OutputItem> {
        self.items.iter().find(|item| item.mime() == mime)
    }

    /// Error message, if this is an error output.
    pub fn error_message(&self) -> Option<&str> {
        self.items.iter().find_map(|item| match item {
            OutputItem::Error { message, .. } => Some(message.as_str()),
            _ => None,
        })
    }

    /// Whether this output carries an error.
    pub fn is_error(&self) -> bool {
        self.error_message().is_some()
    }
}

/// Pretty-print JSON with a three-space indent.
fn pretty_json(value: &serde_json::Value) -> String {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"   ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    match value.serialize(&mut serializer) {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sparql_json_output_has_text_and_json_items() {
        let output = CellOutput::sparql_json(json!({ "head": {}, "boolean": true }));

        assert_eq!(output.items.len(), 2);
        assert_eq!(output.items[0].mime(), TEXT_JSON_MIME);
        assert_eq!(output.items[1].mime(), SPARQL_RESULTS_JSON_MIME);

        match &output.items[0] {
            OutputItem::Text { text, .. } => {
                assert!(text.contains("\n   \"boolean\": true"));
            }
            other => panic!("Expected text item, got {:?}", other),
        }
        assert!(!output.is_error());
    }

    #[test]
    fn test_turtle_output_embeds_markdown_fence() {
        let output = CellOutput::turtle("ex:a ex:b ex:c .");

        match output.item(MARKDOWN_MIME) {
            Some(OutputItem::Text { text, .. }) => {
                assert_eq!(text, "```turtle\nex:a ex:b ex:c .\n```");
            }
            other => panic!("Expected markdown item, got {:?}", other),
        }
        assert!(output.item(PLAIN_TEXT_MIME).is_some());
    }

    #[test]
    fn test_error_output() {
        let output = CellOutput::error("boom");
        assert_eq!(output.items.len(), 1);
        assert_eq!(output.items[0].mime(), ERROR_MIME);
        assert_eq!(output.error_message(), Some("boom"));
        assert!(output.is_error());
    }
}
