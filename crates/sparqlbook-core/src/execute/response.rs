//! Classification of endpoint responses by content type.

use serde_json::Value;

use super::endpoint::EndpointResponse;
use crate::output::SPARQL_RESULTS_JSON_MIME;

const TURTLE_MIME: &str = "text/turtle";
const JSON_MIME: &str = "application/json";

/// What an endpoint answered, decided by its declared content type.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseKind {
    /// ASK result: SPARQL JSON carrying a `boolean` field.
    Boolean(Value),

    /// SELECT result: SPARQL JSON without a `boolean` field.
    Bindings(Value),

    /// CONSTRUCT/DESCRIBE result or SHACL validation report.
    Turtle(String),

    /// Error reported by the endpoint as `application/json`.
    ApplicationError(String),

    /// SPARQL JSON whose body could not be parsed.
    Malformed {
        content_type: String,
        error: String,
        body: String,
    },

    /// Any content type the pipeline does not handle.
    Unexpected { content_type: String, body: String },
}

impl ResponseKind {
    /// Classify a response. Only the content type is consulted; parameters
    /// after `;` are ignored.
    pub fn classify(response: EndpointResponse) -> Self {
        let content_type = response.media_type();
        let body = response.body;

        match content_type.as_str() {
            SPARQL_RESULTS_JSON_MIME => match serde_json::from_str::<Value>(&body) {
                Ok(value) if value.get("boolean").is_some() => ResponseKind::Boolean(value),
                Ok(value) => ResponseKind::Bindings(value),
                Err(e) => ResponseKind::Malformed {
                    content_type,
                    error: e.to_string(),
                    body,
                },
            },
            TURTLE_MIME => ResponseKind::Turtle(body),
            JSON_MIME => ResponseKind::ApplicationError(application_error_message(&body)),
            _ => ResponseKind::Unexpected { content_type, body },
        }
    }

    /// Whether this kind ends the execution successfully.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ResponseKind::Boolean(_) | ResponseKind::Bindings(_) | ResponseKind::Turtle(_)
        )
    }
}

/// The `message` field of a JSON error body, or the body itself.
fn application_error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };
    match value.get("message") {
        Some(Value::String(message)) => message.clone(),
        Some(other) => other.to_string(),
        None => body.to_string(),
    }
}
