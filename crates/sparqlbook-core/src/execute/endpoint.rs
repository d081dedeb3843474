//! Endpoint capability and its HTTP implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use super::context::ExecutionHandle;
use crate::config::EndpointConnection;
use crate::error::EndpointError;

/// Accept header sent with SPARQL queries.
const QUERY_ACCEPT: &str =
    "application/sparql-results+json, text/turtle;q=0.9, application/json;q=0.5";

/// Raw response of an endpoint, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointResponse {
    /// HTTP status code
    pub status: u16,
    /// Declared `content-type` header, parameters included
    pub content_type: Option<String>,
    /// Response body
    pub body: String,
}

impl EndpointResponse {
    /// Create a `200` response.
    pub fn ok(content_type: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: Some(content_type.into()),
            body: body.into(),
        }
    }

    /// Media type without parameters, trimmed and lower-cased.
    ///
    /// An absent header yields an empty string.
    pub fn media_type(&self) -> String {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .unwrap_or_default()
    }
}

/// A service able to answer SPARQL queries and SHACL validation requests.
///
/// Implementations are built per cell execution and dropped afterwards.
#[async_trait]
pub trait Endpoint: Send + Sync {
    /// URL of the endpoint.
    fn url(&self) -> &str;

    /// Run a SPARQL query.
    async fn query(
        &self,
        query: &str,
        execution: Option<&dyn ExecutionHandle>,
    ) -> Result<EndpointResponse, EndpointError>;

    /// Validate data against a SHACL shapes graph given as Turtle.
    async fn validate(
        &self,
        shapes: &str,
        execution: Option<&dyn ExecutionHandle>,
    ) -> Result<EndpointResponse, EndpointError>;
}

/// Builds endpoints from resolved connection parameters.
pub trait EndpointFactory: Send + Sync {
    /// Build a fresh endpoint for one execution.
    fn connect(&self, connection: &EndpointConnection) -> Result<Arc<dyn Endpoint>, EndpointError>;
}

/// SPARQL protocol endpoint over HTTP.
pub struct HttpEndpoint {
    client: reqwest::Client,
    url: String,
    user: Option<String>,
    password: Option<String>,
}

impl HttpEndpoint {
    /// Create an endpoint for a connection using the given client.
    pub fn new(client: reqwest::Client, connection: &EndpointConnection) -> Self {
        Self {
            client,
            url: connection.endpoint_url.clone(),
            user: connection.user.clone().filter(|u| !u.is_empty()),
            password: connection.password.clone(),
        }
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<EndpointResponse, EndpointError> {
        let request = match &self.user {
            Some(user) => request.basic_auth(user, self.password.as_deref()),
            None => request,
        };

        let response = request.send().await.map_err(|e| transport_error(&e))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response.text().await.map_err(|e| transport_error(&e))?;

        if !status.is_success() {
            return Err(EndpointError::new(format!(
                "Request failed with status code {}",
                status.as_u16()
            ))
            .with_response_body(body));
        }

        Ok(EndpointResponse {
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

#[async_trait]
impl Endpoint for HttpEndpoint {
    fn url(&self) -> &str {
        &self.url
    }

    async fn query(
        &self,
        query: &str,
        _execution: Option<&dyn ExecutionHandle>,
    ) -> Result<EndpointResponse, EndpointError> {
        tracing::debug!("POST query to {}", self.url);
        let request = self
            .client
            .post(&self.url)
            .header(ACCEPT, QUERY_ACCEPT)
            .form(&[("query", query)]);
        self.send(request).await
    }

    async fn validate(
        &self,
        shapes: &str,
        _execution: Option<&dyn ExecutionHandle>,
    ) -> Result<EndpointResponse, EndpointError> {
        tracing::debug!("POST shapes graph to {}", self.url);
        let request = self
            .client
            .post(&self.url)
            .header(ACCEPT, "text/turtle")
            .header(CONTENT_TYPE, "text/turtle")
            .body(shapes.to_string());
        self.send(request).await
    }
}

/// Transport failure with its causes, e.g.
/// `error sending request for url (…): client error (Connect): tcp connect error: Connection refused`.
fn transport_error(err: &(dyn std::error::Error + 'static)) -> EndpointError {
    EndpointError::new(error_chain(err))
}

/// Join an error and its sources with `": "`, skipping causes the message
/// already repeats.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !text.is_empty() && !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Factory for [`HttpEndpoint`]s. Each endpoint gets its own client.
#[derive(Debug, Clone, Default)]
pub struct HttpEndpointFactory {
    timeout: Option<Duration>,
}

impl HttpEndpointFactory {
    /// Create a factory without a request timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a timeout to every request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl EndpointFactory for HttpEndpointFactory {
    fn connect(&self, connection: &EndpointConnection) -> Result<Arc<dyn Endpoint>, EndpointError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| EndpointError::new(format!("failed to build HTTP client: {e}")))?;
        Ok(Arc::new(HttpEndpoint::new(client, connection)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_strips_parameters() {
        let response = EndpointResponse::ok("application/sparql-results+json; charset=utf-8", "{}");
        assert_eq!(response.media_type(), "application/sparql-results+json");
    }

    #[test]
    fn test_media_type_is_lower_cased() {
        let response = EndpointResponse::ok(" Text/Turtle ", "");
        assert_eq!(response.media_type(), "text/turtle");
    }

    #[test]
    fn test_missing_content_type() {
        let response = EndpointResponse {
            status: 200,
            content_type: None,
            body: String::new(),
        };
        assert_eq!(response.media_type(), "");
    }

    #[derive(Debug)]
    struct Layer {
        message: &'static str,
        source: Option<Box<Layer>>,
    }

    impl std::fmt::Display for Layer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.message)
        }
    }

    impl std::error::Error for Layer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            self.source
                .as_deref()
                .map(|s| s as &(dyn std::error::Error + 'static))
        }
    }

    #[test]
    fn test_error_chain_includes_causes() {
        let err = Layer {
            message: "builder error",
            source: Some(Box::new(Layer {
                message: "relative URL without a base",
                source: None,
            })),
        };
        assert_eq!(
            transport_error(&err).diagnostic(),
            "builder error: relative URL without a base"
        );
    }

    #[test]
    fn test_error_chain_skips_repeated_causes() {
        let err = Layer {
            message: "tcp connect error: Connection refused",
            source: Some(Box::new(Layer {
                message: "Connection refused",
                source: None,
            })),
        };
        assert_eq!(error_chain(&err), "tcp connect error: Connection refused");
    }

    #[test]
    fn test_http_factory_builds_endpoint_for_connection() {
        let factory = HttpEndpointFactory::new().with_timeout(Duration::from_secs(5));
        let endpoint = factory
            .connect(&EndpointConnection::anonymous("http://localhost:7878/query"))
            .unwrap();
        assert_eq!(endpoint.url(), "http://localhost:7878/query");
    }
}
