//! Integration tests for the HTTP endpoint.
//!
//! Each test serves exactly one canned HTTP response from a local listener
//! and checks the request the endpoint sent.

use std::sync::Arc;

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use sparqlbook_core::execute::{CellExecution, CellExecutor, EndpointFactory, HttpEndpointFactory};
use sparqlbook_core::output::{OutputItem, SPARQL_RESULTS_JSON_MIME};
use sparqlbook_core::{Cell, EndpointConnection, QueryLanguage};

// =============================================================================
// Test Helpers
// =============================================================================

/// A request as received by the local server.
struct Received {
    /// Request line and headers, header names lower-cased
    head: String,
    body: String,
}

impl Received {
    fn header(&self, name: &str) -> Option<&str> {
        let prefix = format!("{}:", name.to_ascii_lowercase());
        self.head
            .lines()
            .find_map(|line| line.strip_prefix(prefix.as_str()))
            .map(str::trim)
    }

    fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }
}

/// Canned response served once.
struct Reply {
    status: &'static str,
    content_type: Option<&'static str>,
    body: String,
}

impl Reply {
    fn ok(content_type: &'static str, body: impl Into<String>) -> Self {
        Self {
            status: "200 OK",
            content_type: Some(content_type),
            body: body.into(),
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Listen on a free local port and answer the first request with `reply`.
///
/// Returns the endpoint URL and a task yielding the received request.
async fn serve_once(reply: Reply) -> (String, JoinHandle<Received>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind local listener");
    let url = format!("http://{}/sparql", listener.local_addr().unwrap());

    let task = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("No connection");

        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let header_end = loop {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "Connection closed before the request headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = find(&buf, b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head: String = String::from_utf8_lossy(&buf[..header_end])
            .lines()
            .map(|line| match line.split_once(':') {
                Some((name, value)) => format!("{}:{}", name.to_ascii_lowercase(), value),
                None => line.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n");
        let length: usize = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);

        while buf.len() < header_end + length {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "Connection closed before the request body");
            buf.extend_from_slice(&chunk[..n]);
        }
        let body = String::from_utf8_lossy(&buf[header_end..header_end + length]).into_owned();

        let mut response = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
            reply.status,
            reply.body.len()
        );
        if let Some(content_type) = reply.content_type {
            response.push_str(&format!("Content-Type: {content_type}\r\n"));
        }
        response.push_str("\r\n");
        response.push_str(&reply.body);
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.ok();

        Received { head, body }
    });

    (url, task)
}

fn connect(connection: &EndpointConnection) -> Arc<dyn sparqlbook_core::Endpoint> {
    HttpEndpointFactory::new()
        .connect(connection)
        .expect("Failed to build endpoint")
}

// =============================================================================
// Query and Validate
// =============================================================================

#[tokio::test]
async fn test_query_is_form_encoded_post() {
    let (url, server) = serve_once(Reply::ok(
        "application/sparql-results+json; charset=utf-8",
        r#"{"head":{},"boolean":true}"#,
    ))
    .await;

    let endpoint = connect(&EndpointConnection::anonymous(url.clone()));
    let response = endpoint.query("ASK { ?s ?p ?o }", None).await.unwrap();
    let received = server.await.unwrap();

    assert_eq!(received.request_line(), "POST /sparql HTTP/1.1");
    assert_eq!(
        received.header("content-type"),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(
        received.header("accept"),
        Some("application/sparql-results+json, text/turtle;q=0.9, application/json;q=0.5")
    );
    assert_eq!(received.body, "query=ASK+%7B+%3Fs+%3Fp+%3Fo+%7D");
    assert_eq!(received.header("authorization"), None);

    assert_eq!(response.status, 200);
    assert_eq!(
        response.content_type.as_deref(),
        Some("application/sparql-results+json; charset=utf-8")
    );
    assert_eq!(response.media_type(), "application/sparql-results+json");
    assert_eq!(response.body, r#"{"head":{},"boolean":true}"#);
}

#[tokio::test]
async fn test_validate_posts_turtle() {
    let report = "[] a sh:ValidationReport ; sh:conforms true .";
    let (url, server) = serve_once(Reply::ok("text/turtle", report)).await;

    let endpoint = connect(&EndpointConnection::anonymous(url));
    let shapes = "ex:PersonShape a sh:NodeShape .";
    let response = endpoint.validate(shapes, None).await.unwrap();
    let received = server.await.unwrap();

    assert_eq!(received.request_line(), "POST /sparql HTTP/1.1");
    assert_eq!(received.header("content-type"), Some("text/turtle"));
    assert_eq!(received.header("accept"), Some("text/turtle"));
    assert_eq!(received.body, shapes);

    assert_eq!(response.media_type(), "text/turtle");
    assert_eq!(response.body, report);
}

#[tokio::test]
async fn test_basic_auth_when_user_is_configured() {
    let (url, server) = serve_once(Reply::ok("text/turtle", "")).await;

    let connection = EndpointConnection {
        name: "secured".to_string(),
        endpoint_url: url,
        user: Some("alice".to_string()),
        password: Some("secret".to_string()),
    };
    connect(&connection).query("ASK {}", None).await.unwrap();
    let received = server.await.unwrap();

    assert_eq!(
        received.header("authorization"),
        Some("Basic YWxpY2U6c2VjcmV0")
    );
}

#[tokio::test]
async fn test_missing_content_type_passes_through() {
    let (url, server) = serve_once(Reply {
        status: "200 OK",
        content_type: None,
        body: "plain".to_string(),
    })
    .await;

    let response = connect(&EndpointConnection::anonymous(url))
        .query("ASK {}", None)
        .await
        .unwrap();
    server.await.unwrap();

    assert_eq!(response.content_type, None);
    assert_eq!(response.media_type(), "");
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_error_status_carries_response_body() {
    let (url, server) = serve_once(Reply {
        status: "400 Bad Request",
        content_type: Some("text/plain"),
        body: "Parse error: unexpected token".to_string(),
    })
    .await;

    let err = connect(&EndpointConnection::anonymous(url))
        .query("SELEC nonsense", None)
        .await
        .unwrap_err();
    server.await.unwrap();

    assert_eq!(err.message, "Request failed with status code 400");
    assert_eq!(
        err.response_body.as_deref(),
        Some("Parse error: unexpected token")
    );
    assert_eq!(
        err.diagnostic(),
        "Request failed with status code 400\nParse error: unexpected token"
    );
}

#[tokio::test]
async fn test_refused_connection_reports_cause() {
    // Bind then drop to get a local port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/sparql", listener.local_addr().unwrap());
    drop(listener);

    let err = connect(&EndpointConnection::anonymous(url))
        .query("ASK {}", None)
        .await
        .unwrap_err();

    assert!(err.response_body.is_none());
    assert!(
        err.message.to_lowercase().contains("refused"),
        "cause missing from: {}",
        err.message
    );
}

#[tokio::test]
async fn test_relative_directive_reports_cause() {
    let executor = CellExecutor::new(Arc::new(HttpEndpointFactory::new()));
    let cell = Cell::code(QueryLanguage::Sparql, "# [endpoint=data.ttl]\nASK {}");
    let execution = CellExecution::start(0, 1);

    executor.execute_cell(&cell, None, &execution).await;

    let summary = execution.summary();
    assert_eq!(summary.success, Some(false));
    let message = summary.outputs[0].error_message().unwrap();
    assert!(
        message.contains("relative URL without a base"),
        "cause missing from: {message}"
    );
}

// =============================================================================
// Full Pipeline
// =============================================================================

#[tokio::test]
async fn test_select_through_http_rewrites_namespaces() {
    let results = json!({
        "head": { "vars": ["s"] },
        "results": { "bindings": [
            { "s": { "type": "uri", "value": "http://example.org/alice" } }
        ]}
    });
    let (url, server) =
        serve_once(Reply::ok(SPARQL_RESULTS_JSON_MIME, results.to_string())).await;

    let executor = CellExecutor::new(Arc::new(HttpEndpointFactory::new()));
    let cell = Cell::code(
        QueryLanguage::Sparql,
        "PREFIX ex: <http://example.org/>\nSELECT ?s WHERE { ?s a ex:Person }",
    );
    let execution = CellExecution::start(0, 1);
    let active = EndpointConnection::anonymous(url);

    executor.execute_cell(&cell, Some(&active), &execution).await;
    let received = server.await.unwrap();

    assert!(received.body.starts_with("query=PREFIX+ex%3A+"));

    let summary = execution.summary();
    assert_eq!(summary.success, Some(true));
    match summary.outputs[0].item(SPARQL_RESULTS_JSON_MIME) {
        Some(OutputItem::Json { value, .. }) => {
            assert_eq!(value["results"]["bindings"][0]["s"]["value"], "ex:alice");
        }
        other => panic!("expected SPARQL JSON item, got {other:?}"),
    }
}
