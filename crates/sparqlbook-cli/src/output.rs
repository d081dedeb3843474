//! Terminal rendering of cell outputs.

use std::time::UNIX_EPOCH;

use serde_json::Value;
use sparqlbook_core::ExecutionSummary;
use sparqlbook_core::output::{
    CellOutput, MARKDOWN_MIME, OutputItem, PLAIN_TEXT_MIME, SPARQL_RESULTS_JSON_MIME,
};

use crate::colors;

/// Print the outputs of one execution.
pub fn print_outputs(summary: &ExecutionSummary) {
    for output in &summary.outputs {
        for line in render_output(output).lines() {
            if summary.succeeded() {
                println!("    {line}");
            } else {
                println!("    {}{line}{}", colors::RED, colors::RESET);
            }
        }
    }
}

/// Render a cell output as text, picking the most readable item.
pub fn render_output(output: &CellOutput) -> String {
    if let Some(message) = output.error_message() {
        return format!("Error: {message}");
    }

    if let Some(OutputItem::Json { value, .. }) = output.item(SPARQL_RESULTS_JSON_MIME) {
        return render_results(value);
    }

    if let Some(OutputItem::Text { text, .. }) = output.item(PLAIN_TEXT_MIME) {
        return text.clone();
    }

    output
        .items
        .iter()
        .find_map(|item| match item {
            OutputItem::Text { mime, text } if mime != MARKDOWN_MIME => Some(text.clone()),
            _ => None,
        })
        .unwrap_or_default()
}

/// Render an ASK or SELECT result.
fn render_results(results: &Value) -> String {
    if let Some(boolean) = results.get("boolean").and_then(Value::as_bool) {
        return boolean.to_string();
    }
    format_table(results)
}

/// Lay out SELECT bindings as an aligned table.
pub fn format_table(results: &Value) -> String {
    let vars: Vec<&str> = results
        .pointer("/head/vars")
        .and_then(Value::as_array)
        .map(|vars| vars.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let rows: Vec<Vec<String>> = results
        .pointer("/results/bindings")
        .and_then(Value::as_array)
        .map(|bindings| {
            bindings
                .iter()
                .map(|binding| vars.iter().map(|var| term_text(binding.get(*var))).collect())
                .collect()
        })
        .unwrap_or_default();

    let mut widths: Vec<usize> = vars.iter().map(|v| v.chars().count() + 1).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 3);
    let header: Vec<String> = vars.iter().map(|v| format!("?{v}")).collect();
    lines.push(table_row(&header, &widths));
    lines.push(
        widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("─┼─"),
    );
    for row in &rows {
        lines.push(table_row(row, &widths));
    }
    lines.push(format!(
        "({} {})",
        rows.len(),
        if rows.len() == 1 { "row" } else { "rows" }
    ));

    lines.join("\n")
}

fn table_row(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join(" │ ")
        .trim_end()
        .to_string()
}

/// Display text of an RDF term from a SPARQL JSON binding.
fn term_text(term: Option<&Value>) -> String {
    let Some(term) = term else {
        return String::new();
    };
    let value = term.get("value").and_then(Value::as_str).unwrap_or_default();

    match term.get("type").and_then(Value::as_str) {
        Some("uri") if value.contains("://") => format!("<{value}>"),
        Some("bnode") => format!("_:{value}"),
        Some("literal") | Some("typed-literal") => {
            if let Some(lang) = term.get("xml:lang").and_then(Value::as_str) {
                format!("\"{value}\"@{lang}")
            } else {
                format!("\"{value}\"")
            }
        }
        _ => value.to_string(),
    }
}

/// JSON form of an execution, as printed by `run --json`.
pub fn summary_json(summary: &ExecutionSummary) -> Value {
    serde_json::json!({
        "cell": summary.cell_index,
        "executionOrder": summary.execution_order,
        "startedAt": summary
            .started_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default(),
        "success": summary.success,
        "durationMs": summary.duration.map(|d| d.as_millis() as u64),
        "outputs": summary.outputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_boolean() {
        let output = CellOutput::sparql_json(json!({ "head": {}, "boolean": false }));
        assert_eq!(render_output(&output), "false");
    }

    #[test]
    fn test_render_error() {
        let output = CellOutput::error("Not connected to a SPARQL Endpoint");
        assert_eq!(
            render_output(&output),
            "Error: Not connected to a SPARQL Endpoint"
        );
    }

    #[test]
    fn test_render_turtle() {
        let output = CellOutput::turtle("ex:a ex:b ex:c .");
        assert_eq!(render_output(&output), "ex:a ex:b ex:c .");
    }

    #[test]
    fn test_format_table() {
        let results = json!({
            "head": { "vars": ["s", "name"] },
            "results": { "bindings": [
                { "s": { "type": "uri", "value": "ex:alice" },
                  "name": { "type": "literal", "value": "Alice", "xml:lang": "en" } },
                { "s": { "type": "uri", "value": "http://example.org/bob" } }
            ]}
        });

        let table = format_table(&results);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("?s"));
        assert!(lines[0].contains("?name"));
        assert!(lines[2].starts_with("ex:alice"));
        assert!(lines[2].contains("\"Alice\"@en"));
        assert!(lines[3].starts_with("<http://example.org/bob>"));
        assert_eq!(lines[4], "(2 rows)");
    }

    #[test]
    fn test_format_empty_table() {
        let table = format_table(&json!({
            "head": { "vars": ["s"] },
            "results": { "bindings": [] }
        }));
        assert!(table.ends_with("(0 rows)"));
    }
}
