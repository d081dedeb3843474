//! Markdown documents as notebooks.
//!
//! Fenced blocks tagged `sparql` or `shacl` (any case) become code cells;
//! everything else, including fences in other languages, stays markdown.
//!
//! ````text
//! # Title                 ──► Markup  "# Title"
//!
//! ```sparql               ──► Code    sparql "SELECT * WHERE { ?s ?p ?o }"
//! SELECT * WHERE { ?s ?p ?o }
//! ```
//!
//! ```python               ──► Markup  "```python\nprint(1)\n```"
//! print(1)
//! ```
//! ````
//!
//! Parsing never fails: unterminated fences are kept as markdown text.

use sparqlbook_core::{Cell, Notebook, QueryLanguage};

const FENCE: &str = "```";

/// A run of the document, before conversion to a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    /// Markdown text, trimmed.
    Markdown(String),

    /// Fenced block in a language the pipeline executes.
    Code {
        language: QueryLanguage,
        content: String,
    },
}

/// Fence currently being collected.
struct OpenFence<'a> {
    /// The opening line, as written
    open_line: &'a str,
    /// Tag after the backticks, as written
    tag: &'a str,
    body: Vec<&'a str>,
}

/// Single left-to-right scan over the lines of a document.
#[derive(Default)]
struct SectionScanner<'a> {
    sections: Vec<Section>,
    markdown: Vec<&'a str>,
    fence: Option<OpenFence<'a>>,
}

impl<'a> SectionScanner<'a> {
    fn line(&mut self, line: &'a str) {
        if let Some(fence) = self.fence.as_mut() {
            if line == FENCE {
                self.close_fence();
            } else {
                fence.body.push(line);
            }
            return;
        }

        match fence_open_tag(line) {
            Some(tag) => {
                self.flush_markdown();
                self.fence = Some(OpenFence {
                    open_line: line,
                    tag,
                    body: Vec::new(),
                });
            }
            None => self.markdown.push(line),
        }
    }

    fn close_fence(&mut self) {
        let Some(fence) = self.fence.take() else {
            return;
        };
        let content = fence.body.join("\n");

        let section = match QueryLanguage::from_tag(fence.tag) {
            Some(language) => Section::Code { language, content },
            None => Section::Markdown(format!("{FENCE}{}\n{content}\n{FENCE}", fence.tag)),
        };
        self.sections.push(section);
    }

    fn flush_markdown(&mut self) {
        if self.markdown.is_empty() {
            return;
        }
        let text = self.markdown.join("\n");
        self.markdown.clear();

        let text = text.trim();
        if !text.is_empty() {
            self.sections.push(Section::Markdown(text.to_string()));
        }
    }

    fn finish(mut self) -> Vec<Section> {
        if let Some(fence) = self.fence.take() {
            tracing::debug!("Unterminated {} fence kept as markdown", fence.tag);
            self.markdown.push(fence.open_line);
            self.markdown.extend(fence.body);
        }
        self.flush_markdown();
        self.sections
    }
}

/// Tag of a fence-opening line: three backticks followed only by word characters.
fn fence_open_tag(line: &str) -> Option<&str> {
    let tag = line.strip_prefix(FENCE)?;
    tag.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
        .then_some(tag)
}

/// Split a document into sections.
pub fn parse_sections(text: &str) -> Vec<Section> {
    let mut scanner = SectionScanner::default();
    for line in text.split('\n') {
        scanner.line(line.strip_suffix('\r').unwrap_or(line));
    }
    scanner.finish()
}

/// Decode a markdown document into a notebook.
///
/// Invalid UTF-8 is replaced rather than rejected and a leading byte order
/// mark is dropped.
pub fn deserialize_markdown(bytes: &[u8]) -> Notebook {
    let text = String::from_utf8_lossy(bytes);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let cells = parse_sections(text)
        .into_iter()
        .map(|section| match section {
            Section::Markdown(content) => Cell::markup(content),
            Section::Code { language, content } => Cell::code(language, content),
        })
        .collect();

    Notebook::new(cells)
}

/// Encode a notebook as a markdown document.
///
/// Code cells are fenced with their language, every cell is followed by a
/// blank line, and trailing newlines collapse to one.
pub fn serialize_markdown(notebook: &Notebook) -> Vec<u8> {
    let mut parts: Vec<String> = Vec::with_capacity(notebook.cells.len() * 4);

    for cell in &notebook.cells {
        if cell.is_code() {
            parts.push(format!("{FENCE}{}", cell.code_language()));
            parts.push(cell.content.clone());
            parts.push(FENCE.to_string());
        } else {
            parts.push(cell.content.clone());
        }
        parts.push(String::new());
    }

    let markdown = parts.join("\n");
    let body = markdown.trim_end_matches('\n');
    if body.len() == markdown.len() {
        markdown.into_bytes()
    } else {
        format!("{body}\n").into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparqlbook_core::CellKind;

    fn markdown(text: &str) -> Section {
        Section::Markdown(text.to_string())
    }

    fn code(language: QueryLanguage, content: &str) -> Section {
        Section::Code {
            language,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_parse_markdown_and_query() {
        let text = "# Test Document\n\nThis is some introductory text.\n\n\
                    ```sparql\nSELECT * WHERE { ?s ?p ?o }\n```\n\n\
                    Some more text after the query.\n";

        assert_eq!(
            parse_sections(text),
            vec![
                markdown("# Test Document\n\nThis is some introductory text."),
                code(QueryLanguage::Sparql, "SELECT * WHERE { ?s ?p ?o }"),
                markdown("Some more text after the query."),
            ]
        );
    }

    #[test]
    fn test_parse_case_variants() {
        let text = "```SPARQL\nASK {}\n```\n```Shacl\nex:S a sh:NodeShape .\n```";

        assert_eq!(
            parse_sections(text),
            vec![
                code(QueryLanguage::Sparql, "ASK {}"),
                code(QueryLanguage::Shacl, "ex:S a sh:NodeShape ."),
            ]
        );
    }

    #[test]
    fn test_other_languages_stay_markdown() {
        let text = "```python\nprint('hi')\n```\n\n```\nplain\n```";

        assert_eq!(
            parse_sections(text),
            vec![
                markdown("```python\nprint('hi')\n```"),
                markdown("```\nplain\n```"),
            ]
        );
    }

    #[test]
    fn test_fence_with_trailing_text_is_not_a_fence() {
        let text = "```sparql title=\"q\"\nASK {}\n```";

        // The first line is text; the lone ``` then opens an untagged fence
        // that is never closed.
        let sections = parse_sections(text);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0], markdown("```sparql title=\"q\"\nASK {}"));
        assert_eq!(sections[1], markdown("```"));
    }

    #[test]
    fn test_unterminated_fence_is_kept() {
        let text = "Intro\n\n```sparql\nSELECT *\nWHERE { ?s ?p ?o }";

        assert_eq!(
            parse_sections(text),
            vec![
                markdown("Intro"),
                markdown("```sparql\nSELECT *\nWHERE { ?s ?p ?o }"),
            ]
        );
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = "# T\r\n\r\n```sparql\r\nASK {}\r\n```\r\n";
        assert_eq!(
            parse_sections(text),
            vec![markdown("# T"), code(QueryLanguage::Sparql, "ASK {}")]
        );
    }

    #[test]
    fn test_empty_code_block() {
        assert_eq!(
            parse_sections("```sparql\n```"),
            vec![code(QueryLanguage::Sparql, "")]
        );
    }

    #[test]
    fn test_empty_input_has_no_cells() {
        assert!(deserialize_markdown(b"").is_empty());
        assert!(deserialize_markdown(b"\n\n   \n").is_empty());
    }

    #[test]
    fn test_deserialize_cell_kinds() {
        let notebook = deserialize_markdown(b"# Title\n\n```shacl\nex:S a sh:NodeShape .\n```\n");

        assert_eq!(notebook.len(), 2);
        assert_eq!(notebook.cells[0].kind, CellKind::Markup);
        assert_eq!(notebook.cells[0].language_id(), "markdown");
        assert_eq!(notebook.cells[1].kind, CellKind::Code);
        assert_eq!(notebook.cells[1].language, Some(QueryLanguage::Shacl));
    }

    #[test]
    fn test_deserialize_invalid_utf8() {
        let notebook = deserialize_markdown(&[0x66, 0x6f, 0xff, 0x6f]);
        assert_eq!(notebook.len(), 1);
        assert_eq!(notebook.cells[0].content, "fo\u{fffd}o");
    }

    #[test]
    fn test_serialize_layout() {
        let notebook = Notebook::new(vec![
            Cell::markup("# Title"),
            Cell::code(QueryLanguage::Sparql, "ASK {}"),
        ]);

        let text = String::from_utf8(serialize_markdown(&notebook)).unwrap();
        assert_eq!(text, "# Title\n\n```sparql\nASK {}\n```\n");
    }

    #[test]
    fn test_serialize_unset_language_as_sparql() {
        let mut cell = Cell::code(QueryLanguage::Shacl, "ASK {}");
        cell.language = None;

        let text = String::from_utf8(serialize_markdown(&Notebook::new(vec![cell]))).unwrap();
        assert_eq!(text, "```sparql\nASK {}\n```\n");
    }

    #[test]
    fn test_serialize_empty_notebook() {
        assert!(serialize_markdown(&Notebook::default()).is_empty());
    }
}
