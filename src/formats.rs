//! Document sinks. [DocumentSink] serializes the assembled [Document] to one file; this module
//! holds the trait, its error type, and the single-file HTML, Markdown, text, and JSON sinks.
//! The DOCX sink lives in [crate::docx].

use crate::docx::DocxSink;
use crate::model::{Document, Element, ParagraphStyle, Run};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Output format selector for the CLI and config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Docx,
    Html,
    Markdown,
    Text,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Docx => "docx",
            OutputFormat::Html => "html",
            OutputFormat::Markdown => "md",
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
        }
    }

    /// Parse a format name (case-insensitive; `md` and `txt` accepted as aliases).
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "docx" | "word" => Ok(OutputFormat::Docx),
            "html" => Ok(OutputFormat::Html),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!(
                "Invalid format: '{}'. Use docx, html, markdown, text, or json.",
                s
            )),
        }
    }
}

/// Errors from writing the final document. These are not recovered: the run ends with them.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Cannot write document: title is empty.")]
    EmptyTitle,

    #[error("Failed to create output directory: {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create output file: {path}: {source}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output: {0}")]
    Write(#[from] std::io::Error),

    #[error("Failed to write DOCX archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serializes a finished document to a file. Called once per run, through
/// [Document::finalize](crate::model::Document::finalize).
pub trait DocumentSink {
    fn write(&self, doc: &Document, path: &Path) -> Result<(), SinkError>;
}

/// Sink for `format`.
pub fn sink_for(format: OutputFormat) -> Box<dyn DocumentSink> {
    match format {
        OutputFormat::Docx => Box::new(DocxSink),
        OutputFormat::Html => Box::new(HtmlSink),
        OutputFormat::Markdown => Box::new(MarkdownSink),
        OutputFormat::Text => Box::new(TextSink),
        OutputFormat::Json => Box::new(JsonSink),
    }
}

pub(crate) fn validate_document(doc: &Document) -> Result<(), SinkError> {
    if doc.title.trim().is_empty() {
        return Err(SinkError::EmptyTitle);
    }
    Ok(())
}

pub(crate) fn create_file(path: &Path) -> Result<File, SinkError> {
    File::create(path).map_err(|e| SinkError::CreateFile {
        path: path.to_path_buf(),
        source: e,
    })
}

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Language named by a bold `Language: <name>` label run, if the paragraph has one.
fn code_language(runs: &[Run]) -> Option<&str> {
    runs.iter()
        .find(|r| r.bold)
        .and_then(|r| r.text.trim().strip_prefix("Language: "))
}

/// Single HTML page with inline styles mirroring the DOCX look.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlSink;

impl DocumentSink for HtmlSink {
    fn write(&self, doc: &Document, path: &Path) -> Result<(), SinkError> {
        validate_document(doc)?;
        let mut f = BufWriter::new(create_file(path)?);
        let title_esc = html_escape(&doc.title);

        writeln!(f, r#"<!DOCTYPE html>"#)?;
        writeln!(f, r#"<html lang="en">"#)?;
        writeln!(f, r#"<head>"#)?;
        writeln!(f, r#"  <meta charset="UTF-8"/>"#)?;
        writeln!(f, r#"  <title>{}</title>"#, title_esc)?;
        writeln!(
            f,
            r#"  <style>pre.code {{ font-family: "Courier New", monospace; font-size: 10pt; margin: 6pt 0; white-space: pre-wrap; }}</style>"#
        )?;
        writeln!(f, r#"</head>"#)?;
        writeln!(f, r#"<body>"#)?;
        writeln!(
            f,
            r#"  <h1 class="document-title" style="color: #{}; font-size: 20pt;">{}</h1>"#,
            crate::assemble::TITLE_COLOR.hex(),
            title_esc
        )?;

        for el in &doc.elements {
            match el {
                Element::Heading { level, text, color } => {
                    let level = (*level).clamp(1, 6);
                    writeln!(
                        f,
                        r#"  <h{l} style="color: #{c};">{t}</h{l}>"#,
                        l = level,
                        c = color.hex(),
                        t = html_escape(text)
                    )?;
                }
                Element::Paragraph { style, runs } => {
                    let body: String = runs.iter().map(html_run).collect();
                    match style {
                        ParagraphStyle::Normal => writeln!(f, "  <p>{}</p>", body)?,
                        ParagraphStyle::Code => writeln!(f, r#"  <pre class="code">{}</pre>"#, body)?,
                    }
                }
            }
        }

        writeln!(f, r#"</body>"#)?;
        writeln!(f, r#"</html>"#)?;
        f.flush()?;
        Ok(())
    }
}

fn html_run(run: &Run) -> String {
    let text = html_escape(&run.text);
    if run.bold {
        format!("<strong>{}</strong>", text)
    } else {
        text
    }
}

/// Markdown file. The document title is the only `#` heading; element headings shift down one
/// level (capped at `######`). Code paragraphs become fenced blocks.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownSink;

impl DocumentSink for MarkdownSink {
    fn write(&self, doc: &Document, path: &Path) -> Result<(), SinkError> {
        validate_document(doc)?;
        let mut f = BufWriter::new(create_file(path)?);

        writeln!(f, "# {}", doc.title)?;
        writeln!(f)?;
        for el in &doc.elements {
            match el {
                Element::Heading { level, text, .. } => {
                    let hashes = "#".repeat(usize::from(*level).saturating_add(1).min(6));
                    writeln!(f, "{} {}", hashes, markdown_escape_inline(text))?;
                }
                Element::Paragraph {
                    style: ParagraphStyle::Normal,
                    runs,
                } => {
                    let line: String = runs
                        .iter()
                        .map(|r| {
                            let text = markdown_escape_inline(r.text.trim_end_matches('\n'));
                            if r.bold {
                                format!("**{}**", text.trim())
                            } else {
                                text
                            }
                        })
                        .collect();
                    writeln!(f, "{}", markdown_escape_block_start(line))?;
                }
                Element::Paragraph {
                    style: ParagraphStyle::Code,
                    runs,
                } => {
                    let language = code_language(runs);
                    if let Some(lang) = language {
                        writeln!(f, "**Language: {}**", lang)?;
                        writeln!(f)?;
                    }
                    let code: String = runs
                        .iter()
                        .filter(|r| !r.bold)
                        .map(|r| r.text.as_str())
                        .collect();
                    let fence = if code.contains("```") { "~~~" } else { "```" };
                    writeln!(f, "{}{}", fence, language.unwrap_or_default())?;
                    writeln!(f, "{}", code)?;
                    writeln!(f, "{}", fence)?;
                }
            }
            writeln!(f)?;
        }
        f.flush()?;
        Ok(())
    }
}

/// Backslash-escape characters that start emphasis, code spans, links, or inline HTML.
fn markdown_escape_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_' | '`' | '[' | ']' | '<') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape a leading heading, quote, bullet, or setext marker so the line stays a paragraph.
/// Ordered-list prefixes are left alone: list items are written as `1. item` on purpose.
fn markdown_escape_block_start(mut line: String) -> String {
    if line.starts_with(&['#', '>', '-', '+', '='][..]) {
        line.insert(0, '\\');
    }
    line
}

/// Plain-text file: underlined title, headings set off by blank lines, code indented.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextSink;

impl DocumentSink for TextSink {
    fn write(&self, doc: &Document, path: &Path) -> Result<(), SinkError> {
        validate_document(doc)?;
        let mut f = BufWriter::new(create_file(path)?);

        writeln!(f, "{}", doc.title)?;
        writeln!(f, "{}", "=".repeat(doc.title.chars().count()))?;
        for el in &doc.elements {
            writeln!(f)?;
            match el {
                Element::Heading { level: 1, text, .. } => {
                    writeln!(f, "{}", text)?;
                    writeln!(f, "{}", "-".repeat(text.chars().count()))?;
                }
                Element::Heading { text, .. } => writeln!(f, "{}", text)?,
                Element::Paragraph {
                    style: ParagraphStyle::Normal,
                    ..
                } => writeln!(f, "{}", el.plain_text())?,
                Element::Paragraph {
                    style: ParagraphStyle::Code,
                    ..
                } => {
                    for line in el.plain_text().lines() {
                        writeln!(f, "    {}", line)?;
                    }
                }
            }
        }
        f.flush()?;
        Ok(())
    }
}

/// The document model as pretty-printed JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSink;

impl DocumentSink for JsonSink {
    fn write(&self, doc: &Document, path: &Path) -> Result<(), SinkError> {
        validate_document(doc)?;
        let mut f = BufWriter::new(create_file(path)?);
        serde_json::to_writer_pretty(&mut f, doc)?;
        writeln!(f)?;
        f.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::append;
    use crate::model::{ContentBlock, PageExtract};

    fn sample_doc() -> Document {
        let mut doc = Document::new("Test Docs");
        append(
            &mut doc,
            PageExtract {
                title: "Quick Start".to_string(),
                blocks: vec![
                    ContentBlock::Heading {
                        level: 2,
                        text: "Install".to_string(),
                    },
                    ContentBlock::TextBlock {
                        text: "Use <pip> & go.".to_string(),
                    },
                    ContentBlock::CodeBlock {
                        language: "bash".to_string(),
                        text: "pip install crawl4ai\ncrawl4ai-setup".to_string(),
                    },
                    ContentBlock::ListBlock {
                        items: vec!["a".to_string(), "b".to_string()],
                    },
                ],
            },
        );
        doc
    }

    fn write_and_read(sink: &dyn DocumentSink, name: &str) -> Result<String, SinkError> {
        let path = std::env::temp_dir().join(name);
        sink.write(&sample_doc(), &path)?;
        let out = std::fs::read_to_string(&path)?;
        std::fs::remove_file(&path).ok();
        Ok(out)
    }

    #[test]
    fn html_escapes_text_and_styles_headings() -> Result<(), SinkError> {
        let html = write_and_read(&HtmlSink, "docscrape_test.html")?;
        assert!(html.contains("<title>Test Docs</title>"));
        assert!(html.contains(r#"<h1 style="color: #1F497D;">Quick Start</h1>"#));
        assert!(html.contains(r#"<h2 style="color: #00008B;">Install</h2>"#));
        assert!(html.contains("<p>Use &lt;pip&gt; &amp; go.</p>"));
        assert!(html.contains("<strong>Language: bash\n</strong>pip install crawl4ai\ncrawl4ai-setup"));
        assert!(html.contains("<p>2. b</p>"));
        Ok(())
    }

    #[test]
    fn markdown_fences_code_with_language() -> Result<(), SinkError> {
        let md = write_and_read(&MarkdownSink, "docscrape_test.md")?;
        assert!(md.starts_with("# Test Docs\n"));
        assert!(md.contains("\n## Quick Start\n"));
        assert!(md.contains("\n### Install\n"));
        assert!(md.contains("**Language: bash**\n\n```bash\npip install crawl4ai\ncrawl4ai-setup\n```\n"));
        assert!(md.contains("1. a\n"));
        Ok(())
    }

    #[test]
    fn markdown_escapes_paragraph_markup() -> Result<(), SinkError> {
        let mut doc = Document::new("Escapes");
        append(
            &mut doc,
            PageExtract {
                title: "Tips".to_string(),
                blocks: vec![
                    ContentBlock::TextBlock {
                        text: "# not a heading".to_string(),
                    },
                    ContentBlock::TextBlock {
                        text: "pass *args to my_func".to_string(),
                    },
                    ContentBlock::TextBlock {
                        text: "- not a bullet".to_string(),
                    },
                    ContentBlock::ListBlock {
                        items: vec!["keep_numbering".to_string()],
                    },
                ],
            },
        );
        let path = std::env::temp_dir().join("docscrape_escape_test.md");
        MarkdownSink.write(&doc, &path)?;
        let md = std::fs::read_to_string(&path)?;
        std::fs::remove_file(&path).ok();
        assert!(md.contains("\n\\# not a heading\n"));
        assert!(md.contains("\npass \\*args to my\\_func\n"));
        assert!(md.contains("\n\\- not a bullet\n"));
        assert!(md.contains("\n1. keep\\_numbering\n"));
        Ok(())
    }

    #[test]
    fn text_indents_code_and_has_no_markup() -> Result<(), SinkError> {
        let txt = write_and_read(&TextSink, "docscrape_test.txt")?;
        assert!(txt.starts_with("Test Docs\n=========\n"));
        assert!(txt.contains("Quick Start\n-----------\n"));
        assert!(txt.contains("    pip install crawl4ai\n    crawl4ai-setup\n"));
        assert!(!txt.contains("<p>"));
        Ok(())
    }

    #[test]
    fn json_round_trips_document() -> Result<(), SinkError> {
        let json = write_and_read(&JsonSink, "docscrape_test.json")?;
        let back: Document = serde_json::from_str(&json)?;
        assert_eq!(back, sample_doc());
        Ok(())
    }

    #[test]
    fn empty_title_is_rejected() {
        let doc = Document::new("  ");
        let path = std::env::temp_dir().join("docscrape_void.html");
        assert!(matches!(
            HtmlSink.write(&doc, &path),
            Err(SinkError::EmptyTitle)
        ));
    }

    #[test]
    fn finalize_creates_intermediate_directories() -> Result<(), SinkError> {
        let dir = std::env::temp_dir().join("docscrape_finalize_test");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("a").join("b").join("out.md");
        sample_doc().finalize(&MarkdownSink, &path)?;
        assert!(path.exists());
        std::fs::remove_dir_all(&dir).ok();
        Ok(())
    }

    #[test]
    fn parse_format_names_and_aliases() {
        assert_eq!(OutputFormat::parse("DOCX"), Ok(OutputFormat::Docx));
        assert_eq!(OutputFormat::parse("md"), Ok(OutputFormat::Markdown));
        assert_eq!(OutputFormat::parse("txt"), Ok(OutputFormat::Text));
        assert_eq!(OutputFormat::parse("json"), Ok(OutputFormat::Json));
        assert!(OutputFormat::parse("pdf").is_err());
    }

    #[test]
    fn extension_for_each_format() {
        assert_eq!(OutputFormat::Docx.extension(), "docx");
        assert_eq!(OutputFormat::Html.extension(), "html");
        assert_eq!(OutputFormat::Markdown.extension(), "md");
        assert_eq!(OutputFormat::Text.extension(), "txt");
        assert_eq!(OutputFormat::Json.extension(), "json");
    }
}
