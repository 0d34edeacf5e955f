//! Data model shared by the extractor, assembler, orchestrator, and sinks.
//!
//! `ContentBlock` is what the extractor produces from one page; `Document` is the accumulated
//! output that the sinks serialize.

use crate::formats::{DocumentSink, SinkError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One classified unit of extracted page content.
///
/// Text and items are never empty: the extractor drops whitespace-only elements before
/// constructing a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Heading { level: u8, text: String },
    /// `language` is empty when no `language-*` class was found.
    CodeBlock { language: String, text: String },
    ListBlock { items: Vec<String> },
    TextBlock { text: String },
}

/// Content extracted from one page, in source document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageExtract {
    pub title: String,
    pub blocks: Vec<ContentBlock>,
}

/// 24-bit RGB color used for heading runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Uppercase hex without `#`, e.g. `1F497D`.
    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Paragraph styles known to every sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphStyle {
    Normal,
    /// Monospace block (Courier New 10pt in DOCX).
    Code,
}

/// A run of text inside a paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

/// One styled element of the output document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Element {
    Heading { level: u8, text: String, color: Rgb },
    Paragraph { style: ParagraphStyle, runs: Vec<Run> },
}

impl Element {
    /// Concatenated text of the element, ignoring styling.
    pub fn plain_text(&self) -> String {
        match self {
            Element::Heading { text, .. } => text.clone(),
            Element::Paragraph { runs, .. } => runs.iter().map(|r| r.text.as_str()).collect(),
        }
    }
}

/// The accumulating output document.
///
/// Owned by the caller of [run](crate::run::run) and mutated only through
/// [append](crate::assemble::append). [Document::finalize] consumes it, so it is written at
/// most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub elements: Vec<Element>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            elements: Vec::new(),
        }
    }

    pub fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Write the document through `sink` to `path`, creating missing parent directories.
    pub fn finalize(self, sink: &dyn DocumentSink, path: &Path) -> Result<(), SinkError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| SinkError::CreateDir {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }
        sink.write(&self, path)
    }
}
