//! Content extraction. Picks the main content container of a page and classifies its
//! headings, paragraphs, lists, and code into [ContentBlock]s in document order.
//!
//! Nested matches (a `<code>` inside a `<pre>`, a list inside a paragraph) are each visited
//! once in traversal order and may produce overlapping blocks; no dedup is attempted.

pub mod text;

use crate::model::ContentBlock;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

pub use text::normalize;

/// Candidate content containers, highest priority first. `body` is the last resort.
const CONTAINER_SELECTORS: [&str; 5] = ["div.md-content", "article", "main", "div.content", "body"];

/// Elements that produce content blocks.
const CONTENT_SELECTOR: &str = "h1, h2, h3, h4, p, pre, ul, ol, code";

const LANGUAGE_CLASS_PREFIX: &str = "language-";

/// Why a page yielded no usable content.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No content container found (tried {}).", CONTAINER_SELECTORS.join(", "))]
    NoContainer,

    #[error("Content container <{container}> yielded no content blocks.")]
    NoBlocks { container: String },

    #[error("Invalid selector {selector:?}: {message}")]
    Selector { selector: String, message: String },
}

/// Parse a CSS selector or return an error (avoids panics from Selector::parse).
fn parse_selector(sel: &str) -> Result<Selector, ExtractError> {
    Selector::parse(sel).map_err(|e| ExtractError::Selector {
        selector: sel.to_string(),
        message: e.to_string(),
    })
}

/// Extract content blocks from a full HTML document.
///
/// Returns [ExtractError::NoContainer] or [ExtractError::NoBlocks] when nothing usable was
/// found; both count as "no content" for the caller.
pub fn extract(html: &str) -> Result<Vec<ContentBlock>, ExtractError> {
    let doc = Html::parse_document(html);
    let root = select_container(&doc)?.ok_or(ExtractError::NoContainer)?;
    let container = root.value().name().to_string();
    tracing::debug!(html_len = html.len(), %container, "found content container");

    let content_sel = parse_selector(CONTENT_SELECTOR)?;
    let blocks: Vec<ContentBlock> = root.select(&content_sel).filter_map(classify).collect();
    tracing::debug!(blocks = blocks.len(), "extracted content blocks");

    if blocks.is_empty() {
        return Err(ExtractError::NoBlocks { container });
    }
    Ok(blocks)
}

/// First container (in priority order) that exists and has at least one child node.
fn select_container(doc: &Html) -> Result<Option<ElementRef<'_>>, ExtractError> {
    for sel in CONTAINER_SELECTORS {
        let selector = parse_selector(sel)?;
        if let Some(el) = doc.select(&selector).next() {
            if el.has_children() {
                return Ok(Some(el));
            }
        }
    }
    Ok(None)
}

/// Map one matched element to a block, or None when its content is empty.
fn classify(el: ElementRef<'_>) -> Option<ContentBlock> {
    let name = el.value().name();
    match name {
        "h1" | "h2" | "h3" | "h4" => {
            let level = name[1..].parse().ok()?;
            let text = normalize(&el.text().collect::<String>());
            (!text.is_empty()).then_some(ContentBlock::Heading { level, text })
        }
        "pre" | "code" => {
            let raw = el.text().collect::<String>();
            let text = raw.trim();
            if text.is_empty() {
                return None;
            }
            Some(ContentBlock::CodeBlock {
                language: code_language(el),
                text: text.to_string(),
            })
        }
        "ul" | "ol" => {
            let items: Vec<String> = el
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|child| child.value().name() == "li")
                .map(|li| normalize(&li.text().collect::<String>()))
                .filter(|item| !item.is_empty())
                .collect();
            (!items.is_empty()).then_some(ContentBlock::ListBlock { items })
        }
        "p" => {
            let text = normalize(&el.text().collect::<String>());
            (!text.is_empty()).then_some(ContentBlock::TextBlock { text })
        }
        _ => None,
    }
}

/// Language from the first `language-<name>` class on the element itself, else empty.
fn code_language(el: ElementRef<'_>) -> String {
    el.value()
        .classes()
        .find_map(|c| c.strip_prefix(LANGUAGE_CLASS_PREFIX))
        .unwrap_or_default()
        .to_string()
}
