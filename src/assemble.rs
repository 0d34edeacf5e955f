//! Document assembly. Appends one section (title heading plus its blocks) per extracted page.

use crate::model::{ContentBlock, Document, Element, PageExtract, ParagraphStyle, Rgb, Run};

/// Color of section title headings (and the document title).
pub const TITLE_COLOR: Rgb = Rgb(31, 73, 125);
/// Color of headings found inside a page.
pub const HEADING_COLOR: Rgb = Rgb(0, 0, 139);

/// Append `extract` to `doc` as a level-1 title heading followed by one or more elements per
/// block, in block order.
pub fn append(doc: &mut Document, extract: PageExtract) {
    doc.push(Element::Heading {
        level: 1,
        text: extract.title,
        color: TITLE_COLOR,
    });
    for block in extract.blocks {
        match block {
            ContentBlock::Heading { level, text } => doc.push(Element::Heading {
                level,
                text,
                color: HEADING_COLOR,
            }),
            ContentBlock::CodeBlock { language, text } => {
                let mut runs = Vec::with_capacity(2);
                if !language.is_empty() {
                    runs.push(Run::bold(format!("Language: {}\n", language)));
                }
                runs.push(Run::plain(text));
                doc.push(Element::Paragraph {
                    style: ParagraphStyle::Code,
                    runs,
                });
            }
            // Numbered by hand, not as a native list.
            ContentBlock::ListBlock { items } => {
                for (i, item) in items.into_iter().enumerate() {
                    doc.push(paragraph(format!("{}. {}", i + 1, item)));
                }
            }
            ContentBlock::TextBlock { text } => doc.push(paragraph(text)),
        }
    }
}

fn paragraph(text: String) -> Element {
    Element::Paragraph {
        style: ParagraphStyle::Normal,
        runs: vec![Run::plain(text)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract_of(blocks: Vec<ContentBlock>) -> PageExtract {
        PageExtract {
            title: "Quick Start".to_string(),
            blocks,
        }
    }

    #[test]
    fn section_starts_with_colored_title_heading() {
        let mut doc = Document::new("Docs");
        append(&mut doc, extract_of(Vec::new()));
        assert_eq!(
            doc.elements,
            vec![Element::Heading {
                level: 1,
                text: "Quick Start".to_string(),
                color: TITLE_COLOR
            }]
        );
    }

    #[test]
    fn list_items_become_numbered_paragraphs() {
        let mut doc = Document::new("Docs");
        append(
            &mut doc,
            extract_of(vec![ContentBlock::ListBlock {
                items: vec!["a".to_string(), "b".to_string()],
            }]),
        );
        assert_eq!(
            &doc.elements[1..],
            &[paragraph("1. a".to_string()), paragraph("2. b".to_string())]
        );
    }

    #[test]
    fn code_block_with_language_gets_bold_label() {
        let mut doc = Document::new("Docs");
        append(
            &mut doc,
            extract_of(vec![
                ContentBlock::CodeBlock {
                    language: "python".to_string(),
                    text: "import os".to_string(),
                },
                ContentBlock::CodeBlock {
                    language: String::new(),
                    text: "ls -la".to_string(),
                },
            ]),
        );
        assert_eq!(
            doc.elements[1],
            Element::Paragraph {
                style: ParagraphStyle::Code,
                runs: vec![Run::bold("Language: python\n"), Run::plain("import os")],
            }
        );
        assert_eq!(
            doc.elements[2],
            Element::Paragraph {
                style: ParagraphStyle::Code,
                runs: vec![Run::plain("ls -la")],
            }
        );
    }

    #[test]
    fn headings_keep_level_and_use_heading_color() {
        let mut doc = Document::new("Docs");
        append(
            &mut doc,
            extract_of(vec![
                ContentBlock::Heading {
                    level: 3,
                    text: "Options".to_string(),
                },
                ContentBlock::TextBlock {
                    text: "Some text.".to_string(),
                },
            ]),
        );
        assert_eq!(
            doc.elements[1..],
            [
                Element::Heading {
                    level: 3,
                    text: "Options".to_string(),
                    color: HEADING_COLOR
                },
                paragraph("Some text.".to_string()),
            ]
        );
    }

    #[test]
    fn sections_accumulate_in_append_order() {
        let mut doc = Document::new("Docs");
        append(&mut doc, extract_of(Vec::new()));
        append(
            &mut doc,
            PageExtract {
                title: "Second".to_string(),
                blocks: Vec::new(),
            },
        );
        let titles: Vec<String> = doc.elements.iter().map(Element::plain_text).collect();
        assert_eq!(titles, vec!["Quick Start", "Second"]);
    }
}
