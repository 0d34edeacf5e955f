//! DOCX writer. Serializes a [Document] to a WordprocessingML package (content types, package
//! relationships, core properties, styles, and the main document part).
//!
//! Styles: `Title` (20pt, accent color), `Heading1`-`Heading6`, and `Code` (Courier New 10pt,
//! 6pt before and after). Newlines inside runs become line breaks.

use crate::assemble::TITLE_COLOR;
use crate::formats::{create_file, validate_document, DocumentSink, SinkError};
use crate::model::{Document, Element, ParagraphStyle, Rgb, Run};
use std::io::{Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
  <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
</Types>
"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>
"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>
"#;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Heading run sizes in half-points, index 0 = Heading1.
const HEADING_SIZES: [u32; 6] = [32, 26, 24, 22, 22, 22];
/// 20pt document title.
const TITLE_SIZE: u32 = 40;
/// 10pt code.
const CODE_SIZE: u32 = 20;
/// 6pt in twentieths of a point.
const CODE_SPACING: u32 = 120;

/// Writes `.docx` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxSink;

impl DocumentSink for DocxSink {
    fn write(&self, doc: &Document, path: &Path) -> Result<(), SinkError> {
        validate_document(doc)?;
        let file = create_file(path)?;
        write_docx(doc, file)?;
        Ok(())
    }
}

/// Write the full package to any seekable writer.
pub fn write_docx<W: Write + Seek>(doc: &Document, writer: W) -> Result<W, SinkError> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    write_part(&mut zip, "[Content_Types].xml", CONTENT_TYPES_XML, options)?;
    write_part(&mut zip, "_rels/.rels", PACKAGE_RELS_XML, options)?;
    write_part(&mut zip, "docProps/core.xml", &core_xml(doc), options)?;
    write_part(&mut zip, "word/_rels/document.xml.rels", DOCUMENT_RELS_XML, options)?;
    write_part(&mut zip, "word/styles.xml", &styles_xml(), options)?;
    write_part(&mut zip, "word/document.xml", &document_xml(doc), options)?;

    Ok(zip.finish()?)
}

fn write_part<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    content: &str,
    options: SimpleFileOptions,
) -> Result<(), SinkError> {
    zip.start_file(name, options)?;
    zip.write_all(content.as_bytes())?;
    Ok(())
}

fn core_xml(doc: &Document) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <dc:title>{}</dc:title>
  <dc:creator>docscrape</dc:creator>
</cp:coreProperties>
"#,
        xml_escape(&doc.title)
    )
}

fn styles_xml() -> String {
    let mut headings = String::new();
    for (i, size) in HEADING_SIZES.iter().enumerate() {
        let level = i + 1;
        headings.push_str(&format!(
            r#"  <w:style w:type="paragraph" w:styleId="Heading{level}">
    <w:name w:val="heading {level}"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:qFormat/>
    <w:pPr><w:keepNext/><w:spacing w:before="240" w:after="80"/><w:outlineLvl w:val="{outline}"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="{size}"/></w:rPr>
  </w:style>
"#,
            level = level,
            outline = i,
            size = size
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="{ns}">
  <w:docDefaults>
    <w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="22"/></w:rPr></w:rPrDefault>
    <w:pPrDefault><w:pPr><w:spacing w:after="160"/></w:pPr></w:pPrDefault>
  </w:docDefaults>
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
    <w:name w:val="Normal"/>
    <w:qFormat/>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Title">
    <w:name w:val="Title"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:qFormat/>
    <w:rPr><w:b/><w:color w:val="{title_color}"/><w:sz w:val="{title_size}"/></w:rPr>
  </w:style>
{headings}  <w:style w:type="paragraph" w:customStyle="1" w:styleId="Code">
    <w:name w:val="Code"/>
    <w:basedOn w:val="Normal"/>
    <w:pPr><w:spacing w:before="{code_spacing}" w:after="{code_spacing}"/></w:pPr>
    <w:rPr><w:rFonts w:ascii="Courier New" w:hAnsi="Courier New" w:cs="Courier New"/><w:sz w:val="{code_size}"/></w:rPr>
  </w:style>
</w:styles>
"#,
        ns = W_NS,
        title_color = TITLE_COLOR.hex(),
        title_size = TITLE_SIZE,
        headings = headings,
        code_spacing = CODE_SPACING,
        code_size = CODE_SIZE,
    )
}

fn document_xml(doc: &Document) -> String {
    let mut body = String::new();
    body.push_str(&styled_paragraph(
        "Title",
        &[Run::plain(doc.title.as_str())],
        Some((TITLE_COLOR, Some(TITLE_SIZE))),
    ));
    for el in &doc.elements {
        let xml = match el {
            Element::Heading { level, text, color } => styled_paragraph(
                &format!("Heading{}", (*level).clamp(1, 6)),
                &[Run::plain(text.as_str())],
                Some((*color, None)),
            ),
            Element::Paragraph { style, runs } => {
                let style_id = match style {
                    ParagraphStyle::Normal => "Normal",
                    ParagraphStyle::Code => "Code",
                };
                styled_paragraph(style_id, runs, None)
            }
        };
        body.push_str(&xml);
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{ns}">
  <w:body>
{body}    <w:sectPr>
      <w:pgSz w:w="12240" w:h="15840"/>
      <w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/>
    </w:sectPr>
  </w:body>
</w:document>
"#,
        ns = W_NS,
        body = body
    )
}

/// One `<w:p>` with a paragraph style; `color` applies a run color (and optional size) to
/// every run.
fn styled_paragraph(style_id: &str, runs: &[Run], color: Option<(Rgb, Option<u32>)>) -> String {
    let mut p = format!(
        "    <w:p><w:pPr><w:pStyle w:val=\"{}\"/></w:pPr>",
        style_id
    );
    for run in runs {
        p.push_str("<w:r>");
        let mut rpr = String::new();
        if run.bold {
            rpr.push_str("<w:b/>");
        }
        if let Some((rgb, size)) = color {
            rpr.push_str(&format!("<w:color w:val=\"{}\"/>", rgb.hex()));
            if let Some(sz) = size {
                rpr.push_str(&format!("<w:sz w:val=\"{}\"/>", sz));
            }
        }
        if !rpr.is_empty() {
            p.push_str("<w:rPr>");
            p.push_str(&rpr);
            p.push_str("</w:rPr>");
        }
        p.push_str(&run_content(&run.text));
        p.push_str("</w:r>");
    }
    p.push_str("</w:p>\n");
    p
}

/// Run text as `<w:t>` segments separated by `<w:br/>` (newlines) and `<w:tab/>` (tabs).
fn run_content(text: &str) -> String {
    let mut out = String::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push_str("<w:br/>");
        }
        for (j, segment) in line.trim_end_matches('\r').split('\t').enumerate() {
            if j > 0 {
                out.push_str("<w:tab/>");
            }
            if !segment.is_empty() {
                out.push_str("<w:t xml:space=\"preserve\">");
                out.push_str(&xml_escape(segment));
                out.push_str("</w:t>");
            }
        }
    }
    out
}

/// Escape markup characters and drop control characters that XML 1.0 forbids.
fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::append;
    use crate::model::{ContentBlock, PageExtract};
    use std::io::{Cursor, Read};
    use zip::read::ZipArchive;

    fn sample_doc() -> Document {
        let mut doc = Document::new("Crawl4AI Documentation");
        append(
            &mut doc,
            PageExtract {
                title: "Hooks & Auth".to_string(),
                blocks: vec![
                    ContentBlock::Heading {
                        level: 2,
                        text: "Hooks".to_string(),
                    },
                    ContentBlock::CodeBlock {
                        language: "python".to_string(),
                        text: "def hook():\n\treturn 1".to_string(),
                    },
                    ContentBlock::ListBlock {
                        items: vec!["a".to_string(), "b".to_string()],
                    },
                ],
            },
        );
        doc
    }

    fn read_part(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
        let mut s = String::new();
        archive
            .by_name(name)
            .unwrap()
            .read_to_string(&mut s)
            .unwrap();
        s
    }

    fn build(doc: &Document) -> ZipArchive<Cursor<Vec<u8>>> {
        let cursor = write_docx(doc, Cursor::new(Vec::new())).unwrap();
        ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap()
    }

    #[test]
    fn package_contains_required_parts() {
        let archive = build(&sample_doc());
        let names: Vec<String> = archive.file_names().map(String::from).collect();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "word/_rels/document.xml.rels",
            "word/styles.xml",
            "word/document.xml",
        ] {
            assert!(names.iter().any(|n| n == part), "missing {}", part);
        }
    }

    #[test]
    fn document_part_has_styles_colors_and_breaks() {
        let mut archive = build(&sample_doc());
        let xml = read_part(&mut archive, "word/document.xml");
        assert!(xml.contains(r#"<w:pStyle w:val="Title"/>"#));
        assert!(xml.contains(r#"<w:color w:val="1F497D"/><w:sz w:val="40"/>"#));
        assert!(xml.contains("Hooks &amp; Auth"));
        assert!(xml.contains(r#"<w:pStyle w:val="Heading2"/>"#));
        assert!(xml.contains(r#"<w:color w:val="00008B"/>"#));
        assert!(xml.contains(r#"<w:pStyle w:val="Code"/>"#));
        assert!(xml.contains(
            r#"<w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">Language: python</w:t><w:br/></w:r>"#
        ));
        assert!(xml.contains(
            r#"<w:t xml:space="preserve">def hook():</w:t><w:br/><w:tab/><w:t xml:space="preserve">return 1</w:t>"#
        ));
        assert!(xml.contains(r#"<w:t xml:space="preserve">2. b</w:t>"#));
    }

    #[test]
    fn styles_part_defines_code_and_headings() {
        let mut archive = build(&sample_doc());
        let xml = read_part(&mut archive, "word/styles.xml");
        assert!(xml.contains(r#"w:styleId="Code""#));
        assert!(xml.contains(r#"w:ascii="Courier New""#));
        assert!(xml.contains(r#"<w:spacing w:before="120" w:after="120"/>"#));
        for level in 1..=6 {
            assert!(xml.contains(&format!(r#"w:styleId="Heading{}""#, level)));
        }
    }

    #[test]
    fn core_properties_carry_title() {
        let mut archive = build(&sample_doc());
        let xml = read_part(&mut archive, "docProps/core.xml");
        assert!(xml.contains("<dc:title>Crawl4AI Documentation</dc:title>"));
    }

    #[test]
    fn xml_escape_drops_forbidden_control_chars() {
        assert_eq!(xml_escape("a\u{1}b<c>"), "ab&lt;c&gt;");
        assert_eq!(xml_escape("it's \"q\""), "it&apos;s &quot;q&quot;");
    }

    #[test]
    fn docx_sink_writes_file() -> Result<(), SinkError> {
        let path = std::env::temp_dir().join("docscrape_test.docx");
        DocxSink.write(&sample_doc(), &path)?;
        let file = std::fs::File::open(&path)?;
        let archive = ZipArchive::new(file)?;
        assert!(archive.file_names().any(|n| n == "word/document.xml"));
        std::fs::remove_file(&path).ok();
        Ok(())
    }

    #[test]
    fn docx_sink_rejects_empty_title() {
        let path = std::env::temp_dir().join("docscrape_void.docx");
        assert!(matches!(
            DocxSink.write(&Document::new(""), &path),
            Err(SinkError::EmptyTitle)
        ));
    }
}
