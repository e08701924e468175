//! Content extraction for binary report documents (DOCX, PDF).
//!
//! The pipeline supplies file bytes; this module returns raw display HTML
//! (DOCX) or plain text (PDF). DOCX extraction walks `word/document.xml`
//! directly and rebuilds the markup the reports actually use — paragraphs,
//! bold runs, explicit breaks, nested bullet lists — so the normalizer can
//! recognize the word-processor artifacts downstream. PDF extraction yields
//! plain text only; callers wrap it into paragraphs.

use std::io::Read;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb
/// protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Body substituted when PDF extraction fails, so a failed PDF is visibly
/// distinguishable from an empty one.
pub const PDF_PLACEHOLDER_HTML: &str = "<p><em>PDF content could not be automatically \
     extracted. Please view the original document.</em></p>";
pub const PDF_PLACEHOLDER_TEXT: &str = "PDF content not available";

/// Extraction error. Callers recover per file; nothing here aborts a run.
#[derive(Debug)]
pub enum ExtractError {
    Pdf(String),
    Ooxml(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
            ExtractError::Ooxml(e) => write!(f, "OOXML extraction failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Extract plain text from PDF bytes.
pub fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

/// Wrap blank-line-delimited text blocks into paragraph markup.
pub fn paragraphs_to_html(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", p))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract display HTML from DOCX bytes.
pub fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| ExtractError::Ooxml("word/document.xml not found".to_string()))?;
    let mut doc_xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractError::Ooxml(
            "word/document.xml exceeds size limit".to_string(),
        ));
    }
    document_xml_to_html(&doc_xml)
}

/// Tracks open `<ul>`/`<li>` nesting while paragraphs stream through.
/// One entry per open list level; the flag records whether that level has an
/// item still open (a nested list is emitted inside its parent item).
struct ListState {
    open: Vec<bool>,
}

impl ListState {
    fn new() -> Self {
        ListState { open: Vec::new() }
    }

    fn item(&mut self, html: &mut String, level: usize, inner: &str) {
        while self.open.len() > level + 1 {
            self.close_level(html);
        }
        while self.open.len() < level + 1 {
            html.push_str("<ul>");
            self.open.push(false);
        }
        if let Some(item_open) = self.open.last_mut() {
            if *item_open {
                html.push_str("</li>");
            }
            *item_open = true;
        }
        html.push_str("<li>");
        html.push_str(inner);
    }

    fn close_level(&mut self, html: &mut String) {
        if let Some(item_open) = self.open.pop() {
            if item_open {
                html.push_str("</li>");
            }
            html.push_str("</ul>");
        }
    }

    fn close_all(&mut self, html: &mut String) {
        while !self.open.is_empty() {
            self.close_level(html);
        }
    }
}

fn document_xml_to_html(xml: &[u8]) -> Result<String, ExtractError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut html = String::new();
    let mut list = ListState::new();

    // Per-paragraph state.
    let mut in_paragraph_props = false;
    let mut in_run_props = false;
    let mut in_text = false;
    let mut para_is_list = false;
    let mut para_level = 0usize;
    let mut runs: Vec<(bool, String)> = Vec::new();
    let mut run_bold = false;
    let mut run_text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => {
                    para_is_list = false;
                    para_level = 0;
                    runs.clear();
                }
                b"pPr" => in_paragraph_props = true,
                b"rPr" => in_run_props = true,
                b"numPr" if in_paragraph_props => para_is_list = true,
                b"r" => {
                    run_bold = false;
                    run_text.clear();
                }
                b"t" => in_text = true,
                b"b" if in_run_props && !in_paragraph_props => {
                    run_bold = bold_enabled(&e);
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"numPr" if in_paragraph_props => para_is_list = true,
                b"ilvl" if in_paragraph_props => {
                    para_level = attr_val(&e).and_then(|v| v.parse().ok()).unwrap_or(0);
                }
                b"b" if in_run_props && !in_paragraph_props => {
                    run_bold = bold_enabled(&e);
                }
                b"br" => run_text.push_str("<br />"),
                b"tab" => run_text.push(' '),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                run_text.push_str(&escape_html(t.unescape().unwrap_or_default().as_ref()));
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"p" => {
                    let inner = render_runs(&runs);
                    if para_is_list {
                        list.item(&mut html, para_level, &inner);
                    } else {
                        list.close_all(&mut html);
                        html.push_str("<p>");
                        html.push_str(&inner);
                        html.push_str("</p>");
                    }
                }
                b"pPr" => in_paragraph_props = false,
                b"rPr" => in_run_props = false,
                b"r" => {
                    if !run_text.is_empty() {
                        runs.push((run_bold, std::mem::take(&mut run_text)));
                    }
                }
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    list.close_all(&mut html);
    Ok(html)
}

/// `<w:b/>` turns bold on unless its `w:val` attribute disables it.
fn bold_enabled(e: &BytesStart<'_>) -> bool {
    match attr_val(e) {
        Some(v) => !matches!(v.as_str(), "0" | "false" | "none"),
        None => true,
    }
}

fn attr_val(e: &BytesStart<'_>) -> Option<String> {
    e.attributes().flatten().find_map(|a| {
        if a.key.as_ref() == b"w:val" {
            Some(String::from_utf8_lossy(a.value.as_ref()).into_owned())
        } else {
            None
        }
    })
}

/// Concatenate runs, merging adjacent runs with the same bold flag so a title
/// split across runs still reads as one `<strong>` span.
fn render_runs(runs: &[(bool, String)]) -> String {
    let mut out = String::new();
    let mut i = 0;
    while i < runs.len() {
        let bold = runs[i].0;
        let mut segment = String::new();
        while i < runs.len() && runs[i].0 == bold {
            segment.push_str(&runs[i].1);
            i += 1;
        }
        if bold {
            out.push_str("<strong>");
            out.push_str(&segment);
            out.push_str("</strong>");
        } else {
            out.push_str(&segment);
        }
    }
    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DOC_NS: &str = "xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"";

    fn docx_from_document_xml(body: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            writer
                .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            let xml = format!(
                "<?xml version=\"1.0\"?><w:document {}><w:body>{}</w:body></w:document>",
                DOC_NS, body
            );
            writer.write_all(xml.as_bytes()).unwrap();
            writer.finish().unwrap();
        }
        buf
    }

    #[test]
    fn plain_paragraph() {
        let docx = docx_from_document_xml("<w:p><w:r><w:t>Hello world</w:t></w:r></w:p>");
        assert_eq!(extract_docx(&docx).unwrap(), "<p>Hello world</p>");
    }

    #[test]
    fn bold_paragraph_becomes_strong() {
        let body = "<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Budget:</w:t></w:r></w:p>";
        let docx = docx_from_document_xml(body);
        assert_eq!(extract_docx(&docx).unwrap(), "<p><strong>Budget:</strong></p>");
    }

    #[test]
    fn adjacent_bold_runs_merge() {
        let body = "<w:p>\
            <w:r><w:rPr><w:b/></w:rPr><w:t>Bud</w:t></w:r>\
            <w:r><w:rPr><w:b/></w:rPr><w:t>get</w:t></w:r>\
            <w:r><w:t> and more</w:t></w:r>\
            </w:p>";
        let docx = docx_from_document_xml(body);
        assert_eq!(
            extract_docx(&docx).unwrap(),
            "<p><strong>Budget</strong> and more</p>"
        );
    }

    #[test]
    fn bold_disabled_by_val() {
        let body = "<w:p><w:r><w:rPr><w:b w:val=\"0\"/></w:rPr><w:t>plain</w:t></w:r></w:p>";
        let docx = docx_from_document_xml(body);
        assert_eq!(extract_docx(&docx).unwrap(), "<p>plain</p>");
    }

    #[test]
    fn list_items_nest() {
        let body = "\
            <w:p><w:pPr><w:numPr><w:ilvl w:val=\"0\"/><w:numId w:val=\"1\"/></w:numPr></w:pPr>\
                <w:r><w:t>Meetings</w:t></w:r></w:p>\
            <w:p><w:pPr><w:numPr><w:ilvl w:val=\"1\"/><w:numId w:val=\"1\"/></w:numPr></w:pPr>\
                <w:r><w:t>Met with CS faculty</w:t></w:r></w:p>\
            <w:p><w:r><w:t>After the list</w:t></w:r></w:p>";
        let docx = docx_from_document_xml(body);
        assert_eq!(
            extract_docx(&docx).unwrap(),
            "<ul><li>Meetings<ul><li>Met with CS faculty</li></ul></li></ul><p>After the list</p>"
        );
    }

    #[test]
    fn sibling_list_items_share_a_list() {
        let body = "\
            <w:p><w:pPr><w:numPr><w:ilvl w:val=\"0\"/></w:numPr></w:pPr>\
                <w:r><w:t>one</w:t></w:r></w:p>\
            <w:p><w:pPr><w:numPr><w:ilvl w:val=\"0\"/></w:numPr></w:pPr>\
                <w:r><w:t>two</w:t></w:r></w:p>";
        let docx = docx_from_document_xml(body);
        assert_eq!(
            extract_docx(&docx).unwrap(),
            "<ul><li>one</li><li>two</li></ul>"
        );
    }

    #[test]
    fn explicit_break_becomes_br_tag() {
        let body = "<w:p><w:r><w:t>line one</w:t><w:br/><w:t>line two</w:t></w:r></w:p>";
        let docx = docx_from_document_xml(body);
        assert_eq!(
            extract_docx(&docx).unwrap(),
            "<p>line one<br />line two</p>"
        );
    }

    #[test]
    fn text_is_escaped() {
        let body = "<w:p><w:r><w:t>a &lt; b &amp; c</w:t></w:r></w:p>";
        let docx = docx_from_document_xml(body);
        assert_eq!(extract_docx(&docx).unwrap(), "<p>a &lt; b &amp; c</p>");
    }

    #[test]
    fn invalid_zip_is_an_ooxml_error() {
        let err = extract_docx(b"not a zip").unwrap_err();
        assert!(matches!(err, ExtractError::Ooxml(_)));
    }

    #[test]
    fn missing_document_xml_is_an_ooxml_error() {
        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            writer
                .start_file("other.txt", zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"nothing").unwrap();
            writer.finish().unwrap();
        }
        let err = extract_docx(&buf).unwrap_err();
        assert!(matches!(err, ExtractError::Ooxml(_)));
    }

    #[test]
    fn invalid_pdf_is_a_pdf_error() {
        let err = extract_pdf(b"not a pdf").unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn paragraph_wrapping_splits_on_blank_lines() {
        let html = paragraphs_to_html("first block\n\nsecond block\n\n\n\n");
        assert_eq!(html, "<p>first block</p>\n<p>second block</p>");
    }

    #[test]
    fn paragraph_wrapping_of_empty_text() {
        assert_eq!(paragraphs_to_html(""), "");
    }
}
