//! DOCX reader. A DOCX file is a ZIP archive; the body text lives in
//! `word/document.xml` as `<w:p>` paragraphs made of `<w:r>` runs.

use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use super::ExtractError;

const DOCUMENT_XML: &str = "word/document.xml";

/// Upper bound on the decompressed size of `word/document.xml`.
const MAX_DOCUMENT_XML_BYTES: u64 = 32 * 1024 * 1024;

/// Containers whose paragraphs belong to drawings or text boxes, not the body.
const EMBEDDED_CONTENT: [&[u8]; 4] = [
    b"w:txbxContent",
    b"w:drawing",
    b"w:pict",
    b"mc:Fallback",
];

/// Returns the text of every body-level paragraph, in order, joined by `\n`.
/// Paragraphs nested in tables or text boxes are not body-level and are skipped.
pub fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    extract_with_limit(bytes, MAX_DOCUMENT_XML_BYTES)
}

fn extract_with_limit(bytes: &[u8], limit: u64) -> Result<String, ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::Docx(format!("not a ZIP container: {e}")))?;

    let entry = archive
        .by_name(DOCUMENT_XML)
        .map_err(|_| ExtractError::Docx(format!("{DOCUMENT_XML} not found")))?;
    if entry.size() > limit {
        return Err(too_large(limit));
    }

    // Cap the read as well as the declared size.
    let mut xml = String::new();
    entry
        .take(limit + 1)
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::Docx(format!("failed to read {DOCUMENT_XML}: {e}")))?;
    if xml.len() as u64 > limit {
        return Err(too_large(limit));
    }

    let paragraphs = body_paragraphs(&xml)?;
    Ok(paragraphs.join("\n"))
}

fn too_large(limit: u64) -> ExtractError {
    ExtractError::Docx(format!("{DOCUMENT_XML} exceeds {limit} bytes when decompressed"))
}

fn body_paragraphs(xml: &str) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut paragraphs = Vec::new();
    // Open body-level paragraph and the stack depth it was opened at.
    let mut current: Option<(String, usize)> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ExtractError::Docx(format!("malformed XML: {e}")))?;

        match event {
            Event::Start(e) => {
                let name = e.name().as_ref().to_vec();
                if name == b"w:p" && current.is_none() && parent_is(&stack, b"w:body") {
                    current = Some((String::new(), stack.len()));
                }
                stack.push(name);
            }
            Event::End(_) => {
                stack.pop();
                let closes_paragraph =
                    matches!(&current, Some((_, depth)) if *depth == stack.len());
                if closes_paragraph {
                    if let Some((text, _)) = current.take() {
                        paragraphs.push(text);
                    }
                }
            }
            Event::Empty(e) => {
                let name = e.name();
                let name = name.as_ref();
                if name == b"w:p" && current.is_none() && parent_is(&stack, b"w:body") {
                    paragraphs.push(String::new());
                } else if let Some((text, _)) = current.as_mut() {
                    if parent_is(&stack, b"w:r") && !inside_embedded_content(&stack) {
                        match name {
                            b"w:tab" => text.push('\t'),
                            b"w:br" if is_line_break(&e) => text.push('\n'),
                            b"w:cr" => text.push('\n'),
                            _ => {}
                        }
                    }
                }
            }
            Event::Text(t) => {
                if let Some((text, _)) = current.as_mut() {
                    if parent_is(&stack, b"w:t") && !inside_embedded_content(&stack) {
                        let unescaped = t
                            .unescape()
                            .map_err(|e| ExtractError::Docx(format!("bad text node: {e}")))?;
                        text.push_str(&unescaped);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn parent_is(stack: &[Vec<u8>], name: &[u8]) -> bool {
    stack.last().is_some_and(|top| top.as_slice() == name)
}

fn inside_embedded_content(stack: &[Vec<u8>]) -> bool {
    stack.iter().any(|open| {
        EMBEDDED_CONTENT
            .iter()
            .any(|name| *name == open.as_slice())
    })
}

/// Page and column breaks carry no text; only an untyped or
/// `textWrapping` break is a line break.
fn is_line_break(br: &BytesStart) -> bool {
    match br.try_get_attribute("w:type") {
        Ok(Some(kind)) => kind.value.as_ref() == b"textWrapping",
        _ => true,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use zip::write::FileOptions;
    use zip::ZipWriter;

    use super::*;

    const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

    pub(crate) fn build_docx_from_body(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{W_NS}"><w:body>{body}</w:body></w:document>"#
        );
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("[Content_Types].xml", FileOptions::default())
            .unwrap();
        writer.write_all(b"<Types/>").unwrap();
        writer
            .start_file(DOCUMENT_XML, FileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    pub(crate) fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!(r#"<w:p><w:r><w:t xml:space="preserve">{p}</w:t></w:r></w:p>"#))
            .collect();
        build_docx_from_body(&body)
    }

    #[test]
    fn test_paragraphs_joined_with_newlines() {
        let bytes = build_docx(&["Jane Doe", "MSc Data Science", "Python, SQL"]);
        assert_eq!(
            extract(&bytes).unwrap(),
            "Jane Doe\nMSc Data Science\nPython, SQL"
        );
    }

    #[test]
    fn test_runs_within_a_paragraph_are_concatenated() {
        let body = r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>Senior </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>Engineer</w:t></w:r><w:r><w:tab/><w:t>2019</w:t></w:r></w:p>"#;
        let bytes = build_docx_from_body(body);
        assert_eq!(extract(&bytes).unwrap(), "Senior Engineer\t2019");
    }

    #[test]
    fn test_empty_paragraphs_are_kept() {
        let body = r#"<w:p><w:r><w:t>Top</w:t></w:r></w:p><w:p/><w:p></w:p><w:p><w:r><w:t>Bottom</w:t></w:r></w:p>"#;
        let bytes = build_docx_from_body(body);
        assert_eq!(extract(&bytes).unwrap(), "Top\n\n\nBottom");
    }

    #[test]
    fn test_table_paragraphs_are_not_body_level() {
        let body = r#"<w:p><w:r><w:t>Before</w:t></w:r></w:p><w:tbl><w:tr><w:tc><w:p><w:r><w:t>Cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl><w:p><w:r><w:t>After</w:t></w:r></w:p>"#;
        let bytes = build_docx_from_body(body);
        assert_eq!(extract(&bytes).unwrap(), "Before\nAfter");
    }

    #[test]
    fn test_text_box_paragraphs_are_not_body_level() {
        let text_box = r#"<w:txbxContent><w:p><w:r><w:t>BOX</w:t></w:r></w:p></w:txbxContent>"#;
        let body = format!(
            r#"<w:p><w:r><w:t>Name</w:t></w:r><w:r><mc:AlternateContent><mc:Choice Requires="wps"><w:drawing><wp:anchor><a:graphic><a:graphicData><wps:wsp><wps:txbx>{text_box}</wps:txbx></wps:wsp></a:graphicData></a:graphic></wp:anchor></w:drawing></mc:Choice><mc:Fallback><w:pict><v:shape><v:textbox>{text_box}</v:textbox></v:shape></w:pict></mc:Fallback></mc:AlternateContent></w:r></w:p><w:p><w:r><w:t>Next</w:t></w:r></w:p>"#
        );
        let bytes = build_docx_from_body(&body);
        assert_eq!(extract(&bytes).unwrap(), "Name\nNext");
    }

    #[test]
    fn test_only_line_breaks_become_newlines() {
        let body = r#"<w:p><w:r><w:t>Skills</w:t><w:br/><w:t>Rust</w:t><w:br w:type="textWrapping"/><w:t>Go</w:t><w:br w:type="page"/><w:t>SQL</w:t><w:br w:type="column"/><w:t>Bash</w:t></w:r></w:p>"#;
        let bytes = build_docx_from_body(body);
        assert_eq!(extract(&bytes).unwrap(), "Skills\nRust\nGoSQLBash");
    }

    #[test]
    fn test_oversized_document_xml_is_rejected() {
        let filler = "x".repeat(4096);
        let bytes = build_docx(&[&filler]);
        let err = extract_with_limit(&bytes, 1024).unwrap_err();
        assert!(matches!(err, ExtractError::Docx(msg) if msg.contains("exceeds 1024 bytes")));
        assert!(extract_with_limit(&bytes, MAX_DOCUMENT_XML_BYTES).is_ok());
    }

    #[test]
    fn test_entities_are_unescaped() {
        let bytes = build_docx(&["R&amp;D &lt;lead&gt;"]);
        assert_eq!(extract(&bytes).unwrap(), "R&D <lead>");
    }

    #[test]
    fn test_missing_document_xml_is_an_error() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("other.xml", FileOptions::default())
            .unwrap();
        writer.write_all(b"<x/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = extract(&bytes).unwrap_err();
        assert!(matches!(err, ExtractError::Docx(msg) if msg.contains("not found")));
    }

    #[test]
    fn test_non_zip_bytes_are_an_error() {
        assert!(matches!(
            extract(b"plain text pretending to be docx"),
            Err(ExtractError::Docx(_))
        ));
    }
}
