//! Raw text extraction from uploaded documents (DOCX, PDF, plain text).

use std::io::{Cursor, Read};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;
use tracing::debug;

const DOCUMENT_XML: &str = "word/document.xml";

/// Text runs, tabs, line breaks and paragraph ends in WordprocessingML.
static DOCX_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>|<w:tab/>|<w:(?:br|cr)\b[^>]*/>|</w:p>")
        .expect("valid docx token regex")
});
static XML_ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|lt|gt|amp|quot|apos);").expect("valid entity regex")
});

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("uploaded file is empty")]
    Empty,

    #[error("unsupported file type: {0}")]
    Unsupported(String),

    #[error("invalid DOCX archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("failed to read DOCX content: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to extract PDF text: {0}")]
    Pdf(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Docx,
    Pdf,
    Text,
}

impl DocumentFormat {
    /// Picks the format from the file extension, then from magic bytes.
    pub fn detect(bytes: &[u8], filename: Option<&str>) -> Result<Self, ReadError> {
        let extension = filename
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("docx") => return Ok(Self::Docx),
            Some("pdf") => return Ok(Self::Pdf),
            Some("txt" | "md" | "markdown") => return Ok(Self::Text),
            _ => {}
        }

        if bytes.starts_with(b"PK") {
            Ok(Self::Docx)
        } else if bytes.starts_with(b"%PDF") {
            Ok(Self::Pdf)
        } else if std::str::from_utf8(bytes).is_ok() {
            Ok(Self::Text)
        } else {
            Err(ReadError::Unsupported(
                extension.unwrap_or_else(|| "unknown".to_string()),
            ))
        }
    }
}

/// Extracts the plain text of an uploaded document.
///
/// PDF extraction is CPU-bound; async callers should run this on a blocking
/// thread.
pub fn extract_raw_text(bytes: &[u8], filename: Option<&str>) -> Result<String, ReadError> {
    if bytes.is_empty() {
        return Err(ReadError::Empty);
    }

    let format = DocumentFormat::detect(bytes, filename)?;
    debug!("Reading {} byte upload as {format:?}", bytes.len());

    match format {
        DocumentFormat::Docx => docx_text(bytes),
        DocumentFormat::Pdf => {
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| ReadError::Pdf(e.to_string()))
        }
        DocumentFormat::Text => {
            let text = String::from_utf8_lossy(bytes);
            Ok(text.trim_start_matches('\u{feff}').to_string())
        }
    }
}

fn docx_text(bytes: &[u8]) -> Result<String, ReadError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive.by_name(DOCUMENT_XML)?.read_to_string(&mut xml)?;

    let mut text = String::new();
    for caps in DOCX_TOKEN.captures_iter(&xml) {
        match caps.get(1) {
            Some(run) => text.push_str(&unescape_xml(run.as_str())),
            None if &caps[0] == "<w:tab/>" => text.push('\t'),
            None => text.push('\n'),
        }
    }
    Ok(text)
}

fn unescape_xml(text: &str) -> String {
    XML_ENTITY
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            match entity {
                "lt" => "<".to_string(),
                "gt" => ">".to_string(),
                "amp" => "&".to_string(),
                "quot" => "\"".to_string(),
                "apos" => "'".to_string(),
                _ => {
                    let code = match entity.strip_prefix("#x") {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => entity[1..].parse().ok(),
                    };
                    code.and_then(char::from_u32)
                        .map(String::from)
                        .unwrap_or_else(|| caps[0].to_string())
                }
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_with_body(body: &str) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(DOCUMENT_XML, zip::write::SimpleFileOptions::default())
            .unwrap();
        write!(
            zip,
            r#"<?xml version="1.0"?><w:document xmlns:w="x"><w:body>{body}</w:body></w:document>"#
        )
        .unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_docx_paragraphs_tabs_and_breaks() {
        let bytes = docx_with_body(concat!(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr>"#,
            r#"<w:r><w:t>Jane</w:t></w:r><w:r><w:t xml:space="preserve"> Doe</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>Go</w:t><w:tab/><w:t>Rust</w:t><w:br/><w:t>SQL</w:t></w:r></w:p>"#,
            r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>Cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        ));
        let text = extract_raw_text(&bytes, Some("resume.docx")).unwrap();
        assert_eq!(text, "Jane Doe\nGo\tRust\nSQL\nCell\n");
    }

    #[test]
    fn test_docx_entities_are_unescaped() {
        let bytes = docx_with_body(
            r#"<w:p><w:r><w:t>R&amp;D &lt;team&gt; &quot;A&quot; &#233;&#x2022;</w:t></w:r></w:p>"#,
        );
        let text = extract_raw_text(&bytes, None).unwrap();
        assert_eq!(text, "R&D <team> \"A\" é•\n");
    }

    #[test]
    fn test_docx_without_document_xml_is_archive_error() {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("other.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        let bytes = zip.finish().unwrap().into_inner();
        assert!(matches!(
            extract_raw_text(&bytes, Some("resume.docx")),
            Err(ReadError::Archive(_))
        ));
    }

    #[test]
    fn test_plain_text_strips_bom() {
        let text = extract_raw_text("\u{feff}Jane Doe\nSkills".as_bytes(), Some("cv.TXT")).unwrap();
        assert_eq!(text, "Jane Doe\nSkills");
    }

    #[test]
    fn test_empty_upload_is_rejected() {
        assert!(matches!(extract_raw_text(b"", Some("a.txt")), Err(ReadError::Empty)));
    }

    #[test]
    fn test_format_detection_falls_back_to_magic_bytes() {
        assert_eq!(DocumentFormat::detect(b"PK\x03\x04", None).unwrap(), DocumentFormat::Docx);
        assert_eq!(
            DocumentFormat::detect(b"%PDF-1.7", Some("upload.bin")).unwrap(),
            DocumentFormat::Pdf
        );
        assert_eq!(DocumentFormat::detect(b"hello", None).unwrap(), DocumentFormat::Text);
        assert!(matches!(
            DocumentFormat::detect(&[0xd0, 0xcf, 0x11, 0xe0, 0xff], Some("old.doc")),
            Err(ReadError::Unsupported(ext)) if ext == "doc"
        ));
    }

    #[test]
    fn test_garbage_pdf_is_pdf_error() {
        assert!(matches!(
            extract_raw_text(b"%PDF-1.4 not really", Some("cv.pdf")),
            Err(ReadError::Pdf(_))
        ));
    }
}
