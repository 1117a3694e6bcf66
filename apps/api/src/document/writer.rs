//! Renders a [`ResumeRecord`] into a minimal DOCX package.
//!
//! The template is fixed and order-preserving: name, contact line, summary,
//! skills, experience, education. Empty sections are left out.
//!
//! Rendering is lossy. Reading the document back and running the text
//! extractor does not reproduce the record: experience locations are never
//! written, and an education header line becomes a single `degree` string.

use std::io::{Cursor, Write};

use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::models::resume::ResumeRecord;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const DEFAULT_NAME: &str = "Professional Resume";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_OPEN: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;
const DOCUMENT_CLOSE: &str = "<w:sectPr/></w:body></w:document>";

// Sizes are in half-points.
const NAME_SIZE: u32 = 48;
const HEADING_SIZE: u32 = 28;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to build DOCX archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("failed to write DOCX part: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Copy, Default)]
struct RunStyle {
    bold: bool,
    italic: bool,
    size: Option<u32>,
}

const PLAIN: RunStyle = RunStyle {
    bold: false,
    italic: false,
    size: None,
};
const BOLD: RunStyle = RunStyle {
    bold: true,
    italic: false,
    size: None,
};
const ITALIC: RunStyle = RunStyle {
    bold: false,
    italic: true,
    size: None,
};
const HEADING: RunStyle = RunStyle {
    bold: true,
    italic: false,
    size: Some(HEADING_SIZE),
};

/// Accumulates `<w:p>` elements for `word/document.xml`.
#[derive(Default)]
struct Body {
    xml: String,
}

impl Body {
    fn paragraph(&mut self, text: &str, style: RunStyle) {
        self.xml.push_str("<w:p><w:r>");
        if style.bold || style.italic || style.size.is_some() {
            self.xml.push_str("<w:rPr>");
            if style.bold {
                self.xml.push_str("<w:b/>");
            }
            if style.italic {
                self.xml.push_str("<w:i/>");
            }
            if let Some(size) = style.size {
                self.xml.push_str(&format!(r#"<w:sz w:val="{size}"/>"#));
            }
            self.xml.push_str("</w:rPr>");
        }
        self.xml.push_str(r#"<w:t xml:space="preserve">"#);
        self.xml.push_str(&escape_xml(text));
        self.xml.push_str("</w:t></w:r></w:p>");
    }

    fn bullet(&mut self, text: &str) {
        self.paragraph(&format!("• {text}"), PLAIN);
    }

    fn into_document(self) -> String {
        format!("{DOCUMENT_OPEN}{}{DOCUMENT_CLOSE}", self.xml)
    }
}

/// Renders the record and returns the `.docx` bytes.
pub fn render_docx(record: &ResumeRecord) -> Result<Vec<u8>, RenderError> {
    let document = document_xml(record);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES_XML),
        ("_rels/.rels", RELS_XML),
        ("word/document.xml", document.as_str()),
    ] {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
    }
    Ok(zip.finish()?.into_inner())
}

fn document_xml(record: &ResumeRecord) -> String {
    let mut body = Body::default();
    let contact = &record.contact_info;

    let name = match contact.name.trim() {
        "" => DEFAULT_NAME,
        name => name,
    };
    body.paragraph(
        name,
        RunStyle {
            bold: true,
            size: Some(NAME_SIZE),
            ..Default::default()
        },
    );

    let contact_line = [
        ("Email", &contact.email),
        ("Phone", &contact.phone),
        ("Location", &contact.location),
        ("LinkedIn", &contact.linkedin),
        ("Website", &contact.website),
    ]
    .iter()
    .filter(|(_, value)| !value.trim().is_empty())
    .map(|(label, value)| format!("{label}: {}", value.trim()))
    .collect::<Vec<_>>()
    .join(" | ");
    if !contact_line.is_empty() {
        body.paragraph(&contact_line, PLAIN);
    }

    if !record.summary.trim().is_empty() {
        body.paragraph("Professional Summary", HEADING);
        body.paragraph(record.summary.trim(), PLAIN);
    }

    if !record.skills.is_empty() {
        body.paragraph("Skills", HEADING);
        body.paragraph(&record.skills.join(", "), PLAIN);
    }

    if !record.experience.is_empty() {
        body.paragraph("Professional Experience", HEADING);
        for job in &record.experience {
            body.paragraph(&joined(&job.title, " at ", &job.company), BOLD);
            if !job.date_range.is_empty() {
                body.paragraph(&job.date_range, ITALIC);
            }
            for bullet in &job.description {
                body.bullet(bullet);
            }
        }
    }

    if !record.education.is_empty() {
        body.paragraph("Education", HEADING);
        for edu in &record.education {
            body.paragraph(&joined(&edu.degree, ", ", &edu.institution), BOLD);
            if !edu.date_range.is_empty() {
                body.paragraph(&edu.date_range, ITALIC);
            }
            for detail in &edu.details {
                body.bullet(detail);
            }
        }
    }

    body.into_document()
}

/// Joins two parts with `sep`, dropping the separator when either is empty.
fn joined(left: &str, sep: &str, right: &str) -> String {
    match (left.is_empty(), right.is_empty()) {
        (false, false) => format!("{left}{sep}{right}"),
        (false, true) => left.to_string(),
        _ => right.to_string(),
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Control characters other than tab/newline are not valid XML 1.0.
            c if c.is_control() && c != '\t' && c != '\n' => {}
            c => out.push(c),
        }
    }
    out
}
