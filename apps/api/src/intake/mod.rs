//! Document intake — turns an uploaded essay file into plain text.
//!
//! Supported: Word documents (docx), PDF and plain text. Word files are read
//! straight from the OOXML package (`word/document.xml`); PDF extraction is
//! CPU-bound and runs on the blocking pool.

pub mod handlers;

use std::io::{Cursor, Read};

use bytes::Bytes;
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use tracing::debug;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MSWORD_MIME: &str = "application/msword";
pub const PDF_MIME: &str = "application/pdf";
pub const TEXT_MIME: &str = "text/plain";

const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("{0}")]
    ParsingFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Word,
    Pdf,
    PlainText,
}

impl DocumentKind {
    /// Picks the extractor from the declared MIME type, falling back to the
    /// file extension when the upload has no usable type.
    pub fn detect(mime: Option<&str>, file_name: Option<&str>) -> Result<Self, ParseError> {
        let mime = mime
            .map(|m| m.split(';').next().unwrap_or(m).trim().to_ascii_lowercase())
            .filter(|m| !m.is_empty() && m != "application/octet-stream");

        if let Some(mime) = mime {
            return match mime.as_str() {
                DOCX_MIME | MSWORD_MIME => Ok(Self::Word),
                PDF_MIME => Ok(Self::Pdf),
                TEXT_MIME => Ok(Self::PlainText),
                other => Err(ParseError::UnsupportedFileType(other.to_string())),
            };
        }

        let ext = file_name
            .and_then(|n| n.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("docx") | Some("doc") => Ok(Self::Word),
            Some("pdf") => Ok(Self::Pdf),
            Some("txt") => Ok(Self::PlainText),
            Some(other) => Err(ParseError::UnsupportedFileType(format!(".{other}"))),
            None => Err(ParseError::UnsupportedFileType("unknown".to_string())),
        }
    }
}

/// Extracts the text of an uploaded document.
pub async fn parse_document(
    bytes: Bytes,
    mime: Option<&str>,
    file_name: Option<&str>,
) -> Result<String, ParseError> {
    let kind = DocumentKind::detect(mime, file_name)?;
    debug!("Parsing {} byte upload as {kind:?}", bytes.len());

    match kind {
        DocumentKind::Word => extract_docx_text(&bytes),
        DocumentKind::PlainText => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        DocumentKind::Pdf => tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes)
                .map_err(|e| ParseError::ParsingFailed(format!("PDF parsing failed: {e}")))
        })
        .await
        .map_err(|e| ParseError::ParsingFailed(format!("PDF parsing failed: {e}")))?,
    }
}

/// Reads the main document part of a docx package and flattens it to text.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ParseError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ParseError::ParsingFailed(format!("Not a Word document: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ParseError::ParsingFailed(format!("Missing {DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| ParseError::ParsingFailed(format!("Unreadable {DOCUMENT_PART}: {e}")))?;

    document_xml_to_text(&xml)
}

/// `w:t` runs are concatenated and each paragraph ends with a newline. A `w:tab`
/// run becomes a tab (tab-stop definitions under `w:tabs` are ignored) and
/// `w:br`/`w:cr` become a newline.
fn document_xml_to_text(xml: &str) -> Result<String, ParseError> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_text = false;
    let mut in_tab_stops = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:t" => in_text = true,
                b"w:tabs" => in_tab_stops = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:tabs" => in_tab_stops = false,
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" if !in_tab_stops => out.push('\t'),
                b"w:br" | b"w:cr" | b"w:p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| ParseError::ParsingFailed(format!("Bad document text: {e}")))?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ParseError::ParsingFailed(format!(
                    "Malformed document XML at {}: {e}",
                    reader.buffer_position()
                )))
            }
        }
    }

    Ok(out.trim_end().to_string())
}
