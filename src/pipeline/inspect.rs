//! PDF inspection: page count and document metadata via lopdf.
//!
//! Parsing the cross-reference table and page tree is CPU-bound, so it runs
//! inside `spawn_blocking` to keep Tokio worker threads free while large
//! uploads are inspected.

use crate::error::Pdf2DocxError;
use crate::output::DocumentInfo;
use lopdf::{Dictionary, Document, Object};
use tracing::{debug, info};

/// Inspect PDF bytes without converting them.
pub async fn inspect_bytes(bytes: &[u8], filename: &str) -> Result<DocumentInfo, Pdf2DocxError> {
    let bytes = bytes.to_vec();
    let filename = filename.to_string();

    tokio::task::spawn_blocking(move || inspect_blocking(&bytes, &filename))
        .await
        .map_err(|e| Pdf2DocxError::Internal(format!("Inspection task panicked: {}", e)))?
}

/// Blocking implementation of inspection.
pub fn inspect_blocking(bytes: &[u8], filename: &str) -> Result<DocumentInfo, Pdf2DocxError> {
    let document = Document::load_mem(bytes).map_err(|e| {
        if contains(bytes, b"/Encrypt") {
            Pdf2DocxError::EncryptedPdf {
                filename: filename.to_string(),
            }
        } else {
            Pdf2DocxError::CorruptPdf {
                filename: filename.to_string(),
                detail: e.to_string(),
            }
        }
    })?;

    let page_count = document.get_pages().len() as u32;
    info!("PDF '{}' has {} pages", filename, page_count);

    let info_dict = document
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|o| resolve(&document, o))
        .and_then(|o| o.as_dict().ok());

    let field = |key: &[u8]| info_dict.and_then(|d| info_string(&document, d, key));

    let info = DocumentInfo {
        page_count,
        pdf_version: document.version.clone(),
        is_encrypted: document.trailer.get(b"Encrypt").is_ok(),
        title: field(b"Title"),
        author: field(b"Author"),
        subject: field(b"Subject"),
        creator: field(b"Creator"),
        producer: field(b"Producer"),
    };
    debug!("Inspected '{}': {:?}", filename, info);
    Ok(info)
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => document.get_object(*id).ok(),
        other => Some(other),
    }
}

fn info_string(document: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    match resolve(document, dict.get(key).ok()?)? {
        Object::String(raw, _) => decode_text_string(raw),
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE when BOM-prefixed, else PDFDocEncoding
/// (treated as Latin-1, which agrees on the printable range).
fn decode_text_string(raw: &[u8]) -> Option<String> {
    let text = if let Some(body) = raw.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        raw.iter().map(|&b| b as char).collect()
    };
    let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    (!text.is_empty()).then(|| text.to_string())
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
