//! Result types produced by a conversion request.

use crate::error::{ErrorKind, Pdf2DocxError};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Media type of a WordprocessingML document.
pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Media type of a PDF document.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// A finished, downloadable file.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ConversionArtifact {
    /// Name offered to the user on download.
    pub filename: String,
    /// `DOCX_MEDIA_TYPE`, or `PDF_MEDIA_TYPE` for exported translations.
    pub media_type: &'static str,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ConversionArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionArtifact")
            .field("filename", &self.filename)
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ConversionArtifact {
    pub fn docx(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            media_type: DOCX_MEDIA_TYPE,
            bytes,
        }
    }

    pub fn pdf(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            media_type: PDF_MEDIA_TYPE,
            bytes,
        }
    }

    /// Write the artifact to `path`.
    ///
    /// Uses atomic write (temp file + rename) so a reader never sees a
    /// partially written document.
    pub async fn write_to(&self, path: impl AsRef<Path>) -> Result<(), Pdf2DocxError> {
        let path = path.as_ref().to_path_buf();
        let bytes = self.bytes.clone();
        tokio::task::spawn_blocking(move || persist_atomically(&path, &bytes))
            .await
            .map_err(|e| Pdf2DocxError::Internal(format!("Write task panicked: {}", e)))?
    }
}

/// Write into a uniquely named sibling temp file, then rename it over `path`.
/// The temp file is removed on every failure path when it is dropped.
fn persist_atomically(path: &Path, bytes: &[u8]) -> Result<(), Pdf2DocxError> {
    let fail = |source: std::io::Error| Pdf2DocxError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(fail)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".pdf2docx-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(fail)?;
    tmp.write_all(bytes).map_err(fail)?;
    tmp.persist(path).map_err(|e| fail(e.error))?;
    Ok(())
}

/// The user-facing description of a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl ConversionFailure {
    pub fn from_error(error: &Pdf2DocxError) -> Self {
        Self {
            kind: error.kind(),
            message: error.user_message(),
        }
    }
}

impl std::fmt::Display for ConversionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl std::error::Error for ConversionFailure {}

/// Outcome of one request: an artifact or a failure descriptor.
pub type ConversionResult = Result<ConversionArtifact, ConversionFailure>;

/// What inspection learned about a PDF without converting it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub page_count: u32,
    pub pdf_version: String,
    pub is_encrypted: bool,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
}
