//! The uploaded PDF and the names derived from it.

use crate::error::Pdf2DocxError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Fallback stem when the upload carries no usable filename.
pub const FALLBACK_STEM: &str = "output";

const PDF_MAGIC: &[u8] = b"%PDF";

/// A submitted PDF: raw bytes plus the filename the client sent.
///
/// Immutable once received. The orchestrator takes ownership for the
/// duration of one request and drops it when the request ends.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    filename: String,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for UploadedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedDocument")
            .field("filename", &self.filename)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a local file into an upload, keeping its file name.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, Pdf2DocxError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => Pdf2DocxError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => Pdf2DocxError::FileNotFound {
                path: path.to_path_buf(),
            },
        })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(Self { filename, bytes })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Reject empty uploads and anything without the `%PDF` signature.
    pub fn check_signature(&self) -> Result<(), Pdf2DocxError> {
        if self.bytes.is_empty() {
            return Err(Pdf2DocxError::EmptyUpload {
                filename: self.filename.clone(),
            });
        }
        if !self.bytes.starts_with(PDF_MAGIC) {
            let magic = self.bytes.iter().take(PDF_MAGIC.len()).copied().collect();
            return Err(Pdf2DocxError::NotAPdf {
                filename: self.filename.clone(),
                magic,
            });
        }
        Ok(())
    }

    /// Stem of the uploaded filename (`report.pdf` → `report`).
    pub fn stem(&self) -> String {
        file_stem(&self.filename)
    }
}

/// Last path component of a client-supplied name, tolerating both `/` and `\`.
fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name).trim()
}

fn file_stem(name: &str) -> String {
    let base = base_name(name);
    Path::new(base)
        .file_stem()
        .map(|s| s.to_string_lossy().trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_STEM.to_string())
}

/// Default output name: the input filename with its extension replaced by `.docx`.
pub fn default_output_filename(input_filename: &str) -> String {
    format!("{}.docx", file_stem(input_filename))
}

/// Resolve the user's requested output filename.
///
/// * blank, or nothing but `.docx` → [`default_output_filename`]
/// * directory components are dropped
/// * `.docx` is appended unless already present (case-insensitive)
pub fn resolve_output_filename(requested: &str, input_filename: &str) -> String {
    let base = base_name(requested);
    let stem = strip_docx_suffix(base);
    if stem.trim().is_empty() || stem == "." || stem == ".." {
        return default_output_filename(input_filename);
    }
    if stem.len() < base.len() {
        base.to_string()
    } else {
        format!("{base}.docx")
    }
}

fn strip_docx_suffix(name: &str) -> &str {
    const SUFFIX: &str = ".docx";
    match name.len().checked_sub(SUFFIX.len()) {
        Some(cut) if name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(SUFFIX) => {
            &name[..cut]
        }
        _ => name,
    }
}

/// Stem of a resolved `.docx` name (`out.docx` → `out`).
pub fn output_stem(resolved: &str) -> String {
    file_stem(resolved)
}

/// Choose where the CLI writes the artifact.
///
/// An explicit path wins; otherwise the artifact's filename is placed next to
/// the input file.
pub fn output_path_for(explicit: Option<&Path>, input: &Path, artifact_name: &str) -> PathBuf {
    match explicit {
        Some(p) => p.to_path_buf(),
        None => input
            .parent()
            .map(|d| d.join(artifact_name))
            .unwrap_or_else(|| PathBuf::from(artifact_name)),
    }
}
