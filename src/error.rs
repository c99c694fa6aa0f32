//! Error types for the edgequake-pdf2docx library.
//!
//! Every failure is a [`Pdf2DocxError`], and every variant belongs to exactly
//! one [`ErrorKind`]:
//!
//! * **Validation**: the request itself is wrong (no upload, not a PDF,
//!   inverted or out-of-range page bounds, a feature the server does not
//!   offer). Detected before the engine is touched; the user fixes the input
//!   and resubmits.
//!
//! * **ConversionEngine**: the input looked fine but could not be converted
//!   (corrupt or encrypted PDF, engine crash, engine missing, unusable output).
//!
//! * **Resource**: temp-storage or I/O failure while staging the upload or
//!   reading back an intermediate file.
//!
//! [`crate::convert::Orchestrator::run`] folds any error into a single
//! [`crate::output::ConversionFailure`] using [`Pdf2DocxError::user_message`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failure category surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input or options; recoverable by correcting them.
    Validation,
    /// The external engine (or a post-processing backend) failed.
    ConversionEngine,
    /// Temp storage exhausted or an I/O error while staging files.
    Resource,
}

impl ErrorKind {
    /// Stable identifier, used in HTTP headers and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::ConversionEngine => "conversion_engine",
            ErrorKind::Resource => "resource",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All errors returned by the edgequake-pdf2docx library.
#[derive(Debug, Error)]
pub enum Pdf2DocxError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// No file was attached to the request.
    #[error("No PDF file was uploaded.\nChoose a PDF file and submit again.")]
    MissingUpload,

    /// A file was attached but it has no content.
    #[error("Uploaded file '{filename}' is empty")]
    EmptyUpload { filename: String },

    /// The upload does not start with the `%PDF` signature.
    #[error("File '{filename}' is not a valid PDF\nFirst bytes: {magic:?}")]
    NotAPdf { filename: String, magic: Vec<u8> },

    /// Input path given on the command line does not exist.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the input path.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// A page bound is not a positive integer.
    #[error("{field} must be a positive whole number (got '{value}')")]
    InvalidPageNumber { field: &'static str, value: String },

    /// End page precedes start page.
    #[error("End page cannot be smaller than start page (start {start}, end {end})")]
    InvertedPageRange { start: u32, end: u32 },

    /// A page bound exceeds the document's page count.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: u32, total: u32 },

    /// The request asked for a capability this orchestrator was built without.
    #[error("{feature} is not available on this server")]
    FeatureDisabled { feature: &'static str },

    /// Translation requested into (or from) an unknown language code.
    #[error("Unsupported language code '{code}'")]
    UnsupportedLanguage { code: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Conversion engine errors ──────────────────────────────────────────
    /// The PDF structure could not be parsed.
    #[error("PDF '{filename}' is corrupt: {detail}")]
    CorruptPdf { filename: String, detail: String },

    /// The PDF is password protected.
    #[error("PDF '{filename}' is encrypted and cannot be converted")]
    EncryptedPdf { filename: String },

    /// The engine executable could not be started.
    #[error(
        "Conversion engine '{program}' could not be started: {source}\n\
Install it with `pip install pdf2docx` or point PDF2DOCX_BIN at the executable."
    )]
    EngineUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The engine ran but exited unsuccessfully.
    #[error("Conversion engine '{program}' failed (exit code {code:?}): {stderr}")]
    EngineFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The engine reported success but did not write its output.
    #[error("Conversion engine produced no output at '{path}'")]
    EngineOutputMissing { path: PathBuf },

    /// The engine output is empty or not a DOCX container.
    #[error("Conversion engine produced an invalid document: {detail}")]
    InvalidEngineOutput { detail: String },

    /// The DOCX could not be opened or rewritten for translation.
    #[error("Translation failed: {detail}")]
    TranslationFailed { detail: String },

    /// The office suite used for PDF export could not be started.
    #[error(
        "PDF exporter '{program}' could not be started: {source}\n\
Install LibreOffice or point SOFFICE_BIN at the soffice executable."
    )]
    ExportUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// DOCX→PDF export failed.
    #[error("PDF export failed: {detail}")]
    ExportFailed { detail: String },

    // ── Resource errors ───────────────────────────────────────────────────
    /// Could not create the request's temporary workspace.
    #[error("Could not create temporary workspace: {source}")]
    TempStorage {
        #[source]
        source: std::io::Error,
    },

    /// Could not write the upload into the workspace.
    #[error("Failed to stage upload at '{path}': {source}")]
    StagingFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not read an intermediate file back from the workspace.
    #[error("Failed to read intermediate file '{path}': {source}")]
    ArtifactReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write the final artifact to disk (CLI).
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

const ENGINE_FAILURE_MESSAGE: &str = "Conversion failed: the PDF could not be converted. \
It may be corrupt, encrypted, or use features the converter does not support.";

const RESOURCE_FAILURE_MESSAGE: &str = "Conversion failed: the server could not stage the \
document in temporary storage. Please try again later.";

impl Pdf2DocxError {
    /// The failure category of this error.
    pub fn kind(&self) -> ErrorKind {
        use Pdf2DocxError::*;
        match self {
            MissingUpload
            | EmptyUpload { .. }
            | NotAPdf { .. }
            | FileNotFound { .. }
            | PermissionDenied { .. }
            | InvalidPageNumber { .. }
            | InvertedPageRange { .. }
            | PageOutOfRange { .. }
            | FeatureDisabled { .. }
            | UnsupportedLanguage { .. }
            | InvalidConfig(_) => ErrorKind::Validation,

            CorruptPdf { .. }
            | EncryptedPdf { .. }
            | EngineUnavailable { .. }
            | EngineFailed { .. }
            | EngineOutputMissing { .. }
            | InvalidEngineOutput { .. }
            | TranslationFailed { .. }
            | ExportUnavailable { .. }
            | ExportFailed { .. }
            | Internal(_) => ErrorKind::ConversionEngine,

            TempStorage { .. }
            | StagingFailed { .. }
            | ArtifactReadFailed { .. }
            | OutputWriteFailed { .. } => ErrorKind::Resource,
        }
    }

    /// Message shown to the end user.
    ///
    /// Validation errors are descriptive so the user can fix the input.
    /// Engine and resource errors get a generic message; their detail only
    /// goes to the log.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Validation => self.to_string(),
            ErrorKind::ConversionEngine => ENGINE_FAILURE_MESSAGE.to_string(),
            ErrorKind::Resource => RESOURCE_FAILURE_MESSAGE.to_string(),
        }
    }
}
