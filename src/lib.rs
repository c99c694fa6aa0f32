//! # edgequake-pdf2docx
//!
//! Convert PDF documents to editable Word (DOCX) files, optionally
//! translating them, behind a one-page web form or a command-line tool.
//!
//! ## Why this crate?
//!
//! Layout-preserving PDF→DOCX conversion is a hard problem that the
//! [`pdf2docx`](https://github.com/ArtifexSoftware/pdf2docx) engine already
//! solves well. What it lacks is a safe front door: validated page ranges,
//! one private workspace per request that is always cleaned up, clear
//! errors for users, and a small server that many people can hit at once.
//! This crate is that front door.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF upload
//!  │
//!  ├─ 1. Validate  %PDF signature, page bounds, features, languages
//!  ├─ 2. Inspect   page count + metadata via lopdf (spawn_blocking)
//!  ├─ 3. Stage     write the upload into a request-scoped TempDir
//!  ├─ 4. Engine    `pdf2docx convert` subprocess (0-based, end-exclusive range)
//!  ├─ 5. Translate optional, paragraph by paragraph (Google Translate)
//!  ├─ 6. Export    optional, translated DOCX → PDF (LibreOffice headless)
//!  └─ 7. Output    named artifact, or a user-facing failure
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2docx::{
//!     ConversionOptions, Orchestrator, OrchestratorConfig, PageBound, UploadedDocument,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator = Orchestrator::from_config(OrchestratorConfig::default())?;
//!     let document = UploadedDocument::from_path("report.pdf").await?;
//!     let options = ConversionOptions {
//!         start_page: PageBound::at(3),
//!         end_page: PageBound::at(5),
//!         ..Default::default()
//!     };
//!     match orchestrator.run(document, &options).await {
//!         Ok(artifact) => artifact.write_to(&artifact.filename).await?,
//!         Err(failure) => eprintln!("{failure}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2docx` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `web`   | on      | Enables the [`web`] module and the `pdf2docx-web` server (axum + tower-http) |
//!
//! Disable both when using only the library:
//! ```toml
//! edgequake-pdf2docx = { version = "0.1", default-features = false }
//! ```
//!
//! ## External tools
//!
//! | Tool | Needed for | Override |
//! |------|------------|----------|
//! | `pdf2docx` (`pip install pdf2docx`) | every conversion | `PDF2DOCX_BIN` |
//! | `soffice` (LibreOffice) | translated PDF export | `SOFFICE_BIN` |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod languages;
pub mod output;
pub mod pipeline;
pub mod progress;
#[cfg(feature = "web")]
pub mod web;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionOptions, EnginePageRange, OrchestratorConfig, OrchestratorConfigBuilder, PageBound,
    PageRange, TranslationOptions,
};
pub use convert::{Orchestrator, OrchestratorBuilder};
pub use document::{resolve_output_filename, UploadedDocument};
pub use error::{ErrorKind, Pdf2DocxError};
pub use languages::{Language, SUPPORTED_LANGUAGES};
pub use output::{ConversionArtifact, ConversionFailure, ConversionResult, DocumentInfo};
pub use pipeline::engine::{ConversionEngine, EngineRequest, Pdf2DocxCliEngine};
pub use pipeline::export::{LibreOfficeExporter, PdfExporter};
pub use pipeline::google::GoogleTranslator;
pub use pipeline::translate::{TranslateError, Translator};
pub use progress::{ConversionObserver, ConversionStage, ConversionState, NoopObserver};
