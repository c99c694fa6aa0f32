//! The conversion orchestrator.
//!
//! One [`Orchestrator`] serves every request. Each call to
//! [`Orchestrator::run`] walks the per-request state machine:
//!
//! ```text
//! Idle ─▶ Validating ─┬─▶ Converting ─┬─▶ Done
//!                     │               │
//!                     └───────────────┴─▶ Failed
//! ```
//!
//! * **Validating**: signature check, page bounds, feature and language
//!   checks, then lopdf inspection so bounds past the last page fail before
//!   the engine is started.
//! * **Converting**: stage the upload into a private workspace, run the
//!   engine, optionally translate the DOCX and export it to PDF.
//!
//! The workspace is a `TempDir` owned by the converting step, so it is
//! removed on every exit path.

use crate::config::{ConversionOptions, OrchestratorConfig, PageRange};
use crate::document::{output_stem, resolve_output_filename, UploadedDocument};
use crate::error::Pdf2DocxError;
use crate::languages;
use crate::output::{ConversionArtifact, ConversionFailure, ConversionResult, DocumentInfo};
use crate::pipeline::engine::{ConversionEngine, EngineRequest, Pdf2DocxCliEngine};
use crate::pipeline::export::{LibreOfficeExporter, PdfExporter};
use crate::pipeline::google::GoogleTranslator;
use crate::pipeline::input::Workspace;
use crate::pipeline::inspect;
use crate::pipeline::translate::{translate_docx, Translator};
use crate::progress::{ConversionStage, ConversionState, ObserverHandle, StateTracker};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const PDF_MAGIC: &[u8] = b"%PDF";

const CONVERTED_DOCX: &str = "converted.docx";
const TRANSLATED_DOCX: &str = "translated.docx";

/// A request that passed validation.
#[derive(Debug)]
struct ValidatedRequest {
    pages: Option<PageRange>,
    filename: String,
    /// `None` when lopdf could not load the file and no bound needed it.
    info: Option<DocumentInfo>,
}

/// Drives one conversion per call; cheap to share behind an `Arc`.
pub struct Orchestrator {
    config: OrchestratorConfig,
    engine: Arc<dyn ConversionEngine>,
    translator: Option<Arc<dyn Translator>>,
    exporter: Option<Arc<dyn PdfExporter>>,
    observer: Option<ObserverHandle>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("engine", &self.engine.name())
            .field("translator", &self.translator.as_ref().map(|t| t.name().to_string()))
            .field("exporter", &self.exporter.as_ref().map(|e| e.name().to_string()))
            .finish()
    }
}

impl Orchestrator {
    /// Start building an orchestrator around a custom engine.
    pub fn builder(engine: Arc<dyn ConversionEngine>) -> OrchestratorBuilder {
        OrchestratorBuilder {
            config: OrchestratorConfig::default(),
            engine,
            translator: None,
            exporter: None,
            observer: None,
        }
    }

    /// The production wiring: `pdf2docx` CLI, Google Translate, LibreOffice.
    pub fn from_config(config: OrchestratorConfig) -> Result<Self, Pdf2DocxError> {
        Ok(Self::production(config)?.build())
    }

    /// Builder pre-wired like [`Orchestrator::from_config`], for adding an
    /// observer or removing optional features.
    pub fn production(config: OrchestratorConfig) -> Result<OrchestratorBuilder, Pdf2DocxError> {
        let engine = Pdf2DocxCliEngine::new(config.engine_program.clone())
            .with_stderr_excerpt(config.stderr_excerpt_chars);
        let translator = GoogleTranslator::new(config.translate_timeout_secs)
            .map_err(|e| Pdf2DocxError::InvalidConfig(e.to_string()))?;
        let exporter = LibreOfficeExporter::new(config.soffice_program.clone())
            .with_stderr_excerpt(config.stderr_excerpt_chars);

        Ok(Self::builder(Arc::new(engine))
            .translator(Arc::new(translator))
            .exporter(Arc::new(exporter))
            .config(config))
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn supports_translation(&self) -> bool {
        self.translator.is_some()
    }

    pub fn supports_pdf_export(&self) -> bool {
        self.translator.is_some() && self.exporter.is_some()
    }

    pub fn default_target_lang(&self) -> &str {
        &self.config.default_target_lang
    }

    /// Run one request and fold any error into a [`ConversionFailure`].
    ///
    /// The full error goes to the log; the failure only carries what the
    /// user should see.
    pub async fn run(
        &self,
        document: UploadedDocument,
        options: &ConversionOptions,
    ) -> ConversionResult {
        self.convert(document, options).await.map_err(|e| {
            match e.kind() {
                crate::error::ErrorKind::Validation => warn!("Request rejected: {}", e),
                _ => error!("Conversion failed: {}", e),
            }
            ConversionFailure::from_error(&e)
        })
    }

    /// Run one request, returning the detailed error on failure.
    pub async fn convert(
        &self,
        document: UploadedDocument,
        options: &ConversionOptions,
    ) -> Result<ConversionArtifact, Pdf2DocxError> {
        let started = Instant::now();
        let mut tracker = StateTracker::new(self.observer.clone());
        info!("Received '{}' ({} bytes)", document.filename(), document.len());

        tracker.advance(ConversionState::Validating);
        let request = match self.validate(&document, options).await {
            Ok(request) => request,
            Err(e) => {
                tracker.fail(&e.user_message());
                return Err(e);
            }
        };

        tracker.advance(ConversionState::Converting);
        match self.execute(&document, options, &request, &tracker).await {
            Ok(artifact) => {
                tracker.advance(ConversionState::Done);
                info!(
                    "Produced '{}' ({} bytes) in {}ms",
                    artifact.filename,
                    artifact.bytes.len(),
                    started.elapsed().as_millis()
                );
                Ok(artifact)
            }
            Err(e) => {
                tracker.fail(&e.user_message());
                Err(e)
            }
        }
    }

    /// Inspect a PDF without converting it.
    pub async fn inspect(&self, document: &UploadedDocument) -> Result<DocumentInfo, Pdf2DocxError> {
        document.check_signature()?;
        inspect::inspect_bytes(document.bytes(), document.filename()).await
    }

    async fn validate(
        &self,
        document: &UploadedDocument,
        options: &ConversionOptions,
    ) -> Result<ValidatedRequest, Pdf2DocxError> {
        document.check_signature()?;

        let start = options.start_page.effective();
        let end = options.end_page.effective();
        PageRange::check_bounds(start, end)?;

        if let Some(ref translation) = options.translation {
            if self.translator.is_none() {
                return Err(Pdf2DocxError::FeatureDisabled {
                    feature: "Translation",
                });
            }
            if options.export_pdf && self.exporter.is_none() {
                return Err(Pdf2DocxError::FeatureDisabled {
                    feature: "PDF export",
                });
            }
            if languages::lookup(&translation.target_lang).is_none() {
                return Err(Pdf2DocxError::UnsupportedLanguage {
                    code: translation.target_lang.clone(),
                });
            }
            if !languages::is_valid_source(&translation.source_lang) {
                return Err(Pdf2DocxError::UnsupportedLanguage {
                    code: translation.source_lang.clone(),
                });
            }
        }

        // The page count is only needed to check enabled bounds; without
        // them a PDF lopdf cannot load still goes to the engine.
        let bounded = start.is_some() || end.is_some();
        let info = match inspect::inspect_bytes(document.bytes(), document.filename()).await {
            Ok(info) => {
                if info.is_encrypted {
                    warn!("'{}' is encrypted; the engine may refuse it", document.filename());
                }
                Some(info)
            }
            Err(e @ (Pdf2DocxError::CorruptPdf { .. } | Pdf2DocxError::EncryptedPdf { .. }))
                if !bounded =>
            {
                warn!("Could not inspect '{}': {}; passing it to the engine", document.filename(), e);
                None
            }
            Err(e) => return Err(e),
        };
        let pages = match info {
            Some(ref info) => PageRange::resolve(start, end, info.page_count)?,
            None => None,
        };
        let filename = resolve_output_filename(&options.output_filename, document.filename());

        Ok(ValidatedRequest {
            pages,
            filename,
            info,
        })
    }

    async fn execute(
        &self,
        document: &UploadedDocument,
        options: &ConversionOptions,
        request: &ValidatedRequest,
        tracker: &StateTracker,
    ) -> Result<ConversionArtifact, Pdf2DocxError> {
        tracker.stage(ConversionStage::Staging);
        let workspace = Workspace::create(self.config.temp_root.as_deref())?;
        let pdf_path = workspace.stage(document.bytes()).await?;

        tracker.stage(ConversionStage::Engine);
        let engine_request = EngineRequest {
            pdf_path,
            docx_path: workspace.file(CONVERTED_DOCX),
            pages: request.pages.map(PageRange::to_engine),
            multi_processing: options.multi_processing,
        };
        match (request.pages, &request.info) {
            (Some(range), Some(info)) => info!(
                "Converting {} of {} pages with {}",
                range.page_count(),
                info.page_count,
                self.engine.name()
            ),
            (None, Some(info)) => info!(
                "Converting all {} pages with {}",
                info.page_count,
                self.engine.name()
            ),
            _ => info!("Converting an uninspected document with {}", self.engine.name()),
        }
        self.engine.convert(&engine_request).await?;
        let docx = workspace
            .read(&engine_request.docx_path)
            .await?
            .ok_or_else(|| Pdf2DocxError::EngineOutputMissing {
                path: engine_request.docx_path.clone(),
            })?;
        check_magic(&docx, ZIP_MAGIC, "DOCX")?;

        let artifact = match (&options.translation, &self.translator) {
            (Some(translation), Some(translator)) => {
                tracker.stage(ConversionStage::Translating);
                let (translated, stats) = translate_docx(
                    &docx,
                    translator.as_ref(),
                    &translation.source_lang,
                    &translation.target_lang,
                )
                .await?;
                if stats.failed > 0 {
                    warn!("{} paragraphs kept their original text", stats.failed);
                }

                let stem = output_stem(&request.filename);
                match (options.export_pdf, &self.exporter) {
                    (true, Some(exporter)) => {
                        tracker.stage(ConversionStage::Exporting);
                        let docx_path = workspace.write(TRANSLATED_DOCX, &translated).await?;
                        let pdf_path = exporter.export(&docx_path, workspace.path()).await?;
                        let pdf = workspace.read(&pdf_path).await?.ok_or_else(|| {
                            Pdf2DocxError::ExportFailed {
                                detail: format!("'{}' disappeared", pdf_path.display()),
                            }
                        })?;
                        check_magic(&pdf, PDF_MAGIC, "PDF").map_err(|_| {
                            Pdf2DocxError::ExportFailed {
                                detail: "exported file is not a PDF".into(),
                            }
                        })?;
                        ConversionArtifact::pdf(format!("{stem}.pdf"), pdf)
                    }
                    _ => ConversionArtifact::docx(format!("{stem}_translated.docx"), translated),
                }
            }
            _ => ConversionArtifact::docx(request.filename.clone(), docx),
        };

        workspace.close();
        Ok(artifact)
    }
}

fn check_magic(bytes: &[u8], magic: &[u8], what: &str) -> Result<(), Pdf2DocxError> {
    if bytes.is_empty() {
        return Err(Pdf2DocxError::InvalidEngineOutput {
            detail: format!("{what} output is empty"),
        });
    }
    if !bytes.starts_with(magic) {
        return Err(Pdf2DocxError::InvalidEngineOutput {
            detail: format!("{what} output has an unexpected signature"),
        });
    }
    Ok(())
}

/// Builder for [`Orchestrator`].
pub struct OrchestratorBuilder {
    config: OrchestratorConfig,
    engine: Arc<dyn ConversionEngine>,
    translator: Option<Arc<dyn Translator>>,
    exporter: Option<Arc<dyn PdfExporter>>,
    observer: Option<ObserverHandle>,
}

impl OrchestratorBuilder {
    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn exporter(mut self, exporter: Arc<dyn PdfExporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// Receive state transitions and stage changes of every request.
    pub fn observer(mut self, observer: ObserverHandle) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Remove translation (and with it PDF export) from the offering.
    pub fn without_translation(mut self) -> Self {
        self.translator = None;
        self
    }

    pub fn without_pdf_export(mut self) -> Self {
        self.exporter = None;
        self
    }

    pub fn build(self) -> Orchestrator {
        Orchestrator {
            config: self.config,
            engine: self.engine,
            translator: self.translator,
            exporter: self.exporter,
            observer: self.observer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl ConversionEngine for Unreachable {
        fn name(&self) -> &str {
            "unreachable"
        }
        async fn convert(&self, _request: &EngineRequest) -> Result<(), Pdf2DocxError> {
            panic!("engine must not run");
        }
    }

    #[test]
    fn magic_check_distinguishes_empty_and_foreign() {
        assert!(check_magic(b"PK\x03\x04rest", ZIP_MAGIC, "DOCX").is_ok());
        let err = check_magic(b"", ZIP_MAGIC, "DOCX").unwrap_err();
        assert!(err.to_string().contains("empty"));
        let err = check_magic(b"<html>", ZIP_MAGIC, "DOCX").unwrap_err();
        assert!(err.to_string().contains("signature"));
    }

    #[test]
    fn export_needs_translation() {
        let orchestrator = Orchestrator::builder(Arc::new(Unreachable))
            .exporter(Arc::new(LibreOfficeExporter::new("soffice")))
            .build();
        assert!(!orchestrator.supports_translation());
        assert!(!orchestrator.supports_pdf_export());
    }

    #[tokio::test]
    async fn non_pdf_never_reaches_the_engine() {
        let orchestrator = Orchestrator::builder(Arc::new(Unreachable)).build();
        let doc = UploadedDocument::new("notes.txt", b"hello".to_vec());
        let failure = orchestrator
            .run(doc, &ConversionOptions::default())
            .await
            .unwrap_err();
        assert_eq!(failure.kind, crate::error::ErrorKind::Validation);
        assert!(failure.message.contains("not a valid PDF"));
    }

    #[tokio::test]
    async fn translation_without_backend_is_disabled() {
        let orchestrator = Orchestrator::builder(Arc::new(Unreachable)).build();
        let doc = UploadedDocument::new("a.pdf", b"%PDF-1.4 whatever".to_vec());
        let options = ConversionOptions {
            translation: Some(Default::default()),
            ..Default::default()
        };
        let err = orchestrator.convert(doc, &options).await.unwrap_err();
        assert!(matches!(err, Pdf2DocxError::FeatureDisabled { .. }));
    }
}
