//! Orchestrator integration tests with a stand-in engine.
//!
//! Every test builds its PDFs with lopdf and points the workspaces at a
//! private temp root, so leftover files are easy to detect.

mod common;

use async_trait::async_trait;
use common::{
    entries, pdf_with_pages, with_broken_startxref, BadOutputEngine, CrashingEngine,
    DirectoryOutputEngine, StubEngine, TaggingTranslator,
};
use edgequake_pdf2docx::pipeline::translate::{read_part, DOCUMENT_XML};
use edgequake_pdf2docx::{
    ConversionObserver, ConversionOptions, ConversionStage, ConversionState, EnginePageRange,
    ErrorKind, Orchestrator, OrchestratorConfig, PageBound, Pdf2DocxError, PdfExporter,
    TranslationOptions, UploadedDocument,
};
use edgequake_pdf2docx::output::{DOCX_MEDIA_TYPE, PDF_MEDIA_TYPE};
use proptest::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Helpers ──────────────────────────────────────────────────────────────────

struct Harness {
    root: TempDir,
    engine: Arc<StubEngine>,
    orchestrator: Orchestrator,
}

fn harness() -> Harness {
    let root = tempfile::tempdir().unwrap();
    let engine = Arc::new(StubEngine::default());
    let config = OrchestratorConfig::builder()
        .temp_root(root.path())
        .build()
        .unwrap();
    let orchestrator = Orchestrator::builder(engine.clone()).config(config).build();
    Harness {
        root,
        engine,
        orchestrator,
    }
}

fn range(start: u32, end: u32, output: &str) -> ConversionOptions {
    ConversionOptions {
        start_page: PageBound::at(start),
        end_page: PageBound::at(end),
        output_filename: output.to_string(),
        ..Default::default()
    }
}

fn paragraphs(docx: &[u8]) -> Vec<String> {
    let xml = read_part(docx, DOCUMENT_XML).unwrap();
    xml.split("<w:t")
        .skip(1)
        .filter_map(|chunk| {
            let text = chunk.split_once('>')?.1;
            Some(text.split("</w:t>").next()?.to_string())
        })
        .collect()
}

/// Exporter that writes a tiny PDF named after the DOCX.
struct FakeExporter;

#[async_trait]
impl PdfExporter for FakeExporter {
    fn name(&self) -> &str {
        "fake"
    }

    async fn export(&self, docx_path: &Path, out_dir: &Path) -> Result<PathBuf, Pdf2DocxError> {
        let stem = docx_path.file_stem().unwrap().to_string_lossy().into_owned();
        let pdf = out_dir.join(format!("{stem}.pdf"));
        let docx = tokio::fs::read(docx_path).await.unwrap();
        let mut bytes = b"%PDF-1.7\n".to_vec();
        bytes.extend_from_slice(&docx[..4]);
        tokio::fs::write(&pdf, bytes).await.unwrap();
        Ok(pdf)
    }
}

#[derive(Default)]
struct Recorder {
    states: Mutex<Vec<ConversionState>>,
    stages: Mutex<Vec<ConversionStage>>,
}

impl ConversionObserver for Recorder {
    fn on_state_change(&self, _from: ConversionState, to: ConversionState) {
        self.states.lock().unwrap().push(to);
    }
    fn on_stage(&self, stage: ConversionStage) {
        self.stages.lock().unwrap().push(stage);
    }
}

// ── Page ranges ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn converts_only_the_requested_pages() {
    let h = harness();
    let doc = UploadedDocument::new("report.pdf", pdf_with_pages(10));

    let artifact = h.orchestrator.run(doc, &range(3, 5, "out.docx")).await.unwrap();

    assert_eq!(artifact.filename, "out.docx");
    assert_eq!(artifact.media_type, DOCX_MEDIA_TYPE);
    assert_eq!(paragraphs(&artifact.bytes), vec!["Page 3", "Page 4", "Page 5"]);

    let request = h.engine.last_request().unwrap();
    assert_eq!(request.pages, Some(EnginePageRange { start: 2, end: 5 }));
    assert!(!request.multi_processing);
    assert_eq!(entries(h.root.path()), 0, "workspace must be removed");
}

#[tokio::test]
async fn whole_document_when_no_bound_is_enabled() {
    let h = harness();
    let doc = UploadedDocument::new("four.pdf", pdf_with_pages(4));
    let options = ConversionOptions {
        // Values without their checkbox have no effect.
        start_page: PageBound {
            enabled: false,
            value: 3,
        },
        multi_processing: true,
        ..Default::default()
    };

    let artifact = h.orchestrator.run(doc, &options).await.unwrap();

    assert_eq!(artifact.filename, "four.docx");
    assert_eq!(paragraphs(&artifact.bytes).len(), 4);
    let request = h.engine.last_request().unwrap();
    assert_eq!(request.pages, None);
    assert!(request.multi_processing);
}

#[tokio::test]
async fn only_start_runs_to_the_last_page() {
    let h = harness();
    let doc = UploadedDocument::new("ten.pdf", pdf_with_pages(10));
    let options = ConversionOptions {
        start_page: PageBound::at(8),
        ..Default::default()
    };

    let artifact = h.orchestrator.run(doc, &options).await.unwrap();

    assert_eq!(paragraphs(&artifact.bytes), vec!["Page 8", "Page 9", "Page 10"]);
    assert_eq!(
        h.engine.last_request().unwrap().pages,
        Some(EnginePageRange { start: 7, end: 10 })
    );
}

#[tokio::test]
async fn inverted_range_never_reaches_the_engine() {
    let h = harness();
    let doc = UploadedDocument::new("report.pdf", pdf_with_pages(10));

    let failure = h
        .orchestrator
        .run(doc, &range(8, 3, "out.docx"))
        .await
        .unwrap_err();

    assert_eq!(failure.kind, ErrorKind::Validation);
    assert!(failure.message.contains("smaller than start page"), "{}", failure.message);
    assert_eq!(h.engine.calls(), 0);
    assert_eq!(entries(h.root.path()), 0, "no temp artifact may be left behind");
}

#[tokio::test]
async fn bounds_past_the_last_page_fail_fast() {
    let h = harness();
    let doc = UploadedDocument::new("report.pdf", pdf_with_pages(10));

    let err = h
        .orchestrator
        .convert(doc, &range(3, 12, ""))
        .await
        .unwrap_err();

    assert!(matches!(err, Pdf2DocxError::PageOutOfRange { page: 12, total: 10 }));
    assert_eq!(h.engine.calls(), 0);
}

// ── Inputs and names ─────────────────────────────────────────────────────────

#[tokio::test]
async fn non_pdf_upload_is_rejected() {
    let h = harness();
    let doc = UploadedDocument::new("photo.png", b"\x89PNG\r\n\x1a\n".to_vec());

    let failure = h
        .orchestrator
        .run(doc, &ConversionOptions::default())
        .await
        .unwrap_err();

    assert_eq!(failure.kind, ErrorKind::Validation);
    assert_eq!(h.engine.calls(), 0);
}

#[tokio::test]
async fn unreadable_pdf_with_page_bounds_is_an_engine_failure_with_generic_message() {
    let h = harness();
    let doc = UploadedDocument::new("broken.pdf", b"%PDF-1.4\n%%garbage".to_vec());

    let failure = h
        .orchestrator
        .run(doc, &range(1, 2, ""))
        .await
        .unwrap_err();

    assert_eq!(failure.kind, ErrorKind::ConversionEngine);
    assert!(!failure.message.contains("broken.pdf"));
    assert_eq!(h.engine.calls(), 0);
    assert_eq!(entries(h.root.path()), 0);
}

#[tokio::test]
async fn unreadable_pdf_without_bounds_goes_to_the_engine() {
    let h = harness();
    let pdf = with_broken_startxref(pdf_with_pages(3));
    assert!(lopdf::Document::load_mem(&pdf).is_err());

    let artifact = h
        .orchestrator
        .run(UploadedDocument::new("damaged.pdf", pdf), &ConversionOptions::default())
        .await
        .unwrap();

    assert_eq!(artifact.filename, "damaged.docx");
    assert_eq!(h.engine.calls(), 1);
    assert_eq!(h.engine.last_request().unwrap().pages, None);
    assert_eq!(entries(h.root.path()), 0);
}

#[tokio::test]
async fn blank_output_name_uses_the_input_stem() {
    let h = harness();
    let doc = UploadedDocument::new("Annual Report.pdf", pdf_with_pages(1));
    let options = ConversionOptions {
        output_filename: "   ".into(),
        ..Default::default()
    };

    let artifact = h.orchestrator.run(doc, &options).await.unwrap();
    assert_eq!(artifact.filename, "Annual Report.docx");
}

#[tokio::test]
async fn same_request_twice_gives_equivalent_artifacts() {
    let h = harness();
    let pdf = pdf_with_pages(6);
    let options = range(2, 4, "copy");

    let first = h
        .orchestrator
        .run(UploadedDocument::new("a.pdf", pdf.clone()), &options)
        .await
        .unwrap();
    let second = h
        .orchestrator
        .run(UploadedDocument::new("a.pdf", pdf), &options)
        .await
        .unwrap();

    assert_eq!(first.filename, "copy.docx");
    assert_eq!(first.filename, second.filename);
    assert_eq!(paragraphs(&first.bytes), paragraphs(&second.bytes));
    assert_eq!(h.engine.calls(), 2);
}

// ── Engine failures ──────────────────────────────────────────────────────────

#[tokio::test]
async fn engine_crash_is_reported_without_its_traceback() {
    let root = tempfile::tempdir().unwrap();
    let config = OrchestratorConfig::builder()
        .temp_root(root.path())
        .build()
        .unwrap();
    let orchestrator = Orchestrator::builder(Arc::new(CrashingEngine))
        .config(config)
        .build();

    let failure = orchestrator
        .run(UploadedDocument::new("a.pdf", pdf_with_pages(2)), &Default::default())
        .await
        .unwrap_err();

    assert_eq!(failure.kind, ErrorKind::ConversionEngine);
    assert!(!failure.message.contains("Traceback"));
    assert_eq!(entries(root.path()), 0);
}

#[tokio::test]
async fn missing_or_foreign_engine_output_is_not_offered() {
    for (output, expected) in [
        (None, "EngineOutputMissing"),
        (Some(Vec::new()), "InvalidEngineOutput"),
        (Some(b"<html>oops</html>".to_vec()), "InvalidEngineOutput"),
    ] {
        let root = tempfile::tempdir().unwrap();
        let config = OrchestratorConfig::builder()
            .temp_root(root.path())
            .build()
            .unwrap();
        let orchestrator = Orchestrator::builder(Arc::new(BadOutputEngine { output }))
            .config(config)
            .build();
        let err = orchestrator
            .convert(UploadedDocument::new("a.pdf", pdf_with_pages(1)), &Default::default())
            .await
            .unwrap_err();
        assert!(format!("{err:?}").starts_with(expected), "got {err:?}");
        assert_eq!(err.kind(), ErrorKind::ConversionEngine);
        assert_eq!(entries(root.path()), 0);
    }
}

// ── Resource failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn vanished_temp_root_is_a_resource_failure() {
    let outer = tempfile::tempdir().unwrap();
    let root = outer.path().join("workspaces");
    std::fs::create_dir(&root).unwrap();
    let engine = Arc::new(StubEngine::default());
    let config = OrchestratorConfig::builder()
        .temp_root(&root)
        .build()
        .unwrap();
    let orchestrator = Orchestrator::builder(engine.clone()).config(config).build();
    std::fs::remove_dir(&root).unwrap();

    let failure = orchestrator
        .run(UploadedDocument::new("a.pdf", pdf_with_pages(2)), &range(1, 2, ""))
        .await
        .unwrap_err();

    assert_eq!(failure.kind, ErrorKind::Resource);
    assert!(failure.message.contains("temporary storage"), "{}", failure.message);
    assert!(!failure.message.contains("workspaces"));
    assert_eq!(engine.calls(), 0);
    assert_eq!(entries(outer.path()), 0);
}

#[tokio::test]
async fn unreadable_engine_output_is_a_resource_failure_and_cleans_up() {
    let root = tempfile::tempdir().unwrap();
    let config = OrchestratorConfig::builder()
        .temp_root(root.path())
        .build()
        .unwrap();
    let orchestrator = Orchestrator::builder(Arc::new(DirectoryOutputEngine))
        .config(config)
        .build();

    let err = orchestrator
        .convert(UploadedDocument::new("a.pdf", pdf_with_pages(1)), &Default::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Pdf2DocxError::ArtifactReadFailed { .. }), "got {err:?}");
    assert_eq!(err.kind(), ErrorKind::Resource);
    assert_eq!(entries(root.path()), 0);
}

// ── Translation and export ───────────────────────────────────────────────────

#[tokio::test]
async fn stemless_output_name_translates_under_the_upload_stem() {
    let orchestrator = Orchestrator::builder(Arc::new(StubEngine::default()))
        .translator(Arc::new(TaggingTranslator::default()))
        .build();
    let options = ConversionOptions {
        output_filename: ".docx".into(),
        translation: Some(TranslationOptions::to("fr")),
        ..Default::default()
    };

    let artifact = orchestrator
        .run(UploadedDocument::new("report.pdf", pdf_with_pages(1)), &options)
        .await
        .unwrap();

    assert_eq!(artifact.filename, "report_translated.docx");
}

#[tokio::test]
async fn translated_download_is_named_after_the_output_stem() {
    let translator = Arc::new(TaggingTranslator::default());
    let orchestrator = Orchestrator::builder(Arc::new(StubEngine::default()))
        .translator(translator.clone())
        .build();
    let options = ConversionOptions {
        output_filename: "paper.docx".into(),
        translation: Some(TranslationOptions::to("fr")),
        ..range(1, 2, "")
    };

    let artifact = orchestrator
        .run(UploadedDocument::new("in.pdf", pdf_with_pages(3)), &options)
        .await
        .unwrap();

    assert_eq!(artifact.filename, "paper_translated.docx");
    assert_eq!(paragraphs(&artifact.bytes), vec!["[fr] Page 1", "[fr] Page 2"]);
    assert_eq!(translator.calls.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[tokio::test]
async fn translated_pdf_export() {
    let recorder = Arc::new(Recorder::default());
    let orchestrator = Orchestrator::builder(Arc::new(StubEngine::default()))
        .translator(Arc::new(TaggingTranslator::default()))
        .exporter(Arc::new(FakeExporter))
        .observer(recorder.clone())
        .build();
    let options = ConversionOptions {
        translation: Some(TranslationOptions::to("de")),
        export_pdf: true,
        ..Default::default()
    };

    let artifact = orchestrator
        .run(UploadedDocument::new("thesis.pdf", pdf_with_pages(2)), &options)
        .await
        .unwrap();

    assert_eq!(artifact.filename, "thesis.pdf");
    assert_eq!(artifact.media_type, PDF_MEDIA_TYPE);
    assert!(artifact.bytes.starts_with(b"%PDF"));
    assert_eq!(
        *recorder.states.lock().unwrap(),
        vec![
            ConversionState::Validating,
            ConversionState::Converting,
            ConversionState::Done
        ]
    );
    assert_eq!(
        *recorder.stages.lock().unwrap(),
        vec![
            ConversionStage::Staging,
            ConversionStage::Engine,
            ConversionStage::Translating,
            ConversionStage::Exporting
        ]
    );
}

#[tokio::test]
async fn unknown_target_language_is_a_validation_error() {
    let orchestrator = Orchestrator::builder(Arc::new(StubEngine::default()))
        .translator(Arc::new(TaggingTranslator::default()))
        .build();
    let options = ConversionOptions {
        translation: Some(TranslationOptions::to("xx-YY")),
        ..Default::default()
    };

    let err = orchestrator
        .convert(UploadedDocument::new("a.pdf", pdf_with_pages(1)), &options)
        .await
        .unwrap_err();
    assert!(matches!(err, Pdf2DocxError::UnsupportedLanguage { .. }));
}

#[tokio::test]
async fn export_without_exporter_is_disabled() {
    let orchestrator = Orchestrator::builder(Arc::new(StubEngine::default()))
        .translator(Arc::new(TaggingTranslator::default()))
        .build();
    let options = ConversionOptions {
        translation: Some(TranslationOptions::default()),
        export_pdf: true,
        ..Default::default()
    };

    let err = orchestrator
        .convert(UploadedDocument::new("a.pdf", pdf_with_pages(1)), &options)
        .await
        .unwrap_err();
    assert!(matches!(err, Pdf2DocxError::FeatureDisabled { feature: "PDF export" }));
}

// ── Properties ───────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn start_after_end_is_always_validation(start in 2u32..40, gap in 1u32..20) {
        let end = start.saturating_sub(gap).max(1);
        prop_assume!(end < start);

        let rt = tokio::runtime::Runtime::new().unwrap();
        let h = harness();
        let doc = UploadedDocument::new("p.pdf", pdf_with_pages(40));
        let failure = rt
            .block_on(h.orchestrator.run(doc, &range(start, end, "")))
            .unwrap_err();

        prop_assert_eq!(failure.kind, ErrorKind::Validation);
        prop_assert_eq!(h.engine.calls(), 0);
        prop_assert_eq!(entries(h.root.path()), 0);
    }

    #[test]
    fn valid_ranges_convert_exactly_those_pages(start in 1u32..=8, len in 0u32..3) {
        let end = start + len;
        let rt = tokio::runtime::Runtime::new().unwrap();
        let h = harness();
        let doc = UploadedDocument::new("p.pdf", pdf_with_pages(10));
        let artifact = rt
            .block_on(h.orchestrator.run(doc, &range(start, end, "")))
            .unwrap();

        let expected: Vec<String> = (start..=end).map(|p| format!("Page {p}")).collect();
        prop_assert_eq!(paragraphs(&artifact.bytes), expected);
    }
}
