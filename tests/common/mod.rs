//! Shared fixtures: lopdf-built PDFs and stand-in engines.

#![allow(dead_code)]

use async_trait::async_trait;
use edgequake_pdf2docx::pipeline::translate::{TranslateError, Translator};
use edgequake_pdf2docx::{ConversionEngine, EngineRequest, Pdf2DocxError};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// A valid PDF with `n` empty A4 pages.
pub fn pdf_with_pages(n: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let kids: Vec<Object> = (0..n)
        .map(|_| {
            let content = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            })
            .into()
        })
        .collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => n as i64,
        }),
    );
    let catalog = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog);
    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// `pdf` with its `startxref` offset pointing into the header, so lopdf
/// can no longer find the cross-reference table.
pub fn with_broken_startxref(mut pdf: Vec<u8>) -> Vec<u8> {
    let marker = b"startxref";
    let at = pdf
        .windows(marker.len())
        .rposition(|w| w == marker)
        .expect("PDF has a startxref");
    pdf.truncate(at);
    pdf.extend_from_slice(b"startxref\n12\n%%EOF\n");
    pdf
}

/// A DOCX package whose body holds one paragraph per entry of `paragraphs`.
pub fn docx_with_paragraphs(paragraphs: &[String]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{W_NS}"><w:body>{body}</w:body></w:document>"#
    );
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    writer.start_file("[Content_Types].xml", options).unwrap();
    writer.write_all(b"<Types/>").unwrap();
    writer.start_file("word/document.xml", options).unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

/// Stand-in for `pdf2docx`: writes a DOCX with a "Page N" paragraph for each
/// converted page and records every request.
#[derive(Default)]
pub struct StubEngine {
    pub requests: Mutex<Vec<EngineRequest>>,
}

impl StubEngine {
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<EngineRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ConversionEngine for StubEngine {
    fn name(&self) -> &str {
        "stub"
    }

    async fn convert(&self, request: &EngineRequest) -> Result<(), Pdf2DocxError> {
        self.requests.lock().unwrap().push(request.clone());

        let pdf = tokio::fs::read(&request.pdf_path).await.unwrap();
        // The real engine repairs what lopdf cannot load; treat it as empty.
        let total = Document::load_mem(&pdf)
            .map(|d| d.get_pages().len())
            .unwrap_or(0);
        let (start, end) = request
            .pages
            .map(|r| (r.start, r.end))
            .unwrap_or((0, total));

        let paragraphs: Vec<String> = (start..end).map(|i| format!("Page {}", i + 1)).collect();
        tokio::fs::write(&request.docx_path, docx_with_paragraphs(&paragraphs))
            .await
            .unwrap();
        Ok(())
    }
}

/// Engine that exits successfully but writes `output` (possibly nothing).
pub struct BadOutputEngine {
    pub output: Option<Vec<u8>>,
}

#[async_trait]
impl ConversionEngine for BadOutputEngine {
    fn name(&self) -> &str {
        "bad-output"
    }

    async fn convert(&self, request: &EngineRequest) -> Result<(), Pdf2DocxError> {
        if let Some(ref bytes) = self.output {
            tokio::fs::write(&request.docx_path, bytes).await.unwrap();
        }
        Ok(())
    }
}

/// Engine that leaves a directory where the DOCX should be, so reading the
/// output back fails with an I/O error other than "not found".
pub struct DirectoryOutputEngine;

#[async_trait]
impl ConversionEngine for DirectoryOutputEngine {
    fn name(&self) -> &str {
        "directory-output"
    }

    async fn convert(&self, request: &EngineRequest) -> Result<(), Pdf2DocxError> {
        tokio::fs::create_dir(&request.docx_path).await.unwrap();
        Ok(())
    }
}

/// Engine that fails like a crashed `pdf2docx`.
pub struct CrashingEngine;

#[async_trait]
impl ConversionEngine for CrashingEngine {
    fn name(&self) -> &str {
        "crashing"
    }

    async fn convert(&self, _request: &EngineRequest) -> Result<(), Pdf2DocxError> {
        Err(Pdf2DocxError::EngineFailed {
            program: "pdf2docx".into(),
            code: Some(1),
            stderr: "Traceback (most recent call last):\nValueError: bad xref".into(),
        })
    }
}

/// Translator that tags text with the target language.
#[derive(Default)]
pub struct TaggingTranslator {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Translator for TaggingTranslator {
    fn name(&self) -> &str {
        "tagging"
    }

    async fn translate(
        &self,
        text: &str,
        _source: &str,
        target: &str,
    ) -> Result<String, TranslateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("[{target}] {text}"))
    }
}

/// Number of entries left in `dir`.
pub fn entries(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}
