//! The external PDF→DOCX engine.
//!
//! The orchestrator only sees the [`ConversionEngine`] capability: give it a
//! staged PDF, a target path, an optional native page range and the
//! multi-processing hint; it either writes the DOCX or fails. Tests plug in
//! a stub; production uses [`Pdf2DocxCliEngine`], which drives the
//! `pdf2docx` command-line tool.

use crate::config::EnginePageRange;
use crate::error::Pdf2DocxError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Arguments for one engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRequest {
    /// Staged input PDF.
    pub pdf_path: PathBuf,
    /// Where the engine must write the DOCX.
    pub docx_path: PathBuf,
    /// 0-based, end-exclusive range; `None` converts every page.
    pub pages: Option<EnginePageRange>,
    /// Let the engine fan out across worker processes.
    pub multi_processing: bool,
}

/// Anything that can turn a PDF on disk into a DOCX on disk.
#[async_trait]
pub trait ConversionEngine: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Convert `request.pdf_path` into `request.docx_path`.
    async fn convert(&self, request: &EngineRequest) -> Result<(), Pdf2DocxError>;
}

/// Engine backed by the `pdf2docx` CLI.
///
/// Invoked as:
/// ```text
/// pdf2docx convert <pdf> <docx> [--start=N] [--end=M] [--multi_processing=True]
/// ```
#[derive(Debug, Clone)]
pub struct Pdf2DocxCliEngine {
    program: String,
    stderr_excerpt_chars: usize,
}

impl Pdf2DocxCliEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            stderr_excerpt_chars: 2000,
        }
    }

    pub fn with_stderr_excerpt(mut self, chars: usize) -> Self {
        self.stderr_excerpt_chars = chars;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Command-line arguments for `request`, after the program name.
    pub fn args(request: &EngineRequest) -> Vec<String> {
        let mut args = vec![
            "convert".to_string(),
            request.pdf_path.to_string_lossy().into_owned(),
            request.docx_path.to_string_lossy().into_owned(),
        ];
        if let Some(range) = request.pages {
            args.push(format!("--start={}", range.start));
            args.push(format!("--end={}", range.end));
        }
        if request.multi_processing {
            args.push("--multi_processing=True".to_string());
        }
        args
    }
}

#[async_trait]
impl ConversionEngine for Pdf2DocxCliEngine {
    fn name(&self) -> &str {
        "pdf2docx"
    }

    async fn convert(&self, request: &EngineRequest) -> Result<(), Pdf2DocxError> {
        let args = Self::args(request);
        info!(
            "Running {} (pages: {:?}, multi_processing: {})",
            self.program, request.pages, request.multi_processing
        );
        debug!("Engine arguments: {:?}", args);

        let start = Instant::now();
        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| Pdf2DocxError::EngineUnavailable {
                program: self.program.clone(),
                source,
            })?;
        let elapsed_ms = start.elapsed().as_millis();

        if !output.status.success() {
            let stderr = excerpt(&output.stderr, self.stderr_excerpt_chars);
            warn!(
                "{} exited with {:?} after {}ms: {}",
                self.program,
                output.status.code(),
                elapsed_ms,
                stderr
            );
            return Err(Pdf2DocxError::EngineFailed {
                program: self.program.clone(),
                code: output.status.code(),
                stderr,
            });
        }

        if !tokio::fs::try_exists(&request.docx_path).await.unwrap_or(false) {
            // pdf2docx reports some failures on stderr with exit status 0.
            let stderr = excerpt(&output.stderr, self.stderr_excerpt_chars);
            if !stderr.is_empty() {
                warn!("{} wrote no output: {}", self.program, stderr);
            }
            return Err(Pdf2DocxError::EngineOutputMissing {
                path: request.docx_path.clone(),
            });
        }

        info!("{} finished in {}ms", self.program, elapsed_ms);
        Ok(())
    }
}

/// Last `max_chars` characters of a process stream, trimmed.
///
/// The tail carries the actual exception in Python tracebacks.
pub(crate) fn excerpt(raw: &[u8], max_chars: usize) -> String {
    let text = String::from_utf8_lossy(raw);
    let text = text.trim();
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - max_chars).collect();
    format!("\u{2026}{tail}")
}
