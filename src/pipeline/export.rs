//! DOCX→PDF export through a headless office suite.

use crate::error::Pdf2DocxError;
use crate::pipeline::engine::excerpt;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, warn};

/// Anything that can render a DOCX on disk into a PDF on disk.
#[async_trait]
pub trait PdfExporter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Export `docx_path` into `out_dir`; returns the written PDF's path.
    async fn export(&self, docx_path: &Path, out_dir: &Path) -> Result<PathBuf, Pdf2DocxError>;
}

/// Exporter backed by LibreOffice (`soffice --headless --convert-to pdf`).
///
/// Every run gets its own user profile inside `out_dir`: two soffice
/// processes sharing a profile block each other.
#[derive(Debug, Clone)]
pub struct LibreOfficeExporter {
    program: String,
    stderr_excerpt_chars: usize,
}

impl LibreOfficeExporter {
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

    /// Command-line arguments for one export.
    pub fn args(docx_path: &Path, out_dir: &Path) -> Vec<String> {
        let profile = out_dir.join("lo-profile");
        vec![
            format!("-env:UserInstallation=file://{}", profile.display()),
            "--headless".to_string(),
            "--convert-to".to_string(),
            "pdf".to_string(),
            "--outdir".to_string(),
            out_dir.to_string_lossy().into_owned(),
            docx_path.to_string_lossy().into_owned(),
        ]
    }

    /// Where soffice writes the PDF for `docx_path`.
    pub fn expected_output(docx_path: &Path, out_dir: &Path) -> PathBuf {
        let stem = docx_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        out_dir.join(format!("{stem}.pdf"))
    }
}

#[async_trait]
impl PdfExporter for LibreOfficeExporter {
    fn name(&self) -> &str {
        "libreoffice"
    }

    async fn export(&self, docx_path: &Path, out_dir: &Path) -> Result<PathBuf, Pdf2DocxError> {
        info!("Exporting {} to PDF with {}", docx_path.display(), self.program);
        let output = Command::new(&self.program)
            .args(Self::args(docx_path, out_dir))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| Pdf2DocxError::ExportUnavailable {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = excerpt(&output.stderr, self.stderr_excerpt_chars);
            warn!("{} exited with {:?}: {}", self.program, output.status.code(), stderr);
            return Err(Pdf2DocxError::ExportFailed {
                detail: format!("exit code {:?}: {}", output.status.code(), stderr),
            });
        }

        let pdf_path = Self::expected_output(docx_path, out_dir);
        if !tokio::fs::try_exists(&pdf_path).await.unwrap_or(false) {
            return Err(Pdf2DocxError::ExportFailed {
                detail: format!("no PDF written at '{}'", pdf_path.display()),
            });
        }
        Ok(pdf_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_isolate_the_profile() {
        let args = LibreOfficeExporter::args(Path::new("/ws/translated.docx"), Path::new("/ws"));
        assert_eq!(args[0], "-env:UserInstallation=file:///ws/lo-profile");
        assert_eq!(&args[1..5], &["--headless", "--convert-to", "pdf", "--outdir"]);
        assert_eq!(args.last().unwrap(), "/ws/translated.docx");
    }

    #[test]
    fn expected_output_uses_docx_stem() {
        let p = LibreOfficeExporter::expected_output(Path::new("/ws/translated.docx"), Path::new("/ws"));
        assert_eq!(p, PathBuf::from("/ws/translated.pdf"));
    }

    #[tokio::test]
    async fn missing_office_suite_is_unavailable() {
        let exporter = LibreOfficeExporter::new("/definitely/not/a/real/soffice");
        let dir = tempfile::tempdir().unwrap();
        let err = exporter
            .export(&dir.path().join("x.docx"), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2DocxError::ExportUnavailable { .. }));
    }
}
