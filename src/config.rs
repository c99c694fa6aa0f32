//! Configuration types for PDF-to-DOCX conversion.
//!
//! Two records control behaviour:
//!
//! * [`ConversionOptions`]: the per-request choices a user makes in the form
//!   (page bounds, multi-processing, output name, translation). Built fresh
//!   for every request and passed by reference into the orchestrator.
//! * [`OrchestratorConfig`]: the deployment-level knobs (engine executable,
//!   temp root, translation defaults), built once via
//!   [`OrchestratorConfig::builder()`].

use crate::error::Pdf2DocxError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default translation target (Traditional Chinese).
pub const DEFAULT_TARGET_LANG: &str = "zh-TW";

/// Source language value that asks the backend to auto-detect.
pub const AUTO_DETECT_LANG: &str = "auto";

// ── Per-request options ──────────────────────────────────────────────────

/// A 1-based page number paired with the checkbox that enables it.
///
/// The form always submits a number; it only takes effect when `enabled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageBound {
    pub enabled: bool,
    pub value: u32,
}

impl PageBound {
    /// A bound that is switched off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            value: 1,
        }
    }

    /// A bound that is switched on at `page`.
    pub fn at(page: u32) -> Self {
        Self {
            enabled: true,
            value: page,
        }
    }

    /// The page number if the bound is active.
    pub fn effective(&self) -> Option<u32> {
        self.enabled.then_some(self.value)
    }
}

impl Default for PageBound {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Translation request attached to a conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationOptions {
    /// Source language code, or `"auto"`.
    pub source_lang: String,
    /// Target language code, e.g. `"zh-TW"`, `"fr"`.
    pub target_lang: String,
}

impl TranslationOptions {
    pub fn to(target_lang: impl Into<String>) -> Self {
        Self {
            source_lang: AUTO_DETECT_LANG.to_string(),
            target_lang: target_lang.into(),
        }
    }
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self::to(DEFAULT_TARGET_LANG)
    }
}

/// Everything the user chose for one conversion request.
///
/// # Example
/// ```rust
/// use edgequake_pdf2docx::{ConversionOptions, PageBound};
///
/// let options = ConversionOptions {
///     start_page: PageBound::at(3),
///     end_page: PageBound::at(5),
///     output_filename: "out.docx".into(),
///     ..Default::default()
/// };
/// assert_eq!(options.start_page.effective(), Some(3));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOptions {
    /// First page to convert (1-based, inclusive).
    pub start_page: PageBound,
    /// Last page to convert (1-based, inclusive).
    pub end_page: PageBound,
    /// Hint forwarded to the engine; it may fan out across processes.
    pub multi_processing: bool,
    /// Requested download name. Blank falls back to `<input stem>.docx`.
    pub output_filename: String,
    /// Translate the produced document when set.
    pub translation: Option<TranslationOptions>,
    /// Export the translated document to PDF. Ignored without `translation`.
    pub export_pdf: bool,
}

// ── Page ranges ──────────────────────────────────────────────────────────

/// A validated, user-facing page range (1-based, inclusive on both ends).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

/// The engine's native page range: 0-based, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnginePageRange {
    pub start: usize,
    pub end: usize,
}

impl PageRange {
    /// Check the shape of the bounds without knowing the page count.
    ///
    /// Both bounds must be ≥ 1 and `start ≤ end` when both are enabled.
    pub fn check_bounds(start: Option<u32>, end: Option<u32>) -> Result<(), Pdf2DocxError> {
        if let Some(0) = start {
            return Err(Pdf2DocxError::InvalidPageNumber {
                field: "Start page",
                value: "0".into(),
            });
        }
        if let Some(0) = end {
            return Err(Pdf2DocxError::InvalidPageNumber {
                field: "End page",
                value: "0".into(),
            });
        }
        if let (Some(s), Some(e)) = (start, end) {
            if e < s {
                return Err(Pdf2DocxError::InvertedPageRange { start: s, end: e });
            }
        }
        Ok(())
    }

    /// Resolve optional bounds against the document's page count.
    ///
    /// Returns `Ok(None)` when neither bound is enabled (whole document).
    /// Bounds past the last page fail; they are never clamped.
    pub fn resolve(
        start: Option<u32>,
        end: Option<u32>,
        total_pages: u32,
    ) -> Result<Option<PageRange>, Pdf2DocxError> {
        Self::check_bounds(start, end)?;
        if start.is_none() && end.is_none() {
            return Ok(None);
        }

        let range = PageRange {
            start: start.unwrap_or(1),
            end: end.unwrap_or(total_pages),
        };
        for page in [range.start, range.end] {
            if page > total_pages {
                return Err(Pdf2DocxError::PageOutOfRange {
                    page,
                    total: total_pages,
                });
            }
        }
        // Only reachable with start enabled on an empty document.
        if range.end < range.start {
            return Err(Pdf2DocxError::PageOutOfRange {
                page: range.start,
                total: total_pages,
            });
        }
        Ok(Some(range))
    }

    /// Number of pages covered.
    pub fn page_count(&self) -> u32 {
        self.end - self.start + 1
    }

    /// Translate to the engine's 0-based, end-exclusive indexing.
    pub fn to_engine(self) -> EnginePageRange {
        EnginePageRange {
            start: (self.start - 1) as usize,
            end: self.end as usize,
        }
    }
}

// ── Orchestrator configuration ───────────────────────────────────────────

/// Deployment-level configuration for the [`crate::convert::Orchestrator`].
///
/// # Example
/// ```rust
/// use edgequake_pdf2docx::OrchestratorConfig;
///
/// let config = OrchestratorConfig::builder()
///     .engine_program("/opt/venv/bin/pdf2docx")
///     .stderr_excerpt_chars(500)
///     .build()
///     .unwrap();
/// assert_eq!(config.stderr_excerpt_chars, 500);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Directory under which per-request workspaces are created.
    /// `None` uses the system temp directory.
    pub temp_root: Option<PathBuf>,

    /// Executable of the PDF→DOCX engine. Default: `pdf2docx`.
    pub engine_program: String,

    /// Executable of the office suite used for PDF export. Default: `soffice`.
    pub soffice_program: String,

    /// Default target language offered in the form. Default: `zh-TW`.
    pub default_target_lang: String,

    /// Maximum characters of engine stderr kept in errors and logs. Default: 2000.
    pub stderr_excerpt_chars: usize,

    /// Timeout for a single translation HTTP call in seconds. Default: 30.
    pub translate_timeout_secs: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            temp_root: None,
            engine_program: "pdf2docx".to_string(),
            soffice_program: "soffice".to_string(),
            default_target_lang: DEFAULT_TARGET_LANG.to_string(),
            stderr_excerpt_chars: 2000,
            translate_timeout_secs: 30,
        }
    }
}

impl OrchestratorConfig {
    /// Create a new builder for `OrchestratorConfig`.
    pub fn builder() -> OrchestratorConfigBuilder {
        OrchestratorConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`OrchestratorConfig`].
#[derive(Debug)]
pub struct OrchestratorConfigBuilder {
    config: OrchestratorConfig,
}

impl OrchestratorConfigBuilder {
    pub fn temp_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_root = Some(dir.into());
        self
    }

    pub fn engine_program(mut self, program: impl Into<String>) -> Self {
        self.config.engine_program = program.into();
        self
    }

    pub fn soffice_program(mut self, program: impl Into<String>) -> Self {
        self.config.soffice_program = program.into();
        self
    }

    pub fn default_target_lang(mut self, code: impl Into<String>) -> Self {
        self.config.default_target_lang = code.into();
        self
    }

    pub fn stderr_excerpt_chars(mut self, n: usize) -> Self {
        self.config.stderr_excerpt_chars = n.max(80);
        self
    }

    pub fn translate_timeout_secs(mut self, secs: u64) -> Self {
        self.config.translate_timeout_secs = secs.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<OrchestratorConfig, Pdf2DocxError> {
        let c = &self.config;
        if c.engine_program.trim().is_empty() {
            return Err(Pdf2DocxError::InvalidConfig(
                "engine program must not be empty".into(),
            ));
        }
        if c.soffice_program.trim().is_empty() {
            return Err(Pdf2DocxError::InvalidConfig(
                "soffice program must not be empty".into(),
            ));
        }
        if crate::languages::lookup(&c.default_target_lang).is_none() {
            return Err(Pdf2DocxError::InvalidConfig(format!(
                "unknown default target language '{}'",
                c.default_target_lang
            )));
        }
        if let Some(ref root) = c.temp_root {
            if !root.is_dir() {
                return Err(Pdf2DocxError::InvalidConfig(format!(
                    "temp root '{}' is not a directory",
                    root.display()
                )));
            }
        }
        Ok(self.config)
    }
}
