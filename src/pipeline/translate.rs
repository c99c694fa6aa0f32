//! Paragraph-level translation of a DOCX produced by the engine.
//!
//! Only `word/document.xml` is rewritten; every other part of the package is
//! copied byte-for-byte. Each `w:p` is translated as one unit:
//!
//! 1. the text of its `w:t` runs is concatenated and stripped,
//! 2. blank paragraphs are left untouched,
//! 3. identical texts are translated once per document (cache),
//! 4. leading/trailing spaces of the original are restored,
//! 5. the result goes into the first `w:t` and the other runs are emptied.
//!
//! Paragraph styles (headings, list levels) survive; inline formatting on
//! individual words may not. Table cells are plain `w:p` elements and are
//! handled the same way. Paragraphs nested in text boxes are translated on
//! their own, not as part of the paragraph that anchors the box.
//!
//! A paragraph whose translation fails keeps its original text. Only a
//! package that cannot be read or written fails the whole step.

use crate::error::Pdf2DocxError;
use async_trait::async_trait;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use thiserror::Error;
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Main document part inside a DOCX package.
pub const DOCUMENT_XML: &str = "word/document.xml";

const PARAGRAPH: &[u8] = b"w:p";
const TEXT: &[u8] = b"w:t";

/// A non-fatal failure translating one piece of text.
#[derive(Debug, Clone, Error)]
pub enum TranslateError {
    /// Network or client failure.
    #[error("translation request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("translation backend returned HTTP {0}")]
    Status(u16),

    /// The backend's answer could not be understood.
    #[error("unexpected translation response: {0}")]
    MalformedResponse(String),

    /// The text exceeds what the backend accepts in one call.
    #[error("text of {len} characters exceeds the {max}-character limit")]
    TextTooLong { len: usize, max: usize },
}

/// Anything that can translate a piece of plain text.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Translate `text` from `source` (or `"auto"`) to `target`.
    async fn translate(&self, text: &str, source: &str, target: &str)
        -> Result<String, TranslateError>;
}

/// Counters reported after a document is translated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslationStats {
    pub paragraphs: usize,
    pub translated: usize,
    pub cache_hits: usize,
    pub failed: usize,
}

/// Translate every paragraph of a DOCX package.
pub async fn translate_docx(
    docx: &[u8],
    translator: &dyn Translator,
    source: &str,
    target: &str,
) -> Result<(Vec<u8>, TranslationStats), Pdf2DocxError> {
    let xml = read_part(docx, DOCUMENT_XML)?;
    let events = parse_events(&xml)?;
    let layout = ParagraphLayout::scan(&events);

    let mut session = TranslationSession::new(translator, source, target);
    let mut replacements: Vec<Option<String>> = Vec::with_capacity(layout.texts.len());
    for text in &layout.texts {
        replacements.push(session.translate_paragraph(text).await);
    }
    session.stats.paragraphs = layout.texts.len();
    info!(
        "Translated {}/{} paragraphs with {} ({} cached, {} failed)",
        session.stats.translated,
        session.stats.paragraphs,
        translator.name(),
        session.stats.cache_hits,
        session.stats.failed
    );

    let rewritten = rewrite_events(events, &replacements)?;
    let package = replace_part(docx, DOCUMENT_XML, &rewritten)?;
    Ok((package, session.stats))
}

// ── Translation with cache ───────────────────────────────────────────────

struct TranslationSession<'a> {
    translator: &'a dyn Translator,
    source: &'a str,
    target: &'a str,
    cache: HashMap<String, String>,
    stats: TranslationStats,
}

impl<'a> TranslationSession<'a> {
    fn new(translator: &'a dyn Translator, source: &'a str, target: &'a str) -> Self {
        Self {
            translator,
            source,
            target,
            cache: HashMap::new(),
            stats: TranslationStats::default(),
        }
    }

    /// `Some(new text)` when the paragraph should change.
    async fn translate_paragraph(&mut self, text: &str) -> Option<String> {
        let stripped = text.trim();
        if stripped.is_empty() {
            return None;
        }

        let translated = match self.cache.get(stripped) {
            Some(hit) => {
                self.stats.cache_hits += 1;
                hit.clone()
            }
            None => match self
                .translator
                .translate(stripped, self.source, self.target)
                .await
            {
                Ok(t) if !t.trim().is_empty() => {
                    self.cache.insert(stripped.to_string(), t.clone());
                    t
                }
                Ok(_) => {
                    warn!("Empty translation for {:?}; keeping original", preview(stripped));
                    self.stats.failed += 1;
                    return None;
                }
                Err(e) => {
                    warn!("Translation error for {:?}: {}", preview(stripped), e);
                    self.stats.failed += 1;
                    return None;
                }
            },
        };

        self.stats.translated += 1;
        let leading = text.len() - text.trim_start_matches(' ').len();
        let trailing = text.len() - text.trim_end_matches(' ').len();
        Some(format!(
            "{}{}{}",
            " ".repeat(leading),
            translated,
            " ".repeat(trailing)
        ))
    }
}

fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}

// ── WordprocessingML walking ─────────────────────────────────────────────

fn parse_events(xml: &str) -> Result<Vec<Event<'static>>, Pdf2DocxError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    let mut events = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(ev) => events.push(ev.into_owned()),
            Err(e) => {
                return Err(Pdf2DocxError::TranslationFailed {
                    detail: format!(
                        "{} is not well-formed at byte {}: {}",
                        DOCUMENT_XML,
                        reader.buffer_position(),
                        e
                    ),
                })
            }
        }
    }
    Ok(events)
}

/// Which paragraph owns which text runs.
struct ParagraphLayout {
    /// Concatenated `w:t` text per paragraph, in document order of opening.
    texts: Vec<String>,
}

/// Tracks the innermost open paragraph and whether we are inside a `w:t`.
#[derive(Default)]
struct RunTracker {
    open: Vec<usize>,
    next_id: usize,
    in_text: Option<usize>,
}

impl RunTracker {
    /// Update position for `ev`; returns the paragraph id a `w:p` start opened.
    fn step(&mut self, ev: &Event<'_>) -> Option<usize> {
        match ev {
            Event::Start(e) if e.name().as_ref() == PARAGRAPH => {
                let id = self.next_id;
                self.next_id += 1;
                self.open.push(id);
                return Some(id);
            }
            Event::End(e) if e.name().as_ref() == PARAGRAPH => {
                self.open.pop();
            }
            Event::Start(e) if e.name().as_ref() == TEXT => {
                self.in_text = self.open.last().copied();
            }
            Event::End(e) if e.name().as_ref() == TEXT => {
                self.in_text = None;
            }
            _ => {}
        }
        None
    }
}

impl ParagraphLayout {
    fn scan(events: &[Event<'static>]) -> Self {
        let mut texts: Vec<String> = Vec::new();
        let mut tracker = RunTracker::default();
        for ev in events {
            if tracker.step(ev).is_some() {
                texts.push(String::new());
                continue;
            }
            if let (Event::Text(t), Some(p)) = (ev, tracker.in_text) {
                match t.unescape() {
                    Ok(s) => texts[p].push_str(&s),
                    Err(e) => debug!("Skipping undecodable text run: {}", e),
                }
            }
        }
        Self { texts }
    }
}

/// What to do with one event while rewriting.
enum Rewrite<'r> {
    /// Copy the event unchanged.
    Keep,
    /// Drop the event (original text of a translated paragraph).
    Skip,
    /// Write this `w:t` start tag followed by the paragraph's new text.
    Fill(BytesStart<'static>, usize, &'r str),
}

fn write_error(e: impl std::fmt::Display) -> Pdf2DocxError {
    Pdf2DocxError::TranslationFailed {
        detail: format!("could not write {}: {}", DOCUMENT_XML, e),
    }
}

fn rewrite_events(
    events: Vec<Event<'static>>,
    replacements: &[Option<String>],
) -> Result<Vec<u8>, Pdf2DocxError> {
    let mut writer = Writer::new(Vec::new());
    let mut tracker = RunTracker::default();
    // Paragraphs whose replacement text has already been written.
    let mut filled = vec![false; replacements.len()];

    for ev in events {
        tracker.step(&ev);
        let replacement = tracker
            .in_text
            .and_then(|p| replacements.get(p)?.as_deref().map(|r| (p, r)));

        let action = match (&ev, replacement) {
            (Event::Start(start), Some((p, text)))
                if start.name().as_ref() == TEXT && !filled[p] =>
            {
                Rewrite::Fill(start.clone(), p, text)
            }
            (Event::Text(_) | Event::CData(_), Some(_)) => Rewrite::Skip,
            _ => Rewrite::Keep,
        };

        match action {
            Rewrite::Keep => writer.write_event(ev).map_err(write_error)?,
            Rewrite::Skip => {}
            Rewrite::Fill(mut start, p, text) => {
                if !matches!(start.try_get_attribute("xml:space"), Ok(Some(_))) {
                    start.push_attribute(("xml:space", "preserve"));
                }
                writer
                    .write_event(Event::Start(start))
                    .map_err(write_error)?;
                writer
                    .write_event(Event::Text(BytesText::new(text)))
                    .map_err(write_error)?;
                filled[p] = true;
            }
        }
    }
    Ok(writer.into_inner())
}

// ── ZIP package access ───────────────────────────────────────────────────

fn package_error(e: impl std::fmt::Display) -> Pdf2DocxError {
    Pdf2DocxError::TranslationFailed {
        detail: format!("invalid DOCX package: {e}"),
    }
}

/// Read one part of a DOCX package as UTF-8.
pub fn read_part(docx: &[u8], name: &str) -> Result<String, Pdf2DocxError> {
    let mut archive = ZipArchive::new(Cursor::new(docx)).map_err(package_error)?;
    let mut file = archive.by_name(name).map_err(package_error)?;
    let mut xml = String::new();
    file.read_to_string(&mut xml).map_err(package_error)?;
    Ok(xml)
}

/// Return a copy of the package with `name` replaced by `content`.
fn replace_part(docx: &[u8], name: &str, content: &[u8]) -> Result<Vec<u8>, Pdf2DocxError> {
    let mut archive = ZipArchive::new(Cursor::new(docx)).map_err(package_error)?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let file = archive.by_index_raw(i).map_err(package_error)?;
        if file.name() == name {
            drop(file);
            writer.start_file(name, options).map_err(package_error)?;
            writer.write_all(content).map_err(package_error)?;
        } else {
            writer.raw_copy_file(file).map_err(package_error)?;
        }
    }
    let cursor = writer.finish().map_err(package_error)?;
    Ok(cursor.into_inner())
}
