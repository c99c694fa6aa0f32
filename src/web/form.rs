//! Reading the `multipart/form-data` conversion form.

use crate::config::{ConversionOptions, PageBound, TranslationOptions};
use crate::document::UploadedDocument;
use crate::error::Pdf2DocxError;
use crate::languages;
use axum::extract::multipart::{Multipart, MultipartError};
use tracing::debug;

/// Raw values of the form as the user submitted them.
///
/// Kept as strings so a rejected request can be re-rendered exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFields {
    pub start_page: String,
    pub use_start_page: bool,
    pub end_page: String,
    pub use_end_page: bool,
    pub multi_processing: bool,
    pub output_filename: String,
    pub translate: bool,
    pub target_lang: String,
    pub export_pdf: bool,
}

impl FormFields {
    /// Values shown on a fresh page.
    pub fn initial(default_target_lang: &str) -> Self {
        Self {
            start_page: "1".into(),
            use_start_page: false,
            end_page: "1".into(),
            use_end_page: false,
            multi_processing: false,
            output_filename: String::new(),
            translate: false,
            target_lang: default_target_lang.to_string(),
            export_pdf: false,
        }
    }

    /// Record one text field; unknown names are ignored.
    pub fn set(&mut self, name: &str, value: String) {
        match name {
            "start_page" => self.start_page = value,
            "use_start_page" => self.use_start_page = checkbox(&value),
            "end_page" => self.end_page = value,
            "use_end_page" => self.use_end_page = checkbox(&value),
            "multi_processing" => self.multi_processing = checkbox(&value),
            "output_filename" => self.output_filename = value,
            "translate" => self.translate = checkbox(&value),
            "target_lang" if !value.trim().is_empty() => self.target_lang = value,
            "export_pdf" => self.export_pdf = checkbox(&value),
            other => debug!("Ignoring unknown form field '{}'", other),
        }
    }

    /// Turn the raw values into request options.
    ///
    /// Only enabled page bounds are parsed; a disabled box may hold anything.
    pub fn to_options(&self) -> Result<ConversionOptions, Pdf2DocxError> {
        let translation = if self.translate {
            let code = self.target_lang.trim();
            let language =
                languages::lookup(code).ok_or_else(|| Pdf2DocxError::UnsupportedLanguage {
                    code: code.to_string(),
                })?;
            Some(TranslationOptions::to(language.code))
        } else {
            None
        };

        Ok(ConversionOptions {
            start_page: page_bound("Start page", &self.start_page, self.use_start_page)?,
            end_page: page_bound("End page", &self.end_page, self.use_end_page)?,
            multi_processing: self.multi_processing,
            output_filename: self.output_filename.clone(),
            export_pdf: self.export_pdf && translation.is_some(),
            translation,
        })
    }
}

/// Browsers send `on`; scripts tend to send `true` or `1`.
pub fn checkbox(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "on" | "true" | "1" | "yes"
    )
}

fn page_bound(field: &'static str, raw: &str, enabled: bool) -> Result<PageBound, Pdf2DocxError> {
    let parsed = raw.trim().parse::<u32>().ok().filter(|&n| n >= 1);
    if !enabled {
        return Ok(PageBound {
            enabled: false,
            value: parsed.unwrap_or(1),
        });
    }
    parsed
        .map(PageBound::at)
        .ok_or_else(|| Pdf2DocxError::InvalidPageNumber {
            field,
            value: raw.trim().to_string(),
        })
}

/// A fully read form submission.
#[derive(Debug)]
pub struct ConversionForm {
    /// `None` when no file was chosen.
    pub document: Option<UploadedDocument>,
    pub fields: FormFields,
}

impl ConversionForm {
    /// Drain the multipart stream.
    pub async fn read(
        mut multipart: Multipart,
        default_target_lang: &str,
    ) -> Result<Self, MultipartError> {
        let mut document = None;
        let mut fields = FormFields::initial(default_target_lang);

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                // An unselected file input still submits an empty, nameless part.
                if !(filename.is_empty() && bytes.is_empty()) {
                    document = Some(UploadedDocument::new(filename, bytes.to_vec()));
                }
            } else {
                let value = field.text().await?;
                fields.set(&name, value);
            }
        }

        Ok(Self { document, fields })
    }

    /// Split into the upload and its options, or the validation error.
    pub fn into_request(self) -> Result<(UploadedDocument, ConversionOptions), Pdf2DocxError> {
        let options = self.fields.to_options()?;
        let document = self.document.ok_or(Pdf2DocxError::MissingUpload)?;
        Ok((document, options))
    }
}
