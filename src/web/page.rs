//! The single HTML page: upload form plus the last failure, if any.

use crate::languages::SUPPORTED_LANGUAGES;
use crate::output::ConversionFailure;
use crate::web::form::FormFields;
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;

/// What the page shows.
#[derive(Debug)]
pub struct PageModel<'a> {
    pub fields: &'a FormFields,
    pub translation: bool,
    pub pdf_export: bool,
    pub failure: Option<&'a ConversionFailure>,
}

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:40rem;margin:2rem auto;padding:0 1rem}\
fieldset{border:1px solid #ccc;border-radius:6px;margin:1rem 0}\
label{display:block;margin:.4rem 0}\
input[type=number]{width:5rem}\
.error{background:#fdecea;border:1px solid #f5c2c0;color:#611a15;padding:.75rem;border-radius:6px;white-space:pre-line}\
button{padding:.5rem 1.5rem}";

/// Render the page.
pub fn render(model: &PageModel<'_>) -> String {
    let f = model.fields;
    let mut html = String::with_capacity(8 * 1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\n");
    html.push_str("<title>PDF to DOCX</title>\n");
    let _ = writeln!(html, "<style>{STYLE}</style>");
    html.push_str("</head>\n<body>\n<h1>PDF to DOCX</h1>\n");

    if let Some(failure) = model.failure {
        let _ = writeln!(
            html,
            "<p class=\"error\" role=\"alert\" data-kind=\"{}\">{}</p>",
            failure.kind,
            encode_text(&failure.message)
        );
    }

    html.push_str(
        "<form method=\"post\" action=\"/convert\" enctype=\"multipart/form-data\">\n",
    );
    html.push_str(
        "<label>PDF file <input type=\"file\" name=\"file\" accept=\"application/pdf,.pdf\" required></label>\n",
    );

    html.push_str("<fieldset><legend>Pages</legend>\n");
    page_row(&mut html, "use_start_page", f.use_start_page, "Start page", "start_page", &f.start_page);
    page_row(&mut html, "use_end_page", f.use_end_page, "End page", "end_page", &f.end_page);
    html.push_str("</fieldset>\n");

    checkbox_row(&mut html, "multi_processing", f.multi_processing, "Use multiple processes");
    let _ = writeln!(
        html,
        "<label>Output file name <input type=\"text\" name=\"output_filename\" value=\"{}\" placeholder=\"defaults to the PDF name\"></label>",
        encode_double_quoted_attribute(&f.output_filename)
    );

    if model.translation {
        html.push_str("<fieldset><legend>Translation</legend>\n");
        checkbox_row(&mut html, "translate", f.translate, "Translate the document");
        html.push_str("<label>Target language <select name=\"target_lang\">\n");
        for lang in SUPPORTED_LANGUAGES {
            let selected = if lang.code.eq_ignore_ascii_case(f.target_lang.trim()) {
                " selected"
            } else {
                ""
            };
            let _ = writeln!(
                html,
                "<option value=\"{}\"{}>{}</option>",
                lang.code, selected, lang.name
            );
        }
        html.push_str("</select></label>\n");
        if model.pdf_export {
            checkbox_row(&mut html, "export_pdf", f.export_pdf, "Download the translation as PDF");
        }
        html.push_str("</fieldset>\n");
    }

    html.push_str("<button type=\"submit\">Convert</button>\n</form>\n</body>\n</html>\n");
    html
}

fn checkbox_row(html: &mut String, name: &str, checked: bool, label: &str) {
    let _ = writeln!(
        html,
        "<label><input type=\"checkbox\" name=\"{name}\"{}> {label}</label>",
        if checked { " checked" } else { "" }
    );
}

fn page_row(html: &mut String, toggle: &str, enabled: bool, label: &str, name: &str, value: &str) {
    let _ = writeln!(
        html,
        "<label><input type=\"checkbox\" name=\"{toggle}\"{}> {label} \
<input type=\"number\" name=\"{name}\" min=\"1\" value=\"{}\"></label>",
        if enabled { " checked" } else { "" },
        encode_double_quoted_attribute(value)
    );
}
