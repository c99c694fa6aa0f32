//! Languages accepted as translation targets.
//!
//! Codes follow the Google Translate web API. The list is sorted by display
//! name so it can feed a `<select>` directly.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

/// A selectable translation language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Language {
    pub name: &'static str,
    pub code: &'static str,
}

const fn lang(name: &'static str, code: &'static str) -> Language {
    Language { name, code }
}

/// All supported languages, sorted by name.
pub static SUPPORTED_LANGUAGES: &[Language] = &[
    lang("afrikaans", "af"),
    lang("albanian", "sq"),
    lang("amharic", "am"),
    lang("arabic", "ar"),
    lang("armenian", "hy"),
    lang("azerbaijani", "az"),
    lang("basque", "eu"),
    lang("belarusian", "be"),
    lang("bengali", "bn"),
    lang("bosnian", "bs"),
    lang("bulgarian", "bg"),
    lang("catalan", "ca"),
    lang("chinese (simplified)", "zh-CN"),
    lang("chinese (traditional)", "zh-TW"),
    lang("croatian", "hr"),
    lang("czech", "cs"),
    lang("danish", "da"),
    lang("dutch", "nl"),
    lang("english", "en"),
    lang("esperanto", "eo"),
    lang("estonian", "et"),
    lang("filipino", "tl"),
    lang("finnish", "fi"),
    lang("french", "fr"),
    lang("galician", "gl"),
    lang("georgian", "ka"),
    lang("german", "de"),
    lang("greek", "el"),
    lang("gujarati", "gu"),
    lang("hebrew", "iw"),
    lang("hindi", "hi"),
    lang("hungarian", "hu"),
    lang("icelandic", "is"),
    lang("indonesian", "id"),
    lang("irish", "ga"),
    lang("italian", "it"),
    lang("japanese", "ja"),
    lang("kannada", "kn"),
    lang("kazakh", "kk"),
    lang("khmer", "km"),
    lang("korean", "ko"),
    lang("lao", "lo"),
    lang("latin", "la"),
    lang("latvian", "lv"),
    lang("lithuanian", "lt"),
    lang("macedonian", "mk"),
    lang("malay", "ms"),
    lang("malayalam", "ml"),
    lang("maltese", "mt"),
    lang("marathi", "mr"),
    lang("mongolian", "mn"),
    lang("nepali", "ne"),
    lang("norwegian", "no"),
    lang("persian", "fa"),
    lang("polish", "pl"),
    lang("portuguese", "pt"),
    lang("punjabi", "pa"),
    lang("romanian", "ro"),
    lang("russian", "ru"),
    lang("serbian", "sr"),
    lang("sinhala", "si"),
    lang("slovak", "sk"),
    lang("slovenian", "sl"),
    lang("spanish", "es"),
    lang("swahili", "sw"),
    lang("swedish", "sv"),
    lang("tamil", "ta"),
    lang("telugu", "te"),
    lang("thai", "th"),
    lang("turkish", "tr"),
    lang("ukrainian", "uk"),
    lang("urdu", "ur"),
    lang("uzbek", "uz"),
    lang("vietnamese", "vi"),
    lang("welsh", "cy"),
    lang("yiddish", "yi"),
    lang("zulu", "zu"),
];

static BY_CODE: Lazy<HashMap<String, &'static Language>> = Lazy::new(|| {
    SUPPORTED_LANGUAGES
        .iter()
        .map(|l| (l.code.to_ascii_lowercase(), l))
        .collect()
});

/// Find a language by code, case-insensitively (`zh-tw` matches `zh-TW`).
pub fn lookup(code: &str) -> Option<&'static Language> {
    BY_CODE.get(&code.trim().to_ascii_lowercase()).copied()
}

/// Whether `code` is acceptable as a translation source (`auto` included).
pub fn is_valid_source(code: &str) -> bool {
    code.trim().eq_ignore_ascii_case(crate::config::AUTO_DETECT_LANG) || lookup(code).is_some()
}
