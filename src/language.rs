use isolang::Language;

/// Language utilities for the annotation pass
///
/// Detection itself is an external capability: implement [`LanguageDetector`]
/// with whatever engine is available and hand it to the reader. The reader
/// records one ISO 639-1 (or 639-3 when no two-letter code exists) lowercase
/// code per track.
/// The external language-detection boundary: a pure text-to-language
/// function, called once per caption track with the track's concatenated
/// text. Return None when no confident result exists; the track's language
/// is then left unset.
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> Option<Language>;
}

/// The code recorded for a detected language: ISO 639-1 when it exists,
/// otherwise ISO 639-3
pub fn language_code(language: Language) -> String {
    language
        .to_639_1()
        .map(|code| code.to_string())
        .unwrap_or_else(|| language.to_639_3().to_string())
}

/// Check if two language codes represent the same language, accepting both
/// ISO 639-1 (2-letter) and ISO 639-3 (3-letter) codes
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    let Some(lang1) = parse_language_code(code1) else {
        return false;
    };
    let Some(lang2) = parse_language_code(code2) else {
        return false;
    };
    lang1 == lang2
}

/// Parse a 2- or 3-letter ISO language code
pub fn parse_language_code(code: &str) -> Option<Language> {
    let normalized = code.trim().to_lowercase();
    match normalized.len() {
        2 => Language::from_639_1(&normalized),
        3 => Language::from_639_3(&normalized),
        _ => None,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Option<String> {
    parse_language_code(code).map(|lang| lang.to_name().to_string())
}
