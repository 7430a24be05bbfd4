/*!
 * Tests for language code utilities and the detector boundary
 */

use isolang::Language;
use mccreader::language::{
    get_language_name, language_code, language_codes_match, parse_language_code,
};
use mccreader::LanguageDetector;

use crate::common::MockLanguageDetector;

/// 2-letter and 3-letter codes for the same language match
#[test]
fn test_codes_match_withEquivalentCodes_shouldMatch() {
    assert!(language_codes_match("en", "eng"));
    assert!(language_codes_match("eng", "en"));
    assert!(language_codes_match("en", "EN"));
    assert!(language_codes_match("fr", "fra"));
}

/// Different languages never match
#[test]
fn test_codes_match_withDifferentLanguages_shouldNotMatch() {
    assert!(!language_codes_match("en", "es"));
    assert!(!language_codes_match("eng", "fra"));
}

/// Invalid codes never match anything
#[test]
fn test_codes_match_withInvalidCodes_shouldNotMatch() {
    assert!(!language_codes_match("zz", "en"));
    assert!(!language_codes_match("en", "zzzz"));
    assert!(!language_codes_match("", ""));
}

/// Detected languages record their 639-1 code when one exists
#[test]
fn test_language_code_shouldPrefer6391() {
    assert_eq!(language_code(Language::Eng), "en");
    assert_eq!(language_code(Language::Fra), "fr");
    assert_eq!(language_code(Language::Spa), "es");
}

/// Codes parse by length into the right ISO table
#[test]
fn test_parse_language_code_shouldHandleBothLengths() {
    assert_eq!(parse_language_code("en"), Some(Language::Eng));
    assert_eq!(parse_language_code("eng"), Some(Language::Eng));
    assert_eq!(parse_language_code(" EN "), Some(Language::Eng));
    assert_eq!(parse_language_code("x"), None);
    assert_eq!(parse_language_code("english"), None);
}

/// Language names resolve from either code form
#[test]
fn test_get_language_name_shouldResolveNames() {
    assert_eq!(get_language_name("en").as_deref(), Some("English"));
    assert_eq!(get_language_name("fra").as_deref(), Some("French"));
    assert_eq!(get_language_name("zz"), None);
}

/// The detector boundary is a pure text-to-language function
#[test]
fn test_detector_boundary_shouldReturnOptionalLanguage() {
    let detector = MockLanguageDetector::new().with_rule("bonjour", Language::Fra);

    assert_eq!(detector.detect("bonjour tout le monde"), Some(Language::Fra));
    assert_eq!(detector.detect("no match here"), None);
}
