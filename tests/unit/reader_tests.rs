/*!
 * Tests for the MccReader query surface
 */

use anyhow::Result;
use isolang::Language;
use mccreader::models::DebugLevel;
use mccreader::{parse_caption_files, CaptionFormat, DecodeResult, MccReader};
use tempfile::TempDir;

use crate::common::{self, MockLanguageDetector};

/// Builds a decode result with one 608 channel, one 708 service, a
/// descriptor and a debug log
fn sample_result() -> Result<(TempDir, DecodeResult)> {
    let temp_dir = common::create_temp_dir()?;
    common::create_ccd_file(temp_dir.path(), "Sample", 30, true)?;
    common::create_608_file(
        temp_dir.path(),
        "Sample",
        1,
        "00:00:07:09 - {RCL} {R14:C8} \"Hello World\"\n\
         00:00:09:02 - {EOC}\n\
         00:00:10:00 - {EDM}\n",
    )?;
    common::create_708_file(
        temp_dir.path(),
        "Sample",
        1,
        "00:00:07:09 - {DLW:11111111} {DF0:PopUp-Cntrd:R0-C20:Anchor-UL-V65-H0:VIS} {SPL:R0-C10} \"Good evening viewers\"\n\
         00:00:09:02 - {DLW:11111111}\n",
    )?;
    common::create_dbg_file(
        temp_dir.path(),
        "Sample",
        "INFO DBG_GENERAL [main.c:194] - Version: v0.0\n\
         WARN DBG_708_DEC [dtvcc_decode.c:628] - Skipping Unknown G2 Char: 0x03\n",
    )?;

    let result = parse_caption_files(temp_dir.path(), None)?;
    Ok((temp_dir, result))
}

fn reader_with_sample() -> Result<MccReader> {
    let (_temp_dir, result) = sample_result()?;
    let detector = MockLanguageDetector::new()
        .with_rule("Hello", Language::Eng)
        .with_rule("Good", Language::Eng);
    let mut reader = MccReader::with_detector(Box::new(detector));
    reader.load_result(result);
    Ok(reader)
}

/// The magic-header sniff validates content without decoding it
#[test]
fn test_detect_withValidHeader_shouldReturnTrue() {
    assert!(MccReader::detect("File Format=MacCaption_MCC V1.0\n\nUUID=test"));
    assert!(!MccReader::detect("This is not an MCC file"));
    assert!(!MccReader::detect(""));
    assert!(!MccReader::detect("Wrong header\nFile Format=MacCaption_MCC"));
}

/// Queries before any read yield empty results, not errors
#[test]
fn test_queries_beforeRead_shouldBeEmpty() {
    let reader = MccReader::new();

    assert!(reader.captions(None, None, None).is_empty());
    assert!(reader.tracks(None).is_empty());
    assert!(reader.languages(None).is_empty());
    assert!(reader.formats().is_empty());
    assert!(reader.fps().is_none());
    assert!(reader.drop_frame().is_none());
    assert!(reader.debug_metadata(None).is_empty());
    assert!(reader.original_result().is_none());
}

/// Loading a result populates every accessor
#[test]
fn test_load_result_shouldPopulateAccessors() -> Result<()> {
    let reader = reader_with_sample()?;

    assert_eq!(
        reader.formats(),
        vec![CaptionFormat::Cea608, CaptionFormat::Cea708]
    );
    assert!((reader.fps().unwrap().as_f64() - 29.97).abs() < 0.01);
    assert_eq!(reader.drop_frame(), Some(true));
    assert!(reader.original_result().is_some());
    Ok(())
}

/// Tracks group by standard and filter by format
#[test]
fn test_tracks_withFormatFilter_shouldReturnMatching() -> Result<()> {
    let reader = reader_with_sample()?;

    let all = reader.tracks(None);
    assert_eq!(all[&CaptionFormat::Cea608], vec!["c1"]);
    assert_eq!(all[&CaptionFormat::Cea708], vec!["s1"]);

    let only_608 = reader.tracks(Some(CaptionFormat::Cea608));
    assert_eq!(only_608.len(), 1);
    assert!(only_608.contains_key(&CaptionFormat::Cea608));
    Ok(())
}

/// Caption queries filter by format and track
#[test]
fn test_captions_withFilters_shouldReturnMatching() -> Result<()> {
    let reader = reader_with_sample()?;

    assert_eq!(reader.captions(None, None, None).len(), 2);
    let cea608 = reader.captions(Some(CaptionFormat::Cea608), None, None);
    assert_eq!(cea608.len(), 1);
    assert_eq!(cea608[0].text, "Hello World");

    let by_track = reader.captions(Some(CaptionFormat::Cea708), Some("s1"), None);
    assert_eq!(by_track.len(), 1);
    assert_eq!(by_track[0].text, "Good evening viewers");
    Ok(())
}

/// Unknown formats and tracks yield empty results, never errors
#[test]
fn test_captions_withUnknownTrack_shouldBeEmpty() -> Result<()> {
    let reader = reader_with_sample()?;

    assert!(reader.captions(None, Some("c9"), None).is_empty());
    assert!(reader
        .captions(Some(CaptionFormat::Cea608), Some("s1"), None)
        .is_empty());
    Ok(())
}

/// Filtering by format equals the union of its per-track queries in
/// track-discovery order
#[test]
fn test_captions_aggregation_shouldBeIdempotent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_ccd_file(temp_dir.path(), "Sample", 24, false)?;
    common::create_608_file(
        temp_dir.path(),
        "Sample",
        1,
        "00:00:01:00 - {RDC} {R15:C0} \"One\"\n00:00:02:00 - {EDM}\n",
    )?;
    common::create_608_file(
        temp_dir.path(),
        "Sample",
        3,
        "00:00:03:00 - {RDC} {R15:C0} \"Three\"\n00:00:04:00 - {EDM}\n",
    )?;

    let mut reader = MccReader::new();
    reader.load_result(parse_caption_files(temp_dir.path(), None)?);

    let merged = reader.captions(Some(CaptionFormat::Cea608), None, None);
    let mut unioned = Vec::new();
    for track in &reader.tracks(Some(CaptionFormat::Cea608))[&CaptionFormat::Cea608] {
        unioned.extend(reader.captions(Some(CaptionFormat::Cea608), Some(track), None));
    }
    assert_eq!(merged, unioned);
    Ok(())
}

/// One language is detected per track
#[test]
fn test_languages_withDetector_shouldAnnotateTracks() -> Result<()> {
    let reader = reader_with_sample()?;

    let languages = reader.languages(None);
    assert_eq!(languages[&CaptionFormat::Cea608]["c1"], "en");
    assert_eq!(languages[&CaptionFormat::Cea708]["s1"], "en");

    let only_708 = reader.languages(Some(CaptionFormat::Cea708));
    assert_eq!(only_708.len(), 1);
    Ok(())
}

/// Language queries filter captions; 2- and 3-letter codes both match
#[test]
fn test_captions_withLanguageFilter_shouldMatchIsoCodes() -> Result<()> {
    let reader = reader_with_sample()?;

    assert_eq!(reader.captions(None, None, Some("en")).len(), 2);
    assert_eq!(reader.captions(None, None, Some("eng")).len(), 2);
    assert!(reader.captions(None, None, Some("fr")).is_empty());
    Ok(())
}

/// Without a detector, track languages stay unset rather than defaulted
#[test]
fn test_languages_withoutDetector_shouldStayUnset() -> Result<()> {
    let (_temp_dir, result) = sample_result()?;
    let mut reader = MccReader::new();
    reader.load_result(result);

    let languages = reader.languages(None);
    assert!(languages[&CaptionFormat::Cea608].is_empty());
    assert!(languages[&CaptionFormat::Cea708].is_empty());
    Ok(())
}

/// A detector with no confident result leaves the track unset
#[test]
fn test_languages_withUnconfidentDetector_shouldLeaveTrackUnset() -> Result<()> {
    let (_temp_dir, result) = sample_result()?;
    // Only the 608 track matches a rule
    let detector = MockLanguageDetector::new().with_rule("Hello", Language::Eng);
    let mut reader = MccReader::with_detector(Box::new(detector));
    reader.load_result(result);

    let languages = reader.languages(None);
    assert_eq!(languages[&CaptionFormat::Cea608]["c1"], "en");
    assert!(!languages[&CaptionFormat::Cea708].contains_key("s1"));
    Ok(())
}

/// Debug metadata filters by level
#[test]
fn test_debug_metadata_withLevelFilter_shouldReturnMatching() -> Result<()> {
    let reader = reader_with_sample()?;

    assert_eq!(reader.debug_metadata(None).len(), 2);
    let warnings = reader.debug_metadata(Some(DebugLevel::Warn));
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].category, "DBG_708_DEC");
    assert!(reader.debug_metadata(Some(DebugLevel::Fatal)).is_empty());
    Ok(())
}

/// The serialized result shape round-trips to an equal DecodeResult
#[test]
fn test_serialized_result_shouldRoundTrip() -> Result<()> {
    let (_temp_dir, result) = sample_result()?;

    let json = serde_json::to_string_pretty(&result)?;
    let reparsed: DecodeResult = serde_json::from_str(&json)?;
    assert_eq!(result, reparsed);

    // The interchange shape keys captions by format then track
    let value: serde_json::Value = serde_json::from_str(&json)?;
    assert!(value["captions"]["cea608"]["c1"].is_array());
    assert!(value["metadata"]["fps"].is_number());
    assert!(value["metadata"]["debug"].is_array());
    Ok(())
}
