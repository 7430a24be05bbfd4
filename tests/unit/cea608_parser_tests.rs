/*!
 * Tests for the CEA-608 decode-stream parser
 */

use mccreader::models::DebugLevel;
use mccreader::parsers::cea608::{
    parse_608_content, parse_608_layout, parse_608_style, parse_608_text_with_positions,
};
use mccreader::FrameRate;

const FPS_24: FrameRate = FrameRate::new(24, 1);

fn parse(records: &str) -> (Vec<mccreader::CaptionEvent>, Vec<mccreader::DebugEntry>) {
    let content = format!("Decoded Line 21 / CEA-608 for Asset: test - Channel: 1\n{}", records);
    let mut diagnostics = Vec::new();
    let events = parse_608_content(&content, FPS_24, false, "test-C1.608", &mut diagnostics);
    (events, diagnostics)
}

/// Mid-row foreground styles parse into CSS-like properties
#[test]
fn test_parse_style_withForegroundColor_shouldExtractColor() {
    let style = parse_608_style(r#"{FG-Blue} "Hello world""#);
    assert_eq!(style["color"], "blue");
}

/// Italic White is a combined style and color
#[test]
fn test_parse_style_withItalicWhite_shouldExtractBoth() {
    let style = parse_608_style(r#"{FG-Italic-White} "Styled""#);
    assert_eq!(style["font-style"], "italic");
    assert_eq!(style["color"], "white");
}

/// Mid-row flags mark transparency and underline
#[test]
fn test_parse_style_withFlags_shouldExtractFlags() {
    let style = parse_608_style(r#"{FG-White:PT:UL} "Flagged""#);
    assert_eq!(style["color"], "white");
    assert_eq!(style["partially_transparent"], true);
    assert_eq!(style["text-decoration"], "underline");
}

/// Background colors parse separately from foregrounds
#[test]
fn test_parse_style_withBackgroundColor_shouldExtractBackground() {
    let style = parse_608_style(r#"{BG-Blue} "Text with bg""#);
    assert_eq!(style["background-color"], "blue");
}

/// PAC color codes style the following text
#[test]
fn test_parse_style_withPacColor_shouldExtractColor() {
    let style = parse_608_style(r#"{R14:Yellow} "Yellow text""#);
    assert_eq!(style["color"], "yellow");
}

/// A standalone underline marker applies
#[test]
fn test_parse_style_withUnderlineMarker_shouldExtractUnderline() {
    let style = parse_608_style(r#"{UL} "Underlined text""#);
    assert_eq!(style["text-decoration"], "underline");
}

/// Style codes after all text do not style that text
#[test]
fn test_parse_style_withTrailingCode_shouldIgnoreIt() {
    let style = parse_608_style(r#""Plain text" {FG-Red}"#);
    assert!(style.is_empty());
}

/// A single positioned line extracts text and placement
#[test]
fn test_text_positions_withSingleLine_shouldExtractPlacement() {
    let (text, lines) = parse_608_text_with_positions(r#"{R14:C8} "Hello world""#);
    assert_eq!(text, "Hello world");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].row, 14);
    assert_eq!(lines[0].column, 8);
}

/// A row change starts a new physical line
#[test]
fn test_text_positions_withTwoRows_shouldBreakLine() {
    let (text, lines) =
        parse_608_text_with_positions(r#"{R14:C8} "Line one" {R15:C4} "Line two""#);
    assert_eq!(text, "Line one\nLine two");
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].row, 14);
    assert_eq!(lines[1].row, 15);
}

/// Text on the same row concatenates into one line
#[test]
fn test_text_positions_withSameRow_shouldConcatenate() {
    let (text, lines) = parse_608_text_with_positions(r#"{R14:C8} "Hello" {R14:C14} "world""#);
    assert_eq!(text, "Hello world");
    assert_eq!(lines.len(), 1);
}

/// Lines come out sorted by row, top first
#[test]
fn test_text_positions_withReversedRows_shouldSortByRow() {
    let (text, lines) = parse_608_text_with_positions(r#"{R15:C0} "Bottom" {R14:C0} "Top""#);
    assert_eq!(lines[0].row, 14);
    assert_eq!(lines[1].row, 15);
    assert_eq!(text, "Top\nBottom");
}

/// A truncated artifact with an unclosed final quote still yields its text
#[test]
fn test_text_positions_withUnclosedQuote_shouldRecoverText() {
    let (text, lines) = parse_608_text_with_positions(r#"{R15:C4} {TO2} "[background chatter]"#);
    assert_eq!(text, "[background chatter]");
    assert_eq!(lines.len(), 1);

    let (text, lines) =
        parse_608_text_with_positions(r#"{R14:C0} "First line" {R15:C0} "Second line"#);
    assert!(text.contains("First line"));
    assert!(text.contains("Second line"));
    assert_eq!(lines.len(), 2);
}

#[test]
fn test_text_positions_withEmptyContent_shouldYieldNothing() {
    let (text, lines) = parse_608_text_with_positions("");
    assert_eq!(text, "");
    assert!(lines.is_empty());
}

/// Cursor positions map onto the 15x32 grid as percentages
#[test]
fn test_parse_layout_withCursorPosition_shouldComputePercentages() {
    let layout = parse_608_layout(r#"{R14:C8} "Hello""#);
    assert_eq!(layout.row, Some(14));
    assert_eq!(layout.column, Some(8));
    assert_eq!(layout.vertical_percent, Some(14.0 / 14.0 * 100.0));
    assert_eq!(layout.horizontal_percent, Some(8.0 / 31.0 * 100.0));
}

/// Every cursor position is kept for multi-line captions
#[test]
fn test_parse_layout_withMultiplePositions_shouldKeepAllPositions() {
    let layout = parse_608_layout(r#"{R14:C8} "One" {R15:C4} "Two""#);
    let positions = layout.all_positions.unwrap();
    assert_eq!(positions.len(), 2);
    assert_eq!((positions[0].row, positions[0].column), (14, 8));
    assert_eq!((positions[1].row, positions[1].column), (15, 4));
}

/// A color PAC still carries its row
#[test]
fn test_parse_layout_withColorPac_shouldExtractRow() {
    let layout = parse_608_layout(r#"{R4:Yellow} "Warning""#);
    assert_eq!(layout.row, Some(4));
    assert_eq!(layout.column, None);
    assert_eq!(layout.vertical_percent, Some(4.0 / 14.0 * 100.0));
}

/// Tab offsets and control codes are recorded
#[test]
fn test_parse_layout_withTabAndControlCodes_shouldRecordThem() {
    let layout = parse_608_layout(r#"{RCL} {R14:C8} {TO3} "Hello""#);
    assert_eq!(layout.tab_offset, Some(3));
    assert_eq!(layout.mode.as_deref(), Some("pop-on"));
    assert_eq!(layout.control_codes, Some(vec!["RCL".to_string()]));
}

/// Roll-up modes record their window height
#[test]
fn test_parse_layout_withRollUp_shouldRecordRows() {
    let layout = parse_608_layout(r#"{RU3} {R14:C0} "Rolling""#);
    assert_eq!(layout.mode.as_deref(), Some("roll-up"));
    assert_eq!(layout.roll_up_rows, Some(3));
}

/// Pop-on captions display at the EOC swap, not when loaded
#[test]
fn test_parse_content_withPopOnCaptions_shouldTimeFromEoc() {
    let (events, diagnostics) = parse(
        "00:00:01:00 - {RCL} {R14:C8} \"Hello world\"\n\
         00:00:02:00 - {EOC}\n\
         00:00:03:00 - {RCL} {R14:C4} \"Second caption\"\n\
         00:00:04:00 - {EOC}\n",
    );

    assert!(diagnostics.is_empty());
    assert_eq!(events.len(), 2);

    assert_eq!(events[0].text, "Hello world");
    assert_eq!(events[0].start_us, 2_000_000);
    assert_eq!(events[0].start_timecode, "00:00:02:00");
    assert_eq!(events[0].end_us, Some(4_000_000));
    assert_eq!(events[0].end_timecode.as_deref(), Some("00:00:04:00"));

    // The second caption is still on screen at end of stream
    assert_eq!(events[1].text, "Second caption");
    assert_eq!(events[1].start_us, 4_000_000);
    assert_eq!(events[1].end_us, None);
    assert_eq!(events[1].end_timecode, None);
}

/// Paint-on captions display immediately and end at EDM
#[test]
fn test_parse_content_withPaintOnCaption_shouldTimeFromReceipt() {
    let (events, _) = parse(
        "00:00:01:00 - {RDC} {R15:C0} \"Paint on text\"\n\
         00:00:03:12 - {EDM}\n",
    );

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].start_us, 1_000_000);
    assert_eq!(events[0].end_us, Some(3_500_000));
    let layout = events[0].layout.as_ref().unwrap();
    assert_eq!(layout.mode.as_deref(), Some("paint-on"));
}

/// A new roll-up line closes the previous one at its own start
#[test]
fn test_parse_content_withRollUpCaptions_shouldCloseOnNextLine() {
    let (events, _) = parse(
        "00:00:01:00 - {RU2} {R14:C0} \"First\"\n\
         00:00:02:00 - {RU2} {R14:C0} \"Second\"\n",
    );

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].end_us, Some(2_000_000));
    assert_eq!(events[1].start_us, 2_000_000);
    assert_eq!(events[1].end_us, None);
    assert_eq!(
        events[0].layout.as_ref().unwrap().roll_up_rows,
        Some(2)
    );
}

/// Events within a track never overlap and start strictly later than their
/// predecessor
#[test]
fn test_parse_content_events_shouldBeOrderedAndNonOverlapping() {
    let (events, _) = parse(
        "00:00:01:00 - {RDC} {R15:C0} \"One\"\n\
         00:00:02:00 - {RDC} {R15:C0} \"Two\"\n\
         00:00:03:00 - {RDC} {R15:C0} \"Three\"\n\
         00:00:04:00 - {EDM}\n",
    );

    assert_eq!(events.len(), 3);
    for pair in events.windows(2) {
        assert!(pair[0].start_us < pair[1].start_us);
        assert!(pair[0].end_us.unwrap() <= pair[1].start_us);
    }
}

/// One malformed line in the middle is skipped with a diagnostic; everything
/// around it still parses
#[test]
fn test_parse_content_withMalformedLine_shouldSkipAndRecord() {
    let (events, diagnostics) = parse(
        "00:00:01:00 - {RDC} {R15:C0} \"Before\"\n\
         this line is not a record\n\
         00:00:02:00 - {RDC} {R15:C0} \"After\"\n\
         00:00:03:00 - {EDM}\n",
    );

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].text, "Before");
    assert_eq!(events[1].text, "After");

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].level, DebugLevel::Warn);
    assert!(diagnostics[0].source.starts_with("test-C1.608:"));
}

/// An out-of-range frame number skips only that record
#[test]
fn test_parse_content_withMalformedTimecode_shouldSkipRecord() {
    let (events, diagnostics) = parse(
        "00:00:01:99 - {RDC} {R15:C0} \"Bad clock\"\n\
         00:00:02:00 - {RDC} {R15:C0} \"Good clock\"\n",
    );

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].text, "Good clock");
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains("Malformed timecode"));
}

/// Multi-line captions keep per-line placement in the layout
#[test]
fn test_parse_content_withMultiLineCaption_shouldKeepLines() {
    let (events, _) = parse(
        "00:00:01:00 - {RDC} {R14:C0} \"Line one\" {R15:C0} \"Line two\"\n\
         00:00:02:00 - {EDM}\n",
    );

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].text, "Line one\nLine two");
    let lines = events[0].layout.as_ref().unwrap().lines.as_ref().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].text, "Line one");
    assert_eq!(lines[1].text, "Line two");
}

/// Style in force at open time is frozen into the event
#[test]
fn test_parse_content_withStyledCaption_shouldFreezeStyle() {
    let (events, _) = parse(
        "00:00:01:00 - {RCL} {R14:C8} {FG-Italic-White} \"Styled text\"\n\
         00:00:02:00 - {EOC}\n",
    );

    assert_eq!(events.len(), 1);
    let style = events[0].style.as_ref().unwrap();
    assert_eq!(style["font-style"], "italic");
    assert_eq!(style["color"], "white");
}

/// A header-only file yields no captions
#[test]
fn test_parse_content_withHeaderOnly_shouldYieldNothing() {
    let (events, diagnostics) = parse("");
    assert!(events.is_empty());
    assert!(diagnostics.is_empty());
}

/// Plain text without an explicit mode displays like paint-on
#[test]
fn test_parse_content_withNoMode_shouldDefaultToImmediateDisplay() {
    let (events, _) = parse(
        "00:00:01:00 - {R15:C0} \"First caption\"\n\
         00:00:02:00 - {R15:C0} \"Second caption\"\n",
    );

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].start_us, 1_000_000);
    assert_eq!(events[0].end_us, Some(2_000_000));
}
