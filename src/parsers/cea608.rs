/*!
 * CEA-608 (line 21) decode-stream parser.
 *
 * The decoder emits one text file per caption channel, one record per line:
 * `HH:MM:SS:FF - <content>`, where the content mixes quoted text fragments,
 * preamble address codes (`{R14:C8}`, `{R14:Yellow}`), mid-row style codes
 * (`{FG-...}`, `{BG-...}`), tab offsets (`{TO2}`) and control codes
 * (`{RCL}`, `{EOC}`, `{EDM}`, ...).
 *
 * Caption timing follows the channel's display mode:
 * - pop-on (RCL): text loads into a buffer and displays at the EOC swap
 * - paint-on (RDC) and roll-up (RU2/RU3/RU4): text displays immediately
 * - EDM erases the currently displayed caption
 */

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::errors::MccError;
use crate::file_utils::FileManager;
use crate::models::{CaptionEvent, CaptionEventBuilder, DebugEntry, Layout, PenPosition, StyleMap, TextLine};
use crate::parsers::{quoted_fragments, record_parse_warning, split_at_matches, RECORD_REGEX};
use crate::timecode::{timecode_to_microseconds, FrameRate};

/// Colors a mid-row code or PAC may carry. Black is technically only a
/// background color in CEA-608 but the decoder emits it for foregrounds too.
const MIDROW_COLORS: [&str; 8] = [
    "white", "green", "blue", "cyan", "red", "yellow", "magenta", "black",
];

/// Control-code mnemonics the decoder emits, in reporting order
const CONTROL_CODES: [&str; 16] = [
    "RCL", // Resume Caption Loading
    "BS",  // Backspace
    "AOF", // Alarm Off
    "AON", // Alarm On
    "DER", // Delete to End of Row
    "RU2", // Roll Up Captions Two Rows
    "RU3", // Roll Up Captions Three Rows
    "RU4", // Roll Up Captions Four Rows
    "FON", // Flash On
    "RDC", // Resume Direct Captioning
    "TR",  // Text Restart
    "RTD", // Resume Text Display
    "EDM", // Erase Displayed Memory
    "CR",  // Carriage Return
    "ENM", // Erase Non-Displayed Memory
    "EOC", // End Of Caption
];

static FIRST_TEXT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r#""[^"]*""#).unwrap());

static FG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{FG-([^}]+)\}").unwrap());

static BG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{BG-([^}:]+)(?::([^}]+))?\}").unwrap());

/// PAC carrying a color instead of a cursor column: {R14:Yellow:UL}
static PAC_COLOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{R(\d+):([A-Za-z][A-Za-z ]+)(?::UL)?\}").unwrap());

static PAC_UNDERLINE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{R\d+:[^}]+:UL\}").unwrap());

/// PAC cursor position: {R14:C8} (brace left open so flags can follow)
static ROW_COL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{R(\d+):C(\d+)").unwrap());

static TAB_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{TO(\d+)\}").unwrap());

fn insert(style: &mut StyleMap, key: &str, value: impl Into<Value>) {
    style.insert(key.to_string(), value.into());
}

/// Extract style information from a record's content.
///
/// Style codes only apply to text that comes after them; a code trailing all
/// text in a record does not style that text, so only the content before the
/// first quoted fragment is considered.
pub fn parse_608_style(content: &str) -> StyleMap {
    let mut style = StyleMap::new();

    let first_text_pos = FIRST_TEXT_REGEX
        .find(content)
        .map_or(content.len(), |m| m.start());
    let before_text = &content[..first_text_pos];

    // Mid-row foreground: {FG-Italic-White:PT:UL}, {FG-White}, ...
    if let Some(caps) = FG_REGEX.captures(before_text) {
        let fg_content = caps.get(1).map_or("", |m| m.as_str());
        let mut fields = fg_content.split(':');
        let fg_style = fields.next().unwrap_or("");
        let fg_flags: Vec<&str> = fields.collect();

        let normalized = fg_style.replace('-', " ").to_lowercase().trim().to_string();
        if normalized == "italic white" {
            insert(&mut style, "font-style", "italic");
            insert(&mut style, "color", "white");
        } else if MIDROW_COLORS.contains(&normalized.as_str()) {
            insert(&mut style, "color", normalized);
        } else {
            for part in fg_style.split('-') {
                let part = part.to_lowercase().trim().to_string();
                if MIDROW_COLORS.contains(&part.as_str()) {
                    insert(&mut style, "color", part);
                } else if part == "italic" {
                    insert(&mut style, "font-style", "italic");
                }
            }
        }

        // PT = partially transparent, UL = underline
        if fg_flags.iter().any(|flag| flag.contains("PT")) {
            insert(&mut style, "partially_transparent", true);
        }
        if fg_flags.iter().any(|flag| flag.contains("UL")) {
            insert(&mut style, "text-decoration", "underline");
        }
    }

    // Mid-row background: {BG-<color>:PT:UL}
    if let Some(caps) = BG_REGEX.captures(before_text) {
        let bg_color = caps.get(1).map_or("", |m| m.as_str()).to_lowercase();
        let bg_flags = caps.get(2).map_or("", |m| m.as_str());

        if MIDROW_COLORS.contains(&bg_color.as_str()) {
            insert(&mut style, "background-color", bg_color);
        }
        if bg_flags.contains("PT") {
            insert(&mut style, "background_partially_transparent", true);
        }
        if bg_flags.contains("UL") {
            insert(&mut style, "text-decoration", "underline");
        }
    }

    // PAC color: {R4:Yellow} or {R4:Italic White:UL}
    if !style.contains_key("color") {
        if let Some(caps) = PAC_COLOR_REGEX.captures(before_text) {
            let color = caps.get(2).map_or("", |m| m.as_str()).to_lowercase();
            if color == "italic white" {
                insert(&mut style, "color", "white");
                insert(&mut style, "font-style", "italic");
            } else if MIDROW_COLORS.contains(&color.as_str()) {
                insert(&mut style, "color", color);
            }
        }
    }

    if PAC_UNDERLINE_REGEX.is_match(before_text) || before_text.contains("{UL}") {
        insert(&mut style, "text-decoration", "underline");
    }

    style
}

/// Extract text with line breaks derived from PAC cursor rows: a row change
/// (e.g. {R14:C8} to {R15:C4}) starts a new physical line. Returns the
/// newline-joined text and the per-line placements, top row first.
pub fn parse_608_text_with_positions(content: &str) -> (String, Vec<TextLine>) {
    let mut lines: Vec<TextLine> = Vec::new();
    let mut current_row: Option<u32> = None;
    let mut current_column: Option<u32> = None;
    let mut current_text: Vec<String> = Vec::new();

    for segment in split_at_matches(content, &ROW_COL_REGEX) {
        if segment.trim().is_empty() {
            continue;
        }

        let fragments = quoted_fragments(segment);
        let segment_text = fragments.join(" ").trim().to_string();

        if let Some(caps) = ROW_COL_REGEX.captures(segment) {
            if fragments.is_empty() {
                continue;
            }
            let row: u32 = caps[1].parse().unwrap_or(0);
            let column: u32 = caps[2].parse().unwrap_or(0);

            if current_row.is_some() && current_row != Some(row) {
                // Row changed: flush the current line, start a new one
                if !current_text.is_empty() {
                    lines.push(TextLine {
                        row: current_row.unwrap_or(0),
                        column: current_column.unwrap_or(0),
                        text: current_text.join(" "),
                    });
                }
                current_text = vec![segment_text];
                current_column = Some(column);
            } else {
                current_text.push(segment_text);
                if current_column.is_none() {
                    current_column = Some(column);
                }
            }
            current_row = Some(row);
        } else if !fragments.is_empty() && current_row.is_some() {
            // Text without a new position continues the current line
            current_text.push(segment_text);
        }
    }

    if !current_text.is_empty() {
        lines.push(TextLine {
            row: current_row.unwrap_or(0),
            column: current_column.unwrap_or(0),
            text: current_text.join(" "),
        });
    }

    lines.sort_by_key(|line| line.row);
    let formatted = lines
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    (formatted, lines)
}

/// Extract layout information: cursor position (as grid coordinates and as
/// percentages of the 15-row by 32-column caption grid), tab offset, caption
/// mode and the control codes present.
pub fn parse_608_layout(content: &str) -> Layout {
    let mut layout = Layout::default();

    let positions: Vec<PenPosition> = ROW_COL_REGEX
        .captures_iter(content)
        .map(|caps| PenPosition {
            row: caps[1].parse().unwrap_or(0),
            column: caps[2].parse().unwrap_or(0),
        })
        .collect();

    if let Some(first) = positions.first() {
        layout.row = Some(first.row);
        layout.column = Some(first.column);
        // Rows 0-14 top to bottom, columns 0-31 left to right
        layout.vertical_percent = Some(f64::from(first.row) / 14.0 * 100.0);
        layout.horizontal_percent = Some(f64::from(first.column) / 31.0 * 100.0);
        if positions.len() > 1 {
            layout.all_positions = Some(positions);
        }
    }

    // PAC in style mode carries only a row: {R14:Yellow}
    if layout.row.is_none() {
        if let Some(caps) = PAC_COLOR_REGEX.captures(content) {
            let row: u32 = caps[1].parse().unwrap_or(0);
            layout.row = Some(row);
            layout.vertical_percent = Some(f64::from(row) / 14.0 * 100.0);
        }
    }

    if let Some(caps) = TAB_REGEX.captures(content) {
        layout.tab_offset = caps[1].parse().ok();
    }

    if content.contains("{RDC}") {
        layout.mode = Some("paint-on".to_string());
    } else if content.contains("{RCL}") {
        layout.mode = Some("pop-on".to_string());
    } else if content.contains("{RU2}") {
        layout.mode = Some("roll-up".to_string());
        layout.roll_up_rows = Some(2);
    } else if content.contains("{RU3}") {
        layout.mode = Some("roll-up".to_string());
        layout.roll_up_rows = Some(3);
    } else if content.contains("{RU4}") {
        layout.mode = Some("roll-up".to_string());
        layout.roll_up_rows = Some(4);
    }

    let found: Vec<String> = CONTROL_CODES
        .iter()
        .filter(|code| content.contains(&format!("{{{}}}", code)))
        .map(|code| code.to_string())
        .collect();
    if !found.is_empty() {
        layout.control_codes = Some(found);
    }

    layout
}

/// Parse one channel's decode stream into caption events.
///
/// Runs the two-slot display state machine: a displayed caption (what is on
/// screen) and a loading caption (the pop-on buffer). Records that match no
/// known form are skipped with a recorded diagnostic; a single bad line never
/// aborts the file. Events still open at end of stream keep no end time.
pub fn parse_608_content(
    content: &str,
    fps: FrameRate,
    drop_frame: bool,
    source_label: &str,
    diagnostics: &mut Vec<DebugEntry>,
) -> Vec<CaptionEvent> {
    let mut captions: Vec<CaptionEvent> = Vec::new();
    let mut displayed: Option<CaptionEventBuilder> = None;
    let mut loading: Option<CaptionEventBuilder> = None;

    for (idx, raw_line) in content.lines().enumerate() {
        if idx == 0 {
            // Header line with asset/channel info
            continue;
        }
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(caps) = RECORD_REGEX.captures(line) else {
            record_parse_warning(
                diagnostics,
                &format!("{}:{}", source_label, idx + 1),
                format!("Skipping unrecognized directive line: {}", line),
            );
            continue;
        };
        let timecode = caps.get(1).map_or("", |m| m.as_str());
        let body = caps.get(2).map_or("", |m| m.as_str());

        let current_time = match timecode_to_microseconds(timecode, fps, drop_frame) {
            Ok(us) => us,
            Err(err) => {
                record_parse_warning(
                    diagnostics,
                    &format!("{}:{}", source_label, idx + 1),
                    format!("Skipping record: {}", err),
                );
                continue;
            }
        };

        let (text, text_lines) = parse_608_text_with_positions(body);

        let is_eoc = body.contains("{EOC}");
        let is_edm = body.contains("{EDM}");
        let is_pop_on = body.contains("{RCL}");
        let is_paint_on = body.contains("{RDC}");
        let is_roll_up =
            body.contains("{RU2}") || body.contains("{RU3}") || body.contains("{RU4}");

        if is_eoc {
            // End of Caption: swap buffers, display the loaded caption
            if let Some(shown) = displayed.take() {
                captions.push(shown.close(current_time, timecode));
            }
            if let Some(mut buffered) = loading.take() {
                buffered.restart_at(current_time, timecode);
                displayed = Some(buffered);
            }
        } else if is_edm {
            // Erase Displayed Memory clears what is on screen
            if let Some(shown) = displayed.take() {
                captions.push(shown.close(current_time, timecode));
            }
        } else if !text.is_empty() {
            let style = parse_608_style(body);
            let mut layout = parse_608_layout(body);
            if !text_lines.is_empty() {
                layout.lines = Some(text_lines);
            }
            let builder = CaptionEventBuilder::new(current_time, timecode, text)
                .style((!style.is_empty()).then_some(style))
                .layout((!layout.is_empty()).then_some(layout));

            if is_pop_on {
                // Pop-on: load into the buffer, display happens at EOC
                loading = Some(builder);
            } else if is_paint_on || is_roll_up {
                if let Some(shown) = displayed.take() {
                    captions.push(shown.close(current_time, timecode));
                }
                displayed = Some(builder);
            } else if loading.is_some() {
                // Continuing an unfinished pop-on load
                loading = Some(builder);
            } else if let Some(shown) = displayed.take() {
                // Continuing paint-on display
                captions.push(shown.close(current_time, timecode));
                displayed = Some(builder);
            } else {
                displayed = Some(builder);
            }
        }
    }

    if let Some(shown) = displayed.take() {
        if shown.has_text() {
            captions.push(shown.into_open_event());
        }
    }
    // A leftover loading caption means the EOC swap never arrived
    if let Some(buffered) = loading.take() {
        if buffered.has_text() {
            captions.push(buffered.into_open_event());
        }
    }

    captions
}

/// Parse a .608 artifact file
pub fn parse_608_file(
    path: &Path,
    fps: FrameRate,
    drop_frame: bool,
    diagnostics: &mut Vec<DebugEntry>,
) -> Result<Vec<CaptionEvent>, MccError> {
    let content = FileManager::read_to_string_lossy(path)?;
    let label = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    Ok(parse_608_content(&content, fps, drop_frame, &label, diagnostics))
}
