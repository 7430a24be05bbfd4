/*!
 * CEA-708 (DTVCC) decode-stream parser.
 *
 * The decoder emits one text file per caption service, one record per line:
 * `HH:MM:SS:FF - <content>`, where the content mixes quoted text, extended
 * characters (`{P16:0x06A9}`), window definitions (`{DF0:...}`), window
 * attributes (`{SWA:...}`), pen attributes/colors (`{SPA:...}`, `{SPC:...}`),
 * pen moves (`{SPL:R1-C0}`) and window commands (`{CLW}`, `{DSW}`, `{HDW}`,
 * `{TGW}`, `{DLW}` with per-window bitmasks).
 *
 * Display is triggered by DSW (or a window definition carrying text);
 * clearing is triggered by DLW or CLW.
 */

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use crate::errors::MccError;
use crate::file_utils::FileManager;
use crate::models::{
    CaptionEvent, CaptionEventBuilder, DebugEntry, Layout, PenPosition, StyleMap, TextLine,
    TextSegment,
};
use crate::parsers::{
    quoted_fragments, record_parse_warning, split_at_matches, QUOTED_TEXT_REGEX, RECORD_REGEX,
};
use crate::timecode::{timecode_to_microseconds, FrameRate};

static STYLE_CMD_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(SPC|SPA):([^}]+)\}").unwrap());

static SPC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{SPC:([^}]+)\}").unwrap());
static SPA_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{SPA:([^}]+)\}").unwrap());

static FG_COLOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"FG-(\w+)-R([0-3])G([0-3])B([0-3])").unwrap());
static BG_COLOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"BG-(\w+)-R([0-3])G([0-3])B([0-3])").unwrap());
static EDGE_COLOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Edg-R([0-3])G([0-3])B([0-3])").unwrap());
static RGB_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"R([0-3])G([0-3])B([0-3])").unwrap());

static SIZE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"Size:(\w+)").unwrap());
static OFFSET_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"Offset:(\w+)").unwrap());
static TEXT_TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"TextTag-([^:}]+)").unwrap());
static FONT_TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"FontTag-([^:}]+)").unwrap());
static EDGE_TYPE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"EdgeType-([^:}]+)").unwrap());

static PEN_STYLE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[:{])Pen-([A-Za-z]+)(?:[:\-]|$|\})").unwrap());
static PEN_STYLE_BARE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Pen-([A-Za-z]+)$").unwrap());

static DF_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{DF(\d+):([^}]+)\}").unwrap());
static DF_PEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{DF\d+:[^}]*Pen-([A-Za-z]+)").unwrap());
static DF_PRESENT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{DF\d+:").unwrap());

static WINDOW_SIZE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r":R(\d+)-C(\d+)").unwrap());
static ANCHOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Anchor-(\w+)-V(\d+)-H(\d+)").unwrap());
static PRIORITY_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"Pr-(\d+)").unwrap());

static SWA_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{SWA:([^}]+)\}").unwrap());
static FILL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Fill-(\w+)-R([0-3])G([0-3])B([0-3])").unwrap());
static BORDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Brdr-(\w+)-R([0-3])G([0-3])B([0-3])").unwrap());
static PRINT_DIR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"PD-(\w+)").unwrap());
static SCROLL_DIR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"SD-(\w+)").unwrap());
static JUSTIFY_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"JD-(\w+)").unwrap());
static EFFECT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(Snap|Fade|Wipe|Mask)-([0-9.]+)sec-(\w+)").unwrap());

static SPL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{SPL:R(\d+)-C(\d+)\}").unwrap());
static P16_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{P16:0x([0-9A-Fa-f]+)\}").unwrap());

static CLW_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{CLW:(\d+)\}").unwrap());
static DSW_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{DSW:(\d+)\}").unwrap());
static HDW_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{HDW:(\d+)\}").unwrap());
static TGW_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{TGW:(\d+)\}").unwrap());
static DLW_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{DLW:(\d+)\}").unwrap());

/// Convert 2-bit CEA-708 channel values (0-3) to a CSS hex color.
/// Each channel scales 0→00, 1→55, 2→AA, 3→FF.
pub fn cea708_color_to_rgb(r: u8, g: u8, b: u8) -> String {
    fn scale(v: u8) -> u8 {
        match v {
            0 => 0x00,
            1 => 0x55,
            2 => 0xAA,
            _ => 0xFF,
        }
    }
    format!("#{:02X}{:02X}{:02X}", scale(r), scale(g), scale(b))
}

/// Describe a raw 2-bit CEA-708 opacity value
pub fn cea708_opacity_description(opacity: i64) -> &'static str {
    match opacity {
        1 => "flash",
        2 => "translucent",
        3 => "transparent",
        _ => "solid",
    }
}

/// Convert a decoder opacity tag (Solid, Flash, Translucent, Transparent) to
/// a CSS-friendly value
fn opacity_css(opacity: &str) -> Value {
    match opacity.to_lowercase().as_str() {
        "flash" => Value::from("flash"),
        "translucent" => Value::from(0.5),
        "transparent" => Value::from(0.0),
        _ => Value::from(1.0),
    }
}

fn pen_size_css(size: &str) -> String {
    match size {
        "small" => "small".to_string(),
        "standard" => "medium".to_string(),
        "large" => "large".to_string(),
        other => other.to_string(),
    }
}

fn pen_offset_css(offset: &str) -> Option<&'static str> {
    match offset {
        "subscript" => Some("sub"),
        "superscript" => Some("super"),
        _ => None,
    }
}

fn font_tag_css(font: &str) -> Option<&'static str> {
    match font {
        "monospaced serif" | "monoserif" => Some("monospace, serif"),
        "proportional serif" | "proportserif" | "propserif" => Some("serif"),
        "monospaced sanserif" | "monosanserif" | "monosans" => Some("monospace, sans-serif"),
        "proportional sanserif" | "proportionsanserif" | "propsans" | "propsanserif" => {
            Some("sans-serif")
        }
        "casual" | "cursive" => Some("cursive"),
        "smallcaps" => Some("small-caps"),
        _ => None,
    }
}

fn edge_type_css(edge: &str) -> Option<&'static str> {
    match edge {
        "raised" => Some("raised"),
        "depressed" => Some("depressed"),
        "uniform" => Some("uniform"),
        "left drop shadow" | "leftdropshadow" => Some("left-drop-shadow"),
        "right drop shadow" | "rightdropshadow" => Some("right-drop-shadow"),
        _ => None,
    }
}

fn anchor_description(anchor: &str) -> Option<&'static str> {
    match anchor {
        "ul" => Some("upper-left"),
        "uc" => Some("upper-center"),
        "ur" => Some("upper-right"),
        "ml" => Some("middle-left"),
        "mc" => Some("middle-center"),
        "mr" => Some("middle-right"),
        "ll" => Some("lower-left"),
        "lc" => Some("lower-center"),
        "lr" => Some("lower-right"),
        _ => None,
    }
}

/// Mode implied by a predefined window style name
fn window_style_mode(style: &str) -> Option<&'static str> {
    match style {
        "608-popup" | "popup-transbg" | "popup-centered" => Some("pop-on"),
        "608-rollup" | "rollup-transbg" | "rollup-centered" => Some("roll-up"),
        "tickertape" => Some("ticker"),
        other => {
            if other.contains("popup") {
                Some("pop-on")
            } else if other.contains("rollup") {
                Some("roll-up")
            } else if other.contains("painton") {
                Some("paint-on")
            } else if other.contains("ticker") {
                Some("ticker")
            } else {
                None
            }
        }
    }
}

fn border_type_css(border: &str) -> Option<&'static str> {
    match border {
        "raised" => Some("raised"),
        "depressed" => Some("depressed"),
        "uniform" => Some("uniform"),
        "shadow left" => Some("shadow-left"),
        "shadow right" => Some("shadow-right"),
        _ => None,
    }
}

fn direction_css(direction: &str) -> Option<&'static str> {
    match direction {
        "ltor" => Some("left-to-right"),
        "rtol" => Some("right-to-left"),
        "ttob" => Some("top-to-bottom"),
        "btot" => Some("bottom-to-top"),
        _ => None,
    }
}

fn justify_css(justify: &str) -> Option<&'static str> {
    match justify {
        "l/t" => Some("left"),
        "r/b" => Some("right"),
        "cntr" => Some("center"),
        "full" => Some("justify"),
        _ => None,
    }
}

/// Decode one P16 extended-character hex value to its Unicode scalar.
/// The decoder uses these for text outside the DTVCC G0/G1 sets
/// (Arabic, Farsi, CJK, ...).
pub fn decode_p16_character(hex: &str) -> Option<char> {
    let code = u32::from_str_radix(hex, 16).ok()?;
    char::from_u32(code)
}

/// Extract display text from a content slice: quoted fragments and P16
/// sequences concatenated in order of appearance.
pub fn extract_text_with_p16(content: &str) -> String {
    let mut pieces: Vec<(usize, String)> = Vec::new();

    for caps in QUOTED_TEXT_REGEX.captures_iter(content) {
        let start = caps.get(0).map_or(0, |m| m.start());
        let text = caps.get(1).map_or("", |c| c.as_str());
        if !text.is_empty() {
            pieces.push((start, text.to_string()));
        }
    }
    for caps in P16_REGEX.captures_iter(content) {
        let start = caps.get(0).map_or(0, |m| m.start());
        if let Some(ch) = decode_p16_character(&caps[1]) {
            pieces.push((start, ch.to_string()));
        }
    }

    pieces.sort_by_key(|(pos, _)| *pos);
    pieces.into_iter().map(|(_, text)| text).collect()
}

fn insert(style: &mut StyleMap, key: &str, value: impl Into<Value>) {
    style.insert(key.to_string(), value.into());
}

fn apply_spc(style: &mut StyleMap, spc_content: &str) {
    if let Some(caps) = FG_COLOR_REGEX.captures(spc_content) {
        let opacity = &caps[1];
        let (r, g, b) = (
            caps[2].parse().unwrap_or(0),
            caps[3].parse().unwrap_or(0),
            caps[4].parse().unwrap_or(0),
        );
        insert(style, "color", cea708_color_to_rgb(r, g, b));
        insert(style, "color_raw", json!({"r": r, "g": g, "b": b}));
        insert(style, "opacity", opacity_css(opacity));
        insert(style, "opacity_raw", opacity.to_lowercase());
    }

    if let Some(caps) = BG_COLOR_REGEX.captures(spc_content) {
        let opacity = &caps[1];
        let (r, g, b) = (
            caps[2].parse().unwrap_or(0),
            caps[3].parse().unwrap_or(0),
            caps[4].parse().unwrap_or(0),
        );
        insert(style, "background-color", cea708_color_to_rgb(r, g, b));
        insert(style, "background_color_raw", json!({"r": r, "g": g, "b": b}));
        insert(style, "background_opacity", opacity_css(opacity));
        insert(style, "background_opacity_raw", opacity.to_lowercase());
    }

    if let Some(caps) = EDGE_COLOR_REGEX.captures(spc_content) {
        let (r, g, b) = (
            caps[1].parse().unwrap_or(0),
            caps[2].parse().unwrap_or(0),
            caps[3].parse().unwrap_or(0),
        );
        insert(style, "edge_color", cea708_color_to_rgb(r, g, b));
        insert(style, "edge_color_raw", json!({"r": r, "g": g, "b": b}));
    }
}

fn spa_flag(spa_content: &str, flag: &str) -> bool {
    spa_content.contains(&format!(":{}", flag)) || spa_content.ends_with(flag)
}

/// Extract style information from a record's content: pen colors (SPC), pen
/// attributes (SPA), standalone RGB values and window-definition pen fonts.
pub fn parse_708_style(content: &str) -> StyleMap {
    let mut style = StyleMap::new();

    if let Some(caps) = SPC_REGEX.captures(content) {
        apply_spc(&mut style, &caps[1]);
    }

    if let Some(caps) = SPA_REGEX.captures(content) {
        let spa_content = caps.get(1).map_or("", |m| m.as_str());

        if let Some(size) = SIZE_REGEX.captures(spa_content) {
            insert(&mut style, "font-size", pen_size_css(&size[1].to_lowercase()));
        }
        if let Some(offset) = OFFSET_REGEX.captures(spa_content) {
            if let Some(align) = pen_offset_css(&offset[1].to_lowercase()) {
                insert(&mut style, "vertical-align", align);
            }
        }
        if let Some(tag) = TEXT_TAG_REGEX.captures(spa_content) {
            insert(&mut style, "text_tag", tag[1].to_lowercase());
        }
        if let Some(font) = FONT_TAG_REGEX.captures(spa_content) {
            if let Some(family) = font_tag_css(&font[1].to_lowercase()) {
                insert(&mut style, "font-family", family);
            }
        }
        if let Some(edge) = EDGE_TYPE_REGEX.captures(spa_content) {
            if let Some(edge_css) = edge_type_css(&edge[1].to_lowercase()) {
                insert(&mut style, "text-edge", edge_css);
            }
        }
        if spa_flag(spa_content, "UL") {
            insert(&mut style, "text-decoration", "underline");
        }
        if spa_flag(spa_content, "IT") {
            insert(&mut style, "font-style", "italic");
        }
        if spa_flag(spa_content, "BL") {
            insert(&mut style, "font-weight", "bold");
        }
    }

    // Standalone RGB not belonging to an FG/BG/Edg group
    if !style.contains_key("color") {
        for caps in RGB_REGEX.captures_iter(content) {
            let start = caps.get(0).map_or(0, |m| m.start());
            let prefix = &content[..start];
            if prefix.ends_with("FG-") || prefix.ends_with("BG-") || prefix.ends_with("Edg-") {
                continue;
            }
            let (r, g, b) = (
                caps[1].parse().unwrap_or(0),
                caps[2].parse().unwrap_or(0),
                caps[3].parse().unwrap_or(0),
            );
            insert(&mut style, "color", cea708_color_to_rgb(r, g, b));
            insert(&mut style, "color_raw", json!({"r": r, "g": g, "b": b}));
            break;
        }
    }

    // Pen font from a window definition or standalone Pen-<style>
    if !style.contains_key("font-family") {
        let pen = PEN_STYLE_REGEX
            .captures(content)
            .or_else(|| PEN_STYLE_BARE_REGEX.captures(content));
        if let Some(caps) = pen {
            if let Some(family) = font_tag_css(&caps[1].to_lowercase()) {
                insert(&mut style, "font-family", family);
            }
        }
    }

    style
}

#[derive(Debug)]
enum Piece {
    Style { command: String, content: String },
    PenMove { row: u32 },
    Text { text: String },
}

/// Parse content into text runs with their applicable pen styles.
///
/// SPC/SPA commands apply to all subsequent text until changed. Returns the
/// full newline-joined text plus either one shared style (when every run has
/// the same style) or the per-run segments.
pub fn parse_708_text_segments(
    content: &str,
) -> (String, Option<StyleMap>, Option<Vec<TextSegment>>) {
    let mut events: Vec<(usize, Piece)> = Vec::new();

    for caps in STYLE_CMD_REGEX.captures_iter(content) {
        events.push((
            caps.get(0).map_or(0, |m| m.start()),
            Piece::Style {
                command: caps[1].to_string(),
                content: caps[2].to_string(),
            },
        ));
    }
    for caps in QUOTED_TEXT_REGEX.captures_iter(content) {
        let text = caps.get(1).map_or("", |m| m.as_str());
        if !text.is_empty() {
            events.push((
                caps.get(0).map_or(0, |m| m.start()),
                Piece::Text {
                    text: text.to_string(),
                },
            ));
        }
    }
    for caps in P16_REGEX.captures_iter(content) {
        if let Some(ch) = decode_p16_character(&caps[1]) {
            events.push((
                caps.get(0).map_or(0, |m| m.start()),
                Piece::Text {
                    text: ch.to_string(),
                },
            ));
        }
    }
    for caps in SPL_REGEX.captures_iter(content) {
        events.push((
            caps.get(0).map_or(0, |m| m.start()),
            Piece::PenMove {
                row: caps[1].parse().unwrap_or(0),
            },
        ));
    }

    events.sort_by_key(|(pos, _)| *pos);

    let mut current_style = StyleMap::new();
    let mut current_row: u32 = 0;
    // (text, style, row)
    let mut segments: Vec<(String, Option<StyleMap>, u32)> = Vec::new();

    // Window-definition pen font is the base style for every run
    if let Some(caps) = DF_PEN_REGEX.captures(content) {
        if let Some(family) = font_tag_css(&caps[1].to_lowercase()) {
            insert(&mut current_style, "font-family", family);
        }
    }

    for (_, piece) in events {
        match piece {
            Piece::Style { command, content } => {
                if command == "SPC" {
                    apply_spc(&mut current_style, &content);
                } else {
                    if let Some(size) = SIZE_REGEX.captures(&content) {
                        insert(
                            &mut current_style,
                            "font-size",
                            pen_size_css(&size[1].to_lowercase()),
                        );
                    }
                    if let Some(offset) = OFFSET_REGEX.captures(&content) {
                        if let Some(align) = pen_offset_css(&offset[1].to_lowercase()) {
                            insert(&mut current_style, "vertical-align", align);
                        }
                    }
                    // SPA replaces the pen's flag attributes wholesale
                    if spa_flag(&content, "UL") {
                        insert(&mut current_style, "text-decoration", "underline");
                    } else {
                        current_style.remove("text-decoration");
                    }
                    if spa_flag(&content, "IT") {
                        insert(&mut current_style, "font-style", "italic");
                    } else {
                        current_style.remove("font-style");
                    }
                    if spa_flag(&content, "BL") {
                        insert(&mut current_style, "font-weight", "bold");
                    } else {
                        current_style.remove("font-weight");
                    }
                }
            }
            Piece::PenMove { row } => current_row = row,
            Piece::Text { text } => {
                let snapshot =
                    (!current_style.is_empty()).then(|| current_style.clone());
                match segments.last_mut() {
                    // Coalesce runs sharing a row and style
                    Some((existing, style, row))
                        if *row == current_row && *style == snapshot =>
                    {
                        existing.push_str(&text);
                    }
                    _ => segments.push((text, snapshot, current_row)),
                }
            }
        }
    }

    if segments.is_empty() {
        return (String::new(), None, None);
    }

    segments.sort_by_key(|(_, _, row)| *row);

    let mut full_text = String::new();
    let mut prev_row: Option<u32> = None;
    for (text, _, row) in &segments {
        if prev_row.is_some() && prev_row != Some(*row) {
            full_text.push('\n');
        }
        full_text.push_str(text);
        prev_row = Some(*row);
    }

    let all_same_style = segments.iter().all(|(_, style, _)| *style == segments[0].1);
    if all_same_style {
        let style = segments.into_iter().next().and_then(|(_, style, _)| style);
        return (full_text, style, None);
    }

    let mut result_segments = Vec::with_capacity(segments.len());
    for (i, (text, style, row)) in segments.iter().enumerate() {
        let mut segment_text = text.clone();
        if let Some((_, _, next_row)) = segments.get(i + 1) {
            if next_row != row {
                segment_text.push('\n');
            }
        }
        result_segments.push(TextSegment {
            text: segment_text,
            style: style.clone(),
        });
    }

    (full_text, None, Some(result_segments))
}

/// Extract text with line breaks derived from pen positions: a row change in
/// `{SPL:R#-C#}` starts a new physical line; text before any pen move belongs
/// to row 0. Returns the newline-joined text and per-line placements, top row
/// first.
pub fn parse_708_text_with_positions(content: &str) -> (String, Vec<TextLine>) {
    let mut lines: Vec<TextLine> = Vec::new();

    for segment in split_at_matches(content, &SPL_REGEX) {
        if segment.trim().is_empty() {
            continue;
        }

        let text = extract_text_with_p16(segment).trim().to_string();
        if text.is_empty() {
            continue;
        }

        let (row, column) = match SPL_REGEX.captures(segment) {
            Some(caps) => (caps[1].parse().unwrap_or(0), caps[2].parse().unwrap_or(0)),
            None => (0, 0),
        };

        lines.push(TextLine { row, column, text });
    }

    lines.sort_by_key(|line| line.row);
    let formatted = lines
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    (formatted, lines)
}

/// Extract layout information: window definition, window attributes, pen
/// positions and window command bitmasks.
pub fn parse_708_layout(content: &str) -> Layout {
    let mut layout = Layout::default();

    if let Some(caps) = DF_REGEX.captures(content) {
        layout.window_id = caps[1].parse().ok();
        let df_content = caps.get(2).map_or("", |m| m.as_str());

        // Window style preset is the first colon-separated field
        if let Some(window_style) = df_content.split(':').next() {
            let normalized = window_style.to_lowercase();
            if let Some(mode) = window_style_mode(&normalized) {
                layout.mode = Some(mode.to_string());
            }
            layout.window_style = Some(window_style.to_string());

            if normalized.contains("centered") || normalized.contains("cntrd") {
                layout.text_align = Some("center".to_string());
            } else if normalized.contains("left") {
                layout.text_align = Some("left".to_string());
            } else if normalized.contains("right") {
                layout.text_align = Some("right".to_string());
            }
            if normalized.contains("transbg") {
                layout.transparent_background = Some(true);
            }
        }

        if let Some(size) = WINDOW_SIZE_REGEX.captures(df_content) {
            layout.window_rows = size[1].parse().ok();
            layout.window_columns = size[2].parse().ok();
        }

        if let Some(anchor) = ANCHOR_REGEX.captures(df_content) {
            let anchor_point = &anchor[1];
            layout.anchor = Some(anchor_point.to_string());
            layout.anchor_description =
                anchor_description(&anchor_point.to_lowercase()).map(|s| s.to_string());
            layout.vertical_percent = anchor[2].parse().ok();
            layout.horizontal_percent = anchor[3].parse().ok();
        }

        if let Some(priority) = PRIORITY_REGEX.captures(df_content) {
            layout.priority = priority[1].parse().ok();
        }

        if df_content.contains(":VIS") {
            layout.visible = Some(true);
        }
        if df_content.contains(":RL") {
            layout.row_locked = Some(true);
        }
        if df_content.contains(":CL") {
            layout.column_locked = Some(true);
        }
        if df_content.contains(":RP") {
            layout.relative_position = Some(true);
        }
    }

    if let Some(caps) = SWA_REGEX.captures(content) {
        let swa_content = caps.get(1).map_or("", |m| m.as_str());

        if let Some(fill) = FILL_REGEX.captures(swa_content) {
            let (r, g, b) = (
                fill[2].parse().unwrap_or(0),
                fill[3].parse().unwrap_or(0),
                fill[4].parse().unwrap_or(0),
            );
            layout.fill_color = Some(cea708_color_to_rgb(r, g, b));
            layout.fill_opacity = Some(fill[1].to_lowercase());
        }

        if let Some(border) = BORDER_REGEX.captures(swa_content) {
            let (r, g, b) = (
                border[2].parse().unwrap_or(0),
                border[3].parse().unwrap_or(0),
                border[4].parse().unwrap_or(0),
            );
            layout.border_type =
                border_type_css(&border[1].to_lowercase()).map(|s| s.to_string());
            layout.border_color = Some(cea708_color_to_rgb(r, g, b));
        }

        if let Some(pd) = PRINT_DIR_REGEX.captures(swa_content) {
            layout.print_direction = direction_css(&pd[1].to_lowercase()).map(|s| s.to_string());
        }
        if let Some(sd) = SCROLL_DIR_REGEX.captures(swa_content) {
            layout.scroll_direction = direction_css(&sd[1].to_lowercase()).map(|s| s.to_string());
        }
        if let Some(jd) = JUSTIFY_REGEX.captures(swa_content) {
            if let Some(justify) = justify_css(&jd[1].to_lowercase()) {
                layout.text_align = Some(justify.to_string());
            }
        }

        if let Some(effect) = EFFECT_REGEX.captures(swa_content) {
            layout.display_effect = Some(effect[1].to_lowercase());
            layout.effect_speed = effect[2].parse().ok();
            layout.effect_direction =
                direction_css(&effect[3].to_lowercase()).map(|s| s.to_string());
        }

        if swa_content.contains(":WW") {
            layout.word_wrap = Some(true);
        }
    }

    let pen_positions: Vec<PenPosition> = SPL_REGEX
        .captures_iter(content)
        .map(|caps| PenPosition {
            row: caps[1].parse().unwrap_or(0),
            column: caps[2].parse().unwrap_or(0),
        })
        .collect();
    if let Some(first) = pen_positions.first() {
        layout.row = Some(first.row);
        layout.column = Some(first.column);
        layout.pen_positions = Some(pen_positions);
    }

    if let Some(caps) = CLW_REGEX.captures(content) {
        layout.clear_windows = Some(caps[1].to_string());
    }
    if let Some(caps) = DSW_REGEX.captures(content) {
        layout.display_windows = Some(caps[1].to_string());
    }
    if let Some(caps) = HDW_REGEX.captures(content) {
        layout.hide_windows = Some(caps[1].to_string());
    }
    if let Some(caps) = TGW_REGEX.captures(content) {
        layout.toggle_windows = Some(caps[1].to_string());
    }
    if let Some(caps) = DLW_REGEX.captures(content) {
        layout.delete_windows = Some(caps[1].to_string());
    }

    layout
}

/// Parse one service's decode stream into caption events.
///
/// Display is triggered by DSW or a window definition carrying text; DLW and
/// CLW close the open caption. Records that match no known form are skipped
/// with a recorded diagnostic; a single bad line never aborts the file.
pub fn parse_708_content(
    content: &str,
    fps: FrameRate,
    drop_frame: bool,
    source_label: &str,
    diagnostics: &mut Vec<DebugEntry>,
) -> Vec<CaptionEvent> {
    let mut captions: Vec<CaptionEvent> = Vec::new();
    let mut current: Option<CaptionEventBuilder> = None;

    for (idx, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = RECORD_REGEX.captures(line) {
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

            let (text, text_lines) = parse_708_text_with_positions(body);

            let has_dsw = body.contains("{DSW:");
            let has_dlw = body.contains("{DLW:");
            let has_clw = body.contains("{CLW:");
            let has_df = DF_PRESENT_REGEX.is_match(body);

            if !text.is_empty() && (has_dsw || has_df) {
                let (_, style, segments) = parse_708_text_segments(body);
                let mut layout = parse_708_layout(body);
                if !text_lines.is_empty() {
                    layout.lines = Some(text_lines);
                }

                if let Some(open) = current.take() {
                    captions.push(open.close(current_time, timecode));
                }

                current = Some(
                    CaptionEventBuilder::new(current_time, timecode, text)
                        .style(style)
                        .layout((!layout.is_empty()).then_some(layout))
                        .segments(segments),
                );
            } else if (has_dlw || has_clw) && current.is_some() {
                if let Some(open) = current.take() {
                    captions.push(open.close(current_time, timecode));
                }
            } else if !text.is_empty() && current.is_none() {
                // Text without a display command: first caption or continuation
                let (_, style, segments) = parse_708_text_segments(body);
                let mut layout = parse_708_layout(body);
                if !text_lines.is_empty() {
                    layout.lines = Some(text_lines);
                }

                current = Some(
                    CaptionEventBuilder::new(current_time, timecode, text)
                        .style(style)
                        .layout((!layout.is_empty()).then_some(layout))
                        .segments(segments),
                );
            }
        } else {
            // The header line sometimes carries the first caption's text
            let fragments = quoted_fragments(line);
            let text = fragments.join(" ").trim().to_string();
            if !text.is_empty() && current.is_none() {
                current = Some(CaptionEventBuilder::new(0, "00:00:00:00", text));
            } else if idx > 0 {
                record_parse_warning(
                    diagnostics,
                    &format!("{}:{}", source_label, idx + 1),
                    format!("Skipping unrecognized directive line: {}", line),
                );
            }
        }
    }

    if let Some(open) = current.take() {
        if open.has_text() {
            captions.push(open.into_open_event());
        }
    }

    captions
}

/// Parse a .708 artifact file
pub fn parse_708_file(
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
    Ok(parse_708_content(&content, fps, drop_frame, &label, diagnostics))
}
