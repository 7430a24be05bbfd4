/*!
 * Data model for decoded caption runs.
 *
 * All entities are created during a single parse pass over the decoder's
 * output files and are immutable afterward; the language annotation pass only
 * adds a language per track on the reader. The serde shape of these types is
 * the interchange contract: emitted JSON re-parses to an equal DecodeResult.
 */

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::timecode::FrameRate;

/// Caption standard of a decoded elementary stream
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CaptionFormat {
    /// Legacy line-21 captions, addressed by channel ("c1", "c3", ...)
    Cea608,
    /// DTVCC window-based captions, addressed by service ("s1", "s2", ...)
    Cea708,
}

impl CaptionFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptionFormat::Cea608 => "cea608",
            CaptionFormat::Cea708 => "cea708",
        }
    }
}

impl fmt::Display for CaptionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CaptionFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cea608" => Ok(CaptionFormat::Cea608),
            "cea708" => Ok(CaptionFormat::Cea708),
            _ => Err(anyhow!("Invalid caption format: {}", s)),
        }
    }
}

/// Severity levels emitted by the external decoder's debug log, in the
/// decoder's own order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum DebugLevel {
    #[serde(rename = "UNKNOWN_DEBUG_LEVEL")]
    UnknownDebugLevel,
    #[serde(rename = "VERBOSE")]
    Verbose,
    #[serde(rename = "INFO")]
    Info,
    #[serde(rename = "WARN")]
    Warn,
    #[serde(rename = "ERROR")]
    Error,
    #[serde(rename = "FATAL")]
    Fatal,
    #[serde(rename = "ASSERT")]
    Assert,
}

impl DebugLevel {
    /// All levels, in the decoder's order
    pub const ALL: [DebugLevel; 7] = [
        DebugLevel::UnknownDebugLevel,
        DebugLevel::Verbose,
        DebugLevel::Info,
        DebugLevel::Warn,
        DebugLevel::Error,
        DebugLevel::Fatal,
        DebugLevel::Assert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DebugLevel::UnknownDebugLevel => "UNKNOWN_DEBUG_LEVEL",
            DebugLevel::Verbose => "VERBOSE",
            DebugLevel::Info => "INFO",
            DebugLevel::Warn => "WARN",
            DebugLevel::Error => "ERROR",
            DebugLevel::Fatal => "FATAL",
            DebugLevel::Assert => "ASSERT",
        }
    }

    /// Parse a level tag as it appears in the debug log
    pub fn from_tag(tag: &str) -> Option<DebugLevel> {
        DebugLevel::ALL.into_iter().find(|level| level.as_str() == tag)
    }
}

impl fmt::Display for DebugLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One structured line from the decoder's debug log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugEntry {
    pub level: DebugLevel,
    /// Decoder-defined tag, e.g. "DBG_708_DEC"
    pub category: String,
    /// file:line provenance within the decoder
    pub source: String,
    pub message: String,
}

/// CSS-like style properties attached to a caption event; values are strings,
/// booleans, numbers, or small raw-channel objects depending on the property
pub type StyleMap = BTreeMap<String, Value>;

/// One physical text line with its grid placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub row: u32,
    pub column: u32,
    pub text: String,
}

/// A cursor/pen position on the caption grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenPosition {
    pub row: u32,
    pub column: u32,
}

/// A run of caption text sharing one style, used when a single event carries
/// more than one pen style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSegment {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub style: Option<StyleMap>,
}

/// Positional layout captured while an event was open. Only the fields the
/// standard's directives populate are present: CEA-608 events carry cursor
/// rows/columns, tab offsets and control codes, CEA-708 events carry window
/// geometry, anchors and window commands.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Layout {
    /// Caption mode: "pop-on", "roll-up", "paint-on" or "ticker"
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub mode: Option<String>,
    /// Primary cursor row (CEA-608) or final pen row (CEA-708)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub row: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub column: Option<u32>,
    /// Screen-relative vertical placement, percent
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub vertical_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub horizontal_percent: Option<f64>,
    /// Every distinct cursor position touched while the event was open
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub all_positions: Option<Vec<PenPosition>>,
    /// Sub-column adjustment from tab directives
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tab_offset: Option<u32>,
    /// Roll-up window height in rows
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub roll_up_rows: Option<u32>,
    /// Recognized control-code mnemonics, in a fixed order
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub control_codes: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub window_id: Option<u32>,
    /// Named window style preset as emitted by the decoder
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub window_style: Option<String>,
    #[serde(rename = "text-align", skip_serializing_if = "Option::is_none", default)]
    pub text_align: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub transparent_background: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub window_rows: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub window_columns: Option<u32>,
    /// Anchor point code (UL, UC, ..., LR)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub anchor: Option<String>,
    /// Human-readable anchor point ("upper-left", ...)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub anchor_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub priority: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub row_locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub column_locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub relative_position: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fill_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fill_opacity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub border_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub border_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub print_direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub scroll_direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub display_effect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub effect_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub effect_direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub word_wrap: Option<bool>,

    /// Ordered pen moves while the event was open
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pen_positions: Option<Vec<PenPosition>>,
    /// Window command bitmasks, one character per window slot
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub clear_windows: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub display_windows: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hide_windows: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub toggle_windows: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub delete_windows: Option<String>,

    /// One entry per physical text line, preserving placement
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lines: Option<Vec<TextLine>>,
}

impl Layout {
    /// Whether any directive populated this layout
    pub fn is_empty(&self) -> bool {
        *self == Layout::default()
    }
}

/// One decoded, displayable unit of caption text with a time span.
///
/// An event is open (no end) until it is closed by the next event's start or
/// by an explicit clear; events still open at end of stream keep `end: None`
/// and the consuming application decides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionEvent {
    /// Start of display, microseconds
    #[serde(rename = "start")]
    pub start_us: u64,
    pub start_timecode: String,
    /// End of display, microseconds; None while the event is open
    #[serde(rename = "end")]
    pub end_us: Option<u64>,
    pub end_timecode: Option<String>,
    /// Display text, physical lines joined with '\n'
    pub text: String,
    /// CSS-like style; absent when no style directive was emitted
    pub style: Option<StyleMap>,
    /// Positional layout; absent when no positioning directive applies
    pub layout: Option<Layout>,
    /// Per-style text runs, present only when styles differ mid-event
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub segments: Option<Vec<TextSegment>>,
}

/// Accumulates the directives in force for one open caption and freezes them
/// into an immutable [`CaptionEvent`] at close time
#[derive(Debug, Clone)]
pub struct CaptionEventBuilder {
    start_us: u64,
    start_timecode: String,
    text: String,
    style: Option<StyleMap>,
    layout: Option<Layout>,
    segments: Option<Vec<TextSegment>>,
}

impl CaptionEventBuilder {
    pub fn new(start_us: u64, start_timecode: impl Into<String>, text: impl Into<String>) -> Self {
        CaptionEventBuilder {
            start_us,
            start_timecode: start_timecode.into(),
            text: text.into(),
            style: None,
            layout: None,
            segments: None,
        }
    }

    pub fn style(mut self, style: Option<StyleMap>) -> Self {
        self.style = style;
        self
    }

    pub fn layout(mut self, layout: Option<Layout>) -> Self {
        self.layout = layout;
        self
    }

    pub fn segments(mut self, segments: Option<Vec<TextSegment>>) -> Self {
        self.segments = segments;
        self
    }

    /// Pop-on captions load into a buffer and only start displaying at the
    /// end-of-caption swap; this moves the start to that point.
    pub fn restart_at(&mut self, start_us: u64, start_timecode: impl Into<String>) {
        self.start_us = start_us;
        self.start_timecode = start_timecode.into();
    }

    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }

    /// Close the event at the given boundary
    pub fn close(self, end_us: u64, end_timecode: impl Into<String>) -> CaptionEvent {
        self.finish(Some(end_us), Some(end_timecode.into()))
    }

    /// Freeze the event while still open (end of stream reached)
    pub fn into_open_event(self) -> CaptionEvent {
        self.finish(None, None)
    }

    fn finish(self, end_us: Option<u64>, end_timecode: Option<String>) -> CaptionEvent {
        CaptionEvent {
            start_us: self.start_us,
            start_timecode: self.start_timecode,
            end_us,
            end_timecode,
            text: self.text,
            style: self.style,
            layout: self.layout,
            segments: self.segments,
        }
    }
}

/// Per-run metadata attached to a decode result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeMetadata {
    /// File-global frame rate, read once from the descriptor
    pub fps: FrameRate,
    /// File-global drop-frame flag
    pub drop_frame: bool,
    /// Directory the decoder wrote its artifacts into
    pub source_dir: PathBuf,
    /// The original MCC input path
    #[serde(default)]
    pub input_file: PathBuf,
    /// Every artifact the decoder produced
    #[serde(default)]
    pub output_files: Vec<PathBuf>,
    /// Decoder diagnostics followed by synthetic parser diagnostics
    #[serde(default)]
    pub debug: Vec<DebugEntry>,
}

/// Ordered caption events per track id, per standard
pub type CaptionMap = BTreeMap<CaptionFormat, BTreeMap<String, Vec<CaptionEvent>>>;

/// The root aggregate of one decode run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeResult {
    /// captions.{format}.{track} -> ordered caption events. Both standards
    /// are always keyed, possibly with empty track maps.
    pub captions: CaptionMap,
    pub metadata: DecodeMetadata,
}

impl DecodeResult {
    /// Track ids per standard, in discovery order
    pub fn track_ids(&self, format: CaptionFormat) -> Vec<String> {
        self.captions
            .get(&format)
            .map(|tracks| tracks.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Standards that actually carry at least one track
    pub fn formats(&self) -> Vec<CaptionFormat> {
        self.captions
            .iter()
            .filter(|(_, tracks)| !tracks.is_empty())
            .map(|(format, _)| *format)
            .collect()
    }
}
