/*!
 * # mccreader - MacCaption MCC caption reader
 *
 * A Rust library that turns the Caption Inspector decoder's text output into
 * a normalized, queryable caption model.
 *
 * ## Features
 *
 * - Invoke the external Caption Inspector process on an MCC file
 * - Parse per-channel CEA-608 and per-service CEA-708 decode streams into
 *   time-ordered caption events with text, style and layout
 * - Exact SMPTE timecode arithmetic, including drop-frame counting
 * - Frame rate and drop-frame flag from the decode descriptor
 * - Structured decoder diagnostics from the debug log
 * - Per-track language annotation through a pluggable detector
 * - Filtering by format, track and language over one immutable result
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `reader`: The MccReader query surface
 * - `decoder`: External decode process boundary and artifact orchestration
 * - `parsers`: Artifact parsers:
 *   - `parsers::ccd`: Descriptor (frame rate / drop frame)
 *   - `parsers::cea608`: CEA-608 decode streams
 *   - `parsers::cea708`: CEA-708 decode streams
 *   - `parsers::dbg`: Decoder debug log
 * - `timecode`: Timecode engine (timecode <-> microseconds)
 * - `models`: Caption data model and its serde interchange shape
 * - `language`: Language detector boundary and ISO code utilities
 * - `app_config`: Configuration management
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the library
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod decoder;
pub mod errors;
pub mod file_utils;
pub mod language;
pub mod models;
pub mod parsers;
pub mod reader;
pub mod timecode;

// Re-export main types for easier usage
pub use decoder::{decode_mcc_file, decode_mcc_file_with, parse_caption_files, DecoderOptions};
pub use errors::MccError;
pub use language::{language_codes_match, LanguageDetector};
pub use models::{
    CaptionEvent, CaptionFormat, DebugEntry, DebugLevel, DecodeMetadata, DecodeResult, Layout,
    StyleMap, TextLine, TextSegment,
};
pub use reader::MccReader;
pub use timecode::{microseconds_to_timecode, timecode_to_microseconds, FrameRate};
