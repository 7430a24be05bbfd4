/*!
 * Parsers for the external decoder's artifact files: the closed-caption
 * descriptor, the per-standard decode text streams, and the debug log.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{DebugEntry, DebugLevel};

pub mod ccd;
pub mod cea608;
pub mod cea708;
pub mod dbg;

/// One decode-stream record: `HH:MM:SS:FF - <content>` (or `;FF` for
/// drop-frame notation)
pub(crate) static RECORD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}:\d{2}:\d{2}[:;]\d{2})\s*-\s*(.*)$").unwrap()
});

/// Quoted text, tolerating a missing closing quote at end of content
/// (truncated artifact files still yield their final fragment)
pub(crate) static QUOTED_TEXT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]*)("|$)"#).unwrap());

/// All quoted fragments of a content slice, in order
pub(crate) fn quoted_fragments(content: &str) -> Vec<&str> {
    QUOTED_TEXT_REGEX
        .captures_iter(content)
        .map(|caps| caps.get(1).map_or("", |m| m.as_str()))
        .collect()
}

/// Split content into segments, each starting at a match of `re` (any prefix
/// before the first match becomes the leading segment). The decode grammars
/// scope text to the position directive introducing it.
pub(crate) fn split_at_matches<'a>(content: &'a str, re: &Regex) -> Vec<&'a str> {
    let starts: Vec<usize> = re.find_iter(content).map(|m| m.start()).collect();
    if starts.is_empty() {
        return vec![content];
    }

    let mut segments = Vec::with_capacity(starts.len() + 1);
    if starts[0] > 0 {
        segments.push(&content[..starts[0]]);
    }
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(content.len());
        segments.push(&content[start..end]);
    }
    segments
}

/// Record a synthetic diagnostic for a skipped record. Local parse failures
/// never abort a file; they surface through the run's debug metadata.
pub(crate) fn record_parse_warning(
    diagnostics: &mut Vec<DebugEntry>,
    source: &str,
    message: String,
) {
    log::warn!("{}: {}", source, message);
    diagnostics.push(DebugEntry {
        level: DebugLevel::Warn,
        category: "DBG_PARSER".to_string(),
        source: source.to_string(),
        message,
    });
}
