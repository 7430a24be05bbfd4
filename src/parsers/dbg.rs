/*!
 * Debug-log parser: extracts structured entries from the decoder's .dbg
 * artifact.
 *
 * Each line follows `LEVEL CATEGORY [source:line] - message`. Lines that do
 * not parse are dropped silently: unlike the caption streams, the debug log
 * is purely diagnostic and partial loss of it is acceptable.
 */

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::MccError;
use crate::file_utils::FileManager;
use crate::models::{DebugEntry, DebugLevel};

/// `WARN DBG_708_DEC [dtvcc_decode.c:342] - Mismatch in Packet length...`
static DEBUG_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(UNKNOWN_DEBUG_LEVEL|VERBOSE|INFO|WARN|ERROR|FATAL|ASSERT)\s+(\S+)\s+\[([^\]]+)\]\s+-\s+(.*)$",
    )
    .unwrap()
});

/// Parse debug-log content into entries, preserving the original order
pub fn parse_debug_content(content: &str) -> Vec<DebugEntry> {
    let mut entries = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = DEBUG_LINE_REGEX.captures(line) {
            let Some(level) = DebugLevel::from_tag(&caps[1]) else {
                continue;
            };
            entries.push(DebugEntry {
                level,
                category: caps[2].to_string(),
                source: caps[3].to_string(),
                message: caps[4].to_string(),
            });
        }
    }

    entries
}

/// Locate the first .dbg artifact in the output directory and parse it.
/// A missing debug log yields no entries.
pub fn parse_debug_file(output_dir: &Path) -> Result<Vec<DebugEntry>, MccError> {
    let mut dbg_files = FileManager::find_files(output_dir, "dbg")?;
    dbg_files.sort();

    let Some(dbg_file) = dbg_files.first() else {
        return Ok(Vec::new());
    };

    let content = FileManager::read_to_string_lossy(dbg_file)?;
    Ok(parse_debug_content(&content))
}
