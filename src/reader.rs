/*!
 * MccReader: the query surface over one decode run.
 *
 * `read` drives the whole pipeline (external decode, artifact parsing,
 * language annotation) and either installs a complete, internally consistent
 * [`DecodeResult`] or returns a typed error leaving the reader unchanged —
 * callers never observe a partially populated result.
 */

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;

use crate::decoder::{decode_mcc_file_with, DecoderOptions};
use crate::errors::MccError;
use crate::file_utils::MCC_MAGIC_HEADER;
use crate::language::{language_code, language_codes_match, LanguageDetector};
use crate::models::{CaptionEvent, CaptionFormat, DebugEntry, DebugLevel, DecodeResult};
use crate::timecode::FrameRate;

/// Reads MCC caption files into a queryable caption model
pub struct MccReader {
    result: Option<DecodeResult>,
    tracks: BTreeMap<CaptionFormat, Vec<String>>,
    languages: BTreeMap<CaptionFormat, BTreeMap<String, String>>,
    detector: Option<Box<dyn LanguageDetector>>,
    options: DecoderOptions,
}

impl Default for MccReader {
    fn default() -> Self {
        MccReader::new()
    }
}

impl MccReader {
    /// A reader without a language detector; track languages stay unset
    pub fn new() -> Self {
        MccReader {
            result: None,
            tracks: BTreeMap::new(),
            languages: BTreeMap::new(),
            detector: None,
            options: DecoderOptions::default(),
        }
    }

    /// A reader that annotates each track with a detected language
    pub fn with_detector(detector: Box<dyn LanguageDetector>) -> Self {
        MccReader {
            detector: Some(detector),
            ..MccReader::new()
        }
    }

    /// Override how the external decoder process is invoked
    pub fn set_decoder_options(&mut self, options: DecoderOptions) {
        self.options = options;
    }

    /// Validate whether raw content looks like an MCC file by checking its
    /// magic header, without decoding anything
    pub fn detect(content: &str) -> bool {
        content
            .lines()
            .next()
            .is_some_and(|line| line.starts_with(MCC_MAGIC_HEADER))
    }

    /// Decode an MCC file and install the result.
    ///
    /// When `output_dir` is None the decoder's artifacts go to a temporary
    /// directory removed after parsing.
    pub async fn read(
        &mut self,
        input_path: &Path,
        output_dir: Option<&Path>,
    ) -> Result<(), MccError> {
        let result = decode_mcc_file_with(input_path, output_dir, None, &self.options).await?;
        self.load_result(result);
        Ok(())
    }

    /// Install an already parsed decode result, rebuilding the track index
    /// and re-running language annotation. Useful when the decoder's
    /// artifacts were parsed separately via
    /// [`crate::decoder::parse_caption_files`].
    pub fn load_result(&mut self, result: DecodeResult) {
        let mut tracks: BTreeMap<CaptionFormat, Vec<String>> = BTreeMap::new();
        for (format, track_map) in &result.captions {
            tracks.insert(*format, track_map.keys().cloned().collect());
        }

        let languages = self.detect_languages(&result);

        self.tracks = tracks;
        self.languages = languages;
        self.result = Some(result);
    }

    /// Caption events filtered by format, track and detected language, in
    /// track-discovery order. Unknown formats, tracks or languages yield an
    /// empty result, never an error; absence of data is a normal outcome.
    pub fn captions(
        &self,
        format: Option<CaptionFormat>,
        track: Option<&str>,
        language: Option<&str>,
    ) -> Vec<&CaptionEvent> {
        let Some(result) = &self.result else {
            return Vec::new();
        };

        let mut events = Vec::new();
        for (current_format, track_map) in &result.captions {
            if format.is_some() && format != Some(*current_format) {
                continue;
            }
            for (track_id, track_events) in track_map {
                if let Some(wanted) = track {
                    if track_id != wanted {
                        continue;
                    }
                }
                if let Some(wanted) = language {
                    let detected = self
                        .languages
                        .get(current_format)
                        .and_then(|langs| langs.get(track_id));
                    let matches = detected
                        .map(|code| language_codes_match(code, wanted))
                        .unwrap_or(false);
                    if !matches {
                        continue;
                    }
                }
                events.extend(track_events.iter());
            }
        }
        events
    }

    /// Available track ids grouped by standard, in discovery order
    pub fn tracks(
        &self,
        format: Option<CaptionFormat>,
    ) -> BTreeMap<CaptionFormat, Vec<String>> {
        self.tracks
            .iter()
            .filter(|(current, _)| format.is_none() || format == Some(**current))
            .map(|(current, ids)| (*current, ids.clone()))
            .collect()
    }

    /// Detected language per track, grouped by standard. Tracks with no
    /// confident detection are absent.
    pub fn languages(
        &self,
        format: Option<CaptionFormat>,
    ) -> BTreeMap<CaptionFormat, BTreeMap<String, String>> {
        self.languages
            .iter()
            .filter(|(current, _)| format.is_none() || format == Some(**current))
            .map(|(current, langs)| (*current, langs.clone()))
            .collect()
    }

    /// Standards that actually carry caption tracks
    pub fn formats(&self) -> Vec<CaptionFormat> {
        self.result
            .as_ref()
            .map(|result| result.formats())
            .unwrap_or_default()
    }

    pub fn fps(&self) -> Option<FrameRate> {
        self.result.as_ref().map(|result| result.metadata.fps)
    }

    pub fn drop_frame(&self) -> Option<bool> {
        self.result.as_ref().map(|result| result.metadata.drop_frame)
    }

    /// Debug entries, optionally filtered to one level
    pub fn debug_metadata(&self, level: Option<DebugLevel>) -> Vec<&DebugEntry> {
        let Some(result) = &self.result else {
            return Vec::new();
        };
        result
            .metadata
            .debug
            .iter()
            .filter(|entry| level.is_none() || level == Some(entry.level))
            .collect()
    }

    /// The full decode result as produced by the pipeline
    pub fn original_result(&self) -> Option<&DecodeResult> {
        self.result.as_ref()
    }

    /// One detection call per track over its concatenated caption text,
    /// chronological order, original line breaks preserved. Best-effort:
    /// failure to detect leaves the track's language unset and never
    /// invalidates the result.
    fn detect_languages(
        &self,
        result: &DecodeResult,
    ) -> BTreeMap<CaptionFormat, BTreeMap<String, String>> {
        let mut languages: BTreeMap<CaptionFormat, BTreeMap<String, String>> = BTreeMap::new();
        languages.insert(CaptionFormat::Cea608, BTreeMap::new());
        languages.insert(CaptionFormat::Cea708, BTreeMap::new());

        let Some(detector) = &self.detector else {
            debug!("No language detector configured, leaving track languages unset");
            return languages;
        };

        for (format, track_map) in &result.captions {
            for (track_id, events) in track_map {
                let mut full_text = String::new();
                for event in events {
                    if event.text.trim().is_empty() {
                        continue;
                    }
                    if !full_text.is_empty() {
                        full_text.push(' ');
                    }
                    full_text.push_str(&event.text);
                }

                if full_text.trim().is_empty() {
                    continue;
                }

                match detector.detect(&full_text) {
                    Some(language) => {
                        let code = language_code(language);
                        debug!("Detected language {} for {}_{}", code, format, track_id);
                        languages
                            .entry(*format)
                            .or_default()
                            .insert(track_id.clone(), code);
                    }
                    None => {
                        debug!("No confident language for {}_{}", format, track_id);
                    }
                }
            }
        }

        languages
    }
}
