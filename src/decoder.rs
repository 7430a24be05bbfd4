/*!
 * External decode boundary: invokes the Caption Inspector process on an MCC
 * file and parses the artifacts it deposits (per-channel .608 streams,
 * per-service .708 streams, the .ccd descriptor and the .dbg log) into a
 * [`DecodeResult`].
 */

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use tempfile::TempDir;
use tokio::process::Command;

use crate::errors::MccError;
use crate::file_utils::{FileManager, MCC_MAGIC_HEADER};
use crate::models::{CaptionEvent, CaptionFormat, CaptionMap, DebugEntry, DecodeMetadata, DecodeResult};
use crate::parsers::{ccd, cea608, cea708, dbg};
use crate::timecode::FrameRate;

/// Track id from a CEA-608 artifact name: "Asset-C1.608" -> "c1"
static CHANNEL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"-C(\d+)\.608$").unwrap());

/// Track id from a CEA-708 artifact name: "Asset-S1.708" -> "s1"
static SERVICE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"-S(\d+)\.708$").unwrap());

/// How the external decoder process is invoked
#[derive(Debug, Clone)]
pub struct DecoderOptions {
    /// Decoder executable name or path
    pub command: String,
    /// Seconds to wait before giving up on the decoder
    pub timeout_secs: u64,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        DecoderOptions {
            command: "caption-inspector".to_string(),
            timeout_secs: 300,
        }
    }
}

/// Parse every caption artifact in the output directory into a unified
/// result.
///
/// The frame rate and drop-frame flag are extracted from the .ccd descriptor
/// unless an explicit `fps` override is given; a run with neither fails with
/// [`MccError::MissingDescriptor`] since no correct timing is possible
/// without a frame rate. Provenance fields (input file, artifact list) are
/// filled in by [`decode_mcc_file`].
pub fn parse_caption_files(
    output_dir: &Path,
    fps: Option<FrameRate>,
) -> Result<DecodeResult, MccError> {
    let (ccd_fps, ccd_drop_frame) = ccd::parse_ccd_metadata(output_dir)?;

    let actual_fps = match fps.or(ccd_fps) {
        Some(rate) => rate,
        None => {
            return Err(MccError::MissingDescriptor(format!(
                "no Frame Rate field in {}",
                output_dir.display()
            )));
        }
    };
    let drop_frame = ccd_drop_frame.unwrap_or(false);
    debug!("Using frame rate {} (drop frame: {})", actual_fps, drop_frame);

    // Synthetic diagnostics for records the parsers had to skip
    let mut diagnostics: Vec<DebugEntry> = Vec::new();

    let mut tracks_608: BTreeMap<String, Vec<CaptionEvent>> = BTreeMap::new();
    let mut files_608 = FileManager::find_files(output_dir, "608")?;
    files_608.sort();
    for file in &files_608 {
        let filename = file.file_name().map(|n| n.to_string_lossy().to_string());
        let channel = filename
            .as_deref()
            .and_then(|name| CHANNEL_REGEX.captures(name))
            .map(|caps| format!("c{}", &caps[1]));

        let events = cea608::parse_608_file(file, actual_fps, drop_frame, &mut diagnostics)?;
        if let Some(channel) = channel {
            if !events.is_empty() {
                debug!("Parsed {} CEA-608 events for channel {}", events.len(), channel);
                tracks_608.insert(channel, events);
            }
        }
    }

    let mut tracks_708: BTreeMap<String, Vec<CaptionEvent>> = BTreeMap::new();
    let mut files_708 = FileManager::find_files(output_dir, "708")?;
    files_708.sort();
    for file in &files_708 {
        let filename = file.file_name().map(|n| n.to_string_lossy().to_string());
        let service = filename
            .as_deref()
            .and_then(|name| SERVICE_REGEX.captures(name))
            .map(|caps| format!("s{}", &caps[1]));

        let events = cea708::parse_708_file(file, actual_fps, drop_frame, &mut diagnostics)?;
        if let Some(service) = service {
            if !events.is_empty() {
                debug!("Parsed {} CEA-708 events for service {}", events.len(), service);
                tracks_708.insert(service, events);
            }
        }
    }

    // Both standards are always keyed, matching the interchange shape
    let mut captions: CaptionMap = BTreeMap::new();
    captions.insert(CaptionFormat::Cea608, tracks_608);
    captions.insert(CaptionFormat::Cea708, tracks_708);

    // Decoder diagnostics first, synthetic parser diagnostics after
    let mut debug_entries = dbg::parse_debug_file(output_dir)?;
    debug_entries.append(&mut diagnostics);

    Ok(DecodeResult {
        captions,
        metadata: DecodeMetadata {
            fps: actual_fps,
            drop_frame,
            source_dir: output_dir.to_path_buf(),
            input_file: PathBuf::new(),
            output_files: Vec::new(),
            debug: debug_entries,
        },
    })
}

/// Decode an MCC file with the external Caption Inspector process and parse
/// the resulting artifacts.
///
/// When `output_dir` is None the artifacts go to a temporary directory that
/// is removed after parsing; a caller-provided directory is left in place.
/// The optional `fps` overrides the frame rate from the descriptor.
pub async fn decode_mcc_file(
    mcc_file_path: &Path,
    output_dir: Option<&Path>,
    fps: Option<FrameRate>,
) -> Result<DecodeResult, MccError> {
    decode_mcc_file_with(mcc_file_path, output_dir, fps, &DecoderOptions::default()).await
}

/// [`decode_mcc_file`] with explicit decoder invocation options
pub async fn decode_mcc_file_with(
    mcc_file_path: &Path,
    output_dir: Option<&Path>,
    fps: Option<FrameRate>,
    options: &DecoderOptions,
) -> Result<DecodeResult, MccError> {
    if !mcc_file_path.exists() {
        return Err(MccError::InputNotFound(mcc_file_path.to_path_buf()));
    }

    let is_mcc_extension = mcc_file_path
        .extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("mcc"))
        .unwrap_or(false);
    if !is_mcc_extension {
        return Err(MccError::InvalidMcc(format!(
            "file must have .mcc extension: {}",
            mcc_file_path.display()
        )));
    }

    let content = FileManager::read_to_string_lossy(mcc_file_path)?;
    if content.is_empty() {
        return Err(MccError::InvalidMcc(format!(
            "file has no content: {}",
            mcc_file_path.display()
        )));
    }
    if !content.starts_with(MCC_MAGIC_HEADER) {
        return Err(MccError::InvalidMcc(format!(
            "file has no proper header \"{}\": {}",
            MCC_MAGIC_HEADER,
            mcc_file_path.display()
        )));
    }

    // A temporary output directory lives only as long as this decode run
    let temp_dir: Option<TempDir>;
    let work_dir: PathBuf = match output_dir {
        Some(dir) => {
            FileManager::ensure_dir(dir)?;
            temp_dir = None;
            dir.to_path_buf()
        }
        None => {
            let dir = TempDir::new()?;
            let path = dir.path().to_path_buf();
            temp_dir = Some(dir);
            path
        }
    };

    run_decoder(mcc_file_path, &work_dir, options).await?;

    let output_files = FileManager::list_files(&work_dir)?;
    if output_files.is_empty() {
        return Err(MccError::ExternalDecodeFailed(format!(
            "decoder produced no artifacts in {}",
            work_dir.display()
        )));
    }

    let mut result = parse_caption_files(&work_dir, fps)?;
    result.metadata.input_file = mcc_file_path.to_path_buf();
    result.metadata.output_files = output_files;

    // Dropping the guard removes the temporary artifacts
    drop(temp_dir);

    Ok(result)
}

async fn run_decoder(
    input: &Path,
    output_dir: &Path,
    options: &DecoderOptions,
) -> Result<(), MccError> {
    info!(
        "Running: {} -o {} {}",
        options.command,
        output_dir.display(),
        input.display()
    );

    let decode_future = Command::new(&options.command)
        .arg("-o")
        .arg(output_dir)
        .arg(input)
        .output();

    let timeout = std::time::Duration::from_secs(options.timeout_secs);
    let output = tokio::select! {
        result = decode_future => {
            result.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    MccError::ExternalDecodeFailed(format!(
                        "{} not found. Is it installed?",
                        options.command
                    ))
                } else {
                    MccError::ExternalDecodeFailed(format!(
                        "failed to execute {}: {}",
                        options.command, e
                    ))
                }
            })?
        },
        _ = tokio::time::sleep(timeout) => {
            return Err(MccError::ExternalDecodeFailed(format!(
                "{} timed out after {} seconds",
                options.command, options.timeout_secs
            )));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!("Caption decoder failed: {}", stderr);
        return Err(MccError::ExternalDecodeFailed(format!(
            "{} exited with {}: {}",
            options.command,
            output.status,
            stderr.trim()
        )));
    }

    Ok(())
}
