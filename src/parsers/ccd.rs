/*!
 * Descriptor parser: extracts the frame rate and drop-frame flag from the
 * decoder's .ccd artifact.
 */

use std::path::Path;

use log::debug;

use crate::errors::MccError;
use crate::file_utils::FileManager;
use crate::timecode::FrameRate;

/// Nominal NTSC rates the descriptor reports; the true rates are pulled by
/// 1000/1001 when the stream is drop-frame. PAL rates (25, 50) never use
/// drop-frame timecode.
const NTSC_NOMINAL_RATES: [u32; 5] = [24, 30, 48, 60, 120];

/// Parse descriptor content for `Frame Rate=` and `Drop Frame=` fields.
///
/// Returns whatever was found; the caller decides whether a missing frame
/// rate is fatal. When the stream is drop-frame and the descriptor reports a
/// nominal NTSC rate, the rate is adjusted to its exact 1000/1001 rational
/// (30 becomes 30000/1001).
pub fn parse_ccd_content(content: &str) -> (Option<FrameRate>, Option<bool>) {
    let mut frame_rate: Option<FrameRate> = None;
    let mut drop_frame: Option<bool> = None;

    for line in content.lines() {
        let line = line.trim();

        if let Some(value) = line.strip_prefix("Frame Rate=") {
            if let Ok(rate) = value.trim().parse::<f64>() {
                frame_rate = Some(FrameRate::from_f64(rate));
            }
        } else if let Some(value) = line.strip_prefix("Drop Frame=") {
            drop_frame = Some(value.trim().eq_ignore_ascii_case("true"));
        }

        // Both fields appear early in the file
        if frame_rate.is_some() && drop_frame.is_some() {
            break;
        }
    }

    if drop_frame == Some(true) {
        if let Some(rate) = frame_rate {
            if rate.den == 1 && NTSC_NOMINAL_RATES.contains(&rate.num) {
                frame_rate = Some(FrameRate::new(rate.num * 1000, 1001));
            }
        }
    }

    (frame_rate, drop_frame)
}

/// Locate the first .ccd artifact in the output directory and parse it.
/// Returns `(None, None)` when no descriptor was produced.
pub fn parse_ccd_metadata(output_dir: &Path) -> Result<(Option<FrameRate>, Option<bool>), MccError> {
    let mut ccd_files = FileManager::find_files(output_dir, "ccd")?;
    ccd_files.sort();

    let Some(ccd_file) = ccd_files.first() else {
        debug!("No .ccd descriptor found in {}", output_dir.display());
        return Ok((None, None));
    };

    let content = FileManager::read_to_string_lossy(ccd_file)?;
    Ok(parse_ccd_content(&content))
}
