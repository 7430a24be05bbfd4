/*!
 * Timecode engine: bidirectional conversion between SMPTE-style timecode
 * strings and microsecond offsets, parametrized by frame rate and the
 * drop-frame flag.
 *
 * Frame rates are carried as exact rationals (e.g. 30000/1001); floats only
 * appear at display and serialization boundaries.
 */

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::MccError;

/// Broadcast frame rates recognized when recovering a rational from a float
/// (nominal rates plus their NTSC 1000/1001-pulled variants).
const KNOWN_RATES: &[(u32, u32)] = &[
    (24_000, 1_001),
    (24, 1),
    (25, 1),
    (30_000, 1_001),
    (30, 1),
    (48_000, 1_001),
    (48, 1),
    (50, 1),
    (60_000, 1_001),
    (60, 1),
    (120_000, 1_001),
    (120, 1),
];

/// An exact rational frame rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "f64", from = "f64")]
pub struct FrameRate {
    /// Frames per `den` seconds
    pub num: u32,
    /// Denominator in seconds (1001 for the NTSC family)
    pub den: u32,
}

impl FrameRate {
    pub const fn new(num: u32, den: u32) -> Self {
        FrameRate { num, den }
    }

    /// Frames per second as a display float (e.g. 29.97002997...)
    pub fn as_f64(&self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Rounded integer frame count per second (30 for 29.97, 60 for 59.94).
    /// Frame numbers in timecodes range over `[0, nominal)`.
    pub fn nominal(&self) -> u64 {
        self.as_f64().round() as u64
    }

    /// Whether this rate belongs to the ~29.97 fps family
    pub fn is_ntsc_2997(&self) -> bool {
        let fps = self.as_f64();
        fps > 29.9 && fps < 30.1
    }

    /// Whether this rate belongs to the ~59.94 fps family
    pub fn is_ntsc_5994(&self) -> bool {
        let fps = self.as_f64();
        fps > 59.9 && fps < 60.1
    }

    /// Recover an exact rational from a display float by matching the known
    /// broadcast family; unknown rates fall back to a millifps rational.
    pub fn from_f64(value: f64) -> Self {
        for &(num, den) in KNOWN_RATES {
            if (value - f64::from(num) / f64::from(den)).abs() < 0.01 {
                return FrameRate::new(num, den);
            }
        }
        FrameRate::new((value * 1000.0).round() as u32, 1000)
    }
}

impl From<FrameRate> for f64 {
    fn from(rate: FrameRate) -> f64 {
        rate.as_f64()
    }
}

impl From<f64> for FrameRate {
    fn from(value: f64) -> FrameRate {
        FrameRate::from_f64(value)
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{:.2}", self.as_f64())
        }
    }
}

/// Convert a timecode string (HH:MM:SS:FF or HH:MM:SS;FF) to microseconds.
///
/// Both `:` and `;` field separators are accepted; `;` conventionally marks
/// drop-frame timecode but the calculation is governed solely by the
/// `drop_frame` flag from the decode descriptor.
///
/// Drop-frame counting applies only to the ~29.97 and ~59.94 families: the
/// first two (or four) frame numbers of every minute are skipped, except for
/// minutes divisible by ten, and the adjusted frame count is converted with
/// the true 1000/1001-pulled rate.
pub fn timecode_to_microseconds(
    timecode: &str,
    fps: FrameRate,
    drop_frame: bool,
) -> Result<u64, MccError> {
    let parts: Vec<&str> = timecode.split([':', ';']).collect();
    if parts.len() != 4 {
        return Err(MccError::MalformedTimecode(timecode.to_string()));
    }

    let mut fields = [0u64; 4];
    for (slot, part) in fields.iter_mut().zip(&parts) {
        *slot = part
            .trim()
            .parse()
            .map_err(|_| MccError::MalformedTimecode(timecode.to_string()))?;
    }
    let [hours, minutes, seconds, frames] = fields;

    if frames >= fps.nominal() {
        return Err(MccError::MalformedTimecode(timecode.to_string()));
    }

    let is_2997 = fps.is_ntsc_2997();
    let is_5994 = fps.is_ntsc_5994();

    if drop_frame && (is_2997 || is_5994) {
        // 2 frame numbers are dropped per minute at ~29.97 fps, 4 at ~59.94
        let (dropped_per_minute, nominal) = if is_2997 { (2u64, 30u64) } else { (4u64, 60u64) };

        let total_minutes = hours * 60 + minutes;
        let frames_dropped = dropped_per_minute * (total_minutes - total_minutes / 10);

        let counted = (hours * 3600 + minutes * 60 + seconds) * nominal + frames;
        let total_frames = u128::from(counted.saturating_sub(frames_dropped));

        // Convert with the true rate: nominal * 1000 / 1001 fps
        Ok((total_frames * 1_001 * 1_000_000 / u128::from(nominal * 1_000)) as u64)
    } else {
        let seconds_total = hours * 3600 + minutes * 60 + seconds;
        let frame_us =
            u128::from(frames) * 1_000_000 * u128::from(fps.den) / u128::from(fps.num);
        Ok(seconds_total * 1_000_000 + frame_us as u64)
    }
}

/// Convert a microsecond offset back to a timecode string, the inverse of
/// [`timecode_to_microseconds`] up to frame-boundary rounding. The output
/// always uses `:` separators, matching the decoder's own rendering.
pub fn microseconds_to_timecode(us: u64, fps: FrameRate, drop_frame: bool) -> String {
    let is_2997 = fps.is_ntsc_2997();
    let is_5994 = fps.is_ntsc_5994();

    if drop_frame && (is_2997 || is_5994) {
        let (dropped_per_minute, nominal) = if is_2997 { (2u128, 30u128) } else { (4u128, 60u128) };

        // Nearest true frame at the 1000/1001-pulled rate
        let total = (u128::from(us) * nominal * 1_000 + 1_001 * 1_000_000 / 2)
            / (1_001 * 1_000_000);

        // Re-insert the dropped frame numbers minute by minute
        let frames_per_minute = 60 * nominal - dropped_per_minute;
        let frames_per_ten = 10 * frames_per_minute + dropped_per_minute;
        let tens = total / frames_per_ten;
        let rem = total % frames_per_ten;
        let adjusted = if rem < 60 * nominal {
            total + 9 * dropped_per_minute * tens
        } else {
            total
                + 9 * dropped_per_minute * tens
                + dropped_per_minute * ((rem - 60 * nominal) / frames_per_minute + 1)
        };

        let frames = adjusted % nominal;
        let seconds_total = adjusted / nominal;
        format_timecode(seconds_total as u64, frames as u64)
    } else {
        let mut seconds_total = us / 1_000_000;
        let rem = us % 1_000_000;
        let nominal = u128::from(fps.nominal());
        let denom = u128::from(fps.den) * 1_000_000;
        let mut frames = (u128::from(rem) * u128::from(fps.num) + denom / 2) / denom;
        if frames >= nominal {
            seconds_total += 1;
            frames = 0;
        }
        format_timecode(seconds_total, frames as u64)
    }
}

fn format_timecode(seconds_total: u64, frames: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}:{:02}",
        seconds_total / 3600,
        (seconds_total % 3600) / 60,
        seconds_total % 60,
        frames
    )
}
