//! Conversions between seconds, frame counts, SRT timestamps and
//! `HH:MM:SS:FF` timecodes.
//!
//! Timecodes are always counted as non-drop-frame at the nominal integer rate
//! (`round(fps)`, so 30 for 29.97). A semicolon separator is accepted but does not
//! switch to drop-frame counting, which drifts by roughly 3.6 seconds per hour of
//! NTSC material. Downstream editors that consume these timecodes expect the same
//! counting, so the drift is kept.

use lazy_static::lazy_static;
use regex::Regex;

use super::error::AlignError;

lazy_static! {
    static ref TIMECODE_PATTERN: Regex =
        Regex::new(r"^(\d+)[:;](\d+)[:;](\d+)[:;](\d+)$").expect("valid timecode pattern");
}

const MS_PER_HOUR: u64 = 3_600_000;
const MS_PER_MINUTE: u64 = 60_000;

/// Round seconds to whole milliseconds, clamping negative values to zero.
pub fn seconds_to_ms(sec: f64) -> u64 {
    if !sec.is_finite() || sec <= 0.0 {
        return 0;
    }
    (sec * 1000.0).round() as u64
}

pub fn seconds_to_srt_timestamp(sec: f64) -> String {
    ms_to_srt_timestamp(seconds_to_ms(sec))
}

pub fn ms_to_srt_timestamp(total_ms: u64) -> String {
    let hours = total_ms / MS_PER_HOUR;
    let minutes = (total_ms % MS_PER_HOUR) / MS_PER_MINUTE;
    let seconds = (total_ms % MS_PER_MINUTE) / 1000;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Parse `HH:MM:SS,mmm` (or `HH:MM:SS.mmm`) into milliseconds.
pub fn parse_srt_timestamp(value: &str) -> Option<u64> {
    let value = value.trim();
    let (time_part, millis_part) = value.split_once([',', '.'])?;

    let mut hms = time_part.split(':');
    let hours = hms.next()?.parse::<u64>().ok()?;
    let minutes = hms.next()?.parse::<u64>().ok()?;
    let seconds = hms.next()?.parse::<u64>().ok()?;
    if hms.next().is_some() || minutes >= 60 || seconds >= 60 {
        return None;
    }

    if millis_part.is_empty()
        || millis_part.len() > 3
        || !millis_part.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }
    // "5" means 500ms, "05" means 50ms
    let mut padded = millis_part.to_string();
    while padded.len() < 3 {
        padded.push('0');
    }
    let millis = padded.parse::<u64>().ok()?;

    hours
        .checked_mul(MS_PER_HOUR)?
        .checked_add(minutes * MS_PER_MINUTE + seconds * 1000 + millis)
}

pub fn frames_to_seconds(frames: u64, fps: f64) -> f64 {
    if fps <= 0.0 || !fps.is_finite() {
        return 0.0;
    }
    frames as f64 / fps
}

pub fn seconds_to_frames(sec: f64, fps: f64) -> u64 {
    if sec <= 0.0 || !sec.is_finite() || fps <= 0.0 || !fps.is_finite() {
        return 0;
    }
    (sec * fps).round() as u64
}

/// Integer frame base used for timecode fields.
pub fn nominal_frame_rate(fps: f64) -> u64 {
    if fps <= 0.0 || !fps.is_finite() {
        return 1;
    }
    (fps.round() as u64).max(1)
}

pub fn timecode_to_frames(tc: &str, fps: f64) -> Result<u64, AlignError> {
    if fps <= 0.0 || !fps.is_finite() {
        return Err(AlignError::invalid_timecode(
            tc,
            format!("frame rate {fps} must be positive"),
        ));
    }

    let caps = TIMECODE_PATTERN
        .captures(tc.trim())
        .ok_or_else(|| AlignError::invalid_timecode(tc, "expected HH:MM:SS:FF"))?;

    let field = |idx: usize| -> Result<u64, AlignError> {
        caps[idx]
            .parse::<u64>()
            .map_err(|_| AlignError::invalid_timecode(tc, "field out of range"))
    };
    let hours = field(1)?;
    let minutes = field(2)?;
    let seconds = field(3)?;
    let frames = field(4)?;

    if minutes >= 60 {
        return Err(AlignError::invalid_timecode(tc, "minutes must be below 60"));
    }
    if seconds >= 60 {
        return Err(AlignError::invalid_timecode(tc, "seconds must be below 60"));
    }

    let base = nominal_frame_rate(fps);
    if frames >= base {
        return Err(AlignError::invalid_timecode(
            tc,
            format!("frame field must be below {base}"),
        ));
    }

    hours
        .checked_mul(3600)
        .and_then(|h| h.checked_add(minutes * 60 + seconds))
        .and_then(|total_seconds| total_seconds.checked_mul(base))
        .and_then(|f| f.checked_add(frames))
        .ok_or_else(|| AlignError::invalid_timecode(tc, "out of range"))
}

pub fn frames_to_timecode(frames: u64, fps: f64) -> String {
    let base = nominal_frame_rate(fps);
    let total_seconds = frames / base;
    let ff = frames % base;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}:{ff:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_srt_timestamps() {
        assert_eq!(seconds_to_srt_timestamp(0.0), "00:00:00,000");
        assert_eq!(seconds_to_srt_timestamp(3723.4567), "01:02:03,457");
        assert_eq!(seconds_to_srt_timestamp(-2.0), "00:00:00,000");
        assert_eq!(ms_to_srt_timestamp(59_999), "00:00:59,999");
    }

    #[test]
    fn parses_srt_timestamps() {
        assert_eq!(parse_srt_timestamp("00:00:01,500"), Some(1500));
        assert_eq!(parse_srt_timestamp("01:00:00.250"), Some(3_600_250));
        assert_eq!(parse_srt_timestamp("00:00:01,5"), Some(1500));
        assert_eq!(parse_srt_timestamp("00:61:00,000"), None);
        assert_eq!(parse_srt_timestamp("00:00:01"), None);
        assert_eq!(parse_srt_timestamp("aa:00:01,000"), None);
        assert_eq!(parse_srt_timestamp("99999999999999999:00:00,000"), None);
    }

    #[test]
    fn converts_frames_and_seconds() {
        assert_eq!(frames_to_seconds(48, 24.0), 2.0);
        assert_eq!(seconds_to_frames(2.0, 24.0), 48);
        assert_eq!(seconds_to_frames(1.0, 29.97), 30);
        assert_eq!(seconds_to_frames(-1.0, 30.0), 0);
    }

    #[test]
    fn parses_timecodes() {
        assert_eq!(timecode_to_frames("00:00:01:00", 25.0), Ok(25));
        assert_eq!(timecode_to_frames("01:00:00:00", 30.0), Ok(108_000));
        assert_eq!(timecode_to_frames("00:01:00;02", 29.97), Ok(1802));
    }

    #[test]
    fn rejects_invalid_timecodes() {
        for tc in ["00:60:00:00", "00:00:60:00", "00:00:00", "00:00:00:00:00", "a:b:c:d"] {
            assert!(
                matches!(
                    timecode_to_frames(tc, 25.0),
                    Err(AlignError::InvalidTimecode { .. })
                ),
                "{tc} should be rejected"
            );
        }
        assert!(timecode_to_frames("00:00:00:25", 25.0).is_err());
        assert!(timecode_to_frames("00:00:00:00", 0.0).is_err());
    }

    #[test]
    fn huge_hour_field_is_out_of_range() {
        assert_eq!(
            timecode_to_frames("9999999999999999:00:00:00", 30.0),
            Err(AlignError::invalid_timecode(
                "9999999999999999:00:00:00",
                "out of range"
            ))
        );
    }

    #[test]
    fn timecode_round_trips() {
        for fps in [23.976, 24.0, 25.0, 29.97, 30.0, 59.94, 60.0] {
            for frames in [0u64, 1, 29, 30, 1799, 1800, 107_999, 108_000, 2_592_001] {
                let tc = frames_to_timecode(frames, fps);
                assert_eq!(timecode_to_frames(&tc, fps), Ok(frames), "{tc} @ {fps}");
            }
        }
    }

    #[test]
    fn formats_timecodes_zero_padded() {
        assert_eq!(frames_to_timecode(0, 25.0), "00:00:00:00");
        assert_eq!(frames_to_timecode(25 * 61 + 3, 25.0), "00:01:01:03");
    }
}
