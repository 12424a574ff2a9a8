use serde::Serialize;

use super::error::AlignError;
use super::model::TimelineSegment;

/// A clip as measured, before it is placed on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipDuration {
    pub segment_index: u32,
    pub audio_filename: String,
    /// `None` when the clip is missing or could not be measured
    pub duration_sec: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct Timeline {
    pub segments: Vec<TimelineSegment>,
    /// One `MissingAudioFile` per dropped clip
    pub dropped: Vec<AlignError>,
}

impl Timeline {
    pub fn end_sec(&self) -> f64 {
        self.segments.last().map_or(0.0, |s| s.end_sec)
    }
}

/// Lay clips end to end in the given order, `gap_sec` apart.
///
/// Clips without a positive duration take no time and are reported in `dropped`.
pub fn build_timeline(clips: &[ClipDuration], gap_sec: f64) -> Timeline {
    let mut timeline = Timeline::default();
    let mut cursor = 0.0f64;

    for clip in clips {
        let duration = match clip.duration_sec {
            Some(d) if d.is_finite() && d > 0.0 => d,
            _ => {
                timeline.dropped.push(AlignError::MissingAudioFile {
                    segment: clip.segment_index,
                    file: clip.audio_filename.clone(),
                });
                continue;
            }
        };

        let start_sec = cursor;
        let end_sec = start_sec + duration;
        timeline.segments.push(TimelineSegment {
            index: clip.segment_index,
            audio_filename: clip.audio_filename.clone(),
            duration_sec: duration,
            start_sec,
            end_sec,
        });
        cursor = end_sec + gap_sec;
    }

    timeline
}
