//! Records shared by every stage of the retiming pipeline.

use serde::Serialize;

/// One reviewed cue from the original subtitle file. Only its timing is ever replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subtitle {
    pub index: u32,
    pub start_ms: u64,
    pub end_ms: u64,
    /// Cue text with lines joined by `\n`, exactly as authored
    pub text: String,
}

impl Subtitle {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// One script line that was rendered to a single audio clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NarrationSegment {
    pub index: u32,
    pub text: String,
    pub audio_filename: String,
}

/// The window a rendered clip occupies in the concatenated narration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineSegment {
    pub index: u32,
    pub audio_filename: String,
    pub duration_sec: f64,
    pub start_sec: f64,
    pub end_sec: f64,
}

/// A retimed output cue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cue {
    pub index: u32,
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

impl Cue {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    pub fn duration_sec(&self) -> f64 {
        self.duration_ms() as f64 / 1000.0
    }
}

impl From<&Subtitle> for Cue {
    fn from(subtitle: &Subtitle) -> Self {
        Cue {
            index: subtitle.index,
            start_ms: subtitle.start_ms,
            end_ms: subtitle.end_ms,
            text: subtitle.text.clone(),
        }
    }
}
