use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlignError {
    #[error("Invalid timecode '{value}': {reason}")]
    InvalidTimecode { value: String, reason: String },

    #[error("Malformed SRT block starting with '{index_line}': {reason}")]
    MalformedSrtBlock { index_line: String, reason: String },

    #[error("Audio for narration segment {segment} ({file}) is missing or has no duration")]
    MissingAudioFile { segment: u32, file: String },

    #[error("No narration script available")]
    NoNarrationData,

    #[error("{count} subtitle(s) could not be matched to a narration segment")]
    UnmatchedSubtitles { count: usize },

    #[error("Subtitle file contains no valid cues")]
    EmptySubtitles,

    #[error("No timeline segments remain after measuring audio durations")]
    NoTimelineSegments,

    #[error("Invalid narration record {record}: {reason}")]
    InvalidNarration { record: usize, reason: String },
}

impl AlignError {
    pub fn invalid_timecode(value: &str, reason: impl Into<String>) -> Self {
        AlignError::InvalidTimecode {
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
