//! Narration scripts: the ordered lines that were sent to TTS, one audio clip each.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::error::AlignError;
use super::model::NarrationSegment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFormat {
    Yaml,
    Json,
}

impl ScriptFormat {
    /// `.json` files are JSON, anything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ScriptFormat::Json,
            _ => ScriptFormat::Yaml,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScriptDocument {
    Segments(Vec<ScriptRecord>),
    Wrapped { segments: Vec<ScriptRecord> },
}

#[derive(Debug, Deserialize)]
struct ScriptRecord {
    #[serde(default)]
    index: Option<u32>,
    #[serde(default)]
    text: String,
    #[serde(default, alias = "audio_filename", alias = "file")]
    audio: String,
}

pub fn load_narration(path: &Path) -> Result<Vec<NarrationSegment>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading narration script {}", path.display()))?;
    parse_narration(&contents, ScriptFormat::from_path(path))
        .with_context(|| format!("loading narration script {}", path.display()))
}

pub fn parse_narration(contents: &str, format: ScriptFormat) -> Result<Vec<NarrationSegment>> {
    let document: ScriptDocument = match format {
        ScriptFormat::Yaml => serde_yaml::from_str(contents).context("parsing YAML script")?,
        ScriptFormat::Json => serde_json::from_str(contents).context("parsing JSON script")?,
    };
    let records = match document {
        ScriptDocument::Segments(records) | ScriptDocument::Wrapped { segments: records } => {
            records
        }
    };

    Ok(validate_records(records)?)
}

/// Records are numbered from 1 in error messages, matching the default segment index.
fn validate_records(records: Vec<ScriptRecord>) -> Result<Vec<NarrationSegment>, AlignError> {
    let mut seen = HashSet::new();
    let mut segments = Vec::with_capacity(records.len());

    for (position, record) in records.into_iter().enumerate() {
        let record_number = position + 1;
        let audio_filename = record.audio.trim().to_string();
        if audio_filename.is_empty() {
            return Err(AlignError::InvalidNarration {
                record: record_number,
                reason: "audio file name is empty".to_string(),
            });
        }

        if record.text.trim().is_empty() {
            return Err(AlignError::InvalidNarration {
                record: record_number,
                reason: "text is empty".to_string(),
            });
        }

        let index = record.index.unwrap_or(record_number as u32);
        if !seen.insert(index) {
            return Err(AlignError::InvalidNarration {
                record: record_number,
                reason: format!("segment index {index} is used more than once"),
            });
        }

        segments.push(NarrationSegment {
            index,
            text: record.text,
            audio_filename,
        });
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_list_with_default_indices() {
        let script = "- text: こんにちは\n  audio: 001.wav\n- text: さようなら\n  audio_filename: 002.wav\n";
        let segments = parse_narration(script, ScriptFormat::Yaml).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].index, 1);
        assert_eq!(segments[1].index, 2);
        assert_eq!(segments[1].audio_filename, "002.wav");
    }

    #[test]
    fn json_wrapped_with_explicit_indices() {
        let script = r#"{"segments": [{"index": 10, "text": "a", "file": "a.mp3"}, {"index": 20, "text": "b", "audio": "b.mp3"}]}"#;
        let segments = parse_narration(script, ScriptFormat::Json).unwrap();
        assert_eq!(segments[0].index, 10);
        assert_eq!(segments[0].audio_filename, "a.mp3");
        assert_eq!(segments[1].index, 20);
    }

    #[test]
    fn empty_audio_names_the_record() {
        let script = "- text: ok\n  audio: 001.wav\n- text: broken\n  audio: '  '\n";
        let err = parse_narration(script, ScriptFormat::Yaml).unwrap_err();
        assert_eq!(
            err.downcast_ref::<AlignError>(),
            Some(&AlignError::InvalidNarration {
                record: 2,
                reason: "audio file name is empty".to_string(),
            })
        );
    }

    #[test]
    fn record_without_text_is_rejected() {
        let script = "- audio: 001.wav\n- text: りんごが好きです\n  audio: 002.wav\n";
        let err = parse_narration(script, ScriptFormat::Yaml).unwrap_err();
        assert_eq!(
            err.downcast_ref::<AlignError>(),
            Some(&AlignError::InvalidNarration {
                record: 1,
                reason: "text is empty".to_string(),
            })
        );
    }

    #[test]
    fn duplicate_indices_are_rejected() {
        let script = "- index: 1\n  text: a\n  audio: a.wav\n- index: 1\n  text: b\n  audio: b.wav\n";
        let err = parse_narration(script, ScriptFormat::Yaml).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AlignError>(),
            Some(AlignError::InvalidNarration { record: 2, .. })
        ));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(ScriptFormat::from_path(Path::new("script.JSON")), ScriptFormat::Json);
        assert_eq!(ScriptFormat::from_path(Path::new("script.yml")), ScriptFormat::Yaml);
        assert_eq!(ScriptFormat::from_path(Path::new("script")), ScriptFormat::Yaml);
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.json");
        fs::write(&path, r#"[{"text": "一", "audio": "1.wav"}]"#).unwrap();
        let segments = load_narration(&path).unwrap();
        assert_eq!(segments[0].text, "一");
    }
}
