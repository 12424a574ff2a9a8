//! Clip durations, either listed in a manifest or measured with ffprobe.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::narration::ScriptFormat;

const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "m4a", "flac", "ogg", "opus", "aac"];

/// Where clip durations come from.
pub trait DurationSource {
    /// Clip file names in playback order, used when there is no narration script.
    fn clip_files(&self) -> Result<Vec<String>>;

    /// Duration of one clip in seconds.
    fn duration_of(&self, file: &str) -> Result<f64>;

    /// Whether measuring is slow enough to deserve a spinner.
    fn is_slow(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ManifestEntry {
    #[serde(alias = "audio", alias = "audio_filename")]
    pub file: String,
    #[serde(alias = "duration_sec")]
    pub duration: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ManifestDocument {
    Clips(Vec<ManifestEntry>),
    Wrapped { clips: Vec<ManifestEntry> },
}

/// Durations measured ahead of time, e.g. written by the TTS step.
#[derive(Debug, Clone, Default)]
pub struct DurationManifest {
    entries: Vec<ManifestEntry>,
}

impl DurationManifest {
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading duration manifest {}", path.display()))?;
        Self::parse(&contents, ScriptFormat::from_path(path))
            .with_context(|| format!("parsing duration manifest {}", path.display()))
    }

    pub fn parse(contents: &str, format: ScriptFormat) -> Result<Self> {
        let document: ManifestDocument = match format {
            ScriptFormat::Yaml => serde_yaml::from_str(contents)?,
            ScriptFormat::Json => serde_json::from_str(contents)?,
        };
        let entries = match document {
            ManifestDocument::Clips(entries) | ManifestDocument::Wrapped { clips: entries } => {
                entries
            }
        };
        Ok(Self::new(entries))
    }
}

impl DurationSource for DurationManifest {
    fn clip_files(&self) -> Result<Vec<String>> {
        Ok(self.entries.iter().map(|e| e.file.clone()).collect())
    }

    fn duration_of(&self, file: &str) -> Result<f64> {
        self.entries
            .iter()
            .find(|entry| entry.file == file || file_name_matches(&entry.file, file))
            .map(|entry| entry.duration)
            .with_context(|| format!("{file} is not listed in the duration manifest"))
    }
}

/// Compare by file name so `audio/001.wav` in one file matches `001.wav` in the other.
fn file_name_matches(a: &str, b: &str) -> bool {
    let name = |s: &str| Path::new(s).file_name().map(|n| n.to_os_string());
    name(a).is_some() && name(a) == name(b)
}

/// A directory of rendered clips, measured one ffprobe call at a time.
#[derive(Debug, Clone)]
pub struct AudioDirectory {
    dir: PathBuf,
    ffprobe: PathBuf,
}

impl AudioDirectory {
    pub fn new(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            bail!("audio directory {} does not exist", dir.display());
        }
        let ffprobe = which::which("ffprobe")
            .context("ffprobe was not found on PATH; install ffmpeg or pass a duration manifest")?;
        Ok(Self {
            dir: dir.to_path_buf(),
            ffprobe,
        })
    }
}

impl DurationSource for AudioDirectory {
    fn clip_files(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("listing audio directory {}", self.dir.display()))?
        {
            let path = entry?.path();
            if path.is_file() && is_audio_file(&path)
                && let Some(name) = path.file_name().and_then(|n| n.to_str())
            {
                files.push(name.to_string());
            }
        }
        files.sort();
        Ok(files)
    }

    fn duration_of(&self, file: &str) -> Result<f64> {
        let path = self.dir.join(file);
        if !path.is_file() {
            bail!("{} does not exist", path.display());
        }
        probe_duration_seconds(&self.ffprobe, &path)
    }

    fn is_slow(&self) -> bool {
        true
    }
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            AUDIO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

pub fn probe_duration_seconds(ffprobe: &Path, path: &Path) -> Result<f64> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .with_context(|| format!("Failed to run ffprobe for {}", path.display()))?;

    if !output.status.success() {
        bail!(
            "ffprobe failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let duration_str = String::from_utf8_lossy(&output.stdout);
    duration_str
        .trim()
        .parse()
        .with_context(|| format!("ffprobe reported no duration for {}", path.display()))
}
