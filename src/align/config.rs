use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::common::config::DocumentedConfig;
use crate::common::paths;
use crate::documented_config;

/// How a segment window is divided between the subtitles of its group.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AllocationStrategy {
    /// Every subtitle receives the same share
    EvenSplit,
    /// Shares follow the subtitles' original on-screen durations
    ProportionalByDuration,
    /// Shares follow the weighted character count of each subtitle
    #[default]
    TextAligned,
}

impl fmt::Display for AllocationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationStrategy::EvenSplit => write!(f, "even-split"),
            AllocationStrategy::ProportionalByDuration => write!(f, "proportional-by-duration"),
            AllocationStrategy::TextAligned => write!(f, "text-aligned"),
        }
    }
}

/// Tuning for one retiming run. Passed explicitly to every stage.
///
/// The scoring weights, overflow ratio and minimum score were chosen by hand
/// against a handful of episodes; treat them as starting points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlignConfig {
    pub fps: f64,
    pub min_group_score: f64,
    pub max_group_size: usize,
    pub overlap_weight: f64,
    pub char_ratio_weight: f64,
    pub overflow_ratio: f64,
    pub clip_gap_sec: f64,
    pub strategy: AllocationStrategy,
    pub cps_warning_threshold: f64,
    pub cps_safe_threshold: f64,
    pub min_cue_duration_sec: f64,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            fps: Self::DEFAULT_FPS,
            min_group_score: 0.5,
            max_group_size: 10,
            overlap_weight: 0.7,
            char_ratio_weight: 0.3,
            overflow_ratio: 1.5,
            clip_gap_sec: 0.0,
            strategy: AllocationStrategy::default(),
            cps_warning_threshold: 14.0,
            cps_safe_threshold: 6.0,
            min_cue_duration_sec: 1.2,
        }
    }
}

documented_config!(AlignConfig {
    fields: [
        fps, "Frame rate used for HH:MM:SS:FF timecodes",
        min_group_score, "Minimum match score (0.0-1.0) for a subtitle group to be assigned to a narration line",
        max_group_size, "Largest number of subtitles a single narration line may claim",
        overlap_weight, "Weight of the text overlap term in the match score",
        char_ratio_weight, "Weight of the length ratio term in the match score",
        overflow_ratio, "Stop growing a group once it is this many times longer than the narration line",
        clip_gap_sec, "Silence inserted between consecutive audio clips, in seconds",
        strategy, "How a clip's time is shared between its subtitles (text-aligned, proportional-by-duration, even-split)",
        cps_warning_threshold, "Characters per second above which a cue is reported as too fast",
        cps_safe_threshold, "Characters per second at or below which a cue is comfortably readable",
        min_cue_duration_sec, "Minimum on-screen duration for a cue, in seconds",
    ],
    config_path: paths::default_config_file(),
});

impl AlignConfig {
    pub const DEFAULT_FPS: f64 = 29.97;

    /// Load the config at `path`, or the user config file when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load_from_path(path)?,
            None => {
                let default_path = <Self as DocumentedConfig>::config_path()?;
                <Self as DocumentedConfig>::load_from_path_documented(&default_path)?
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Load an explicitly named file; unlike [`AlignConfig::load`] a missing file is an error.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn resolved_path(path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(path) => Ok(path.to_path_buf()),
            None => <Self as DocumentedConfig>::config_path(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            bail!("fps must be a positive number, got {}", self.fps);
        }
        if !(0.0..=1.0).contains(&self.min_group_score) {
            bail!(
                "min_group_score must be between 0.0 and 1.0, got {}",
                self.min_group_score
            );
        }
        if self.max_group_size == 0 {
            bail!("max_group_size must be at least 1");
        }
        for (name, value) in [
            ("overlap_weight", self.overlap_weight),
            ("char_ratio_weight", self.char_ratio_weight),
            ("clip_gap_sec", self.clip_gap_sec),
            ("min_cue_duration_sec", self.min_cue_duration_sec),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!("{name} must be a non-negative number, got {value}");
            }
        }
        if !self.overflow_ratio.is_finite() || self.overflow_ratio < 1.0 {
            bail!("overflow_ratio must be at least 1.0, got {}", self.overflow_ratio);
        }
        if !self.cps_safe_threshold.is_finite()
            || !self.cps_warning_threshold.is_finite()
            || self.cps_safe_threshold < 0.0
            || self.cps_safe_threshold > self.cps_warning_threshold
        {
            bail!(
                "cps thresholds must satisfy 0 <= cps_safe_threshold ({}) <= cps_warning_threshold ({})",
                self.cps_safe_threshold,
                self.cps_warning_threshold
            );
        }
        Ok(())
    }
}
