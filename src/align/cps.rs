//! Reading-speed checks for subtitle cues.
//!
//! Speed is measured in weighted characters per second, where a full-width
//! character counts as one and a half-width character as half of one.

use serde::Serialize;

use super::config::AlignConfig;
use super::model::Cue;
use super::text::count_weighted_chars;

/// Durations shorter than this are treated as this long when computing speed.
const MIN_MEASURED_DURATION_SEC: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CpsClass {
    TooFast,
    Normal,
    Safe,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CueAnalysis {
    pub cps: f64,
    pub is_too_fast: bool,
    pub class: CpsClass,
}

#[derive(Debug, Clone, Copy)]
pub struct CpsAnalyzer {
    warning_threshold: f64,
    safe_threshold: f64,
    min_duration_sec: f64,
}

impl CpsAnalyzer {
    pub fn new(config: &AlignConfig) -> Self {
        Self {
            warning_threshold: config.cps_warning_threshold,
            safe_threshold: config.cps_safe_threshold,
            min_duration_sec: config.min_cue_duration_sec,
        }
    }

    pub fn analyze_cue(&self, text: &str, duration_sec: f64) -> CueAnalysis {
        let cps = count_weighted_chars(text) / duration_sec.max(MIN_MEASURED_DURATION_SEC);
        let is_too_fast = cps > self.warning_threshold;
        let class = if is_too_fast {
            CpsClass::TooFast
        } else if cps <= self.safe_threshold {
            CpsClass::Safe
        } else {
            CpsClass::Normal
        };

        CueAnalysis {
            cps,
            is_too_fast,
            class,
        }
    }

    pub fn analyze_track(&self, cues: &[Cue]) -> CpsReport {
        let entries: Vec<CpsEntry> = cues
            .iter()
            .enumerate()
            .map(|(position, cue)| CpsEntry {
                position,
                index: cue.index,
                duration_sec: cue.duration_sec(),
                analysis: self.analyze_cue(&cue.text, cue.duration_sec()),
                too_short: cue.duration_sec() < self.min_duration_sec,
            })
            .collect();

        let too_fast = entries.iter().filter(|e| e.analysis.is_too_fast).count();
        let too_short = entries.iter().filter(|e| e.too_short).count();
        let max_cps = entries
            .iter()
            .map(|e| e.analysis.cps)
            .fold(0.0f64, f64::max);

        CpsReport {
            entries,
            too_fast,
            too_short,
            max_cps,
        }
    }

    /// Lengthen cues shorter than the minimum duration, borrowing only from the
    /// silence before the next cue. Starts never move and no cue gets shorter.
    pub fn enforce_min_duration(&self, cues: &[Cue]) -> Vec<Cue> {
        let min_ms = (self.min_duration_sec * 1000.0).round() as u64;
        let mut adjusted: Vec<Cue> = cues.to_vec();

        for position in 0..adjusted.len() {
            let cue = &adjusted[position];
            if cue.duration_ms() >= min_ms {
                continue;
            }
            let wanted_end = cue.start_ms + min_ms;
            let limit = adjusted
                .get(position + 1)
                .map(|next| next.start_ms)
                .unwrap_or(u64::MAX);
            let new_end = wanted_end.min(limit).max(cue.end_ms);
            adjusted[position].end_ms = new_end;
        }

        adjusted
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CpsEntry {
    pub position: usize,
    pub index: u32,
    pub duration_sec: f64,
    pub analysis: CueAnalysis,
    pub too_short: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CpsReport {
    pub entries: Vec<CpsEntry>,
    pub too_fast: usize,
    pub too_short: usize,
    pub max_cps: f64,
}

impl CpsReport {
    pub fn flagged(&self) -> impl Iterator<Item = &CpsEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.analysis.is_too_fast || entry.too_short)
    }
}
