//! The retiming run: measured clips and reviewed subtitles in, retimed cues out.

use anyhow::Result;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::common::progress::create_spinner;
use crate::ui::prelude::{Level, emit};

use super::allocator::TimeAllocator;
use super::config::{AlignConfig, AllocationStrategy};
use super::cps::{CpsAnalyzer, CpsReport};
use super::error::AlignError;
use super::matcher::{AlignmentGroup, MatchOutcome, SegmentMatcher, merge_dropped_groups};
use super::model::{Cue, NarrationSegment, Subtitle};
use super::probe::DurationSource;
use super::srt::ParsedSrt;
use super::timeline::{ClipDuration, Timeline, build_timeline};

/// A clip the timeline needs, in playback order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipRequest {
    pub segment_index: u32,
    pub audio_filename: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// Subtitles were matched against the narration text
    Text,
    /// No narration text; subtitles were spread over clips by count
    Proportional,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetimeSummary {
    pub mode: MatchMode,
    pub strategy: AllocationStrategy,
    pub total_subtitles: usize,
    pub skipped_blocks: usize,
    pub total_segments: usize,
    pub dropped_segments: usize,
    pub matched: usize,
    pub unmatched: usize,
    /// SRT indices of the subtitles that had to be attached by fallback
    pub unmatched_indices: Vec<u32>,
    pub output_cues: usize,
    pub output_duration_sec: f64,
    pub too_fast: usize,
    pub too_short: usize,
    pub max_cps: f64,
}

#[derive(Debug, Clone)]
pub struct Retimed {
    pub cues: Vec<Cue>,
    pub groups: Vec<AlignmentGroup>,
    pub timeline: Timeline,
    /// Non-fatal problems, in the order they were found
    pub warnings: Vec<AlignError>,
    pub cps: CpsReport,
    pub summary: RetimeSummary,
}

/// The clips to measure: one per narration segment, or every clip the source knows about.
pub fn plan_clips(
    narration: Option<&[NarrationSegment]>,
    source: &dyn DurationSource,
) -> Result<Vec<ClipRequest>> {
    match narration {
        Some(segments) => Ok(segments
            .iter()
            .map(|segment| ClipRequest {
                segment_index: segment.index,
                audio_filename: segment.audio_filename.clone(),
            })
            .collect()),
        None => Ok(source
            .clip_files()?
            .into_iter()
            .zip(1u32..)
            .map(|(audio_filename, segment_index)| ClipRequest {
                segment_index,
                audio_filename,
            })
            .collect()),
    }
}

/// Measure every requested clip. A clip that cannot be measured comes back without a duration.
pub fn measure_clips(requests: &[ClipRequest], source: &dyn DurationSource) -> Vec<ClipDuration> {
    let spinner = source
        .is_slow()
        .then(|| create_spinner(format!("Measuring {} audio clip(s)...", requests.len())));

    let clips = requests
        .iter()
        .map(|request| {
            if let Some(pb) = &spinner {
                pb.set_message(format!("Measuring {}", request.audio_filename));
            }
            let duration_sec = match source.duration_of(&request.audio_filename) {
                Ok(duration) => Some(duration),
                Err(err) => {
                    emit(
                        Level::Debug,
                        "align.probe.failed",
                        &format!("{}: {err:#}", request.audio_filename),
                        None,
                    );
                    None
                }
            };
            ClipDuration {
                segment_index: request.segment_index,
                audio_filename: request.audio_filename.clone(),
                duration_sec,
            }
        })
        .collect();

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    clips
}

/// Retime `parsed` onto the measured clips.
///
/// With a narration script the subtitles are matched by text; without one they are
/// spread over the clips by count. Every parsed subtitle ends up in exactly one cue.
pub fn retime(
    parsed: &ParsedSrt,
    narration: Option<&[NarrationSegment]>,
    clips: &[ClipDuration],
    config: &AlignConfig,
) -> Result<Retimed, AlignError> {
    let subtitles = &parsed.subtitles;
    if subtitles.is_empty() {
        return Err(AlignError::EmptySubtitles);
    }

    let mut warnings: Vec<AlignError> = parsed.skipped.clone();

    let timeline = build_timeline(clips, config.clip_gap_sec);
    warnings.extend(timeline.dropped.iter().cloned());
    if timeline.segments.is_empty() {
        return Err(AlignError::NoTimelineSegments);
    }

    let matcher = SegmentMatcher::new(config);
    let timeline_indices: Vec<u32> = timeline.segments.iter().map(|s| s.index).collect();

    let (mode, outcome) = match narration {
        Some(segments) if !segments.is_empty() => {
            let outcome = matcher.match_by_text(subtitles, segments);
            let surviving: HashSet<u32> = timeline_indices.iter().copied().collect();
            let groups = merge_dropped_groups(outcome.groups, &surviving);
            let outcome = MatchOutcome {
                groups,
                unmatched: outcome.unmatched,
            };
            (MatchMode::Text, outcome)
        }
        _ => {
            warnings.push(AlignError::NoNarrationData);
            (
                MatchMode::Proportional,
                matcher.match_proportional(subtitles.len(), &timeline_indices),
            )
        }
    };

    if !outcome.unmatched.is_empty() {
        warnings.push(AlignError::UnmatchedSubtitles {
            count: outcome.unmatched.len(),
        });
    }

    let cues = allocate_cues(subtitles, &timeline, &outcome.groups, config.strategy);
    let cps = CpsAnalyzer::new(config).analyze_track(&cues);

    let summary = RetimeSummary {
        mode,
        strategy: config.strategy,
        total_subtitles: subtitles.len(),
        skipped_blocks: parsed.skipped.len(),
        total_segments: timeline.segments.len(),
        dropped_segments: timeline.dropped.len(),
        matched: subtitles.len() - outcome.unmatched.len(),
        unmatched: outcome.unmatched.len(),
        unmatched_indices: outcome
            .unmatched
            .iter()
            .map(|&position| subtitles[position].index)
            .collect(),
        output_cues: cues.len(),
        output_duration_sec: timeline.end_sec(),
        too_fast: cps.too_fast,
        too_short: cps.too_short,
        max_cps: cps.max_cps,
    };

    Ok(Retimed {
        cues,
        groups: outcome.groups,
        timeline,
        warnings,
        cps,
        summary,
    })
}

/// Walk the timeline in order and spread each group over its segment's window.
fn allocate_cues(
    subtitles: &[Subtitle],
    timeline: &Timeline,
    groups: &[AlignmentGroup],
    strategy: AllocationStrategy,
) -> Vec<Cue> {
    let allocator = TimeAllocator::new(strategy);
    let by_segment: HashMap<u32, &AlignmentGroup> =
        groups.iter().map(|g| (g.segment_index, g)).collect();

    let mut cues: Vec<Cue> = timeline
        .segments
        .iter()
        .filter_map(|segment| {
            let group = by_segment.get(&segment.index)?;
            let members: Vec<&Subtitle> = group.subtitles.iter().map(|&p| &subtitles[p]).collect();
            Some(allocator.allocate(segment, &members))
        })
        .flatten()
        .collect();

    for (position, cue) in cues.iter_mut().enumerate() {
        cue.index = position as u32 + 1;
    }
    cues
}
