//! Assigns subtitles to narration segments.
//!
//! Subtitle boundaries rarely coincide with script lines: one line may be shown
//! as several cues, and a cue can straddle two lines. The matcher walks both
//! lists in order and claims, for every narration segment, the contiguous run of
//! subtitles whose normalized text best resembles the segment's text.

use std::collections::HashSet;

use serde::Serialize;

use super::config::AlignConfig;
use super::model::{NarrationSegment, Subtitle};
use super::similarity::similarity_ratio;
use super::text::{char_len, normalize};

/// Subtitles (as positions into the parsed subtitle list) assigned to one segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentGroup {
    pub segment_index: u32,
    pub subtitles: Vec<usize>,
    /// Match score when the group was claimed by text, `None` when filled by fallback
    pub score: Option<f64>,
}

impl AlignmentGroup {
    fn empty(segment_index: u32) -> Self {
        Self {
            segment_index,
            subtitles: Vec::new(),
            score: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subtitles.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchOutcome {
    pub groups: Vec<AlignmentGroup>,
    /// Positions that no segment claimed by text; they were attached by fallback
    pub unmatched: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: usize,
    size: usize,
    score: f64,
}

pub struct SegmentMatcher<'a> {
    config: &'a AlignConfig,
}

impl<'a> SegmentMatcher<'a> {
    pub fn new(config: &'a AlignConfig) -> Self {
        Self { config }
    }

    /// Text-driven matching: one group per narration segment, in order.
    pub fn match_by_text(
        &self,
        subtitles: &[Subtitle],
        segments: &[NarrationSegment],
    ) -> MatchOutcome {
        let normalized: Vec<String> = subtitles.iter().map(|s| normalize(&s.text)).collect();
        let lengths: Vec<usize> = normalized.iter().map(|s| char_len(s)).collect();

        let mut used = vec![false; subtitles.len()];
        let mut cursor = 0usize;
        let mut groups = Vec::with_capacity(segments.len());

        for segment in segments {
            while cursor < used.len() && used[cursor] {
                cursor += 1;
            }

            // punctuation-only lines have nothing to compare; reconciliation fills them
            let segment_norm = normalize(&segment.text);
            let best = if segment_norm.is_empty() {
                None
            } else {
                self.best_candidate(&segment_norm, &normalized, &lengths, &used, cursor)
            };

            match best {
                Some(candidate) if candidate.score >= self.config.min_group_score => {
                    let positions: Vec<usize> =
                        (candidate.start..candidate.start + candidate.size).collect();
                    for &position in &positions {
                        used[position] = true;
                    }
                    cursor = candidate.start + candidate.size;
                    groups.push(AlignmentGroup {
                        segment_index: segment.index,
                        subtitles: positions,
                        score: Some(candidate.score),
                    });
                }
                _ => groups.push(AlignmentGroup::empty(segment.index)),
            }
        }

        let unmatched: Vec<usize> = (0..used.len()).filter(|&p| !used[p]).collect();
        reconcile(&mut groups, &unmatched);

        MatchOutcome { groups, unmatched }
    }

    /// Fallback without narration text: spread subtitles over segments by count.
    pub fn match_proportional(&self, subtitle_count: usize, segment_indices: &[u32]) -> MatchOutcome {
        let positions: Vec<usize> = (0..subtitle_count).collect();
        let groups = partition_evenly(&positions, segment_indices.len())
            .into_iter()
            .zip(segment_indices)
            .map(|(subtitles, &segment_index)| AlignmentGroup {
                segment_index,
                subtitles,
                score: None,
            })
            .collect();

        MatchOutcome {
            groups,
            unmatched: Vec::new(),
        }
    }

    fn best_candidate(
        &self,
        segment_norm: &str,
        normalized: &[String],
        lengths: &[usize],
        used: &[bool],
        cursor: usize,
    ) -> Option<Candidate> {
        let segment_len = char_len(segment_norm);
        let max_size = self.config.max_group_size;
        let overflow_len = self.config.overflow_ratio * segment_len as f64;
        let last_start = (cursor + max_size).min(normalized.len());

        let mut best: Option<Candidate> = None;

        for start in cursor..last_start {
            let mut group_norm = String::new();
            let mut group_len = 0usize;

            for size in 1..=max_size {
                let position = start + size - 1;
                if position >= normalized.len() || used[position] {
                    break;
                }
                group_norm.push_str(&normalized[position]);
                group_len += lengths[position];

                let score = self.score(segment_norm, segment_len, &group_norm, group_len);
                if best.is_none_or(|b| score > b.score) {
                    best = Some(Candidate { start, size, score });
                }

                // a longer group only drifts further from the segment
                if group_len as f64 > overflow_len {
                    break;
                }
            }
        }

        best
    }

    fn score(&self, segment_norm: &str, segment_len: usize, group_norm: &str, group_len: usize) -> f64 {
        let overlap = if group_norm.contains(segment_norm) || segment_norm.contains(group_norm) {
            1.0
        } else {
            similarity_ratio(segment_norm, group_norm)
        };

        let longest = segment_len.max(group_len);
        let char_ratio = if longest == 0 {
            1.0
        } else {
            segment_len.min(group_len) as f64 / longest as f64
        };

        self.config.overlap_weight * overlap + self.config.char_ratio_weight * char_ratio
    }
}

/// Attach every unmatched subtitle to some group, keeping subtitle order.
///
/// Runs of empty groups first share the unmatched subtitles lying between their
/// neighbouring groups. Whatever is left joins the group that owns the nearest
/// earlier subtitle, or the first non-empty group when nothing precedes it.
fn reconcile(groups: &mut [AlignmentGroup], unmatched: &[usize]) {
    if unmatched.is_empty() {
        return;
    }
    let mut pending: Vec<usize> = unmatched.to_vec();

    let mut idx = 0usize;
    while idx < groups.len() {
        if !groups[idx].is_empty() {
            idx += 1;
            continue;
        }
        let run_start = idx;
        while idx < groups.len() && groups[idx].is_empty() {
            idx += 1;
        }
        let run_end = idx;

        let lower = groups[..run_start]
            .iter()
            .rev()
            .find_map(|g| g.subtitles.last().copied());
        let upper = groups[run_end..]
            .iter()
            .find_map(|g| g.subtitles.first().copied());

        let (between, rest): (Vec<usize>, Vec<usize>) = pending.iter().partition(|&&p| {
            lower.is_none_or(|low| p > low) && upper.is_none_or(|up| p < up)
        });
        pending = rest;

        let shares = partition_evenly(&between, run_end - run_start);
        for (group, share) in groups[run_start..run_end].iter_mut().zip(shares) {
            group.subtitles = share;
        }
    }

    for position in pending {
        let owner = groups
            .iter()
            .enumerate()
            .filter_map(|(g, group)| {
                group
                    .subtitles
                    .iter()
                    .filter(|&&p| p < position)
                    .max()
                    .map(|&p| (p, g))
            })
            .max()
            .map(|(_, g)| g)
            .or_else(|| groups.iter().position(|g| !g.is_empty()));

        if let Some(owner) = owner {
            groups[owner].subtitles.push(position);
            groups[owner].subtitles.sort_unstable();
        }
    }
}

/// Split `positions` into `slots` consecutive chunks, each taking
/// `ceil(remaining / remaining_slots)`.
pub fn partition_evenly(positions: &[usize], slots: usize) -> Vec<Vec<usize>> {
    let mut chunks = Vec::with_capacity(slots);
    let mut offset = 0usize;

    for slot in 0..slots {
        let remaining = positions.len() - offset;
        let remaining_slots = slots - slot;
        let take = remaining.div_ceil(remaining_slots);
        chunks.push(positions[offset..offset + take].to_vec());
        offset += take;
    }

    chunks
}

/// Fold the groups of segments that have no audio into the next segment that
/// does (or the previous one for trailing segments).
pub fn merge_dropped_groups(
    groups: Vec<AlignmentGroup>,
    surviving: &HashSet<u32>,
) -> Vec<AlignmentGroup> {
    let mut merged: Vec<AlignmentGroup> = Vec::with_capacity(surviving.len());
    let mut carried: Vec<usize> = Vec::new();

    for mut group in groups {
        if !surviving.contains(&group.segment_index) {
            carried.extend(group.subtitles);
            continue;
        }
        if !carried.is_empty() {
            carried.append(&mut group.subtitles);
            group.subtitles = std::mem::take(&mut carried);
            group.subtitles.sort_unstable();
        }
        merged.push(group);
    }

    if !carried.is_empty()
        && let Some(last) = merged.last_mut()
    {
        last.subtitles.append(&mut carried);
        last.subtitles.sort_unstable();
    }

    merged
}
