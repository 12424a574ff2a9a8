use super::config::AllocationStrategy;
use super::model::{Cue, Subtitle, TimelineSegment};
use super::text::count_weighted_chars;
use super::timecode::seconds_to_ms;

/// Shares one clip's window between the subtitles matched to it.
#[derive(Debug, Clone, Copy)]
pub struct TimeAllocator {
    strategy: AllocationStrategy,
}

impl TimeAllocator {
    pub fn new(strategy: AllocationStrategy) -> Self {
        Self { strategy }
    }

    /// Cues covering the window exactly, in the order of `subtitles`.
    ///
    /// Text is copied untouched; a cue with more lines than a player shows comfortably
    /// has to be reflowed by whoever authored it.
    pub fn allocate(&self, window: &TimelineSegment, subtitles: &[&Subtitle]) -> Vec<Cue> {
        let start_ms = seconds_to_ms(window.start_sec);
        let end_ms = seconds_to_ms(window.end_sec).max(start_ms);

        match subtitles {
            [] => Vec::new(),
            [only] => vec![Cue {
                index: only.index,
                start_ms,
                end_ms,
                text: only.text.clone(),
            }],
            _ => {
                let weights: Vec<u64> = subtitles.iter().map(|s| self.weight(s)).collect();
                let allocations = split_by_weight(end_ms - start_ms, &weights);

                let mut cursor = start_ms;
                let mut cues: Vec<Cue> = subtitles
                    .iter()
                    .zip(allocations)
                    .map(|(subtitle, allocation)| {
                        let cue = Cue {
                            index: subtitle.index,
                            start_ms: cursor,
                            end_ms: cursor + allocation,
                            text: subtitle.text.clone(),
                        };
                        cursor += allocation;
                        cue
                    })
                    .collect();

                if let Some(last) = cues.last_mut() {
                    last.end_ms = end_ms;
                }
                cues
            }
        }
    }

    fn weight(&self, subtitle: &Subtitle) -> u64 {
        let raw = match self.strategy {
            AllocationStrategy::EvenSplit => 1,
            AllocationStrategy::ProportionalByDuration => subtitle.duration_ms(),
            AllocationStrategy::TextAligned => count_weighted_chars(&subtitle.text).floor() as u64,
        };
        raw.max(1)
    }
}

/// Floor-divide `total` by weight, then hand the remainder out one unit at a time
/// from the front so the parts sum to `total`.
fn split_by_weight(total: u64, weights: &[u64]) -> Vec<u64> {
    let weight_sum: u64 = weights.iter().sum();
    if weight_sum == 0 {
        return vec![0; weights.len()];
    }

    let mut parts: Vec<u64> = weights
        .iter()
        .map(|&w| (u128::from(total) * u128::from(w) / u128::from(weight_sum)) as u64)
        .collect();

    let remainder = total - parts.iter().sum::<u64>();
    for part in parts.iter_mut().take(remainder as usize) {
        *part += 1;
    }
    parts
}
