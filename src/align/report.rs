use serde_json::json;

use crate::ui::prelude::{Level, emit};

use super::cps::{CpsClass, CpsReport};
use super::error::AlignError;
use super::pipeline::{MatchMode, RetimeSummary};

#[derive(Debug, Clone)]
pub(crate) struct ReportLine {
    pub(crate) level: Level,
    pub(crate) code: &'static str,
    pub(crate) message: String,
    pub(crate) data: Option<serde_json::Value>,
}

impl ReportLine {
    pub(crate) fn new(level: Level, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            code,
            message: message.into(),
            data: None,
        }
    }

    pub(crate) fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

pub(crate) fn emit_report(lines: &[ReportLine]) {
    for line in lines {
        emit(line.level, line.code, &line.message, line.data.clone());
    }
}

/// How a non-fatal pipeline problem is shown to the user.
///
/// `mode` is the matching mode of the retime run that produced the warning, if any.
pub(crate) fn warning_line(warning: &AlignError, mode: Option<MatchMode>) -> ReportLine {
    let (level, code) = match warning {
        AlignError::MalformedSrtBlock { .. } => (Level::Warn, "align.srt.malformed"),
        AlignError::MissingAudioFile { .. } => (Level::Warn, "align.timeline.missing_audio"),
        AlignError::NoNarrationData => (Level::Info, "align.match.no_narration"),
        AlignError::UnmatchedSubtitles { .. } => (Level::Warn, "align.match.unmatched"),
        _ => (Level::Warn, "align.warning"),
    };

    let message = match warning {
        AlignError::MissingAudioFile { segment, .. } => match mode {
            Some(MatchMode::Proportional) => format!(
                "{warning}; subtitles are spread over the remaining clips (segment {segment} dropped)"
            ),
            _ => format!(
                "{warning}; its subtitles move to the neighbouring segment (segment {segment} dropped)"
            ),
        },
        AlignError::NoNarrationData => {
            format!("{warning}; spreading subtitles over audio clips by count")
        }
        other => other.to_string(),
    };

    ReportLine::new(level, code, message)
}

pub(crate) fn summary_lines(summary: &RetimeSummary) -> Vec<ReportLine> {
    let mode = match summary.mode {
        MatchMode::Text => "text matching",
        MatchMode::Proportional => "proportional fallback",
    };

    let mut lines = vec![
        ReportLine::new(
            Level::Info,
            "align.retime.inputs",
            format!(
                "Subtitles: {} ({} malformed block(s) skipped)\nAudio segments: {} ({} dropped)",
                summary.total_subtitles,
                summary.skipped_blocks,
                summary.total_segments,
                summary.dropped_segments
            ),
        ),
        ReportLine::new(
            Level::Info,
            "align.retime.matching",
            format!(
                "Matched {} of {} subtitle(s) using {mode}, {} strategy",
                summary.matched, summary.total_subtitles, summary.strategy
            ),
        ),
    ];

    if summary.unmatched > 0 {
        let indices: Vec<String> = summary
            .unmatched_indices
            .iter()
            .map(|index| index.to_string())
            .collect();
        lines.push(ReportLine::new(
            Level::Warn,
            "align.retime.unmatched",
            format!("Attached by position: #{}", indices.join(", #")),
        ));
    }

    if summary.too_fast > 0 || summary.too_short > 0 {
        lines.push(ReportLine::new(
            Level::Warn,
            "align.retime.cps",
            format!(
                "{} cue(s) read too fast (max {:.1} cps), {} shorter than the minimum duration",
                summary.too_fast, summary.max_cps, summary.too_short
            ),
        ));
    }

    lines.push(
        ReportLine::new(
            Level::Success,
            "align.retime.summary",
            format!(
                "Wrote {} cue(s) spanning {}",
                summary.output_cues,
                format_duration(summary.output_duration_sec)
            ),
        )
        .with_data(json!(summary)),
    );

    lines
}

/// One line per flagged cue, then a verdict.
pub(crate) fn cps_lines(report: &CpsReport) -> Vec<ReportLine> {
    let mut lines: Vec<ReportLine> = report
        .flagged()
        .map(|entry| {
            let mut problems = Vec::new();
            if entry.analysis.class == CpsClass::TooFast {
                problems.push(format!("{:.1} cps", entry.analysis.cps));
            }
            if entry.too_short {
                problems.push(format!("only {:.2}s on screen", entry.duration_sec));
            }
            ReportLine::new(
                Level::Warn,
                "align.check.cue",
                format!("Cue #{}: {}", entry.index, problems.join(", ")),
            )
            .with_data(json!(entry))
        })
        .collect();

    let safe = report
        .entries
        .iter()
        .filter(|entry| entry.analysis.class == CpsClass::Safe)
        .count();
    let verdict = if report.too_fast == 0 && report.too_short == 0 {
        ReportLine::new(
            Level::Success,
            "align.check.ok",
            format!(
                "All {} cue(s) are readable ({safe} comfortably, max {:.1} cps)",
                report.entries.len(),
                report.max_cps
            ),
        )
    } else {
        ReportLine::new(
            Level::Warn,
            "align.check.flagged",
            format!(
                "{} too fast, {} too short out of {} cue(s)",
                report.too_fast,
                report.too_short,
                report.entries.len()
            ),
        )
    };
    lines.push(verdict.with_data(json!({
        "cues": report.entries.len(),
        "too_fast": report.too_fast,
        "too_short": report.too_short,
        "safe": safe,
        "max_cps": report.max_cps,
    })));

    lines
}

pub(crate) fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours}h {minutes:02}m {secs:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs:02}s")
    } else {
        format!("{seconds:.2}s")
    }
}
