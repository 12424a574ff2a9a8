use super::error::AlignError;
use super::model::{Cue, Subtitle};
use super::timecode::{ms_to_srt_timestamp, parse_srt_timestamp};

/// Result of reading an SRT file. Malformed blocks never abort parsing.
#[derive(Debug, Clone, Default)]
pub struct ParsedSrt {
    pub subtitles: Vec<Subtitle>,
    pub skipped: Vec<AlignError>,
}

pub fn parse_srt(input: &str) -> ParsedSrt {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let lines = strip_code_fence(input.lines().collect());

    let mut parsed = ParsedSrt::default();
    let mut block: Vec<&str> = Vec::new();

    for line in lines.into_iter().chain(std::iter::once("")) {
        if !line.trim().is_empty() {
            block.push(line);
            continue;
        }
        if block.is_empty() {
            continue;
        }
        match parse_block(&block) {
            Ok(subtitle) => parsed.subtitles.push(subtitle),
            Err(err) => parsed.skipped.push(err),
        }
        block.clear();
    }

    parsed
}

/// Drop a ```` ```srt ```` opener and a closing ```` ``` ```` left over from pasted output.
fn strip_code_fence(mut lines: Vec<&str>) -> Vec<&str> {
    if let Some(first) = lines.iter().position(|line| !line.trim().is_empty())
        && lines[first].trim_start().starts_with("```")
    {
        lines.remove(first);
    }
    if let Some(last) = lines.iter().rposition(|line| !line.trim().is_empty())
        && lines[last].trim() == "```"
    {
        lines.remove(last);
    }
    lines
}

fn parse_block(block: &[&str]) -> Result<Subtitle, AlignError> {
    let index_line = block.first().copied().unwrap_or_default();
    let malformed = |reason: &str| AlignError::MalformedSrtBlock {
        index_line: index_line.trim().to_string(),
        reason: reason.to_string(),
    };

    if block.len() < 3 {
        return Err(malformed("expected an index line, a timing line and text"));
    }

    let index = index_line
        .trim()
        .parse::<u32>()
        .map_err(|_| malformed("index line is not a number"))?;

    let (start_raw, end_raw) = block[1]
        .split_once("-->")
        .ok_or_else(|| malformed("timing line must contain '-->'"))?;
    let start_ms =
        parse_srt_timestamp(start_raw).ok_or_else(|| malformed("invalid start timestamp"))?;
    let end_ms = parse_srt_timestamp(end_raw).ok_or_else(|| malformed("invalid end timestamp"))?;
    if end_ms < start_ms {
        return Err(malformed("cue ends before it starts"));
    }

    Ok(Subtitle {
        index,
        start_ms,
        end_ms,
        text: block[2..].join("\n"),
    })
}

/// Serialize cues, renumbering them from 1.
pub fn write_srt(cues: &[Cue]) -> String {
    cues.iter()
        .enumerate()
        .map(|(position, cue)| {
            format!(
                "{}\n{} --> {}\n{}\n",
                position + 1,
                ms_to_srt_timestamp(cue.start_ms),
                ms_to_srt_timestamp(cue.end_ms),
                cue.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
