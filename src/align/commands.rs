use anyhow::{Context, Result, bail};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

use crate::common::config::DocumentedConfig;
use crate::ui::prelude::{Level, OutputFormat, emit, get_output_format};

use super::cli::{AlignCommands, CheckArgs, ConfigArgs, RetimeArgs, TimeFormat, TimecodeArgs};
use super::config::AlignConfig;
use super::cps::CpsAnalyzer;
use super::error::AlignError;
use super::model::Cue;
use super::narration::load_narration;
use super::pipeline::{measure_clips, plan_clips, retime};
use super::probe::{AudioDirectory, DurationManifest, DurationSource};
use super::report::{cps_lines, emit_report, summary_lines, warning_line};
use super::srt::{ParsedSrt, parse_srt, write_srt};
use super::timecode::{
    frames_to_seconds, frames_to_timecode, parse_srt_timestamp, seconds_to_frames,
    seconds_to_srt_timestamp, timecode_to_frames,
};

pub fn handle_align_command(command: AlignCommands, config_path: Option<&Path>) -> Result<()> {
    match command {
        AlignCommands::Retime(args) => handle_retime(args, config_path),
        AlignCommands::Check(args) => handle_check(args, config_path),
        AlignCommands::Timecode(args) => handle_timecode(args, config_path),
        AlignCommands::Config(args) => handle_config(args, config_path),
    }
}

fn handle_retime(args: RetimeArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = AlignConfig::load(config_path)?;
    args.tuning.apply(&mut config);
    config.validate().context("invalid command line override")?;

    let output_path = resolve_output_path(&args.subtitles, args.out_file.as_deref(), "retimed");
    ensure_writable(&output_path, &args.subtitles, args.force)?;

    let parsed = read_srt(&args.subtitles)?;

    let narration = args
        .narration
        .as_deref()
        .map(load_narration)
        .transpose()?;
    if let Some(segments) = &narration {
        emit(
            Level::Debug,
            "align.narration.loaded",
            &format!("Loaded {} narration segment(s)", segments.len()),
            None,
        );
    }

    let source: Box<dyn DurationSource> = match (&args.durations, &args.audio_dir) {
        (Some(manifest), _) => Box::new(DurationManifest::load(manifest)?),
        (None, Some(dir)) => Box::new(AudioDirectory::new(dir)?),
        (None, None) => bail!("pass either --durations or --audio-dir"),
    };

    let requests = plan_clips(narration.as_deref(), source.as_ref())?;
    let clips = measure_clips(&requests, source.as_ref());

    let retimed = retime(&parsed, narration.as_deref(), &clips, &config)
        .with_context(|| format!("retiming {}", args.subtitles.display()))?;

    for warning in &retimed.warnings {
        emit_report(&[warning_line(warning, Some(retimed.summary.mode))]);
    }
    for segment in &retimed.timeline.segments {
        emit(
            Level::Debug,
            "align.timeline.segment",
            &format!(
                "Segment {} ({}): {:.3}s - {:.3}s",
                segment.index, segment.audio_filename, segment.start_sec, segment.end_sec
            ),
            None,
        );
    }
    for group in &retimed.groups {
        emit(
            Level::Debug,
            "align.match.group",
            &format!(
                "Segment {}: {} subtitle(s){}",
                group.segment_index,
                group.subtitles.len(),
                group
                    .score
                    .map(|score| format!(", score {score:.2}"))
                    .unwrap_or_default()
            ),
            None,
        );
    }

    for entry in retimed.cps.flagged() {
        emit(
            Level::Debug,
            "align.retime.flagged_cue",
            &format!(
                "Cue #{} ({}): {:.1} cps over {:.2}s",
                entry.position + 1,
                entry.index,
                entry.analysis.cps,
                entry.duration_sec
            ),
            None,
        );
    }

    write_output(&output_path, &retimed.cues)?;
    emit_report(&summary_lines(&retimed.summary));
    emit(
        Level::Success,
        "align.retime.written",
        &format!("Retimed subtitles written to {}", output_path.display()),
        Some(json!({ "path": output_path })),
    );

    Ok(())
}

fn handle_check(args: CheckArgs, config_path: Option<&Path>) -> Result<()> {
    let config = AlignConfig::load(config_path)?;
    let parsed = read_srt(&args.subtitles)?;
    for skipped in &parsed.skipped {
        emit_report(&[warning_line(skipped, None)]);
    }
    if parsed.subtitles.is_empty() {
        return Err(AlignError::EmptySubtitles)
            .with_context(|| format!("checking {}", args.subtitles.display()));
    }

    let cues: Vec<Cue> = parsed.subtitles.iter().map(Cue::from).collect();
    let analyzer = CpsAnalyzer::new(&config);
    let report = analyzer.analyze_track(&cues);
    emit_report(&cps_lines(&report));

    if args.fix {
        let output_path = resolve_output_path(&args.subtitles, args.out_file.as_deref(), "fixed");
        ensure_writable(&output_path, &args.subtitles, args.force)?;

        let fixed = analyzer.enforce_min_duration(&cues);
        let lengthened = fixed
            .iter()
            .zip(&cues)
            .filter(|(after, before)| after.end_ms != before.end_ms)
            .count();
        write_output(&output_path, &fixed)?;
        emit(
            Level::Success,
            "align.check.fixed",
            &format!(
                "Lengthened {lengthened} cue(s), written to {}",
                output_path.display()
            ),
            Some(json!({ "path": output_path, "lengthened": lengthened })),
        );
    }

    if args.strict && (report.too_fast > 0 || report.too_short > 0) {
        bail!(
            "{} cue(s) failed the reading speed check",
            report.flagged().count()
        );
    }

    Ok(())
}

fn handle_timecode(args: TimecodeArgs, config_path: Option<&Path>) -> Result<()> {
    let fps = match args.fps {
        Some(fps) => fps,
        None => AlignConfig::load(config_path)?.fps,
    };
    if !fps.is_finite() || fps <= 0.0 {
        bail!("fps must be a positive number, got {fps}");
    }
    let converted = convert_time(&args.value, args.from, fps)?;

    emit(
        Level::Info,
        "align.timecode.converted",
        &format!(
            "timecode {}  frames {}  seconds {:.3}  srt {}",
            converted.timecode, converted.frames, converted.seconds, converted.srt
        ),
        Some(json!({
            "fps": fps,
            "timecode": converted.timecode,
            "frames": converted.frames,
            "seconds": converted.seconds,
            "srt": converted.srt,
        })),
    );
    Ok(())
}

fn handle_config(args: ConfigArgs, config_path: Option<&Path>) -> Result<()> {
    let path = AlignConfig::resolved_path(config_path)?;
    if args.path {
        emit(
            Level::Info,
            "align.config.path",
            &path.display().to_string(),
            Some(json!({ "path": path })),
        );
        return Ok(());
    }

    let config = AlignConfig::load(config_path)?;
    match get_output_format() {
        OutputFormat::Json => emit(
            Level::Info,
            "align.config.show",
            &path.display().to_string(),
            Some(json!(config)),
        ),
        OutputFormat::Text => {
            emit(
                Level::Info,
                "align.config.path",
                &format!("# {}", path.display()),
                None,
            );
            emit(
                Level::Info,
                "align.config.show",
                config.render_documented().trim_end(),
                None,
            );
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
struct ConvertedTime {
    timecode: String,
    frames: u64,
    seconds: f64,
    srt: String,
}

fn convert_time(value: &str, from: Option<TimeFormat>, fps: f64) -> Result<ConvertedTime> {
    let value = value.trim();
    let format = from.unwrap_or_else(|| guess_time_format(value));

    let (frames, seconds) = match format {
        TimeFormat::Timecode => {
            let frames = timecode_to_frames(value, fps)?;
            (frames, frames_to_seconds(frames, fps))
        }
        TimeFormat::Frames => {
            let frames: u64 = value
                .parse()
                .with_context(|| format!("'{value}' is not a frame count"))?;
            (frames, frames_to_seconds(frames, fps))
        }
        TimeFormat::Seconds => {
            let seconds: f64 = value
                .parse()
                .with_context(|| format!("'{value}' is not a number of seconds"))?;
            if !seconds.is_finite() || seconds < 0.0 {
                bail!("seconds must be a non-negative number, got {value}");
            }
            (seconds_to_frames(seconds, fps), seconds)
        }
        TimeFormat::Srt => {
            let ms = parse_srt_timestamp(value)
                .with_context(|| format!("'{value}' is not an HH:MM:SS,mmm timestamp"))?;
            let seconds = ms as f64 / 1000.0;
            (seconds_to_frames(seconds, fps), seconds)
        }
    };

    Ok(ConvertedTime {
        timecode: frames_to_timecode(frames, fps),
        frames,
        seconds,
        srt: seconds_to_srt_timestamp(seconds),
    })
}

fn guess_time_format(value: &str) -> TimeFormat {
    let separators = value.chars().filter(|c| matches!(c, ':' | ';')).count();
    if separators == 3 {
        TimeFormat::Timecode
    } else if separators > 0 {
        TimeFormat::Srt
    } else {
        TimeFormat::Seconds
    }
}

fn read_srt(path: &Path) -> Result<ParsedSrt> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading subtitles from {}", path.display()))?;
    Ok(parse_srt(&contents))
}

fn resolve_output_path(input: &Path, out_file: Option<&Path>, suffix: &str) -> PathBuf {
    match out_file {
        Some(path) => path.to_path_buf(),
        None => {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "subtitles".to_string());
            input.with_file_name(format!("{stem}.{suffix}.srt"))
        }
    }
}

fn ensure_writable(output: &Path, input: &Path, force: bool) -> Result<()> {
    if same_file(output, input) {
        bail!(
            "refusing to overwrite the input file {}; choose another --out-file",
            input.display()
        );
    }
    if output.exists() && !force {
        bail!(
            "{} already exists, pass --force to overwrite",
            output.display()
        );
    }
    Ok(())
}

/// `./ep.srt` and `ep.srt` name the same file once both exist on disk.
fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn write_output(path: &Path, cues: &[Cue]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    fs::write(path, write_srt(cues))
        .with_context(|| format!("writing subtitles to {}", path.display()))
}
