use clap::{ArgGroup, Args, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

use super::config::{AlignConfig, AllocationStrategy};

#[derive(Subcommand, Debug, Clone)]
pub enum AlignCommands {
    /// Retime a reviewed SRT file onto rendered narration clips
    Retime(RetimeArgs),
    /// Report reading speed and too-short cues of an SRT file
    Check(CheckArgs),
    /// Convert between timecodes, frame counts, seconds and SRT timestamps
    Timecode(TimecodeArgs),
    /// Show the resolved configuration
    Config(ConfigArgs),
}

/// Per-run overrides of config file values.
#[derive(Args, Debug, Clone, Default)]
pub struct TuningArgs {
    /// Frame rate for HH:MM:SS:FF timecodes
    #[arg(long)]
    pub fps: Option<f64>,

    /// How a clip's time is shared between its subtitles
    #[arg(long, value_enum)]
    pub strategy: Option<AllocationStrategy>,

    /// Minimum score (0.0-1.0) for a subtitle group to match a narration line
    #[arg(long = "min-score")]
    pub min_score: Option<f64>,

    /// Silence between consecutive clips, in seconds
    #[arg(long)]
    pub gap: Option<f64>,
}

impl TuningArgs {
    pub fn apply(&self, config: &mut AlignConfig) {
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(min_score) = self.min_score {
            config.min_group_score = min_score;
        }
        if let Some(gap) = self.gap {
            config.clip_gap_sec = gap;
        }
    }
}

#[derive(Args, Debug, Clone)]
#[command(group(ArgGroup::new("durations_from").required(true).args(["durations", "audio_dir"])))]
pub struct RetimeArgs {
    /// Reviewed subtitle file whose text is kept verbatim
    #[arg(value_hint = ValueHint::FilePath)]
    pub subtitles: PathBuf,

    /// Narration script (YAML or JSON) listing the text and audio file of every line
    #[arg(short = 'n', long, value_hint = ValueHint::FilePath)]
    pub narration: Option<PathBuf>,

    /// Manifest (YAML or JSON) of clip file names and durations in seconds
    #[arg(short = 'm', long, value_hint = ValueHint::FilePath)]
    pub durations: Option<PathBuf>,

    /// Directory of rendered clips, measured with ffprobe
    #[arg(short = 'a', long, value_hint = ValueHint::DirPath)]
    pub audio_dir: Option<PathBuf>,

    /// Output file; defaults to <name>.retimed.srt next to the input
    #[arg(short = 'o', long = "out-file", value_hint = ValueHint::FilePath)]
    pub out_file: Option<PathBuf>,

    /// Overwrite an existing output file
    #[arg(long)]
    pub force: bool,

    #[command(flatten)]
    pub tuning: TuningArgs,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Subtitle file to check
    #[arg(value_hint = ValueHint::FilePath)]
    pub subtitles: PathBuf,

    /// Lengthen too-short cues into the following silence and write the result
    #[arg(long)]
    pub fix: bool,

    /// Output file for --fix; defaults to <name>.fixed.srt next to the input
    #[arg(short = 'o', long = "out-file", value_hint = ValueHint::FilePath, requires = "fix")]
    pub out_file: Option<PathBuf>,

    /// Overwrite an existing output file
    #[arg(long)]
    pub force: bool,

    /// Exit with an error when any cue is flagged
    #[arg(long)]
    pub strict: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TimeFormat {
    /// HH:MM:SS:FF
    Timecode,
    /// Whole frame count
    Frames,
    /// Seconds, fractional allowed
    Seconds,
    /// HH:MM:SS,mmm
    Srt,
}

#[derive(Args, Debug, Clone)]
pub struct TimecodeArgs {
    /// Value to convert
    pub value: String,

    /// Format of the value; guessed from its shape when omitted
    #[arg(long, value_enum)]
    pub from: Option<TimeFormat>,

    /// Frame rate for frames and timecodes
    #[arg(long)]
    pub fps: Option<f64>,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Only print the path of the config file
    #[arg(long)]
    pub path: bool,
}
