mod common;
mod utils;

use anyhow::Result;
use common::TestEnvironment;

const GREETING_SRT: &str = "1\n00:00:00,500 --> 00:00:01,200\nこんにちは\n\n2\n00:00:01,300 --> 00:00:02,000\nさようなら\n\n3\n00:00:02,500 --> 00:00:04,000\n今日はいい天気ですね\n";

const GREETING_SCRIPT: &str = "segments:\n  - text: こんにちは、さようなら。\n    audio: 001.wav\n  - text: 今日はいい天気ですね\n    audio: 002.wav\n";

const GREETING_DURATIONS: &str = "- file: 001.wav\n  duration: 2.0\n- file: 002.wav\n  duration: 1.5\n";

const LINES: [&str; 5] = [
    "りんごが好きです",
    "みかんを食べました",
    "今日は雨が降っています",
    "明日は晴れるでしょう",
    "ありがとうございました",
];

fn srt_from_lines(lines: &[&str]) -> String {
    lines
        .iter()
        .enumerate()
        .map(|(i, text)| {
            format!(
                "{}\n00:00:{:02},000 --> 00:00:{:02},500\n{}\n",
                i + 1,
                i * 2,
                i * 2 + 1,
                text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_retime_with_narration_and_manifest() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write_file("episode.srt", GREETING_SRT)?;
    env.write_file("script.yaml", GREETING_SCRIPT)?;
    env.write_file("durations.yaml", GREETING_DURATIONS)?;

    let output = utils::run_realign(
        &env,
        &[
            "retime",
            "episode.srt",
            "--narration",
            "script.yaml",
            "--durations",
            "durations.yaml",
        ],
    )?;
    assert_eq!(output.exit_code, 0, "retime failed: {}", output.stderr);

    let retimed = env.read_file("episode.retimed.srt")?;
    assert_eq!(
        retimed,
        "1\n00:00:00,000 --> 00:00:01,000\nこんにちは\n\n2\n00:00:01,000 --> 00:00:02,000\nさようなら\n\n3\n00:00:02,000 --> 00:00:03,500\n今日はいい天気ですね\n"
    );
    assert!(output.stdout.contains("Matched 3 of 3 subtitle(s)"));
    Ok(())
}

#[test]
fn test_retime_gap_override() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write_file("episode.srt", GREETING_SRT)?;
    env.write_file("script.yaml", GREETING_SCRIPT)?;
    env.write_file("durations.yaml", GREETING_DURATIONS)?;

    let output = utils::run_realign(
        &env,
        &[
            "retime",
            "episode.srt",
            "-n",
            "script.yaml",
            "-m",
            "durations.yaml",
            "--gap",
            "0.5",
            "-o",
            "out/gapped.srt",
        ],
    )?;
    assert_eq!(output.exit_code, 0, "retime failed: {}", output.stderr);

    let retimed = env.read_file("out/gapped.srt")?;
    assert!(retimed.contains("3\n00:00:02,500 --> 00:00:04,000\n今日はいい天気ですね\n"));
    Ok(())
}

#[test]
fn test_retime_without_narration_reports_json_summary() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write_file("episode.srt", &srt_from_lines(&["a", "b", "c", "d"]))?;
    env.write_file(
        "durations.json",
        r#"[{"file": "a.wav", "duration": 1.0}, {"file": "b.wav", "duration": 1.0}]"#,
    )?;

    let output = utils::run_realign(
        &env,
        &[
            "--output",
            "json",
            "retime",
            "episode.srt",
            "--durations",
            "durations.json",
        ],
    )?;
    assert_eq!(output.exit_code, 0, "retime failed: {}", output.stderr);

    let summary = output
        .event("align.retime.summary")
        .expect("summary event");
    assert_eq!(summary["data"]["mode"], "proportional");
    assert_eq!(summary["data"]["total_subtitles"], 4);
    assert_eq!(summary["data"]["total_segments"], 2);
    assert!(output.event("align.match.no_narration").is_some());

    let retimed = env.read_file("episode.retimed.srt")?;
    assert!(retimed.contains("2\n00:00:00,500 --> 00:00:01,000\nb\n"));
    assert!(retimed.contains("4\n00:00:01,500 --> 00:00:02,000\nd\n"));
    Ok(())
}

#[test]
fn test_missing_clip_is_dropped_with_warning() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write_file("episode.srt", &srt_from_lines(&LINES))?;

    let script: String = LINES
        .iter()
        .enumerate()
        .map(|(i, text)| format!("- text: {text}\n  audio: {:03}.wav\n", i + 1))
        .collect();
    env.write_file("script.yaml", &script)?;
    env.write_file(
        "durations.yaml",
        "- {file: 001.wav, duration: 2.0}\n- {file: 002.wav, duration: 2.0}\n- {file: 004.wav, duration: 3.0}\n- {file: 005.wav, duration: 2.0}\n",
    )?;

    let output = utils::run_realign(
        &env,
        &[
            "retime",
            "episode.srt",
            "--narration",
            "script.yaml",
            "--durations",
            "durations.yaml",
        ],
    )?;
    assert_eq!(output.exit_code, 0, "retime failed: {}", output.stderr);
    assert!(output.stderr.contains("segment 3"), "stderr: {}", output.stderr);
    assert!(output.stderr.contains("003.wav"));

    let retimed = env.read_file("episode.retimed.srt")?;
    for line in LINES {
        assert!(retimed.contains(line), "{line} missing from output");
    }
    assert!(retimed.contains("3\n00:00:04,000 --> "));
    assert!(retimed.contains("5\n00:00:07,000 --> 00:00:09,000\nありがとうございました\n"));
    Ok(())
}

#[test]
fn test_malformed_block_is_skipped() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write_file(
        "episode.srt",
        "1\n00:00:00,000 --> 00:00:01,000\nりんごが好きです\n\n2\n00:00:01,000 --> 00:00:02,000\n\n3\n00:00:02,000 --> 00:00:03,000\nみかんを食べました\n",
    )?;
    env.write_file(
        "script.json",
        r#"[{"text": "りんごが好きです", "audio": "1.wav"}, {"text": "みかんを食べました", "audio": "2.wav"}]"#,
    )?;
    env.write_file(
        "durations.json",
        r#"{"clips": [{"file": "1.wav", "duration": 1.0}, {"file": "2.wav", "duration": 1.0}]}"#,
    )?;

    let output = utils::run_realign(
        &env,
        &[
            "retime",
            "episode.srt",
            "--narration",
            "script.json",
            "--durations",
            "durations.json",
        ],
    )?;
    assert_eq!(output.exit_code, 0, "retime failed: {}", output.stderr);
    assert!(output.stderr.contains("Malformed SRT block starting with '2'"));
    assert!(output.stdout.contains("1 malformed block(s) skipped"));

    let retimed = env.read_file("episode.retimed.srt")?;
    assert!(retimed.contains("2\n00:00:01,000 --> 00:00:02,000\nみかんを食べました\n"));
    Ok(())
}

#[test]
fn test_existing_output_needs_force() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write_file("episode.srt", GREETING_SRT)?;
    env.write_file("script.yaml", GREETING_SCRIPT)?;
    env.write_file("durations.yaml", GREETING_DURATIONS)?;
    env.write_file("episode.retimed.srt", "keep me")?;

    let args = [
        "retime",
        "episode.srt",
        "--narration",
        "script.yaml",
        "--durations",
        "durations.yaml",
    ];
    let output = utils::run_realign(&env, &args)?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("--force"));
    assert_eq!(env.read_file("episode.retimed.srt")?, "keep me");

    let mut forced = args.to_vec();
    forced.push("--force");
    let output = utils::run_realign(&env, &forced)?;
    assert_eq!(output.exit_code, 0, "retime failed: {}", output.stderr);
    assert_ne!(env.read_file("episode.retimed.srt")?, "keep me");
    Ok(())
}

#[test]
fn test_invalid_narration_names_record() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write_file("episode.srt", GREETING_SRT)?;
    env.write_file(
        "script.yaml",
        "- text: こんにちは\n  audio: 001.wav\n- text: さようなら\n  audio: ''\n",
    )?;
    env.write_file("durations.yaml", GREETING_DURATIONS)?;

    let output = utils::run_realign(
        &env,
        &[
            "retime",
            "episode.srt",
            "--narration",
            "script.yaml",
            "--durations",
            "durations.yaml",
        ],
    )?;
    assert_eq!(output.exit_code, 1);
    assert!(
        output.stderr.contains("Invalid narration record 2"),
        "stderr: {}",
        output.stderr
    );
    Ok(())
}

#[test]
fn test_empty_subtitles_fail() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write_file("episode.srt", "not a subtitle file\n")?;
    env.write_file("durations.yaml", GREETING_DURATIONS)?;

    let output = utils::run_realign(
        &env,
        &["retime", "episode.srt", "--durations", "durations.yaml"],
    )?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("no valid cues"), "stderr: {}", output.stderr);
    Ok(())
}

#[test]
fn test_retime_requires_a_duration_source() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write_file("episode.srt", GREETING_SRT)?;

    let output = utils::run_realign(&env, &["retime", "episode.srt"])?;
    assert_ne!(output.exit_code, 0);
    Ok(())
}

#[test]
fn test_check_fix_and_strict() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write_file(
        "episode.srt",
        "1\n00:00:00,000 --> 00:00:00,500\nはい\n\n2\n00:00:03,000 --> 00:00:06,000\nゆっくり読める字幕です\n",
    )?;

    let output = utils::run_realign(&env, &["check", "episode.srt", "--fix"])?;
    assert_eq!(output.exit_code, 0, "check failed: {}", output.stderr);
    assert!(output.stderr.contains("Cue #1"));

    let fixed = env.read_file("episode.fixed.srt")?;
    assert!(fixed.starts_with("1\n00:00:00,000 --> 00:00:01,200\nはい\n"));
    assert!(fixed.contains("2\n00:00:03,000 --> 00:00:06,000\n"));

    let output = utils::run_realign(&env, &["check", "episode.srt", "--strict"])?;
    assert_eq!(output.exit_code, 1);

    let output = utils::run_realign(&env, &["check", "episode.fixed.srt", "--strict"])?;
    assert_eq!(output.exit_code, 0, "check failed: {}", output.stderr);
    Ok(())
}

#[test]
fn test_timecode_conversion() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = utils::run_realign(&env, &["timecode", "00:00:01:15", "--fps", "30"])?;
    assert_eq!(output.exit_code, 0, "timecode failed: {}", output.stderr);
    assert!(output.stdout.contains("frames 45"));
    assert!(output.stdout.contains("srt 00:00:01,500"));

    let output = utils::run_realign(
        &env,
        &["--output", "json", "timecode", "90", "--from", "frames", "--fps", "30"],
    )?;
    let event = output
        .event("align.timecode.converted")
        .expect("conversion event");
    assert_eq!(event["data"]["timecode"], "00:00:03:00");

    let output = utils::run_realign(&env, &["timecode", "00:00:01:45", "--fps", "30"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("Invalid timecode"));
    Ok(())
}

#[test]
fn test_config_file_is_created_with_documentation() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = utils::run_realign(&env, &["config", "--path"])?;
    assert_eq!(output.exit_code, 0, "config failed: {}", output.stderr);
    assert!(output.stdout.trim_end().ends_with("realign/config.toml"));

    let output = utils::run_realign(&env, &["config"])?;
    assert_eq!(output.exit_code, 0, "config failed: {}", output.stderr);
    assert!(output.stdout.contains("fps = 29.97"));

    let written = std::fs::read_to_string(env.config_home().join("realign/config.toml"))?;
    assert!(written.contains("# Frame rate used for HH:MM:SS:FF timecodes"));
    assert!(written.contains("strategy = \"text-aligned\""));
    Ok(())
}

#[test]
fn test_explicit_config_overrides_defaults() -> Result<()> {
    let env = TestEnvironment::new()?;
    let config = env.write_file("custom.toml", "fps = 24.0\n")?;

    let output = utils::run_realign(
        &env,
        &[
            "--config",
            config.to_str().expect("utf-8 temp path"),
            "timecode",
            "2.0",
        ],
    )?;
    assert_eq!(output.exit_code, 0, "timecode failed: {}", output.stderr);
    assert!(output.stdout.contains("frames 48"));

    let output = utils::run_realign(&env, &["--config", "missing.toml", "timecode", "2.0"])?;
    assert_eq!(output.exit_code, 1);
    Ok(())
}

#[test]
fn test_completions_generate() -> Result<()> {
    let env = TestEnvironment::new()?;
    let output = utils::run_realign(&env, &["completions", "generate", "bash"])?;
    assert_eq!(output.exit_code, 0, "completions failed: {}", output.stderr);
    assert!(output.stdout.contains("retime"));
    Ok(())
}
