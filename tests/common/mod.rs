//! Shared fakes for integration tests: a scripted toolkit and a scripted picker.

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use subextract::config::Config;
use subextract::error::{Result, SubExtractError};
use subextract::media::{CommandOutput, CommandRunner, MediaCommand};
use subextract::picker::PathPicker;

pub const PROBE_CSV: &str = include_str!("../fixtures/ffprobe_subtitles.csv");
pub const INPUT_SUMMARY_LOG: &str = include_str!("../fixtures/ffmpeg_input_summary.log");

pub const SRT_BODY: &str = "1\n00:00:01,000 --> 00:00:03,500\nHello there.\n\n";

/// Stands in for ffmpeg/ffprobe, answering each kind of invocation from a script
pub struct FakeToolkit {
    /// Path at which "ffmpeg" launches; anything else fails to launch
    pub ffmpeg_path: String,
    pub ffprobe_available: bool,
    pub probe_csv: String,
    pub input_log: String,
    /// Number of `0:s:N` sub-streams the manual probe will find
    pub probed_streams: usize,
    /// `-map` selectors for which extraction writes a non-empty file
    pub extractable: HashSet<String>,
    pub calls: Mutex<Vec<MediaCommand>>,
}

impl FakeToolkit {
    /// Toolkit reporting the three fixture streams, all extractable
    pub fn with_fixture_streams() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_available: true,
            probe_csv: PROBE_CSV.to_string(),
            input_log: INPUT_SUMMARY_LOG.to_string(),
            probed_streams: 0,
            extractable: ["0:s:0", "0:s:1", "0:s:2"].iter().map(|s| s.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Toolkit that runs but finds no subtitles with any strategy
    pub fn without_subtitles() -> Self {
        Self {
            probe_csv: String::new(),
            input_log: "  Stream #0:0: Video: h264\n  Stream #0:1: Audio: aac\n".to_string(),
            extractable: HashSet::new(),
            ..Self::with_fixture_streams()
        }
    }

    pub fn extractable_only(mut self, selectors: &[&str]) -> Self {
        self.extractable = selectors.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn calls(&self) -> Vec<MediaCommand> {
        self.calls.lock().unwrap().clone()
    }

    /// Extraction attempts (one per variant tried)
    pub fn extraction_calls(&self) -> Vec<MediaCommand> {
        self.calls()
            .into_iter()
            .filter(|cmd| cmd.args.first().map(String::as_str) == Some("-y"))
            .collect()
    }

    fn map_selector(command: &MediaCommand) -> Option<&str> {
        command
            .args
            .windows(2)
            .find(|pair| pair[0] == "-map")
            .map(|pair| pair[1].as_str())
    }
}

fn output(status: i32, stdout: &str, stderr: &str) -> CommandOutput {
    CommandOutput {
        status: Some(status),
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    }
}

#[async_trait]
impl CommandRunner for FakeToolkit {
    async fn run(&self, command: &MediaCommand) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(command.clone());

        let is_ffprobe = command.binary_path.ends_with("ffprobe");
        let launches = if is_ffprobe {
            self.ffprobe_available
        } else {
            command.binary_path == self.ffmpeg_path
        };
        if !launches {
            return Err(SubExtractError::ToolLaunch {
                program: command.binary_path.clone(),
                reason: "No such file or directory".to_string(),
            });
        }

        if command.args.iter().any(|a| a == "-version") {
            let tool = if is_ffprobe { "ffprobe" } else { "ffmpeg" };
            return Ok(output(
                0,
                &format!("{} version 6.1.1 Copyright (c) 2000-2023 the FFmpeg developers\n", tool),
                "",
            ));
        }

        if is_ffprobe {
            return Ok(output(0, &self.probe_csv, ""));
        }

        if command.args.first().map(String::as_str) == Some("-hide_banner") {
            return Ok(output(0, "", &self.input_log));
        }

        let selector = Self::map_selector(command).unwrap_or_default().to_string();

        // Zero-duration probe of a sub-stream
        if command.args.iter().any(|a| a == "null") {
            let index = selector
                .strip_prefix("0:s:")
                .and_then(|i| i.parse::<usize>().ok())
                .unwrap_or(usize::MAX);
            return if index < self.probed_streams {
                Ok(output(0, "", ""))
            } else {
                Ok(output(1, "", &format!("Stream map '{}' matches no streams.", selector)))
            };
        }

        // Extraction: the output path is always the last argument
        let target = PathBuf::from(command.last_arg().unwrap_or_default());
        if self.extractable.contains(&selector) {
            std::fs::write(&target, SRT_BODY)?;
            Ok(output(0, "", ""))
        } else {
            std::fs::write(&target, "")?;
            let log = "Subtitle encoding currently only possible \
                       from text to text or bitmap to bitmap";
            Ok(output(1, "", log))
        }
    }
}

/// Picker answering from queues instead of dialogs
#[derive(Debug, Default)]
pub struct ScriptedPicker {
    pub files: VecDeque<Option<PathBuf>>,
    pub directories: VecDeque<Option<PathBuf>>,
}

impl PathPicker for ScriptedPicker {
    fn pick_file(&mut self, _start_dir: &Path) -> Option<PathBuf> {
        self.files.pop_front().flatten()
    }

    fn pick_directory(&mut self, _start_dir: &Path) -> Option<PathBuf> {
        self.directories.pop_front().flatten()
    }
}

/// Defaults with no pause after invalid input
pub fn test_config() -> Config {
    colored::control::set_override(false);
    let mut config = Config::default();
    config.session.invalid_input_pause_ms = 0;
    config
}

/// Create an empty-but-present video file the validator accepts
pub fn touch_video(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, vec![0u8; 4096]).unwrap();
    path
}
