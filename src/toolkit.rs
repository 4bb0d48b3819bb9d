use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::ToolkitConfig;
use crate::media::{CommandRunner, MediaCommand, MediaCommandBuilder};

static FFMPEG_BANNER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ffmpeg version (\S+)").expect("valid banner regex"));

static FFPROBE_BANNER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ffprobe version (\S+)").expect("valid banner regex"));

/// Result of probing the media toolkit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolkitStatus {
    /// ffmpeg launched and printed its version banner
    pub available: bool,
    /// Version token from the ffmpeg banner, empty when unavailable
    pub version: String,
    /// ffprobe launched and printed its version banner
    pub ffprobe_available: bool,
}

/// Check whether ffmpeg (and ffprobe) can be launched with the configured paths
pub async fn check_available(runner: &dyn CommandRunner, config: &ToolkitConfig) -> ToolkitStatus {
    let builder = MediaCommandBuilder::new(config);

    let version = match probe_banner(runner, &builder.version_check(), &FFMPEG_BANNER).await {
        Some(version) => version,
        None => {
            warn!("ffmpeg not usable at '{}'", config.ffmpeg_path);
            return ToolkitStatus::default();
        }
    };
    info!("ffmpeg {} is available", version);

    let ffprobe_available = probe_banner(runner, &builder.probe_version_check(), &FFPROBE_BANNER)
        .await
        .is_some();
    if !ffprobe_available {
        warn!(
            "ffprobe not usable at '{}', structured stream listing will be skipped",
            config.ffprobe_path
        );
    }

    ToolkitStatus {
        available: true,
        version,
        ffprobe_available,
    }
}

async fn probe_banner(
    runner: &dyn CommandRunner,
    command: &MediaCommand,
    banner: &Regex,
) -> Option<String> {
    let output = match runner.run(command).await {
        Ok(output) => output,
        Err(e) => {
            debug!("{} failed: {}", command.description, e);
            return None;
        }
    };

    let first_line = output.stdout.lines().next().unwrap_or_default();
    parse_version_banner(first_line, banner)
}

fn parse_version_banner(line: &str, banner: &Regex) -> Option<String> {
    banner
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
