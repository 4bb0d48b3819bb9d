use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::ToolkitConfig;
use crate::error::{Result, SubExtractError};
use crate::media::{CommandRunner, MediaCommand, MediaCommandBuilder};
use crate::streams::StreamDescriptor;

/// One way of asking ffmpeg for an SRT file, tried in [`ExtractionVariant::ORDERED`] order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionVariant {
    /// `0:s:N` addressing, re-encode to SRT, timestamps shifted to zero
    RelativeReencode,
    /// `0:N` addressing, re-encode to SRT, timestamps shifted to zero
    AbsoluteReencode,
    /// `0:s:N` addressing, SRT output format without an explicit codec
    RelativeFormat,
    /// `0:N` addressing, stream copy
    AbsoluteCopy,
}

impl ExtractionVariant {
    pub const ORDERED: [ExtractionVariant; 4] = [
        ExtractionVariant::RelativeReencode,
        ExtractionVariant::AbsoluteReencode,
        ExtractionVariant::RelativeFormat,
        ExtractionVariant::AbsoluteCopy,
    ];

    /// Build the ffmpeg invocation for this variant
    pub fn command(
        &self,
        builder: &MediaCommandBuilder,
        input_path: &Path,
        stream: &StreamDescriptor,
        output_path: &Path,
    ) -> MediaCommand {
        let relative = format!("0:s:{}", stream.relative_index);
        let absolute = format!("0:{}", stream.index);
        let cmd = builder
            .custom(format!("Subtitle extraction ({})", self))
            .overwrite()
            .input(input_path);

        let cmd = match self {
            ExtractionVariant::RelativeReencode => {
                cmd.map(relative).subtitle_codec("srt").normalize_timestamps()
            }
            ExtractionVariant::AbsoluteReencode => {
                cmd.map(absolute).subtitle_codec("srt").normalize_timestamps()
            }
            ExtractionVariant::RelativeFormat => cmd.map(relative).format("srt"),
            ExtractionVariant::AbsoluteCopy => cmd.map(absolute).copy_all(),
        };

        cmd.output(output_path)
    }
}

impl fmt::Display for ExtractionVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtractionVariant::RelativeReencode => "subtitle index, convert to SRT",
            ExtractionVariant::AbsoluteReencode => "stream index, convert to SRT",
            ExtractionVariant::RelativeFormat => "subtitle index, SRT container",
            ExtractionVariant::AbsoluteCopy => "stream index, stream copy",
        };
        f.write_str(name)
    }
}

/// Result of one extraction call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionOutcome {
    pub success: bool,
    pub output_path: PathBuf,
    pub size_bytes: u64,
    /// Variant that produced the file, if any did
    pub variant: Option<ExtractionVariant>,
}

impl ExtractionOutcome {
    /// The written file, or [`SubExtractError::ExtractionFailed`] when no variant worked
    pub fn into_result(self, display_number: usize) -> Result<PathBuf> {
        if self.success {
            Ok(self.output_path)
        } else {
            Err(SubExtractError::ExtractionFailed { display_number })
        }
    }
}

/// `{stem}_subtitle_{number}{_language}.srt`, the language suffix only when known
pub fn output_file_name<P: AsRef<Path>>(
    input_path: P,
    stream: &StreamDescriptor,
    display_number: usize,
) -> String {
    let stem = input_path
        .as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "subtitles".to_string());

    if stream.has_known_language() {
        format!("{}_subtitle_{}_{}.srt", stem, display_number, stream.language)
    } else {
        format!("{}_subtitle_{}.srt", stem, display_number)
    }
}

/// Extracts single subtitle streams into SRT files
pub struct SubtitleExtractor<'a> {
    runner: &'a dyn CommandRunner,
    builder: MediaCommandBuilder,
}

impl<'a> SubtitleExtractor<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &ToolkitConfig) -> Self {
        Self {
            runner,
            builder: MediaCommandBuilder::new(config),
        }
    }

    /// Try every variant in order until one writes a non-empty file
    pub async fn extract<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        stream: &StreamDescriptor,
        output_dir: Q,
        display_number: usize,
    ) -> ExtractionOutcome {
        let input_path = input_path.as_ref();
        let output_path = output_dir
            .as_ref()
            .join(output_file_name(input_path, stream, display_number));
        info!(
            "Extracting subtitle stream {}: {} to {}",
            display_number,
            stream,
            output_path.display()
        );

        for variant in ExtractionVariant::ORDERED {
            let command = variant.command(&self.builder, input_path, stream, &output_path);

            match self.runner.run(&command).await {
                Ok(output) if output.success() => {
                    let size_bytes = file_size(&output_path);
                    if size_bytes > 0 {
                        info!("Extracted {} bytes using {}", size_bytes, variant);
                        return ExtractionOutcome {
                            success: true,
                            output_path,
                            size_bytes,
                            variant: Some(variant),
                        };
                    }
                    warn!("{} exited cleanly but produced no subtitle data", variant);
                }
                Ok(output) => {
                    warn!("{} failed with exit {:?}", variant, output.status);
                    debug!("ffmpeg stderr: {}", output.stderr.trim());
                }
                Err(e) => warn!("{} failed: {}", variant, e),
            }

            remove_empty_artifact(&output_path);
        }

        warn!("All extraction methods failed for subtitle stream {}", display_number);
        ExtractionOutcome {
            success: false,
            output_path,
            size_bytes: 0,
            variant: None,
        }
    }
}

/// Directory the input file lives in, `.` for bare file names
pub fn default_output_dir<P: AsRef<Path>>(input_path: P) -> PathBuf {
    match input_path.as_ref().parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Create `dir` (and parents) if it does not exist yet
pub fn ensure_output_dir<P: AsRef<Path>>(dir: P) -> Result<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).map_err(|source| SubExtractError::DirectoryCreateFailed {
        path: dir.to_path_buf(),
        source,
    })?;
    debug!("Output directory ready: {}", dir.display());
    Ok(dir.to_path_buf())
}

fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

fn remove_empty_artifact(path: &Path) {
    if let Ok(metadata) = std::fs::metadata(path) {
        if metadata.is_file() && metadata.len() == 0 {
            if let Err(e) = std::fs::remove_file(path) {
                debug!("Could not remove empty {}: {}", path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{CommandOutput, MockCommandRunner};
    use crate::streams::UNKNOWN;

    fn stream(index: usize, relative_index: usize, language: &str) -> StreamDescriptor {
        StreamDescriptor {
            index,
            relative_index,
            codec_name: "subrip".to_string(),
            language: language.to_string(),
            title: format!("Subtitle stream {}", index),
        }
    }

    fn exit(code: i32) -> CommandOutput {
        CommandOutput { status: Some(code), ..Default::default() }
    }

    fn write_output(cmd: &MediaCommand, contents: &str) {
        let path = cmd.last_arg().expect("output path");
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(
            output_file_name("movie.mkv", &stream(2, 0, "eng"), 3),
            "movie_subtitle_3_eng.srt"
        );
        assert_eq!(
            output_file_name("movie.mkv", &stream(2, 0, UNKNOWN), 3),
            "movie_subtitle_3.srt"
        );
        assert_eq!(
            output_file_name("/videos/My Show.S01E02.mp4", &stream(4, 1, "jpn"), 1),
            "My Show.S01E02_subtitle_1_jpn.srt"
        );
    }

    #[test]
    fn test_variant_commands() {
        let builder = MediaCommandBuilder::new(&ToolkitConfig::default());
        let s = stream(5, 1, "eng");
        let input = Path::new("in.mkv");
        let output = Path::new("out.srt");

        let args: Vec<Vec<String>> = ExtractionVariant::ORDERED
            .iter()
            .map(|v| v.command(&builder, input, &s, output).args)
            .collect();

        assert_eq!(
            args[0],
            [
                "-y",
                "-i",
                "in.mkv",
                "-map",
                "0:s:1",
                "-c:s",
                "srt",
                "-avoid_negative_ts",
                "make_zero",
                "out.srt"
            ]
        );
        assert_eq!(
            args[1],
            [
                "-y",
                "-i",
                "in.mkv",
                "-map",
                "0:5",
                "-c:s",
                "srt",
                "-avoid_negative_ts",
                "make_zero",
                "out.srt"
            ]
        );
        assert_eq!(args[2], ["-y", "-i", "in.mkv", "-map", "0:s:1", "-f", "srt", "out.srt"]);
        assert_eq!(args[3], ["-y", "-i", "in.mkv", "-map", "0:5", "-c", "copy", "out.srt"]);
    }

    #[tokio::test]
    async fn test_first_variant_success() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = MockCommandRunner::new();
        runner.expect_run().times(1).returning(|cmd| {
            write_output(cmd, "1\n00:00:01,000 --> 00:00:02,000\nHello\n");
            Ok(exit(0))
        });

        let config = ToolkitConfig::default();
        let outcome = SubtitleExtractor::new(&runner, &config)
            .extract("movie.mkv", &stream(2, 0, "eng"), dir.path(), 1)
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.variant, Some(ExtractionVariant::RelativeReencode));
        assert_eq!(outcome.output_path, dir.path().join("movie_subtitle_1_eng.srt"));
        assert!(outcome.size_bytes > 0);
    }

    #[tokio::test]
    async fn test_empty_output_falls_through_to_next_variant() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = MockCommandRunner::new();
        runner.expect_run().times(3).returning(|cmd| {
            if cmd.args.iter().any(|a| a == "-f") {
                write_output(cmd, "1\n00:00:01,000 --> 00:00:02,000\nStyled\n");
            } else {
                // Clean exit, empty file
                write_output(cmd, "");
            }
            Ok(exit(0))
        });

        let config = ToolkitConfig::default();
        let outcome = SubtitleExtractor::new(&runner, &config)
            .extract("movie.mkv", &stream(3, 1, UNKNOWN), dir.path(), 2)
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.variant, Some(ExtractionVariant::RelativeFormat));
        assert_eq!(outcome.output_path, dir.path().join("movie_subtitle_2.srt"));
    }

    #[tokio::test]
    async fn test_all_variants_fail() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = MockCommandRunner::new();
        runner.expect_run().times(4).returning(|cmd| {
            write_output(cmd, "");
            Ok(exit(1))
        });

        let config = ToolkitConfig::default();
        let outcome = SubtitleExtractor::new(&runner, &config)
            .extract("movie.mkv", &stream(4, 2, "fre"), dir.path(), 3)
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.variant, None);
        assert_eq!(outcome.size_bytes, 0);
        assert!(!outcome.output_path.exists(), "empty artifact should be removed");
        assert!(matches!(
            outcome.into_result(3),
            Err(SubExtractError::ExtractionFailed { display_number: 3 })
        ));
    }

    #[test]
    fn test_default_output_dir() {
        assert_eq!(default_output_dir("/videos/movie.mkv"), PathBuf::from("/videos"));
        assert_eq!(default_output_dir("movie.mkv"), PathBuf::from("."));
    }

    #[test]
    fn test_ensure_output_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("subs").join("season1");
        ensure_output_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_ensure_output_dir_fails_on_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("taken");
        std::fs::write(&file, "x").unwrap();
        assert!(matches!(
            ensure_output_dir(file.join("inner")),
            Err(SubExtractError::DirectoryCreateFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_launch_failure_counts_as_failed_variant() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = MockCommandRunner::new();
        runner.expect_run().times(4).returning(|cmd| {
            Err(crate::error::SubExtractError::ToolLaunch {
                program: cmd.binary_path.clone(),
                reason: "permission denied".to_string(),
            })
        });

        let config = ToolkitConfig::default();
        let outcome = SubtitleExtractor::new(&runner, &config)
            .extract("movie.mkv", &stream(2, 0, "eng"), dir.path(), 1)
            .await;
        assert!(!outcome.success);
    }
}
