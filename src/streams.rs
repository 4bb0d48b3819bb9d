//! Subtitle stream discovery.
//!
//! Three strategies are tried in order, each only when the previous one found
//! nothing:
//! 1. a structured ffprobe query parsed as CSV,
//! 2. scraping the input summary ffmpeg prints to its log,
//! 3. probing `0:s:N` sub-streams one by one with zero-duration runs.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ToolkitConfig;
use crate::error::{Result, SubExtractError};
use crate::media::{CommandRunner, MediaCommandBuilder};

/// Placeholder for missing codec and language values
pub const UNKNOWN: &str = "unknown";

/// `Stream #0:2(eng): Subtitle: subrip`, optionally with a `[0x..]` stream id
static STREAM_WITH_LANGUAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Stream #(\d+):(\d+)(?:\[0x[0-9a-fA-F]+\])?\(([^)]*)\): Subtitle: (.+)")
        .expect("valid stream regex")
});

/// `Stream #0:2: Subtitle: ass`
static STREAM_WITHOUT_LANGUAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Stream #(\d+):(\d+)(?:\[0x[0-9a-fA-F]+\])?: Subtitle: (.+)")
        .expect("valid stream regex")
});

/// One subtitle stream found in a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamDescriptor {
    /// Stream index as reported by the toolkit
    pub index: usize,
    /// Position among the container's subtitle streams, used for `0:s:N` addressing
    pub relative_index: usize,
    pub codec_name: String,
    pub language: String,
    pub title: String,
}

impl StreamDescriptor {
    fn new(index: usize, codec_name: &str, language: &str, title: &str) -> Self {
        Self {
            index,
            relative_index: 0,
            codec_name: non_empty_or(codec_name, UNKNOWN),
            language: non_empty_or(language, UNKNOWN),
            title: if title.trim().is_empty() {
                default_title(index)
            } else {
                title.trim().to_string()
            },
        }
    }

    pub fn has_known_language(&self) -> bool {
        !self.language.is_empty() && self.language != UNKNOWN
    }
}

impl fmt::Display for StreamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] (language: {}, stream #{})",
            self.title, self.codec_name, self.language, self.index
        )
    }
}

fn default_title(index: usize) -> String {
    format!("Subtitle stream {}", index)
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Which detection strategy produced a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStrategy {
    StructuredQuery,
    LogScrape,
    ManualProbe,
}

impl fmt::Display for DetectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DetectionStrategy::StructuredQuery => "structured query",
            DetectionStrategy::LogScrape => "log scan",
            DetectionStrategy::ManualProbe => "manual probing",
        };
        f.write_str(name)
    }
}

/// Streams found in one container, with the strategy that found them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamListing {
    /// `None` when every strategy came back empty
    pub strategy: Option<DetectionStrategy>,
    pub streams: Vec<StreamDescriptor>,
}

/// Parse `ffprobe -of csv=p=0:nk=0` output, one stream per line.
///
/// ffprobe only prints the tags a stream actually has, so language and title
/// are read by their `tag:` keys. Unkeyed fields are taken by position for the
/// leading index and codec only.
pub fn parse_probe_csv(output: &str) -> Vec<StreamDescriptor> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }

            let fields = split_csv_fields(line);
            if fields.len() < 3 {
                debug!("Skipping short probe line: {}", line);
                return None;
            }

            let mut index = None;
            let mut codec_name = String::new();
            let mut language = String::new();
            let mut title = String::new();

            for (position, field) in fields.iter().enumerate() {
                match field.split_once('=') {
                    Some(("index", value)) => index = value.trim().parse::<usize>().ok(),
                    Some(("codec_name", value)) => codec_name = unquote_csv(value),
                    Some(("tag:language", value)) => language = unquote_csv(value),
                    Some(("tag:title", value)) => title = unquote_csv(value),
                    Some((key, _)) if is_probe_key(key) => {}
                    _ => match position {
                        0 => index = field.trim().parse::<usize>().ok(),
                        1 => codec_name = unquote_csv(field),
                        _ => {}
                    },
                }
            }

            let Some(index) = index else {
                debug!("Skipping probe line without stream index: {}", line);
                return None;
            };
            Some(StreamDescriptor::new(index, &codec_name, &language, &title))
        })
        .collect()
}

fn is_probe_key(key: &str) -> bool {
    matches!(key, "codec_type" | "codec_tag_string") || key.starts_with("tag:")
}

/// Split on commas outside double quotes
fn split_csv_fields(line: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (offset, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(&line[start..offset]);
                start = offset + 1;
            }
            _ => {}
        }
    }
    fields.push(&line[start..]);
    fields
}

fn unquote_csv(field: &str) -> String {
    let field = field.trim();
    if field.len() >= 2 && field.starts_with('"') && field.ends_with('"') {
        field[1..field.len() - 1].replace("\"\"", "\"")
    } else {
        field.to_string()
    }
}

/// Scrape subtitle streams from the input summary of an ffmpeg log
pub fn parse_stream_log(log: &str) -> Vec<StreamDescriptor> {
    let mut streams = Vec::new();

    for line in log.lines() {
        let trimmed = line.trim_start();
        // Output and mapping sections repeat stream lines that are not inputs
        if trimmed.starts_with("Output #") || trimmed.starts_with("Stream mapping:") {
            break;
        }

        let (index, description) = if let Some(caps) = STREAM_WITH_LANGUAGE.captures(line) {
            (caps[2].parse::<usize>().ok(), caps[4].to_string())
        } else if let Some(caps) = STREAM_WITHOUT_LANGUAGE.captures(line) {
            (caps[2].parse::<usize>().ok(), caps[3].to_string())
        } else {
            continue;
        };

        let Some(index) = index else { continue };
        let codec = description
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .trim_end_matches(',');
        streams.push(StreamDescriptor::new(index, codec, UNKNOWN, ""));
    }

    streams
}

/// Lists subtitle streams through the media toolkit
pub struct StreamLister<'a> {
    runner: &'a dyn CommandRunner,
    builder: MediaCommandBuilder,
    probe_limit: usize,
}

impl<'a> StreamLister<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &ToolkitConfig) -> Self {
        Self {
            runner,
            builder: MediaCommandBuilder::new(config),
            probe_limit: config.probe_limit,
        }
    }

    /// Subtitle streams of `input_path` in discovery order.
    ///
    /// An empty vector means the container has no subtitles; `Err` means no
    /// strategy could run the toolkit at all.
    pub async fn list<P: AsRef<Path>>(&self, input_path: P) -> Result<Vec<StreamDescriptor>> {
        Ok(self.list_detailed(input_path).await?.streams)
    }

    /// Like [`list`](Self::list), also reporting which strategy succeeded
    pub async fn list_detailed<P: AsRef<Path>>(&self, input_path: P) -> Result<StreamListing> {
        let input_path = input_path.as_ref();
        info!("Listing subtitle streams in {}", input_path.display());

        let mut launched_any = false;
        let mut last_error = None;

        for strategy in [
            DetectionStrategy::StructuredQuery,
            DetectionStrategy::LogScrape,
            DetectionStrategy::ManualProbe,
        ] {
            let found = match strategy {
                DetectionStrategy::StructuredQuery => self.structured_query(input_path).await,
                DetectionStrategy::LogScrape => self.log_scrape(input_path).await,
                DetectionStrategy::ManualProbe => self.manual_probe(input_path).await,
            };

            match found {
                Ok(streams) if !streams.is_empty() => {
                    info!("Found {} subtitle stream(s) via {}", streams.len(), strategy);
                    return Ok(StreamListing {
                        strategy: Some(strategy),
                        streams: number_streams(streams),
                    });
                }
                Ok(_) => {
                    launched_any = true;
                    debug!("{} found no subtitle streams", strategy);
                }
                Err(e) => {
                    warn!("{} failed: {}", strategy, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !launched_any => Err(e),
            _ => {
                info!("No subtitle streams found in {}", input_path.display());
                Ok(StreamListing {
                    strategy: None,
                    streams: Vec::new(),
                })
            }
        }
    }

    async fn structured_query(&self, input_path: &Path) -> Result<Vec<StreamDescriptor>> {
        let command = self.builder.list_subtitle_streams(input_path);
        let output = self.runner.run(&command).await?;
        debug!("Structured query output:\n{}", output.stdout);

        if !output.success() {
            debug!("Structured query exited with {:?}: {}", output.status, output.stderr.trim());
            return Ok(Vec::new());
        }
        Ok(parse_probe_csv(&output.stdout))
    }

    async fn log_scrape(&self, input_path: &Path) -> Result<Vec<StreamDescriptor>> {
        let command = self.builder.dump_stream_info(input_path);
        // The exit status is irrelevant, only the printed summary matters
        let output = self.runner.run(&command).await?;
        Ok(parse_stream_log(&output.combined_log()))
    }

    async fn manual_probe(&self, input_path: &Path) -> Result<Vec<StreamDescriptor>> {
        let mut streams = Vec::new();

        for index in 0..self.probe_limit {
            let command = self.builder.probe_subtitle(input_path, index);
            let output = match self.runner.run(&command).await {
                Ok(output) => output,
                Err(e) if index == 0 => return Err(e),
                Err(e) => {
                    debug!("Stopping probe at sub-stream {}: {}", index, e);
                    break;
                }
            };

            // Sub-stream numbering is contiguous, so the first gap ends the scan
            if !output.success() {
                debug!("Sub-stream {} not present (exit {:?})", index, output.status);
                break;
            }

            streams.push(StreamDescriptor::new(
                index,
                UNKNOWN,
                UNKNOWN,
                &format!("Subtitle stream {} (auto-detected)", index),
            ));
        }

        Ok(streams)
    }
}

fn number_streams(streams: Vec<StreamDescriptor>) -> Vec<StreamDescriptor> {
    streams
        .into_iter()
        .enumerate()
        .map(|(position, mut stream)| {
            stream.relative_index = position;
            stream
        })
        .collect()
}

/// Resolve a 1-based stream number against a listing
pub fn select_stream(streams: &[StreamDescriptor], number: usize) -> Result<&StreamDescriptor> {
    if number == 0 || number > streams.len() {
        return Err(SubExtractError::InvalidSelection(format!(
            "stream {} is out of range, expected 1-{}",
            number,
            streams.len()
        )));
    }
    Ok(&streams[number - 1])
}
