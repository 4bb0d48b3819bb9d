use clap::Parser;
use std::path::PathBuf;

use crate::batch::{BatchMode, BatchRequest};
use crate::config::Config;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Input video file
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output directory for extracted subtitles (default: next to the input)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Extract one stream by its number in the listing (1-based)
    #[arg(short, long, value_name = "N", requires = "input", conflicts_with_all = ["list", "all"])]
    pub stream: Option<usize>,

    /// Only list subtitle streams
    #[arg(short, long, requires = "input", conflicts_with = "all")]
    pub list: bool,

    /// Extract every subtitle stream
    #[arg(short, long, requires = "input")]
    pub all: bool,

    /// Use the interactive menu
    #[arg(long, conflicts_with_all = ["list", "all", "stream"])]
    pub interactive: bool,

    /// Path to the ffmpeg executable
    #[arg(long, value_name = "PATH")]
    pub ffmpeg: Option<PathBuf>,

    /// Path to the ffprobe executable
    #[arg(long, value_name = "PATH")]
    pub ffprobe: Option<PathBuf>,

    /// Print the stream listing as JSON
    #[arg(long, requires = "list")]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,

    /// Directory for log files
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

/// Top-level dispatch decided from the flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Full interactive session starting at the main menu
    Interactive,
    Batch(BatchMode),
}

impl Args {
    pub fn run_mode(&self) -> RunMode {
        if self.input.is_none() {
            return RunMode::Interactive;
        }

        let mode = if self.list {
            BatchMode::ListOnly
        } else if self.all {
            BatchMode::ExtractAll
        } else if let Some(number) = self.stream {
            BatchMode::ExtractOne(number)
        } else {
            BatchMode::Interactive
        };
        RunMode::Batch(mode)
    }

    /// Batch request for the given input, if one was passed
    pub fn batch_request(&self) -> Option<BatchRequest> {
        let RunMode::Batch(mode) = self.run_mode() else {
            return None;
        };
        Some(BatchRequest {
            input: self.input.clone()?,
            output_dir: self.output_dir.clone(),
            mode,
            json: self.json,
        })
    }

    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(ffmpeg) = &self.ffmpeg {
            config.toolkit = config.toolkit.with_ffmpeg_override(ffmpeg);
        }
        if let Some(ffprobe) = &self.ffprobe {
            config.toolkit.ffprobe_path = ffprobe.to_string_lossy().to_string();
        }
        if let Some(dir) = &self.output_dir {
            config.output.directory = Some(dir.clone());
        }
        if let Some(dir) = &self.log_dir {
            config.logging.directory = Some(dir.clone());
        }
    }
}
