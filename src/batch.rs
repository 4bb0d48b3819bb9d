use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::Config;
use crate::display;
use crate::error::{Result, SubExtractError};
use crate::extract::{self, SubtitleExtractor};
use crate::media::CommandRunner;
use crate::streams::{self, StreamLister, StreamListing};
use crate::toolkit;
use crate::validate::{self, ValidatedInput};

/// What the non-interactive run should do after listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    ListOnly,
    ExtractAll,
    /// 1-based stream number
    ExtractOne(usize),
    /// List, then continue in the interactive session
    Interactive,
}

#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub input: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub mode: BatchMode,
    /// Print the listing as JSON instead of a table
    pub json: bool,
}

/// How a batch run ended
#[derive(Debug)]
pub enum BatchReport {
    Listed { count: usize },
    Extracted { succeeded: usize, total: usize },
    /// Hand the validated file and its streams to the interactive session
    HandOff { input: ValidatedInput, listing: StreamListing },
}

/// Runs probe, validation, listing and extraction from command-line flags
pub struct BatchDriver<'a, W: Write> {
    runner: &'a dyn CommandRunner,
    config: &'a Config,
    out: W,
}

impl<'a, W: Write> BatchDriver<'a, W> {
    pub fn new(runner: &'a dyn CommandRunner, config: &'a Config, out: W) -> Self {
        Self { runner, config, out }
    }

    pub async fn run(&mut self, request: &BatchRequest) -> Result<BatchReport> {
        let status = toolkit::check_available(self.runner, &self.config.toolkit).await;
        if !status.available {
            return Err(SubExtractError::ToolkitUnavailable(format!(
                "could not run '{}'; install ffmpeg or pass --ffmpeg <path>",
                self.config.toolkit.ffmpeg_path
            )));
        }
        info!("Using ffmpeg {}", status.version);

        let input = validate::validate(&request.input)?;
        if !request.json {
            writeln!(
                self.out,
                "File: {} ({})",
                input.path.display(),
                input.display_size()
            )?;
        }

        let lister = StreamLister::new(self.runner, &self.config.toolkit);
        let listing = lister.list_detailed(&input.path).await?;
        if listing.streams.is_empty() {
            return Err(SubExtractError::NoStreamsFound(input.path.display().to_string()));
        }

        if request.json {
            serde_json::to_writer_pretty(&mut self.out, &listing)?;
            writeln!(self.out)?;
        } else {
            display::print_streams(&mut self.out, &listing)?;
        }

        match request.mode {
            BatchMode::ListOnly => Ok(BatchReport::Listed {
                count: listing.streams.len(),
            }),
            BatchMode::Interactive => Ok(BatchReport::HandOff { input, listing }),
            BatchMode::ExtractAll => {
                let output_dir = self.output_dir(request, &input.path)?;
                let numbered: Vec<usize> = (1..=listing.streams.len()).collect();
                self.extract_numbers(&input.path, &listing, &numbered, &output_dir)
                    .await
            }
            BatchMode::ExtractOne(number) => {
                streams::select_stream(&listing.streams, number)?;
                let output_dir = self.output_dir(request, &input.path)?;
                self.extract_numbers(&input.path, &listing, &[number], &output_dir)
                    .await
            }
        }
    }

    fn output_dir(&self, request: &BatchRequest, input_path: &Path) -> Result<PathBuf> {
        let dir = request
            .output_dir
            .clone()
            .or_else(|| self.config.output.directory.clone())
            .unwrap_or_else(|| extract::default_output_dir(input_path));
        extract::ensure_output_dir(dir)
    }

    async fn extract_numbers(
        &mut self,
        input_path: &Path,
        listing: &StreamListing,
        numbers: &[usize],
        output_dir: &Path,
    ) -> Result<BatchReport> {
        let extractor = SubtitleExtractor::new(self.runner, &self.config.toolkit);
        writeln!(self.out, "\nOutput directory: {}", output_dir.display())?;

        let mut succeeded = 0;
        for &number in numbers {
            let stream = streams::select_stream(&listing.streams, number)?;
            let spinner = display::extraction_spinner(format!(
                "Extracting stream {} ({})",
                number, stream.title
            ));
            let outcome = extractor.extract(input_path, stream, output_dir, number).await;
            spinner.finish_and_clear();

            display::print_outcome(&mut self.out, number, &outcome)?;
            match outcome.into_result(number) {
                Ok(_) => succeeded += 1,
                Err(e) => warn!("{}", e),
            }
        }

        if numbers.len() > 1 {
            display::print_summary(&mut self.out, succeeded, numbers.len())?;
        }
        info!("Extracted {}/{} subtitle stream(s)", succeeded, numbers.len());

        Ok(BatchReport::Extracted {
            succeeded,
            total: numbers.len(),
        })
    }
}
