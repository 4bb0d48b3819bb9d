//! Menu-driven interactive session.
//!
//! The session is a state machine over blocking line prompts. Every failure
//! is reported and leads back to a menu; only the explicit exit choice (or
//! the end of input) leaves the loop.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use colored::Colorize;
use tracing::{debug, info};

use crate::config::Config;
use crate::display;
use crate::error::Result;
use crate::extract::{self, SubtitleExtractor};
use crate::media::CommandRunner;
use crate::picker::{self, PathPicker};
use crate::streams::{self, StreamLister, StreamListing};
use crate::toolkit;
use crate::validate::{self, ValidatedInput};

/// Which streams to extract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    All,
    /// 1-based stream number
    One(usize),
}

#[derive(Debug, Clone)]
struct LoadedFile {
    input: ValidatedInput,
    listing: StreamListing,
}

#[derive(Debug)]
enum State {
    MainMenu,
    FileSelection,
    ManualPathEntry,
    Validation(PathBuf),
    StreamListing(ValidatedInput),
    ExtractionMenu(LoadedFile),
    OutputDirSelection(LoadedFile, Selection),
    Extracting(LoadedFile, Selection, PathBuf),
    Exit,
}

/// Extraction counts over the whole session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub attempted: usize,
    pub succeeded: usize,
}

pub struct Session<'a, R: BufRead, W: Write> {
    runner: &'a dyn CommandRunner,
    config: Config,
    picker: Option<Box<dyn PathPicker + 'a>>,
    input: R,
    out: W,
    working_dir: PathBuf,
    pause: Duration,
    stats: SessionStats,
}

impl<'a, R: BufRead, W: Write> Session<'a, R, W> {
    pub fn new(runner: &'a dyn CommandRunner, config: Config, input: R, out: W) -> Self {
        let pause = config.session.invalid_input_pause();
        Self {
            runner,
            config,
            picker: None,
            input,
            out,
            working_dir: PathBuf::from("."),
            pause,
            stats: SessionStats::default(),
        }
    }

    /// Use `picker` for file and folder selection instead of the text fallbacks
    pub fn with_picker(mut self, picker: Box<dyn PathPicker + 'a>) -> Self {
        self.picker = Some(picker);
        self
    }

    /// Directory offered first when browsing for videos
    pub fn with_working_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.working_dir = dir.into();
        self
    }

    /// Effective configuration, including any ffmpeg path entered during the session
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Verify the toolkit, then run from the main menu until the user exits
    pub async fn run(&mut self) -> Result<()> {
        if !self.ensure_toolkit().await? {
            return Ok(());
        }
        self.run_from(State::MainMenu).await
    }

    /// Continue with a file that was already validated and listed
    pub async fn run_with_file(
        &mut self,
        input: ValidatedInput,
        listing: StreamListing,
    ) -> Result<()> {
        self.run_from(State::ExtractionMenu(LoadedFile { input, listing })).await
    }

    async fn run_from(&mut self, start: State) -> Result<()> {
        let mut state = start;
        loop {
            debug!("Session state: {:?}", state);
            state = match state {
                State::Exit => break,
                State::MainMenu => self.main_menu().await?,
                State::FileSelection => self.file_selection().await?,
                State::ManualPathEntry => self.manual_path_entry()?,
                State::Validation(path) => self.validation(path)?,
                State::StreamListing(input) => self.stream_listing(input).await?,
                State::ExtractionMenu(loaded) => self.extraction_menu(loaded).await?,
                State::OutputDirSelection(loaded, selection) => {
                    self.output_dir_selection(loaded, selection).await?
                }
                State::Extracting(loaded, selection, output_dir) => {
                    self.extracting(loaded, selection, output_dir).await?
                }
            };
        }

        writeln!(self.out, "Goodbye.")?;
        info!(
            "Session finished: {}/{} extraction(s) succeeded",
            self.stats.succeeded, self.stats.attempted
        );
        Ok(())
    }

    /// Probe ffmpeg, asking for its path until it works. `false` means the user gave up.
    async fn ensure_toolkit(&mut self) -> Result<bool> {
        loop {
            let status = toolkit::check_available(self.runner, &self.config.toolkit).await;
            if status.available {
                writeln!(self.out, "{} ffmpeg {}", "ready".green().bold(), status.version)?;
                if !status.ffprobe_available {
                    display::print_warning(
                        &mut self.out,
                        "ffprobe not found, stream detection falls back to log scanning",
                    )?;
                }
                return Ok(true);
            }

            display::print_error(
                &mut self.out,
                &format!("ffmpeg could not be run from '{}'", self.config.toolkit.ffmpeg_path),
            )?;
            let answer = self.prompt("Path to the ffmpeg executable (empty to quit): ")?;
            let Some(answer) = answer else {
                return Ok(false);
            };
            let answer = clean_path_input(&answer);
            if answer.is_empty() {
                return Ok(false);
            }
            self.config.toolkit = self.config.toolkit.with_ffmpeg_override(answer);
            info!("Retrying with ffmpeg at {}", self.config.toolkit.ffmpeg_path);
        }
    }

    async fn main_menu(&mut self) -> Result<State> {
        writeln!(self.out, "\n{}", "=== Subtitle Extractor ===".cyan().bold())?;
        let select_label = if self.picker.is_some() {
            "Select a video file"
        } else {
            "Browse for a video file"
        };
        writeln!(self.out, "1. {}", select_label)?;
        writeln!(self.out, "2. Enter a file path")?;
        writeln!(self.out, "3. Exit")?;

        let Some(choice) = self.prompt("Choice: ")? else {
            return Ok(State::Exit);
        };
        match choice.trim() {
            "1" => Ok(State::FileSelection),
            "2" => Ok(State::ManualPathEntry),
            "3" | "q" | "Q" => Ok(State::Exit),
            other => {
                self.invalid_choice(other).await?;
                Ok(State::MainMenu)
            }
        }
    }

    async fn file_selection(&mut self) -> Result<State> {
        let start_dir = self.working_dir.clone();
        if let Some(picker) = self.picker.as_mut() {
            return match picker.pick_file(&start_dir) {
                Some(path) => Ok(State::Validation(path)),
                None => {
                    writeln!(self.out, "No file selected.")?;
                    Ok(State::MainMenu)
                }
            };
        }

        let videos = picker::find_videos(&start_dir);
        if videos.is_empty() {
            display::print_warning(
                &mut self.out,
                &format!("no video files found in {}", start_dir.display()),
            )?;
            return Ok(State::MainMenu);
        }

        writeln!(self.out, "\nVideo files in {}:", start_dir.display())?;
        for (position, path) in videos.iter().enumerate() {
            let name = path.file_name().unwrap_or(path.as_os_str()).to_string_lossy();
            writeln!(self.out, "{}. {}", position + 1, name)?;
        }
        writeln!(self.out, "0. Back")?;

        let Some(choice) = self.prompt("File number: ")? else {
            return Ok(State::Exit);
        };
        match choice.trim().parse::<usize>() {
            Ok(0) => Ok(State::MainMenu),
            Ok(n) if n <= videos.len() => Ok(State::Validation(videos[n - 1].clone())),
            _ => {
                self.invalid_choice(choice.trim()).await?;
                Ok(State::FileSelection)
            }
        }
    }

    fn manual_path_entry(&mut self) -> Result<State> {
        let Some(answer) = self.prompt("Path to the video file (empty to go back): ")? else {
            return Ok(State::Exit);
        };
        let answer = clean_path_input(&answer);
        if answer.is_empty() {
            return Ok(State::MainMenu);
        }
        Ok(State::Validation(PathBuf::from(answer)))
    }

    fn validation(&mut self, path: PathBuf) -> Result<State> {
        match validate::validate(&path) {
            Ok(input) => {
                writeln!(self.out, "File: {} ({})", input.path.display(), input.display_size())?;
                Ok(State::StreamListing(input))
            }
            Err(e) => {
                display::print_error(&mut self.out, &e.to_string())?;
                Ok(State::MainMenu)
            }
        }
    }

    async fn stream_listing(&mut self, input: ValidatedInput) -> Result<State> {
        writeln!(self.out, "Scanning for subtitle streams...")?;
        let lister = StreamLister::new(self.runner, &self.config.toolkit);

        match lister.list_detailed(&input.path).await {
            Ok(listing) if listing.streams.is_empty() => {
                display::print_warning(
                    &mut self.out,
                    &format!("no subtitle streams found in {}", input.path.display()),
                )?;
                Ok(State::MainMenu)
            }
            Ok(listing) => {
                display::print_streams(&mut self.out, &listing)?;
                Ok(State::ExtractionMenu(LoadedFile { input, listing }))
            }
            Err(e) => {
                display::print_error(&mut self.out, &e.to_string())?;
                Ok(State::MainMenu)
            }
        }
    }

    async fn extraction_menu(&mut self, loaded: LoadedFile) -> Result<State> {
        let count = loaded.listing.streams.len();
        writeln!(self.out, "\n1. Extract all {} stream(s)", count)?;
        writeln!(self.out, "2. Extract one stream")?;
        writeln!(self.out, "3. Return to main menu")?;

        let Some(choice) = self.prompt("Choice: ")? else {
            return Ok(State::Exit);
        };
        match choice.trim() {
            "1" => Ok(State::OutputDirSelection(loaded, Selection::All)),
            "2" => {
                let Some(answer) = self.prompt(&format!("Stream number (1-{}): ", count))? else {
                    return Ok(State::Exit);
                };
                let number = answer.trim().parse::<usize>().unwrap_or(0);
                let checked = streams::select_stream(&loaded.listing.streams, number).map(|_| ());
                match checked {
                    Ok(_) => Ok(State::OutputDirSelection(loaded, Selection::One(number))),
                    Err(e) => {
                        display::print_error(&mut self.out, &e.to_string())?;
                        self.pause().await;
                        Ok(State::ExtractionMenu(loaded))
                    }
                }
            }
            "3" => Ok(State::MainMenu),
            other => {
                self.invalid_choice(other).await?;
                Ok(State::ExtractionMenu(loaded))
            }
        }
    }

    async fn output_dir_selection(
        &mut self,
        loaded: LoadedFile,
        selection: Selection,
    ) -> Result<State> {
        let default_dir = self
            .config
            .output
            .directory
            .clone()
            .unwrap_or_else(|| extract::default_output_dir(&loaded.input.path));

        writeln!(self.out, "\nOutput folder:")?;
        writeln!(self.out, "1. {}", default_dir.display())?;
        writeln!(self.out, "2. Choose another folder")?;
        writeln!(self.out, "3. Back")?;

        let Some(choice) = self.prompt("Choice: ")? else {
            return Ok(State::Exit);
        };
        let chosen = match choice.trim() {
            "1" => default_dir,
            "2" => match self.choose_directory(&default_dir)? {
                Some(dir) => dir,
                None => return Ok(State::OutputDirSelection(loaded, selection)),
            },
            "3" => return Ok(State::ExtractionMenu(loaded)),
            other => {
                self.invalid_choice(other).await?;
                return Ok(State::OutputDirSelection(loaded, selection));
            }
        };

        match extract::ensure_output_dir(&chosen) {
            Ok(dir) => Ok(State::Extracting(loaded, selection, dir)),
            Err(e) => {
                display::print_error(&mut self.out, &e.to_string())?;
                Ok(State::MainMenu)
            }
        }
    }

    fn choose_directory(&mut self, start_dir: &Path) -> Result<Option<PathBuf>> {
        if let Some(picker) = self.picker.as_mut() {
            let picked = picker.pick_directory(start_dir);
            if picked.is_none() {
                writeln!(self.out, "No folder selected.")?;
            }
            return Ok(picked);
        }

        let answer = self.prompt("Output folder path (empty to go back): ")?.unwrap_or_default();
        let answer = clean_path_input(&answer);
        if answer.is_empty() {
            return Ok(None);
        }
        Ok(Some(PathBuf::from(answer)))
    }

    async fn extracting(
        &mut self,
        loaded: LoadedFile,
        selection: Selection,
        output_dir: PathBuf,
    ) -> Result<State> {
        let numbers: Vec<usize> = match selection {
            Selection::All => (1..=loaded.listing.streams.len()).collect(),
            Selection::One(number) => vec![number],
        };
        writeln!(self.out, "\nOutput directory: {}", output_dir.display())?;

        let extractor = SubtitleExtractor::new(self.runner, &self.config.toolkit);
        let mut succeeded = 0;
        for &number in &numbers {
            let stream = &loaded.listing.streams[number - 1];
            let spinner = display::extraction_spinner(format!(
                "Extracting stream {} ({})",
                number, stream.title
            ));
            let outcome = extractor
                .extract(&loaded.input.path, stream, &output_dir, number)
                .await;
            spinner.finish_and_clear();

            display::print_outcome(&mut self.out, number, &outcome)?;
            self.stats.attempted += 1;
            if outcome.success {
                succeeded += 1;
                self.stats.succeeded += 1;
            }
        }

        if numbers.len() > 1 {
            display::print_summary(&mut self.out, succeeded, numbers.len())?;
        }
        Ok(State::MainMenu)
    }

    /// Print `text` and read one line; `None` at end of input
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.out, "{}", text)?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            debug!("End of input");
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    async fn invalid_choice(&mut self, choice: &str) -> Result<()> {
        display::print_error(&mut self.out, &format!("invalid choice '{}'", choice))?;
        self.pause().await;
        Ok(())
    }

    async fn pause(&self) {
        if !self.pause.is_zero() {
            tokio::time::sleep(self.pause).await;
        }
    }
}

/// Trim whitespace and the quotes terminals add around dragged-in paths
fn clean_path_input(answer: &str) -> String {
    answer
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_path_input() {
        assert_eq!(clean_path_input("  \"/tmp/My Movie.mkv\" \n"), "/tmp/My Movie.mkv");
        assert_eq!(clean_path_input("'/tmp/a.mp4'"), "/tmp/a.mp4");
        assert_eq!(clean_path_input("   "), "");
    }
}
