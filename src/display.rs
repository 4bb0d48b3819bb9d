use std::io::{self, Write};
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::extract::ExtractionOutcome;
use crate::streams::{StreamDescriptor, StreamListing};
use crate::validate::format_size;

/// Numbered table of the streams in a listing
pub fn print_streams<W: Write>(out: &mut W, listing: &StreamListing) -> io::Result<()> {
    let count = listing.streams.len();
    match listing.strategy {
        Some(strategy) => writeln!(
            out,
            "\n{} {} subtitle stream(s) (via {}):",
            "Found".green().bold(),
            count,
            strategy
        )?,
        None => writeln!(out, "\n{} no subtitle streams", "Found".yellow().bold())?,
    }

    if count == 0 {
        return Ok(());
    }

    writeln!(out, "{:<4} {:<8} {:<20} {:<10} {}", "#", "Stream", "Codec", "Language", "Title")?;
    writeln!(out, "{}", "-".repeat(70))?;
    for (position, stream) in listing.streams.iter().enumerate() {
        print_stream_row(out, position + 1, stream)?;
    }
    Ok(())
}

fn print_stream_row<W: Write>(
    out: &mut W,
    number: usize,
    stream: &StreamDescriptor,
) -> io::Result<()> {
    writeln!(
        out,
        "{:<4} {:<8} {:<20} {:<10} {}",
        number, stream.index, stream.codec_name, stream.language, stream.title
    )
}

/// One line per finished extraction
pub fn print_outcome<W: Write>(
    out: &mut W,
    display_number: usize,
    outcome: &ExtractionOutcome,
) -> io::Result<()> {
    if outcome.success {
        writeln!(
            out,
            "{} stream {} -> {} ({})",
            "saved".green().bold(),
            display_number,
            outcome.output_path.display(),
            format_size(outcome.size_bytes)
        )
    } else {
        writeln!(
            out,
            "{} stream {}: all extraction methods failed \
             (image-based subtitles cannot be converted to SRT)",
            "failed".red().bold(),
            display_number
        )
    }
}

/// `{succeeded}/{total}` line after extracting several streams
pub fn print_summary<W: Write>(out: &mut W, succeeded: usize, total: usize) -> io::Result<()> {
    let summary = format!("{}/{}", succeeded, total);
    let summary = if succeeded == total {
        summary.green().bold()
    } else {
        summary.yellow().bold()
    };
    writeln!(out, "\nExtracted {} subtitle stream(s)", summary)
}

pub fn print_warning<W: Write>(out: &mut W, message: &str) -> io::Result<()> {
    writeln!(out, "{} {}", "warning:".yellow().bold(), message)
}

pub fn print_error<W: Write>(out: &mut W, message: &str) -> io::Result<()> {
    writeln!(out, "{} {}", "error:".red().bold(), message)
}

/// Spinner shown on stderr while an extraction subprocess runs
pub fn extraction_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let template = "{spinner:.green} [{elapsed}] {msg}";
    if let Ok(style) = ProgressStyle::default_spinner().template(template) {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streams::DetectionStrategy;
    use std::path::PathBuf;

    fn render<F: FnOnce(&mut Vec<u8>) -> io::Result<()>>(f: F) -> String {
        colored::control::set_override(false);
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_print_streams_table() {
        let listing = StreamListing {
            strategy: Some(DetectionStrategy::StructuredQuery),
            streams: vec![StreamDescriptor {
                index: 2,
                relative_index: 0,
                codec_name: "subrip".to_string(),
                language: "eng".to_string(),
                title: "English".to_string(),
            }],
        };

        let text = render(|out| print_streams(out, &listing));
        assert!(text.contains("Found 1 subtitle stream(s) (via structured query)"));
        assert!(text.contains("subrip"));
        assert!(text.contains("English"));
    }

    #[test]
    fn test_print_outcome_and_summary() {
        let outcome = ExtractionOutcome {
            success: true,
            output_path: PathBuf::from("out/movie_subtitle_1_eng.srt"),
            size_bytes: 2048,
            variant: None,
        };
        let text = render(|out| {
            print_outcome(out, 1, &outcome)?;
            print_summary(out, 1, 2)
        });
        assert!(text.contains("movie_subtitle_1_eng.srt (2.00 KB)"));
        assert!(text.contains("Extracted 1/2 subtitle stream(s)"));
    }
}
