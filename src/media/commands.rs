use std::fmt;
use std::path::Path;

use crate::config::ToolkitConfig;

/// Abstract media processing command representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Suppress the build/configuration banner
    pub fn hide_banner(self) -> Self {
        self.arg("-hide_banner")
    }

    /// Set the tool's own log verbosity
    pub fn log_level<S: Into<String>>(self, level: S) -> Self {
        self.arg("-v").arg(level)
    }

    /// Select an input stream, e.g. `0:s:1` or `0:3`
    pub fn map<S: Into<String>>(self, selector: S) -> Self {
        self.arg("-map").arg(selector)
    }

    /// Set subtitle codec
    pub fn subtitle_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:s").arg(codec)
    }

    /// Copy every selected stream without re-encoding
    pub fn copy_all(self) -> Self {
        self.arg("-c").arg("copy")
    }

    /// Force the output container format
    pub fn format<S: Into<String>>(self, format: S) -> Self {
        self.arg("-f").arg(format)
    }

    /// Shift timestamps so the output starts at zero
    pub fn normalize_timestamps(self) -> Self {
        self.arg("-avoid_negative_ts").arg("make_zero")
    }

    /// Limit output duration in seconds
    pub fn duration(self, seconds: u32) -> Self {
        self.arg("-t").arg(seconds.to_string())
    }

    /// Discard all output
    pub fn null_output(self) -> Self {
        self.format("null").arg("-")
    }

    /// Last argument of the command line, which is the output target for
    /// every command this crate builds
    pub fn last_arg(&self) -> Option<&str> {
        self.args.last().map(String::as_str)
    }
}

impl fmt::Display for MediaCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.binary_path)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Builder for the toolkit invocations used by probing, listing and extraction
#[derive(Debug, Clone)]
pub struct MediaCommandBuilder {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new(config: &ToolkitConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            ffprobe_path: config.ffprobe_path.clone(),
        }
    }

    /// Build ffmpeg version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.ffmpeg_path, "Version check").arg("-version")
    }

    /// Build ffprobe version check command
    pub fn probe_version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.ffprobe_path, "ffprobe version check").arg("-version")
    }

    /// Build the structured subtitle stream query (one keyed CSV line per stream)
    pub fn list_subtitle_streams<P: AsRef<Path>>(&self, input_path: P) -> MediaCommand {
        MediaCommand::new(&self.ffprobe_path, "Subtitle stream query")
            .log_level("error")
            .args(["-select_streams", "s"])
            .args([
                "-show_entries",
                "stream=index,codec_name,codec_type,codec_tag_string:stream_tags=language,title",
            ])
            // Keyed fields, since absent tags are omitted rather than left empty
            .args(["-of", "csv=p=0:nk=0"])
            .output(input_path)
    }

    /// Build a no-output run whose log contains the input stream summary
    pub fn dump_stream_info<P: AsRef<Path>>(&self, input_path: P) -> MediaCommand {
        MediaCommand::new(&self.ffmpeg_path, "Stream info dump")
            .hide_banner()
            .input(input_path)
            .duration(0)
            .null_output()
    }

    /// Build a zero-duration extraction addressed at subtitle sub-stream `index`
    pub fn probe_subtitle<P: AsRef<Path>>(&self, input_path: P, index: usize) -> MediaCommand {
        MediaCommand::new(&self.ffmpeg_path, format!("Probe subtitle sub-stream {}", index))
            .log_level("error")
            .input(input_path)
            .map(format!("0:s:{}", index))
            .duration(0)
            .null_output()
    }

    /// Build custom ffmpeg command
    pub fn custom<S: Into<String>>(&self, description: S) -> MediaCommand {
        MediaCommand::new(&self.ffmpeg_path, description.into())
    }
}
