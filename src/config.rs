use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, SubExtractError};

/// File looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "subextract.toml";

fn default_probe_limit() -> usize {
    10
}

fn default_invalid_input_pause_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub toolkit: ToolkitConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolkitConfig {
    /// Path to ffmpeg binary
    pub ffmpeg_path: String,
    /// Path to ffprobe binary
    pub ffprobe_path: String,
    /// Highest subtitle sub-stream index (exclusive) tried by manual probing
    #[serde(default = "default_probe_limit")]
    pub probe_limit: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory; defaults to the directory of the input file
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for the rolling log file; no file logging when unset
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Pause before re-displaying a menu after invalid input
    #[serde(default = "default_invalid_input_pause_ms")]
    pub invalid_input_pause_ms: u64,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            probe_limit: default_probe_limit(),
        }
    }
}

impl ToolkitConfig {
    /// Point at a user-supplied ffmpeg executable.
    ///
    /// ffprobe is assumed to live next to it; a bare program name leaves
    /// ffprobe to be resolved through `PATH`.
    pub fn with_ffmpeg_override<P: AsRef<Path>>(&self, ffmpeg: P) -> Self {
        let ffmpeg = ffmpeg.as_ref();
        let ffprobe_name = if cfg!(windows) { "ffprobe.exe" } else { "ffprobe" };
        let ffprobe_path = match ffmpeg.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                dir.join(ffprobe_name).to_string_lossy().to_string()
            }
            _ => self.ffprobe_path.clone(),
        };

        Self {
            ffmpeg_path: ffmpeg.to_string_lossy().to_string(),
            ffprobe_path,
            probe_limit: self.probe_limit,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            invalid_input_pause_ms: default_invalid_input_pause_ms(),
        }
    }
}

impl SessionConfig {
    pub fn invalid_input_pause(&self) -> Duration {
        Duration::from_millis(self.invalid_input_pause_ms)
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubExtractError::Config(format!("Failed to read config file: {}", e)))?;

        Ok(toml::from_str(&content)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubExtractError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SubExtractError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}
