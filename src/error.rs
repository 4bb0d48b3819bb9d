use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubExtractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Media toolkit unavailable: {0}")]
    ToolkitUnavailable(String),

    #[error("Failed to launch {program}: {reason}")]
    ToolLaunch { program: String, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No subtitle streams found in {0}")]
    NoStreamsFound(String),

    #[error("Extraction failed for subtitle stream {display_number}: all methods failed")]
    ExtractionFailed { display_number: usize },

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Failed to create output directory {}: {source}", path.display())]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SubExtractError>;
