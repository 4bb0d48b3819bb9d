//! subextract - Embedded Subtitle Extraction
//!
//! Finds subtitle streams inside video containers and extracts them to SRT
//! files by driving ffmpeg and ffprobe as subprocesses.

pub mod batch;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod extract;
pub mod media;
pub mod picker;
pub mod session;
pub mod streams;
pub mod toolkit;
pub mod validate;
