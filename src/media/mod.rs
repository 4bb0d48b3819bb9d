// Toolkit process layer
//
// Everything that touches the ffmpeg/ffprobe executables goes through here:
// - Commands: command value objects and the builder for each invocation
// - Runner: the seam that executes a command and captures its output
//
// Higher layers (probe, lister, extractor) only build commands and inspect
// `CommandOutput`, so tests swap the runner for a mock or scripted fake.

pub mod commands;
pub mod runner;

pub use commands::*;
pub use runner::*;
