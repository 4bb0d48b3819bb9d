use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, SubExtractError};
use super::MediaCommand;

/// Captured result of one finished toolkit invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// stderr followed by stdout, the order ffmpeg writes its stream summary in
    pub fn combined_log(&self) -> String {
        let mut log = String::with_capacity(self.stderr.len() + self.stdout.len() + 1);
        log.push_str(&self.stderr);
        if !self.stdout.is_empty() {
            log.push('\n');
            log.push_str(&self.stdout);
        }
        log
    }
}

/// Runs toolkit commands to completion.
///
/// `Err` means the program could not be launched at all; a non-zero exit is
/// an `Ok` output whose `success()` is false.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &MediaCommand) -> Result<CommandOutput>;
}

/// Runs commands as real subprocesses
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, command: &MediaCommand) -> Result<CommandOutput> {
        debug!("Executing media processing command: {}", command);
        debug!("Description: {}", command.description);

        let output = Command::new(&command.binary_path)
            .args(&command.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| SubExtractError::ToolLaunch {
                program: command.binary_path.clone(),
                reason: e.to_string(),
            })?;

        let output = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        debug!("{} exited with {:?}", command.description, output.status);

        Ok(output)
    }
}
