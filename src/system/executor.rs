// src/system/executor.rs

use crate::models::Action;
use anyhow::Result;
use async_trait::async_trait;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

/// Placeholder substituted with the action's target in an opener template.
pub const URL_PLACEHOLDER: &str = "{url}";

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Opener command could not be parsed: {0}")]
    CommandParse(String),
    #[error("No opener command configured.")]
    EmptyCommand,
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, std::io::Error),
    #[error("Command '{0}' exited with a non-zero error code.")]
    NonZeroExitStatus(String),
}

/// Receives the external actions triggered by selections.
///
/// Callers never await the outcome on the interaction path; the navigator runs
/// every dispatch as a detached task and only logs failures.
#[async_trait]
pub trait ActionSink: Send + Sync {
    async fn perform(&self, action: &Action) -> Result<()>;
}

/// Logs actions without performing them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl ActionSink for LogSink {
    async fn perform(&self, action: &Action) -> Result<()> {
        match action {
            Action::Nav { url } => log::info!("Navigate to {}", url),
            Action::Unsupported => log::info!("Ignoring unsupported action"),
        }
        Ok(())
    }
}

/// Opens navigation targets with an external command, e.g. `xdg-open {url}`.
#[derive(Debug, Clone)]
pub struct CommandSink {
    template: String,
}

impl CommandSink {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// The platform's usual "open this URL" command.
    pub fn platform_default() -> Self {
        if cfg!(target_os = "windows") {
            Self::new(r#"cmd /C start "" {url}"#)
        } else if cfg!(target_os = "macos") {
            Self::new("open {url}")
        } else {
            Self::new("xdg-open {url}")
        }
    }

    /// Splits the template into program and arguments, then substitutes the URL
    /// into each token. Splitting first keeps a URL with spaces or quotes as one argument.
    pub fn render(&self, url: &str) -> Result<Vec<String>, ExecutionError> {
        let parts = shlex::split(self.template.trim())
            .ok_or_else(|| ExecutionError::CommandParse(self.template.clone()))?;
        if parts.is_empty() {
            return Err(ExecutionError::EmptyCommand);
        }
        Ok(parts
            .into_iter()
            .map(|part| part.replace(URL_PLACEHOLDER, url))
            .collect())
    }

    async fn open(&self, url: &str) -> Result<(), ExecutionError> {
        let parts = self.render(url)?;
        let (program, args) = parts.split_first().ok_or(ExecutionError::EmptyCommand)?;
        let command_line = parts.join(" ");
        log::debug!("Running opener: {}", command_line);

        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| ExecutionError::CommandFailed(command_line.clone(), e))?;

        if !status.success() {
            return Err(ExecutionError::NonZeroExitStatus(command_line));
        }
        Ok(())
    }
}

#[async_trait]
impl ActionSink for CommandSink {
    async fn perform(&self, action: &Action) -> Result<()> {
        match action {
            Action::Nav { url } => Ok(self.open(url).await?),
            Action::Unsupported => {
                log::debug!("CommandSink ignores unsupported actions");
                Ok(())
            }
        }
    }
}
