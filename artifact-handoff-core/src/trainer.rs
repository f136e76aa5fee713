//! Launching the external trainer that fills the output directory.
//!
//! Training itself happens in another toolkit; this only runs its command
//! line and waits for it to exit.

use std::path::PathBuf;
use std::process::{Command, ExitStatus};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    /// Run the command line through `sh -c`. On unless the config or
    /// `--no-shell` turns it off.
    #[serde(default = "default_use_shell")]
    pub use_shell: bool,
}

fn default_use_shell() -> bool {
    true
}

impl TrainerConfig {
    /// Command line as handed to the shell, each argument single-quoted.
    pub fn shell_line(&self) -> String {
        std::iter::once(self.command.clone())
            .chain(self.args.iter().map(|a| shell_quote(a)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', r"'\''"))
}

#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("failed to launch trainer `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("trainer `{command}` exited with {status}")]
    Exit { command: String, status: ExitStatus },
}

#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
pub trait Trainer: Send + Sync {
    /// Run training to completion. On success the output directory holds at
    /// most one new artifact.
    fn train(&self, config: &TrainerConfig) -> Result<(), TrainerError>;
}

/// Runs the trainer as a child process, inheriting stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandTrainer;

impl Trainer for CommandTrainer {
    fn train(&self, config: &TrainerConfig) -> Result<(), TrainerError> {
        let mut command = if config.use_shell {
            info!("Using shell=true when running the trainer");
            let mut c = Command::new("sh");
            c.arg("-c").arg(config.shell_line());
            c
        } else {
            let mut c = Command::new(&config.command);
            c.args(&config.args);
            c
        };
        if let Some(dir) = &config.working_dir {
            command.current_dir(dir);
        }

        info!(command = %config.command, args = ?config.args, "Launching trainer");
        let status = command.status().map_err(|e| {
            error!(error = ?e, command = %config.command, "Failed to launch trainer");
            TrainerError::Spawn {
                command: config.command.clone(),
                source: e,
            }
        })?;

        if status.success() {
            info!(command = %config.command, "Trainer finished");
            Ok(())
        } else {
            error!(command = %config.command, status = %status, "Trainer exited unsuccessfully");
            Err(TrainerError::Exit {
                command: config.command.clone(),
                status,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(command: &str, args: &[&str], use_shell: bool) -> TrainerConfig {
        TrainerConfig {
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            working_dir: None,
            use_shell,
        }
    }

    #[test]
    fn shell_line_quotes_arguments() {
        let c = config("accelerate", &["launch", "it's.py"], true);
        assert_eq!(c.shell_line(), r"accelerate 'launch' 'it'\''s.py'");
    }

    #[cfg(unix)]
    #[test]
    fn successful_command_is_ok() {
        assert!(CommandTrainer.train(&config("true", &[], false)).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn shell_exit_code_is_reported() {
        let err = CommandTrainer
            .train(&config("exit", &["3"], true))
            .unwrap_err();
        match err {
            TrainerError::Exit { status, .. } => assert_eq!(status.code(), Some(3)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let err = CommandTrainer
            .train(&config("definitely-not-a-trainer-binary", &[], false))
            .unwrap_err();
        assert!(matches!(err, TrainerError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn working_dir_is_honoured() {
        let tmp = std::env::temp_dir();
        let mut c = config("test", &["-d", "."], false);
        c.working_dir = Some(tmp);
        assert!(CommandTrainer.train(&c).is_ok());
    }
}
