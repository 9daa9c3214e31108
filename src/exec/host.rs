//! Native host command execution.
//!
//! Executes commands directly on the host system using `tokio::process::Command`.

use super::{CommandLine, CommandOutput, CommandRunner, ExecError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Executes commands directly on the host system
#[derive(Debug, Clone)]
pub struct HostRunner;

impl HostRunner {
    /// Create a new host runner
    pub fn new() -> Self {
        Self
    }
}

impl Default for HostRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for HostRunner {
    async fn run(&self, command: CommandLine) -> Result<CommandOutput> {
        let rendered = command.rendered();
        debug!("running the following: {:?}", rendered);

        let mut process = if command.shell {
            let mut process = Command::new("sh");
            process.arg("-c").arg(&command.program);
            process
        } else {
            let mut process = Command::new(&command.program);
            process.args(&command.args);
            process
        };
        if let Some(ref dir) = command.cwd {
            process.current_dir(dir);
        }
        process.stdin(Stdio::null());

        let output = process.output().await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ExecError::NotFound {
                    program: command.program.clone(),
                    source,
                }
            } else {
                ExecError::Io {
                    command: rendered.clone(),
                    source,
                }
            }
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let exit_code = output.status.code().unwrap_or(-1);
        if exit_code != 0 {
            return Err(ExecError::Failed {
                command: rendered,
                code: exit_code,
                output: format!("{}{}", stdout, stderr),
            });
        }

        debug!("command {:?} succeeded: {:?}", rendered, stdout);
        Ok(CommandOutput {
            command: command.argv(),
            exit_code,
            stdout,
            stderr,
        })
    }
}
