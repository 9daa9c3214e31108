//! # Command Execution Layer
//!
//! Runs external programs with argument-vector semantics and turns non-zero
//! exits into structured failures carrying the command line and its combined
//! output. Everything in the operator that shells out goes through the
//! [`CommandRunner`] trait, so the layers above stay mockable.
//!
//! ## Core Components
//!
//! - **[`CommandLine`]**: command specification with arguments, optional
//!   working directory and explicit shell opt-in
//! - **[`CommandOutput`]**: capture of a successful run (argv, exit code,
//!   stdout, stderr)
//! - **[`HostRunner`]**: production runner backed by `tokio::process::Command`
//!
//! ## Example
//!
//! ```rust,no_run
//! use jujushell_operator::exec::{CommandLine, CommandRunner, HostRunner};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runner = HostRunner::new();
//!     let output = runner.run(CommandLine::new("echo").arg("hello")).await?;
//!     println!("{}", output.stdout);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use std::borrow::Cow;
use std::path::PathBuf;

/// Host-based command execution.
///
/// Implements [`HostRunner`] for direct process execution on the
/// host system using `tokio::process::Command`.
pub mod host;

#[cfg(test)]
pub(crate) mod testing;

pub use host::HostRunner;

/// Specification of an external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// Program to execute, or the full script when `shell` is set
    pub program: String,
    /// Command line arguments
    pub args: Vec<String>,
    /// Run the program field through `sh -c` instead of spawning it directly
    pub shell: bool,
    /// Working directory for the spawned process
    pub cwd: Option<PathBuf>,
}

impl CommandLine {
    /// Create a command invoking `program` directly.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            shell: false,
            cwd: None,
        }
    }

    /// Create a command running `script` through `sh -c`.
    ///
    /// Only the LXD preseed here-document needs this.
    pub fn shell(script: impl Into<String>) -> Self {
        Self {
            program: script.into(),
            args: Vec::new(),
            shell: true,
            cwd: None,
        }
    }

    /// Append a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory of the spawned process.
    pub fn with_current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// The argument vector as actually executed.
    pub fn argv(&self) -> Vec<String> {
        if self.shell {
            vec!["sh".to_string(), "-c".to_string(), self.program.clone()]
        } else {
            let mut argv = Vec::with_capacity(self.args.len() + 1);
            argv.push(self.program.clone());
            argv.extend(self.args.iter().cloned());
            argv
        }
    }

    /// Shell-quoted rendering of the command, for logs and error messages.
    pub fn rendered(&self) -> String {
        if self.shell {
            return self.program.clone();
        }
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|part| shell_escape::escape(Cow::from(part.as_str())).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Capture of a successful command run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// The argument vector that was executed
    pub command: Vec<String>,
    /// Exit code reported by the process
    pub exit_code: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Concatenated stdout and stderr, in that order.
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// Errors from command execution.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The program does not exist on this host
    #[error("command {program:?} not found: {source}")]
    NotFound {
        /// Program that could not be spawned
        program: String,
        /// Underlying spawn error
        #[source]
        source: std::io::Error,
    },

    /// The process ran but exited with a non-zero code
    #[error("command {command:?} failed with exit code {code}: {output:?}")]
    Failed {
        /// Shell-quoted rendering of the command line
        command: String,
        /// Exit code, -1 when the process died to a signal
        code: i32,
        /// Concatenated stdout and stderr
        output: String,
    },

    /// Spawning or reading the process failed for another reason
    #[error("command {command:?} could not be run: {source}")]
    Io {
        /// Shell-quoted rendering of the command line
        command: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, ExecError>;

/// Executes external commands.
///
/// The production implementation is [`HostRunner`]; tests substitute
/// scripted runners to observe the issued commands.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion, capturing its output.
    ///
    /// A non-zero exit code is reported as [`ExecError::Failed`].
    async fn run(&self, command: CommandLine) -> Result<CommandOutput>;
}
