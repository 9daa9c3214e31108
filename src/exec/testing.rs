//! Scripted command runner shared by unit tests.

use super::{CommandLine, CommandOutput, CommandRunner, ExecError, Result};
use async_trait::async_trait;
use std::sync::Mutex;

type Script = dyn Fn(&CommandLine) -> Result<CommandOutput> + Send + Sync;

/// Runner answering from a canned script while recording every call.
pub(crate) struct ScriptedRunner {
    calls: Mutex<Vec<CommandLine>>,
    script: Box<Script>,
}

impl ScriptedRunner {
    pub(crate) fn new(
        script: impl Fn(&CommandLine) -> Result<CommandOutput> + Send + Sync + 'static,
    ) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            script: Box::new(script),
        }
    }

    /// Runner reporting success with empty output for every command.
    pub(crate) fn ok() -> Self {
        Self::new(|command| Ok(success(command, "")))
    }

    /// Runner reporting success with the given stdout for every command.
    pub(crate) fn with_stdout(stdout: &str) -> Self {
        let stdout = stdout.to_string();
        Self::new(move |command| Ok(success(command, &stdout)))
    }

    pub(crate) fn calls(&self) -> Vec<CommandLine> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn rendered_calls(&self) -> Vec<String> {
        self.calls().iter().map(CommandLine::rendered).collect()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: CommandLine) -> Result<CommandOutput> {
        let response = (self.script)(&command);
        self.calls.lock().unwrap().push(command);
        response
    }
}

/// Successful output for `command` with canned stdout.
pub(crate) fn success(command: &CommandLine, stdout: &str) -> CommandOutput {
    CommandOutput {
        command: command.argv(),
        exit_code: 0,
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

/// The failure a non-zero exit of `command` would produce.
pub(crate) fn failure(command: &CommandLine, code: i32, output: &str) -> ExecError {
    ExecError::Failed {
        command: command.rendered(),
        code,
        output: output.to_string(),
    }
}
