//! Juju hook tool invocations.
//!
//! Hook tools are plain executables the agent puts on the PATH while a
//! hook runs. The operator shells out to them like any other command.

use crate::exec::{self, CommandLine, CommandRunner};
use tracing::warn;

/// Workload status reported to the Juju controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The operator is working on the unit
    Maintenance,
    /// The workload is up and serving
    Active,
    /// Manual intervention is required
    Blocked,
}

impl Status {
    fn as_str(self) -> &'static str {
        match self {
            Status::Maintenance => "maintenance",
            Status::Active => "active",
            Status::Blocked => "blocked",
        }
    }
}

/// Report the unit status via `status-set`.
///
/// Status reporting never interrupts an operator pass: when the hook tool
/// is missing or fails, the attempt is logged and dropped.
pub async fn status_set(runner: &dyn CommandRunner, status: Status, message: &str) {
    let command = CommandLine::new("status-set")
        .arg(status.as_str())
        .arg(message);
    if let Err(err) = runner.run(command).await {
        warn!("cannot set unit status to {:?}: {}", status.as_str(), err);
    }
}

/// Expose `port` over TCP via `open-port`.
pub async fn open_port(runner: &dyn CommandRunner, port: u16) -> exec::Result<()> {
    runner
        .run(CommandLine::new("open-port").arg(format!("{}/tcp", port)))
        .await?;
    Ok(())
}

/// Withdraw the TCP exposure of `port` via `close-port`.
pub async fn close_port(runner: &dyn CommandRunner, port: u16) -> exec::Result<()> {
    runner
        .run(CommandLine::new("close-port").arg(format!("{}/tcp", port)))
        .await?;
    Ok(())
}
