//! Charm resource retrieval.

use crate::exec::{CommandLine, CommandRunner, ExecError};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Fetches charm resources through the `resource-get` hook tool.
pub struct ResourceFetcher {
    runner: Arc<dyn CommandRunner>,
}

impl ResourceFetcher {
    /// Create a fetcher issuing hook tool calls through `runner`.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Retrieve the resource called `name` and move it to `target`.
    ///
    /// `resource-get` prints the path of a staged copy; the copy is moved
    /// into place so repeated fetches do not accumulate staging files.
    pub async fn fetch(&self, name: &str, target: &Path) -> Result<()> {
        let staged = match self.runner.run(CommandLine::new("resource-get").arg(name)).await {
            Ok(output) => output.stdout.trim().to_string(),
            Err(ExecError::Failed { .. }) => {
                return Err(ResourceError::Unavailable {
                    name: name.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        };
        if staged.is_empty() {
            return Err(ResourceError::Unavailable {
                name: name.to_string(),
            });
        }
        debug!("moving resource {:?} from {:?} to {:?}", name, staged, target);
        move_file(Path::new(&staged), target)?;
        Ok(())
    }
}

/// Move `source` to `target`, copying across filesystems when rename fails.
fn move_file(source: &Path, target: &Path) -> std::io::Result<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    match std::fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(_) => {
            std::fs::copy(source, target)?;
            std::fs::remove_file(source)
        }
    }
}

/// Errors from resource retrieval.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// The controller has no payload attached under this name
    #[error("cannot retrieve resource {name:?}")]
    Unavailable {
        /// Name of the missing resource
        name: String,
    },

    /// The hook tool itself could not be run
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// Moving the staged file into place failed
    #[error("cannot place resource: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for resource retrieval.
pub type Result<T> = std::result::Result<T, ResourceError>;
