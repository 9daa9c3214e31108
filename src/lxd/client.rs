//! LXD client over the snap command line tools.
//!
//! The daemon ships a REST API, but snap confinement makes the bundled CLI
//! the stable surface here: listings are requested as `--format json` and
//! mutations go through the same commands an operator would type.

use super::{LxdError, Result};
use crate::env;
use crate::exec::{CommandLine, CommandRunner, ExecError, HostRunner};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

/// Alias attached to an LXD image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAlias {
    /// Alias name
    pub name: String,
    /// Free-form description, usually empty
    #[serde(default)]
    pub description: String,
}

/// A single image known to the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Lowercase hex SHA-256 of the image content
    pub fingerprint: String,
    /// Aliases pointing at this image
    #[serde(default)]
    pub aliases: Vec<ImageAlias>,
}

impl ImageRecord {
    /// Whether this image currently holds `alias`.
    pub fn has_alias(&self, alias: &str) -> bool {
        self.aliases.iter().any(|a| a.name == alias)
    }
}

#[derive(Debug, Deserialize)]
struct NamedRecord {
    name: String,
}

/// Operations the operator needs from the container runtime.
#[async_trait]
pub trait LxdClient: Send + Sync {
    /// All images known to the daemon.
    async fn images(&self) -> Result<Vec<ImageRecord>>;

    /// Import raw image bytes, blocking until the import completes.
    async fn import_image(&self, data: &[u8]) -> Result<()>;

    /// Point `alias` at the image with `fingerprint`.
    async fn create_alias(&self, alias: &str, fingerprint: &str) -> Result<()>;

    /// Remove `alias` from whatever image holds it.
    async fn delete_alias(&self, alias: &str) -> Result<()>;

    /// Names of the configured networks.
    async fn networks(&self) -> Result<Vec<String>>;

    /// Submit a preseed document to `lxd init`.
    async fn init_preseed(&self, document: &str) -> Result<()>;

    /// Block until the daemon answers, up to `timeout`.
    async fn wait_ready(&self, timeout: Duration) -> Result<()>;

    /// Set a limits key on an instance profile.
    async fn set_profile_limit(&self, profile: &str, key: &str, value: &str) -> Result<()>;

    /// Names of all containers.
    async fn containers(&self) -> Result<Vec<String>>;

    /// Force-delete the named container.
    async fn delete_container(&self, name: &str) -> Result<()>;
}

/// Production client driving the snap-installed lxc and lxd binaries.
pub struct LxcClient {
    runner: Arc<dyn CommandRunner>,
}

impl LxcClient {
    /// Probe for the client binary and build a client on the host runner.
    pub fn connect() -> Result<Self> {
        which::which(env::lxd::LXC_BIN)
            .map_err(|err| LxdError::Unavailable(format!("{}: {}", env::lxd::LXC_BIN, err)))?;
        Ok(Self::with_runner(Arc::new(HostRunner::new())))
    }

    /// Build a client on top of an explicit runner.
    pub fn with_runner(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn lxc(&self) -> CommandLine {
        CommandLine::new(env::lxd::LXC_BIN)
    }

    async fn names(&self, command: CommandLine, what: &'static str) -> Result<Vec<String>> {
        let output = self.runner.run(command).await?;
        let records: Vec<NamedRecord> = serde_json::from_str(&output.stdout)
            .map_err(|source| LxdError::Listing { what, source })?;
        Ok(records.into_iter().map(|record| record.name).collect())
    }
}

#[async_trait]
impl LxdClient for LxcClient {
    async fn images(&self) -> Result<Vec<ImageRecord>> {
        let output = self
            .runner
            .run(self.lxc().args(["image", "list", "--format", "json"]))
            .await?;
        serde_json::from_str(&output.stdout).map_err(|source| LxdError::Listing {
            what: "image",
            source,
        })
    }

    async fn import_image(&self, data: &[u8]) -> Result<()> {
        let mut staging = tempfile::NamedTempFile::new()?;
        staging.write_all(data)?;
        staging.flush()?;
        let path = staging.path().display().to_string();
        self.runner
            .run(self.lxc().args(["image", "import"]).arg(path))
            .await?;
        Ok(())
    }

    async fn create_alias(&self, alias: &str, fingerprint: &str) -> Result<()> {
        self.runner
            .run(
                self.lxc()
                    .args(["image", "alias", "create"])
                    .arg(alias)
                    .arg(fingerprint),
            )
            .await?;
        Ok(())
    }

    async fn delete_alias(&self, alias: &str) -> Result<()> {
        self.runner
            .run(self.lxc().args(["image", "alias", "delete"]).arg(alias))
            .await?;
        Ok(())
    }

    async fn networks(&self) -> Result<Vec<String>> {
        self.names(
            self.lxc().args(["network", "list", "--format", "json"]),
            "network",
        )
        .await
    }

    async fn init_preseed(&self, document: &str) -> Result<()> {
        let script = format!(
            "cat <<'EOF' | {} init --preseed\n{}\nEOF\n",
            env::lxd::LXD_BIN,
            document.trim_end(),
        );
        // The working directory must be visible to the confined snap.
        self.runner
            .run(CommandLine::shell(script).with_current_dir("/"))
            .await?;
        Ok(())
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let command = CommandLine::new(env::lxd::LXD_BIN)
            .arg("waitready")
            .arg(format!("--timeout={}", timeout.as_secs()))
            .with_current_dir("/");
        match self.runner.run(command).await {
            Ok(_) => Ok(()),
            Err(ExecError::Failed { .. }) => Err(LxdError::NotReady { timeout }),
            Err(err) => Err(err.into()),
        }
    }

    async fn set_profile_limit(&self, profile: &str, key: &str, value: &str) -> Result<()> {
        self.runner
            .run(
                self.lxc()
                    .args(["profile", "set"])
                    .arg(profile)
                    .arg(key)
                    .arg(value),
            )
            .await?;
        Ok(())
    }

    async fn containers(&self) -> Result<Vec<String>> {
        self.names(self.lxc().args(["list", "--format", "json"]), "container")
            .await
    }

    async fn delete_container(&self, name: &str) -> Result<()> {
        self.runner
            .run(self.lxc().args(["delete", "-f"]).arg(name))
            .await?;
        Ok(())
    }
}
