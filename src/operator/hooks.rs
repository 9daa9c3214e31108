//! Lifecycle passes over the jujushell unit.
//!
//! Each pass loads the persisted [`OperatorState`], performs its steps in
//! order and saves the state back. A pass that fails midway is safe to run
//! again: every step is idempotent or guarded by the state value.

use super::resources::{ResourceError, ResourceFetcher};
use super::service::ServiceManager;
use super::state::OperatorState;
use super::tools::{self, Status};
use crate::config::{ConfigIntent, Synthesizer, diff_ports};
use crate::env;
use crate::exec::{CommandLine, CommandRunner, ExecError};
use crate::lxd::{
    Bootstrapper, ContainerReaper, ImageReconciler, LxdClient, ProfileTuner, QuotaIntent,
    RuntimeState,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// On-disk operator configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OperatorConfig {
    /// Daemon configuration intent
    #[serde(flatten)]
    pub intent: ConfigIntent,
    /// Resource quotas applied to the default LXD profile
    pub quotas: QuotaIntent,
    /// Publish the restricted termserver image instead of the full one
    pub limit_termserver: bool,
}

impl OperatorConfig {
    /// Load the configuration from `path`, using defaults when absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("no operator configuration at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read operator configuration {}", path.display()))?;
        serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse operator configuration {}", path.display()))
    }
}

/// Drives the lifecycle passes over the jujushell unit.
pub struct Operator {
    runner: Arc<dyn CommandRunner>,
    client: Arc<dyn LxdClient>,
    config: OperatorConfig,
    charm_dir: PathBuf,
    unit_path: PathBuf,
    image_store: PathBuf,
}

impl Operator {
    /// Create an operator rooted at `charm_dir`.
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        client: Arc<dyn LxdClient>,
        config: OperatorConfig,
        charm_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            client,
            config,
            charm_dir: charm_dir.into(),
            unit_path: PathBuf::from(env::service::UNIT_PATH),
            image_store: PathBuf::from(env::IMAGE_STORE_DIR),
        }
    }

    /// Override where the systemd unit file is written.
    pub fn with_unit_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.unit_path = path.into();
        self
    }

    /// Override where the termserver image tarballs are staged.
    pub fn with_image_store(mut self, dir: impl Into<PathBuf>) -> Self {
        self.image_store = dir.into();
        self
    }

    /// Provision the host: packages, resources, daemon config, service unit.
    ///
    /// A missing charm resource blocks the unit instead of failing the pass,
    /// so an operator can attach the resource and retry.
    pub async fn install(&self) -> Result<()> {
        let mut state = self.load_state()?;
        self.ensure_host_packages().await?;
        if !self.install_resources().await? {
            return Ok(());
        }
        self.write_daemon_config().await?;
        self.install_service(&mut state).await?;
        self.save_state(&state)?;
        tools::status_set(self.runner.as_ref(), Status::Maintenance, "jujushell installed").await;
        Ok(())
    }

    /// Apply a changed configuration: rewrite the daemon config, adjust the
    /// exposed port and the container quotas, refresh the published image
    /// and restart the daemon.
    pub async fn configure(&self) -> Result<()> {
        let mut state = self.load_state()?;
        self.write_daemon_config().await?;

        let change = diff_ports(state.previous.as_ref(), &self.config.intent);
        tools::open_port(self.runner.as_ref(), change.open)
            .await
            .context("failed to open the daemon port")?;
        if let Some(port) = change.close {
            tools::close_port(self.runner.as_ref(), port)
                .await
                .context("failed to close the previous daemon port")?;
        }

        ProfileTuner::new(self.client.clone())
            .apply(&self.config.quotas)
            .await
            .context("failed to apply container quotas")?;

        if state.runtime == RuntimeState::Ready {
            self.reconcile_image().await?;
        }

        state.previous = Some(self.config.intent.clone());
        self.save_state(&state)?;

        if state.service_installed {
            self.restart_service().await?;
        }
        Ok(())
    }

    /// Bring the unit up: bootstrap LXD, publish the image, start the daemon.
    pub async fn start(&self) -> Result<()> {
        let mut state = self.load_state()?;
        tools::status_set(self.runner.as_ref(), Status::Maintenance, "configuring lxd").await;
        self.runner
            .run(CommandLine::new("gpasswd").args(["-a", "ubuntu", "lxd"]))
            .await
            .context("failed to add the ubuntu user to the lxd group")?;

        let bootstrapper = Bootstrapper::new(self.client.clone());
        state.runtime = bootstrapper
            .ensure_ready(state.runtime)
            .await
            .context("failed to bootstrap lxd")?;
        self.save_state(&state)?;

        tools::status_set(
            self.runner.as_ref(),
            Status::Maintenance,
            "importing termserver images",
        )
        .await;
        self.reconcile_image().await?;

        if state.service_installed {
            tools::status_set(
                self.runner.as_ref(),
                Status::Maintenance,
                "starting the jujushell service",
            )
            .await;
            ServiceManager::new(self.runner.clone())
                .start()
                .await
                .context("failed to start the jujushell service")?;
            tools::status_set(self.runner.as_ref(), Status::Active, "jujushell running").await;
        }
        Ok(())
    }

    /// Stop the daemon.
    pub async fn stop(&self) -> Result<()> {
        ServiceManager::new(self.runner.clone())
            .stop()
            .await
            .context("failed to stop the jujushell service")?;
        Ok(())
    }

    /// Restart the daemon.
    pub async fn restart(&self) -> Result<()> {
        self.restart_service().await
    }

    /// Refresh resources, configuration and image after a charm upgrade.
    pub async fn upgrade(&self) -> Result<()> {
        let mut state = self.load_state()?;
        if !self.install_resources().await? {
            return Ok(());
        }
        self.write_daemon_config().await?;
        self.install_service(&mut state).await?;
        if state.runtime == RuntimeState::Ready {
            tools::status_set(
                self.runner.as_ref(),
                Status::Maintenance,
                "importing termserver images",
            )
            .await;
            self.reconcile_image().await?;
        }
        self.save_state(&state)?;
        if state.service_installed {
            self.restart_service().await?;
        }
        Ok(())
    }

    /// Remove every container the runtime knows about.
    pub async fn teardown(&self) -> Result<()> {
        let removed = ContainerReaper::new(self.client.clone())
            .purge_all()
            .await
            .context("failed to remove containers")?;
        info!("removed {} containers", removed);
        Ok(())
    }

    async fn ensure_host_packages(&self) -> Result<()> {
        match self
            .runner
            .run(CommandLine::new("snap").args(["list", "lxd"]))
            .await
        {
            Ok(_) => debug!("lxd snap already installed"),
            Err(ExecError::Failed { .. }) => {
                tools::status_set(self.runner.as_ref(), Status::Maintenance, "installing lxd")
                    .await;
                self.runner
                    .run(CommandLine::new("snap").args(["install", "lxd"]))
                    .await
                    .context("failed to install the lxd snap")?;
            }
            Err(err) => return Err(err).context("failed to check for the lxd snap"),
        }
        tools::status_set(
            self.runner.as_ref(),
            Status::Maintenance,
            "installing zfsutils-linux",
        )
        .await;
        self.runner
            .run(CommandLine::new("apt-get").args(["install", "-y", "zfsutils-linux"]))
            .await
            .context("failed to install zfsutils-linux")?;
        Ok(())
    }

    /// Fetch the charm resources into place.
    ///
    /// Returns false after reporting a blocked status when a resource has no
    /// payload attached; other failures propagate.
    async fn install_resources(&self) -> Result<bool> {
        let fetcher = ResourceFetcher::new(self.runner.clone());

        tools::status_set(self.runner.as_ref(), Status::Maintenance, "fetching jujushell").await;
        let binary = env::jujushell_binary_path(&self.charm_dir);
        match fetcher.fetch(env::resource::JUJUSHELL, &binary).await {
            Ok(()) => {}
            Err(err @ ResourceError::Unavailable { .. }) => {
                warn!("{}", err);
                tools::status_set(
                    self.runner.as_ref(),
                    Status::Blocked,
                    &format!("jujushell resource not available: {}", err),
                )
                .await;
                return Ok(false);
            }
            Err(err) => return Err(err).context("failed to fetch the jujushell binary"),
        }
        self.install_binary(&binary).await?;

        tools::status_set(self.runner.as_ref(), Status::Maintenance, "fetching termserver").await;
        for (name, limited) in [
            (env::resource::TERMSERVER, false),
            (env::resource::LIMITED_TERMSERVER, true),
        ] {
            match fetcher.fetch(name, &self.image_path(limited)).await {
                Ok(()) => {}
                Err(err @ ResourceError::Unavailable { .. }) => {
                    warn!("{}", err);
                    tools::status_set(
                        self.runner.as_ref(),
                        Status::Blocked,
                        &format!("termserver resource not available: {}", err),
                    )
                    .await;
                    return Ok(false);
                }
                Err(err) => return Err(err).context("failed to fetch the termserver images"),
            }
        }
        Ok(true)
    }

    /// Make the daemon binary executable and able to bind privileged ports.
    async fn install_binary(&self, binary: &Path) -> Result<()> {
        let mut permissions = std::fs::metadata(binary)
            .with_context(|| format!("failed to stat {}", binary.display()))?
            .permissions();
        permissions.set_mode(0o775);
        std::fs::set_permissions(binary, permissions)
            .with_context(|| format!("failed to make {} executable", binary.display()))?;
        self.runner
            .run(
                CommandLine::new("setcap")
                    .arg("CAP_NET_BIND_SERVICE=+eip")
                    .arg(binary.display().to_string()),
            )
            .await
            .context("failed to grant CAP_NET_BIND_SERVICE to the daemon binary")?;
        Ok(())
    }

    async fn install_service(&self, state: &mut OperatorState) -> Result<()> {
        tools::status_set(
            self.runner.as_ref(),
            Status::Maintenance,
            "creating systemd module",
        )
        .await;
        ServiceManager::new(self.runner.clone())
            .install(
                &self.unit_path,
                &env::jujushell_binary_path(&self.charm_dir),
                &env::config_file_path(&self.charm_dir),
            )
            .await
            .context("failed to install the jujushell service")?;
        state.service_installed = true;
        Ok(())
    }

    async fn write_daemon_config(&self) -> Result<()> {
        let synthesizer =
            Synthesizer::new(self.runner.clone(), env::agent_conf_path(&self.charm_dir));
        let resolved = synthesizer
            .synthesize(&self.config.intent)
            .await
            .context("failed to resolve the daemon configuration")?;
        let path = env::config_file_path(&self.charm_dir);
        resolved
            .write_to(&path)
            .with_context(|| format!("failed to write the daemon configuration to {}", path.display()))?;
        info!("daemon configuration written to {:?}", path);
        Ok(())
    }

    async fn reconcile_image(&self) -> Result<()> {
        let path = self.image_path(self.config.limit_termserver);
        let data = std::fs::read(&path)
            .with_context(|| format!("failed to read the termserver image from {}", path.display()))?;
        ImageReconciler::new(self.client.clone())
            .reconcile(&data, env::lxd::IMAGE_ALIAS)
            .await
            .context("failed to publish the termserver image")?;
        Ok(())
    }

    async fn restart_service(&self) -> Result<()> {
        tools::status_set(
            self.runner.as_ref(),
            Status::Maintenance,
            "starting the jujushell service",
        )
        .await;
        ServiceManager::new(self.runner.clone())
            .restart()
            .await
            .context("failed to restart the jujushell service")?;
        tools::status_set(self.runner.as_ref(), Status::Active, "jujushell running").await;
        Ok(())
    }

    fn image_path(&self, limited: bool) -> PathBuf {
        env::termserver_path(&self.image_store, limited)
    }

    fn load_state(&self) -> Result<OperatorState> {
        OperatorState::load(&env::state_file_path(&self.charm_dir))
    }

    fn save_state(&self, state: &OperatorState) -> Result<()> {
        state.save(&env::state_file_path(&self.charm_dir))
    }
}
