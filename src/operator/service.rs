//! Systemd management of the jujushell daemon.

use crate::env;
use crate::exec::{CommandLine, CommandRunner, ExecError};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// The systemd unit pointing the daemon at its configuration file.
pub fn render_unit(binary: &Path, config: &Path) -> String {
    format!(
        "[Unit]\n\
         Description=jujushell\n\
         After=network.target\n\
         \n\
         [Service]\n\
         Type=simple\n\
         ExecStart={} -config {}\n\
         Restart=on-failure\n\
         \n\
         [Install]\n\
         WantedBy=multi-user.target\n",
        binary.display(),
        config.display()
    )
}

/// Installs and drives the jujushell systemd service.
pub struct ServiceManager {
    runner: Arc<dyn CommandRunner>,
}

impl ServiceManager {
    /// Create a manager issuing systemctl calls through `runner`.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Write the unit file at `unit_path` and register it with systemd.
    pub async fn install(&self, unit_path: &Path, binary: &Path, config: &Path) -> Result<()> {
        if let Some(parent) = unit_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(unit_path, render_unit(binary, config))?;
        let mut permissions = std::fs::metadata(unit_path)?.permissions();
        permissions.set_mode(0o775);
        std::fs::set_permissions(unit_path, permissions)?;
        info!("enabling service unit {:?}", unit_path);
        self.systemctl_path("enable", unit_path).await?;
        self.runner
            .run(CommandLine::new("systemctl").arg("daemon-reload"))
            .await?;
        Ok(())
    }

    /// Start the daemon.
    pub async fn start(&self) -> Result<()> {
        self.systemctl("start").await
    }

    /// Stop the daemon.
    pub async fn stop(&self) -> Result<()> {
        self.systemctl("stop").await
    }

    /// Restart the daemon, picking up a rewritten configuration.
    pub async fn restart(&self) -> Result<()> {
        self.systemctl("restart").await
    }

    async fn systemctl(&self, verb: &str) -> Result<()> {
        self.runner
            .run(
                CommandLine::new("systemctl")
                    .arg(verb)
                    .arg(env::service::SERVICE_NAME),
            )
            .await?;
        Ok(())
    }

    async fn systemctl_path(&self, verb: &str, path: &Path) -> Result<()> {
        self.runner
            .run(
                CommandLine::new("systemctl")
                    .arg(verb)
                    .arg(path.display().to_string()),
            )
            .await?;
        Ok(())
    }
}

/// Errors from service management.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// systemctl could not be run or reported a failure
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// The unit file could not be written
    #[error("cannot write service unit: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for service management.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::testing::ScriptedRunner;

    #[test]
    fn test_render_unit() {
        let unit = render_unit(
            Path::new("/srv/charm/files/jujushell"),
            Path::new("/srv/charm/files/config.yaml"),
        );

        assert_eq!(
            unit,
            "[Unit]\n\
             Description=jujushell\n\
             After=network.target\n\
             \n\
             [Service]\n\
             Type=simple\n\
             ExecStart=/srv/charm/files/jujushell -config /srv/charm/files/config.yaml\n\
             Restart=on-failure\n\
             \n\
             [Install]\n\
             WantedBy=multi-user.target\n"
        );
    }

    #[tokio::test]
    async fn test_install_writes_unit_and_registers_it() {
        let dir = tempfile::tempdir().unwrap();
        let unit_path = dir.path().join("user").join("jujushell.service");
        let runner = Arc::new(ScriptedRunner::ok());

        ServiceManager::new(runner.clone())
            .install(
                &unit_path,
                Path::new("/srv/files/jujushell"),
                Path::new("/srv/files/config.yaml"),
            )
            .await
            .unwrap();

        let unit = std::fs::read_to_string(&unit_path).unwrap();
        assert!(unit.contains("ExecStart=/srv/files/jujushell -config /srv/files/config.yaml"));
        let mode = std::fs::metadata(&unit_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o775);
        assert_eq!(
            runner.rendered_calls(),
            vec![
                format!("systemctl enable {}", unit_path.display()),
                "systemctl daemon-reload".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_lifecycle_verbs_target_the_service() {
        let runner = Arc::new(ScriptedRunner::ok());
        let manager = ServiceManager::new(runner.clone());

        manager.start().await.unwrap();
        manager.restart().await.unwrap();
        manager.stop().await.unwrap();

        assert_eq!(
            runner.rendered_calls(),
            vec![
                "systemctl start jujushell",
                "systemctl restart jujushell",
                "systemctl stop jujushell",
            ]
        );
    }
}
