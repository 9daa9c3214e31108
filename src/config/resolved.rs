//! The configuration document consumed by the daemon.

use super::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Fully resolved daemon configuration.
///
/// Serialized verbatim as the config.yaml payload. The three optional TLS
/// keys are omitted entirely when TLS is disabled; the daemon treats their
/// absence, not emptiness, as the signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolvedConfig {
    /// Controller API addresses, in the order they will be tried
    pub addresses: Vec<String>,
    /// Controller CA certificate in PEM form, possibly empty
    pub credential: String,
    /// Image alias instances are launched from
    pub image_alias: String,
    /// Daemon log level
    pub log_level: String,
    /// Port the daemon listens on
    pub port: u16,
    /// PEM certificate text, present only with `tls_key`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_cert: Option<String>,
    /// PEM key text, present only with `tls_cert`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_key: Option<String>,
    /// DNS name for externally managed certificates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_name: Option<String>,
}

impl ResolvedConfig {
    /// Serialize to YAML and write to `path`, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        debug!("writing daemon configuration to {}", path.display());
        let payload = serde_yaml::to_string(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, payload)?;
        Ok(())
    }
}
