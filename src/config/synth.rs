//! Intent resolution into the daemon configuration.

use super::intent::{ConfigIntent, CredentialSource, resolved_port};
use super::resolved::ResolvedConfig;
use super::{ConfigError, Result, tls};
use crate::env;
use crate::exec::CommandRunner;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Resolves a [`ConfigIntent`] into the document the daemon reads.
pub struct Synthesizer {
    runner: Arc<dyn CommandRunner>,
    agent_conf: PathBuf,
}

impl Synthesizer {
    /// Build a synthesizer reading unit credentials from `agent_conf`.
    pub fn new(runner: Arc<dyn CommandRunner>, agent_conf: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            agent_conf: agent_conf.into(),
        }
    }

    /// Resolve `intent` into the value written to the daemon config file.
    pub async fn synthesize(&self, intent: &ConfigIntent) -> Result<ResolvedConfig> {
        let addresses = resolve_addresses(intent)?;
        let credential = self.resolve_credential(intent)?;
        let mut config = ResolvedConfig {
            addresses,
            credential,
            image_alias: env::lxd::IMAGE_ALIAS.to_string(),
            log_level: intent.log_level.clone(),
            port: resolved_port(intent),
            tls_cert: None,
            tls_key: None,
            dns_name: None,
        };
        match tls::resolve(self.runner.as_ref(), intent).await? {
            tls::TlsMaterial::Disabled => {}
            tls::TlsMaterial::DnsManaged { dns_name } => config.dns_name = Some(dns_name),
            tls::TlsMaterial::Pair { cert, key } => {
                config.tls_cert = Some(cert);
                config.tls_key = Some(key);
            }
        }
        Ok(config)
    }

    fn resolve_credential(&self, intent: &ConfigIntent) -> Result<String> {
        match &intent.credential {
            CredentialSource::Literal(value) => Ok(value.clone()),
            CredentialSource::FromUnit => read_unit_credential(&self.agent_conf),
        }
    }
}

/// Addresses from the intent, or the hook environment as a fallback.
fn resolve_addresses(intent: &ConfigIntent) -> Result<Vec<String>> {
    let explicit: Vec<String> = intent
        .addresses
        .iter()
        .map(|address| address.trim().to_string())
        .filter(|address| !address.is_empty())
        .collect();
    if !explicit.is_empty() {
        return Ok(explicit);
    }
    if let Ok(raw) = std::env::var(env::API_ADDRESSES_ENV) {
        let fallback: Vec<String> = raw.split_whitespace().map(str::to_string).collect();
        if !fallback.is_empty() {
            debug!("using controller addresses from ${}", env::API_ADDRESSES_ENV);
            return Ok(fallback);
        }
    }
    Err(ConfigError::MissingAddresses)
}

#[derive(Debug, Deserialize)]
struct AgentConf {
    cacert: String,
}

/// The controller CA certificate as recorded in the unit agent file.
fn read_unit_credential(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Credential {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    let agent: AgentConf =
        serde_yaml::from_str(&raw).map_err(|err| ConfigError::Credential {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
    Ok(agent.cacert)
}
