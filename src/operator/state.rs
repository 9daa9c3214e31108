//! Durable operator state.
//!
//! A small YAML document under the charm files directory carries what the
//! operator must remember between hook invocations: how far the LXD
//! bootstrap has progressed, the last applied intent and whether the
//! systemd service exists yet.

use crate::config::ConfigIntent;
use crate::lxd::RuntimeState;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// State remembered across hook invocations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OperatorState {
    /// Progress of the LXD runtime bootstrap
    pub runtime: RuntimeState,
    /// The last intent applied to the daemon, used for port diffing
    pub previous: Option<ConfigIntent>,
    /// Whether the systemd service has been installed
    pub service_installed: bool,
}

impl OperatorState {
    /// Load the state from `path`, starting fresh when nothing was saved yet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read operator state from {}", path.display()))?;
        serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse operator state at {}", path.display()))
    }

    /// Persist the state at `path`, replacing any previous save atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create state directory {}", parent.display())
            })?;
        }
        let raw = serde_yaml::to_string(self).context("failed to serialize operator state")?;
        let staged = path.with_extension("tmp");
        std::fs::write(&staged, raw)
            .with_context(|| format!("failed to stage operator state at {}", staged.display()))?;
        std::fs::rename(&staged, path)
            .with_context(|| format!("failed to commit operator state to {}", path.display()))?;
        Ok(())
    }
}
