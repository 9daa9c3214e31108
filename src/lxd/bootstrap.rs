//! LXD daemon initialization.
//!
//! First-time provisioning goes through a preseed document piped into
//! `lxd init`: the bridge network, the ZFS storage pool and the two
//! instance profiles all land in one idempotent submission. Progress is
//! tracked as an explicit [`RuntimeState`] value that callers persist
//! between passes instead of deriving it from daemon probes.

use super::client::LxdClient;
use super::Result;
use crate::env;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Provisioning progress of the local LXD daemon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuntimeState {
    /// Nothing verified yet
    #[default]
    Uninitialized,
    /// Preseed applied or found applied, readiness not yet confirmed
    Initialized,
    /// The daemon answered waitready
    Ready,
}

/// The preseed document submitted on first initialization.
pub fn preseed_document() -> String {
    format!(
        r#"networks:
- name: {bridge}
  type: bridge
  config:
    ipv4.address: auto
    ipv6.address: none
storage_pools:
- name: {pool}
  driver: zfs
profiles:
- name: {default_profile}
  devices:
    root:
      path: /
      pool: {pool}
      type: disk
    eth0:
      name: eth0
      nictype: bridged
      parent: {bridge}
      type: nic
- name: {limited_profile}
  config:
    user.user-data: |
      #cloud-config
      users:
      - name: ubuntu
        shell: /bin/bash
"#,
        bridge = env::lxd::BRIDGE_NAME,
        pool = env::lxd::STORAGE_POOL,
        default_profile = env::lxd::DEFAULT_PROFILE,
        limited_profile = env::lxd::LIMITED_PROFILE,
    )
}

/// Drives the daemon from whatever state it is in toward ready.
pub struct Bootstrapper {
    client: Arc<dyn LxdClient>,
}

impl Bootstrapper {
    /// Create a bootstrapper over the given client.
    pub fn new(client: Arc<dyn LxdClient>) -> Self {
        Self { client }
    }

    /// Submit the preseed unless the bridge network already exists.
    ///
    /// The bridge doubles as the initialization marker: it only ever
    /// exists once the preseed has been applied.
    pub async fn ensure_network(&self) -> Result<()> {
        let networks = self.client.networks().await?;
        if networks.iter().any(|name| name == env::lxd::BRIDGE_NAME) {
            debug!("network {} already configured", env::lxd::BRIDGE_NAME);
            return Ok(());
        }
        info!("initializing lxd");
        self.client.init_preseed(&preseed_document()).await
    }

    /// Block until the daemon is ready, up to `timeout`.
    pub async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        self.client.wait_ready(timeout).await
    }

    /// Perform the single provisioning step that follows `state`.
    pub async fn advance(&self, state: RuntimeState) -> Result<RuntimeState> {
        match state {
            RuntimeState::Uninitialized => {
                self.ensure_network().await?;
                Ok(RuntimeState::Initialized)
            }
            RuntimeState::Initialized => {
                self.wait_ready(env::lxd::READY_TIMEOUT).await?;
                Ok(RuntimeState::Ready)
            }
            RuntimeState::Ready => Ok(RuntimeState::Ready),
        }
    }

    /// Drive the runtime from `state` to [`RuntimeState::Ready`].
    ///
    /// Already-ready input returns without touching the daemon.
    pub async fn ensure_ready(&self, state: RuntimeState) -> Result<RuntimeState> {
        let mut state = state;
        while state != RuntimeState::Ready {
            state = self.advance(state).await?;
        }
        Ok(state)
    }
}
