//! Resource quotas on the default instance profile.

use super::client::LxdClient;
use super::Result;
use crate::env;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Resource limits applied to every termserver instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct QuotaIntent {
    /// Number of CPU cores exposed to an instance
    pub cpu_cores: u32,
    /// CPU time share, either a percentage or a fixed time slice
    pub cpu_allowance: String,
    /// Memory ceiling, with unit suffix
    pub ram: String,
    /// Maximum number of processes
    pub processes: u32,
}

impl Default for QuotaIntent {
    fn default() -> Self {
        Self {
            cpu_cores: 1,
            cpu_allowance: "100%".to_string(),
            ram: "256MB".to_string(),
            processes: 100,
        }
    }
}

/// Applies resource quotas to the default profile.
pub struct ProfileTuner {
    client: Arc<dyn LxdClient>,
}

impl ProfileTuner {
    /// Create a tuner over the given client.
    pub fn new(client: Arc<dyn LxdClient>) -> Self {
        Self { client }
    }

    /// Write the four limits keys onto the default profile.
    pub async fn apply(&self, quotas: &QuotaIntent) -> Result<()> {
        debug!("applying instance quotas {:?}", quotas);
        let limits = [
            ("limits.cpu", quotas.cpu_cores.to_string()),
            ("limits.cpu.allowance", quotas.cpu_allowance.clone()),
            ("limits.memory", quotas.ram.clone()),
            ("limits.processes", quotas.processes.to_string()),
        ];
        for (key, value) in limits {
            self.client
                .set_profile_limit(env::lxd::DEFAULT_PROFILE, key, &value)
                .await?;
        }
        Ok(())
    }
}
