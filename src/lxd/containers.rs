//! Container cleanup for teardown.

use super::client::LxdClient;
use super::Result;
use std::sync::Arc;
use tracing::info;

/// Force-deletes every container known to the daemon.
pub struct ContainerReaper {
    client: Arc<dyn LxdClient>,
}

impl ContainerReaper {
    /// Create a reaper over the given client.
    pub fn new(client: Arc<dyn LxdClient>) -> Self {
        Self { client }
    }

    /// Delete all containers, returning how many were removed.
    pub async fn purge_all(&self) -> Result<usize> {
        let names = self.client.containers().await?;
        for name in &names {
            info!("deleting container {:?}", name);
            self.client.delete_container(name).await?;
        }
        Ok(names.len())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::FakeLxd;
    use super::*;

    #[tokio::test]
    async fn test_purge_all_deletes_every_container() {
        let client = Arc::new(FakeLxd::with_containers(&["one", "two", "three"]));
        let reaper = ContainerReaper::new(client.clone());

        let removed = reaper.purge_all().await.unwrap();

        assert_eq!(removed, 3);
        assert!(client.state.lock().unwrap().containers.is_empty());
    }

    #[tokio::test]
    async fn test_purge_all_with_no_containers() {
        let client = Arc::new(FakeLxd::new());
        let reaper = ContainerReaper::new(client.clone());

        assert_eq!(reaper.purge_all().await.unwrap(), 0);
    }
}
