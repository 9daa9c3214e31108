//! In-memory LXD fake shared by unit tests.

use super::client::{ImageAlias, ImageRecord, LxdClient};
use super::{LxdError, Result, fingerprint};
use crate::env;
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub(crate) struct FakeState {
    pub images: Vec<ImageRecord>,
    pub networks: Vec<String>,
    pub containers: Vec<String>,
    pub preseeds: Vec<String>,
    pub profile_limits: Vec<(String, String, String)>,
    pub imports: usize,
    pub alias_creates: usize,
    pub alias_deletes: usize,
    pub waits: usize,
    pub fail_wait: bool,
}

/// Fake daemon answering from in-memory state and counting mutations.
#[derive(Default)]
pub(crate) struct FakeLxd {
    pub state: Mutex<FakeState>,
}

impl FakeLxd {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_networks(networks: &[&str]) -> Self {
        let fake = Self::new();
        fake.state.lock().unwrap().networks = networks.iter().map(|n| n.to_string()).collect();
        fake
    }

    pub(crate) fn with_images(images: Vec<ImageRecord>) -> Self {
        let fake = Self::new();
        fake.state.lock().unwrap().images = images;
        fake
    }

    pub(crate) fn with_containers(containers: &[&str]) -> Self {
        let fake = Self::new();
        fake.state.lock().unwrap().containers =
            containers.iter().map(|n| n.to_string()).collect();
        fake
    }

    pub(crate) fn image(fingerprint: &str, aliases: &[&str]) -> ImageRecord {
        ImageRecord {
            fingerprint: fingerprint.to_string(),
            aliases: aliases
                .iter()
                .map(|name| ImageAlias {
                    name: name.to_string(),
                    description: String::new(),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl LxdClient for FakeLxd {
    async fn images(&self) -> Result<Vec<ImageRecord>> {
        Ok(self.state.lock().unwrap().images.clone())
    }

    async fn import_image(&self, data: &[u8]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.imports += 1;
        let fingerprint = fingerprint(data);
        state.images.push(ImageRecord {
            fingerprint,
            aliases: Vec::new(),
        });
        Ok(())
    }

    async fn create_alias(&self, alias: &str, fingerprint: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.alias_creates += 1;
        for image in &mut state.images {
            if image.fingerprint == fingerprint {
                image.aliases.push(ImageAlias {
                    name: alias.to_string(),
                    description: String::new(),
                });
            }
        }
        Ok(())
    }

    async fn delete_alias(&self, alias: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.alias_deletes += 1;
        for image in &mut state.images {
            image.aliases.retain(|a| a.name != alias);
        }
        Ok(())
    }

    async fn networks(&self) -> Result<Vec<String>> {
        Ok(self.state.lock().unwrap().networks.clone())
    }

    async fn init_preseed(&self, document: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.preseeds.push(document.to_string());
        state.networks.push(env::lxd::BRIDGE_NAME.to_string());
        Ok(())
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.waits += 1;
        if state.fail_wait {
            return Err(LxdError::NotReady { timeout });
        }
        Ok(())
    }

    async fn set_profile_limit(&self, profile: &str, key: &str, value: &str) -> Result<()> {
        self.state.lock().unwrap().profile_limits.push((
            profile.to_string(),
            key.to_string(),
            value.to_string(),
        ));
        Ok(())
    }

    async fn containers(&self) -> Result<Vec<String>> {
        Ok(self.state.lock().unwrap().containers.clone())
    }

    async fn delete_container(&self, name: &str) -> Result<()> {
        self.state.lock().unwrap().containers.retain(|c| c != name);
        Ok(())
    }
}
