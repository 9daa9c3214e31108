//! Termserver image reconciliation.
//!
//! Converges the daemon's image store on "the image with this exact content
//! is present and holds the alias", performing only the operations that are
//! actually needed so repeated runs with the same payload are no-ops.

use super::client::LxdClient;
use super::{ImageRecord, Result};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lowercase hex SHA-256 of the raw image bytes, as LXD computes it.
pub fn fingerprint(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Converges the image store on a single aliased image.
pub struct ImageReconciler {
    client: Arc<dyn LxdClient>,
}

impl ImageReconciler {
    /// Create a reconciler over the given client.
    pub fn new(client: Arc<dyn LxdClient>) -> Self {
        Self { client }
    }

    /// Import `data` if its content is not stored yet and point `alias` at it.
    ///
    /// The image store is re-queried on every call, so external changes
    /// (manual imports, deletions) are picked up rather than assumed away.
    pub async fn reconcile(&self, data: &[u8], alias: &str) -> Result<()> {
        let fingerprint = fingerprint(data);
        debug!("reconciling alias {:?} to image {}", alias, fingerprint);

        let images = self.client.images().await?;
        let mut matching: Option<&ImageRecord> = None;
        let mut holder: Option<&ImageRecord> = None;
        for image in &images {
            if image.fingerprint == fingerprint {
                if matching.is_some() {
                    warn!("duplicate image fingerprint {}", fingerprint);
                } else {
                    debug!("image {} already exists", fingerprint);
                    matching = Some(image);
                }
            }
            if image.has_alias(alias) {
                debug!(
                    "alias {:?} currently refers to image {}",
                    alias, image.fingerprint
                );
                holder = Some(image);
            }
        }

        if matching.is_none() {
            info!("importing image {}", fingerprint);
            self.client.import_image(data).await?;
        }
        match holder {
            None => self.client.create_alias(alias, &fingerprint).await?,
            Some(stale) if stale.fingerprint != fingerprint => {
                info!(
                    "moving alias {:?} from {} to {}",
                    alias, stale.fingerprint, fingerprint
                );
                self.client.delete_alias(alias).await?;
                self.client.create_alias(alias, &fingerprint).await?;
            }
            Some(_) => debug!("alias {:?} already up to date", alias),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::FakeLxd;
    use super::*;

    const DATA: &[u8] = b"termserver image content";

    #[test]
    fn test_fingerprint_of_empty_input() {
        assert_eq!(
            fingerprint(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_fingerprint_shape() {
        let fingerprint = fingerprint(DATA);
        assert_eq!(fingerprint.len(), 64);
        assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(fingerprint, fingerprint.to_lowercase());
    }

    #[tokio::test]
    async fn test_reconcile_empty_store_imports_and_aliases() {
        let client = Arc::new(FakeLxd::new());
        let reconciler = ImageReconciler::new(client.clone());

        reconciler.reconcile(DATA, "termserver").await.unwrap();

        let state = client.state.lock().unwrap();
        assert_eq!(state.imports, 1);
        assert_eq!(state.alias_creates, 1);
        assert_eq!(state.alias_deletes, 0);
        assert_eq!(state.images.len(), 1);
        assert!(state.images[0].has_alias("termserver"));
        assert_eq!(state.images[0].fingerprint, fingerprint(DATA));
    }

    #[tokio::test]
    async fn test_reconcile_existing_image_is_a_noop() {
        let client = Arc::new(FakeLxd::with_images(vec![FakeLxd::image(
            &fingerprint(DATA),
            &["termserver"],
        )]));
        let reconciler = ImageReconciler::new(client.clone());

        reconciler.reconcile(DATA, "termserver").await.unwrap();

        let state = client.state.lock().unwrap();
        assert_eq!(state.imports, 0);
        assert_eq!(state.alias_creates, 0);
        assert_eq!(state.alias_deletes, 0);
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let client = Arc::new(FakeLxd::new());
        let reconciler = ImageReconciler::new(client.clone());

        reconciler.reconcile(DATA, "termserver").await.unwrap();
        reconciler.reconcile(DATA, "termserver").await.unwrap();

        let state = client.state.lock().unwrap();
        assert_eq!(state.imports, 1);
        assert_eq!(state.alias_creates, 1);
        assert_eq!(state.alias_deletes, 0);
    }

    #[tokio::test]
    async fn test_reconcile_adds_missing_alias_without_import() {
        let client = Arc::new(FakeLxd::with_images(vec![FakeLxd::image(
            &fingerprint(DATA),
            &[],
        )]));
        let reconciler = ImageReconciler::new(client.clone());

        reconciler.reconcile(DATA, "termserver").await.unwrap();

        let state = client.state.lock().unwrap();
        assert_eq!(state.imports, 0);
        assert_eq!(state.alias_creates, 1);
        assert!(state.images[0].has_alias("termserver"));
    }

    #[tokio::test]
    async fn test_reconcile_moves_alias_from_stale_image() {
        let client = Arc::new(FakeLxd::with_images(vec![FakeLxd::image(
            "0ld5tale",
            &["termserver"],
        )]));
        let reconciler = ImageReconciler::new(client.clone());

        reconciler.reconcile(DATA, "termserver").await.unwrap();

        let state = client.state.lock().unwrap();
        assert_eq!(state.imports, 1);
        assert_eq!(state.alias_deletes, 1);
        assert_eq!(state.alias_creates, 1);
        let holder: Vec<_> = state
            .images
            .iter()
            .filter(|image| image.has_alias("termserver"))
            .collect();
        assert_eq!(holder.len(), 1);
        assert_eq!(holder[0].fingerprint, fingerprint(DATA));
    }

    #[tokio::test]
    async fn test_reconcile_realias_without_import_when_content_present() {
        let client = Arc::new(FakeLxd::with_images(vec![
            FakeLxd::image("0ld5tale", &["termserver"]),
            FakeLxd::image(&fingerprint(DATA), &[]),
        ]));
        let reconciler = ImageReconciler::new(client.clone());

        reconciler.reconcile(DATA, "termserver").await.unwrap();

        let state = client.state.lock().unwrap();
        assert_eq!(state.imports, 0);
        assert_eq!(state.alias_deletes, 1);
        assert_eq!(state.alias_creates, 1);
    }

    #[tokio::test]
    async fn test_reconcile_tolerates_duplicate_fingerprints() {
        let client = Arc::new(FakeLxd::with_images(vec![
            FakeLxd::image(&fingerprint(DATA), &["termserver"]),
            FakeLxd::image(&fingerprint(DATA), &[]),
        ]));
        let reconciler = ImageReconciler::new(client.clone());

        reconciler.reconcile(DATA, "termserver").await.unwrap();

        let state = client.state.lock().unwrap();
        assert_eq!(state.imports, 0);
        assert_eq!(state.alias_creates, 0);
        assert_eq!(state.alias_deletes, 0);
    }

    #[tokio::test]
    async fn test_reconcile_leaves_other_aliases_alone() {
        let client = Arc::new(FakeLxd::with_images(vec![FakeLxd::image(
            "0ld5tale",
            &["keepme", "termserver"],
        )]));
        let reconciler = ImageReconciler::new(client.clone());

        reconciler.reconcile(DATA, "termserver").await.unwrap();

        let state = client.state.lock().unwrap();
        assert!(state.images[0].has_alias("keepme"));
        assert!(!state.images[0].has_alias("termserver"));
    }
}
