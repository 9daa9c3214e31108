//! LXD runtime provisioning and image management.
//!
//! This module drives the snap-installed LXD daemon through its command line
//! tools: importing and aliasing the termserver image, initializing the
//! bridge network, storage pool and instance profiles, applying resource
//! quotas and deleting containers on teardown.
//!
//! ## Architecture
//!
//! - [`client`]: the [`LxdClient`] trait and its CLI-backed production
//!   implementation [`LxcClient`]
//! - [`image`]: content-addressed image reconciliation
//! - [`bootstrap`]: preseed initialization and daemon readiness
//! - [`profile`]: resource quotas on the default profile
//! - [`containers`]: container cleanup for teardown
//!
//! ## Usage
//!
//! ```rust,no_run
//! use jujushell_operator::lxd::{ImageReconciler, LxcClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Arc::new(LxcClient::connect()?);
//!     let data = std::fs::read("/var/tmp/termserver.tar.gz")?;
//!     ImageReconciler::new(client)
//!         .reconcile(&data, "termserver")
//!         .await?;
//!     Ok(())
//! }
//! ```

mod bootstrap;
mod client;
mod containers;
mod image;
mod profile;

#[cfg(test)]
pub(crate) mod testing;

pub use bootstrap::{Bootstrapper, RuntimeState, preseed_document};
pub use client::{ImageAlias, ImageRecord, LxcClient, LxdClient};
pub use containers::ContainerReaper;
pub use image::{ImageReconciler, fingerprint};
pub use profile::{ProfileTuner, QuotaIntent};

use std::time::Duration;

/// Errors from LXD provisioning and image operations.
#[derive(Debug, thiserror::Error)]
pub enum LxdError {
    /// Command execution failure
    #[error("command execution failed: {0}")]
    Exec(#[from] crate::exec::ExecError),

    /// The daemon did not answer waitready in time
    #[error("lxd not ready after {timeout:?}")]
    NotReady {
        /// How long the daemon was given
        timeout: Duration,
    },

    /// A CLI listing produced unparseable JSON
    #[error("cannot parse {what} listing: {source}")]
    Listing {
        /// Which listing failed
        what: &'static str,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The client tools are not installed on this host
    #[error("lxd client unavailable: {0}")]
    Unavailable(String),

    /// IO error staging image data
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for LXD operations.
pub type Result<T> = std::result::Result<T, LxdError>;
