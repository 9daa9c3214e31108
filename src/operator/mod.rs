//! Unit lifecycle orchestration.
//!
//! This module re-expresses the charm hooks as sequential passes composed
//! from the execution, LXD and configuration layers. Each pass loads the
//! persisted operator state, runs its steps and saves the state back, so
//! the hook machinery's flag bag is replaced by one explicit value.
//!
//! ## Architecture
//!
//! The operator module is organized into several components:
//!
//! - [`hooks`]: the lifecycle passes (install, configure, start, stop,
//!   restart, upgrade, teardown)
//! - [`resources`]: charm resource retrieval through `resource-get`
//! - [`service`]: systemd unit rendering and lifecycle commands
//! - [`state`]: durable operator state carried between passes
//! - [`tools`]: `status-set`, `open-port` and `close-port` hook tools
//!
//! ## Usage
//!
//! ```rust,no_run
//! use jujushell_operator::exec::HostRunner;
//! use jujushell_operator::lxd::LxcClient;
//! use jujushell_operator::operator::{Operator, OperatorConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runner = Arc::new(HostRunner::new());
//!     let client = Arc::new(LxcClient::connect()?);
//!     let config = OperatorConfig::default();
//!
//!     let operator = Operator::new(runner, client, config, "/srv/charm");
//!     operator.start().await?;
//!     Ok(())
//! }
//! ```

pub mod hooks;
pub mod resources;
pub mod service;
pub mod state;
pub mod tools;

pub use hooks::{Operator, OperatorConfig};
pub use resources::{ResourceError, ResourceFetcher};
pub use service::{ServiceError, ServiceManager, render_unit};
pub use state::OperatorState;
pub use tools::Status;
