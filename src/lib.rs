//! # Jujushell Operator
//!
//! A Rust operator that manages the lifecycle of the jujushell
//! terminal-serving daemon on a host machine: fetching binary and image
//! resources, provisioning a local LXD runtime, synthesizing the daemon
//! configuration and driving the systemd service.
//!
//! ## Architecture Overview
//!
//! The system consists of several key components organized into modules:
//!
//! - **[`exec`]**: External command execution behind a mockable async trait
//! - **[`lxd`]**: LXD access, image reconciliation, runtime bootstrap,
//!   profile quotas and container teardown
//! - **[`config`]**: Daemon configuration synthesis including TLS policy
//!   resolution and certificate generation
//! - **[`operator`]**: The lifecycle passes and the durable state carried
//!   between them
//! - **[`metrics`]**: Prometheus metric collection for the dashboard
//! - **[`cli`]**: The command line surface mapping subcommands to passes
//!
//! ## Design Notes
//!
//! - **Idempotent reconciliation**: the image reconciler fingerprints the
//!   desired content and performs at most the import/alias operations that
//!   are actually missing, so passes can be re-run safely
//! - **Explicit state**: bootstrap progress and the previously applied
//!   configuration live in one persisted value instead of scattered flags
//! - **Mockable seams**: everything that touches the host goes through the
//!   [`exec::CommandRunner`] and [`lxd::LxdClient`] traits
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jujushell_operator::lxd::{ImageReconciler, LxcClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Publish a termserver image under its alias
//!     let client = Arc::new(LxcClient::connect()?);
//!     let image = std::fs::read("/var/tmp/termserver.tar.gz")?;
//!     ImageReconciler::new(client)
//!         .reconcile(&image, "termserver")
//!         .await?;
//!     Ok(())
//! }
//! ```

/// External command execution layer.
///
/// Runs programs with argument-vector semantics behind the mockable
/// [`exec::CommandRunner`] trait and turns non-zero exits into structured
/// failures.
pub mod exec;

/// LXD runtime management.
///
/// Provides the [`lxd::LxdClient`] seam over the snap-installed CLI tools,
/// content-addressed image reconciliation, the preseed-based runtime
/// bootstrap, profile quotas and container teardown.
pub mod lxd;

/// Daemon configuration synthesis.
///
/// Resolves a configuration intent into the document the daemon reads,
/// including address fallback, credential lookup and TLS material
/// resolution with on-demand certificate generation.
pub mod config;

/// Unit lifecycle orchestration.
///
/// The sequential passes behind each operator subcommand, the hook tool
/// wrappers and the durable state persisted between passes.
pub mod operator;

/// Daemon metrics collection.
///
/// Fetches the daemon's Prometheus endpoint and extracts single named
/// metrics for the external dashboard.
pub mod metrics;

/// Environment constants and path utilities.
///
/// Centralizes the well-known paths, binary locations and LXD names used
/// throughout the operator.
pub mod env;

// Re-export the execution surface
pub use exec::{CommandLine, CommandOutput, CommandRunner, HostRunner};

// Re-export the main LXD types
pub use lxd::{Bootstrapper, ImageReconciler, LxcClient, LxdClient, RuntimeState};

// Re-export the main configuration types
pub use config::{ConfigIntent, ResolvedConfig, Synthesizer};

// Re-export the main operator types
pub use operator::{Operator, OperatorConfig, OperatorState};

// CLI module for the command-line interface
pub mod cli;
