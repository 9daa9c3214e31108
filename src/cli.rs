//! Command line surface of the operator.
//!
//! Each subcommand maps to one lifecycle pass:
//! - `install`: provision packages, resources, config and service unit
//! - `config-changed`: apply a changed configuration
//! - `start`: bootstrap LXD, publish the image, start the daemon
//! - `stop` / `restart`: drive the systemd unit
//! - `upgrade`: refresh resources after a charm upgrade
//! - `teardown`: force-delete all containers
//! - `collect-metric`: print one daemon metric for the dashboard

use crate::env;
use crate::exec::HostRunner;
use crate::lxd::{LxcClient, LxdClient};
use crate::metrics;
use crate::operator::{Operator, OperatorConfig};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "jujushell-operator")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Manages the jujushell terminal-serving daemon and its LXD runtime")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Operator configuration file (defaults to operator.yaml in the charm directory)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Provision the host: packages, resources, daemon config, service unit
    Install,
    /// Apply a changed configuration and restart the daemon
    ConfigChanged,
    /// Bootstrap LXD, publish the termserver image and start the daemon
    Start,
    /// Stop the daemon
    Stop,
    /// Restart the daemon
    Restart,
    /// Refresh resources and configuration after a charm upgrade
    Upgrade,
    /// Force-delete every container known to the runtime
    Teardown,
    /// Print the value of a daemon metric
    CollectMetric {
        /// Short metric name, for example requests_count
        name: String,
    },
}

impl Cli {
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Execute the selected subcommand.
    pub async fn run(self) -> Result<()> {
        if let Command::CollectMetric { name } = &self.command {
            println!("{}", metrics::collect(name).await);
            return Ok(());
        }

        let charm_dir = env::charm_dir();
        info!("starting the jujushell operator from {:?}", charm_dir);
        let config_path = self
            .config
            .clone()
            .unwrap_or_else(|| env::operator_config_path(&charm_dir));
        let config = OperatorConfig::load(&config_path)?;

        let runner = Arc::new(HostRunner::new());
        let client: Arc<dyn LxdClient> = match self.command {
            // The lxd snap is not on the host yet when install runs.
            Command::Install => Arc::new(LxcClient::with_runner(runner.clone())),
            _ => Arc::new(LxcClient::connect().context("lxd is not available")?),
        };
        let operator = Operator::new(runner, client, config, charm_dir);

        match self.command {
            Command::Install => operator.install().await,
            Command::ConfigChanged => operator.configure().await,
            Command::Start => operator.start().await,
            Command::Stop => operator.stop().await,
            Command::Restart => operator.restart().await,
            Command::Upgrade => operator.upgrade().await,
            Command::Teardown => operator.teardown().await,
            // Handled before the operator is built.
            Command::CollectMetric { .. } => Ok(()),
        }
    }
}
