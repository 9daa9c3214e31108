//! Environment constants and path utilities for the jujushell operator.
//!
//! This module centralizes the well-known paths, binary locations and LXD
//! names used throughout the operator, making them easier to maintain.

use std::path::{Path, PathBuf};

/// Environment variable pointing at the charm directory.
pub const JUJU_CHARM_DIR_ENV: &str = "JUJU_CHARM_DIR";

/// Legacy charm directory environment variable, still set by older agents.
pub const CHARM_DIR_ENV: &str = "CHARM_DIR";

/// Environment variable carrying whitespace-separated controller addresses.
pub const API_ADDRESSES_ENV: &str = "JUJU_API_ADDRESSES";

/// LXD-related names and binaries
pub mod lxd {
    use std::time::Duration;

    /// lxc client binary installed by the snap
    pub const LXC_BIN: &str = "/snap/bin/lxc";

    /// lxd daemon binary installed by the snap
    pub const LXD_BIN: &str = "/snap/bin/lxd";

    /// Bridge network the termserver instances attach to
    pub const BRIDGE_NAME: &str = "jujushellbr0";

    /// ZFS storage pool backing the instances
    pub const STORAGE_POOL: &str = "data";

    /// Profile carrying the root disk, the bridged nic and resource quotas
    pub const DEFAULT_PROFILE: &str = "default";

    /// Profile applied to restricted termserver instances
    pub const LIMITED_PROFILE: &str = "termserver-limited";

    /// Alias the termserver image is published under
    pub const IMAGE_ALIAS: &str = "termserver";

    /// How long `lxd waitready` is allowed to take
    pub const READY_TIMEOUT: Duration = Duration::from_secs(30);
}

/// Systemd service names and locations
pub mod service {
    /// Location of the installed unit file
    pub const UNIT_PATH: &str = "/usr/lib/systemd/user/jujushell.service";

    /// Unit name used with systemctl start/stop/restart
    pub const SERVICE_NAME: &str = "jujushell";
}

/// Charm resource names as declared in the charm metadata
pub mod resource {
    /// The jujushell daemon binary
    pub const JUJUSHELL: &str = "jujushell";

    /// The full termserver image tarball
    pub const TERMSERVER: &str = "termserver";

    /// The restricted termserver image tarball
    pub const LIMITED_TERMSERVER: &str = "limited-termserver";
}

/// Locate the charm directory from the process environment.
///
/// Falls back to the current directory so the operator stays runnable
/// outside a hook context.
pub fn charm_dir() -> PathBuf {
    std::env::var_os(JUJU_CHARM_DIR_ENV)
        .or_else(|| std::env::var_os(CHARM_DIR_ENV))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Build the files directory path inside the charm directory
pub fn files_dir(charm_dir: &Path) -> PathBuf {
    charm_dir.join("files")
}

/// Build the daemon configuration file path
pub fn config_file_path(charm_dir: &Path) -> PathBuf {
    files_dir(charm_dir).join("config.yaml")
}

/// Build the jujushell daemon binary path
pub fn jujushell_binary_path(charm_dir: &Path) -> PathBuf {
    files_dir(charm_dir).join("jujushell")
}

/// Build the persisted operator state file path
pub fn state_file_path(charm_dir: &Path) -> PathBuf {
    files_dir(charm_dir).join("operator-state.yaml")
}

/// Build the operator configuration file path
pub fn operator_config_path(charm_dir: &Path) -> PathBuf {
    charm_dir.join("operator.yaml")
}

/// Build the unit agent file path holding the controller credential
pub fn agent_conf_path(charm_dir: &Path) -> PathBuf {
    charm_dir.join("..").join("agent.conf")
}

/// Directory where the termserver image tarballs are staged
pub const IMAGE_STORE_DIR: &str = "/var/tmp";

/// Build the staging path for the termserver image tarball
pub fn termserver_path(store: &Path, limited: bool) -> PathBuf {
    let suffix = if limited { "-limited" } else { "" };
    store.join(format!("termserver{}.tar.gz", suffix))
}
