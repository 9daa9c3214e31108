//! Desired-state configuration inputs.

use serde::{Deserialize, Serialize};

/// Where the controller credential comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CredentialSource {
    /// PEM text supplied directly, possibly empty
    Literal(String),
    /// Read the certificate from the unit agent file
    FromUnit,
}

impl From<String> for CredentialSource {
    fn from(value: String) -> Self {
        if value.trim() == "from-unit" {
            Self::FromUnit
        } else {
            Self::Literal(value)
        }
    }
}

impl From<CredentialSource> for String {
    fn from(value: CredentialSource) -> Self {
        match value {
            CredentialSource::FromUnit => "from-unit".to_string(),
            CredentialSource::Literal(value) => value,
        }
    }
}

impl Default for CredentialSource {
    fn default() -> Self {
        Self::Literal(String::new())
    }
}

/// Desired daemon configuration as supplied by the operator.
///
/// A fresh intent replaces the previous one wholesale; nothing here is
/// mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConfigIntent {
    /// Controller API addresses as host:port pairs
    pub addresses: Vec<String>,
    /// Daemon log level
    pub log_level: String,
    /// Port the daemon listens on
    pub port: u16,
    /// Whether the daemon serves TLS
    pub tls: bool,
    /// Base64-encoded PEM certificate, paired with `tls_key`
    pub tls_cert: Option<String>,
    /// Base64-encoded PEM key, paired with `tls_cert`
    pub tls_key: Option<String>,
    /// DNS name for externally managed certificates
    pub dns_name: Option<String>,
    /// Controller credential source
    pub credential: CredentialSource,
}

impl Default for ConfigIntent {
    fn default() -> Self {
        Self {
            addresses: Vec::new(),
            log_level: "info".to_string(),
            port: 4247,
            tls: true,
            tls_cert: None,
            tls_key: None,
            dns_name: None,
            credential: CredentialSource::default(),
        }
    }
}

/// Port the daemon must listen on once TLS policy is applied.
///
/// DNS-managed certificate issuance requires the standard HTTPS port.
pub fn resolved_port(intent: &ConfigIntent) -> u16 {
    if intent.tls && non_empty(&intent.dns_name).is_some() {
        443
    } else {
        intent.port
    }
}

/// Exposure adjustment between two configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortChange {
    /// Port that must be open after the change
    pub open: u16,
    /// Previously open port that must be closed, if any
    pub close: Option<u16>,
}

/// Compute the exposure change from `previous` to `current`.
pub fn diff_ports(previous: Option<&ConfigIntent>, current: &ConfigIntent) -> PortChange {
    let open = resolved_port(current);
    let close = previous.map(resolved_port).filter(|&port| port != open);
    PortChange { open, close }
}

/// Trimmed value of an optional field, with empty strings treated as unset.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
