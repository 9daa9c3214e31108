//! Daemon configuration synthesis.
//!
//! Turns the operator-supplied [`ConfigIntent`] into the fully resolved
//! configuration the jujushell daemon reads at startup: controller addresses
//! (with an environment fallback), the controller credential (optionally
//! pulled from the unit agent file), the listen port (forced to 443 for
//! DNS-managed certificates) and the TLS key material (provided, DNS-managed
//! or generated on the spot).
//!
//! ## Architecture
//!
//! - [`intent`]: desired-state inputs and the port diffing rules
//! - [`resolved`]: the on-disk document consumed by the daemon
//! - [`tls`]: TLS policy resolution and certificate generation
//! - [`synth`]: the resolver wiring the pieces together
//!
//! ## Usage
//!
//! ```rust,no_run
//! use jujushell_operator::config::{ConfigIntent, Synthesizer};
//! use jujushell_operator::exec::HostRunner;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let intent = ConfigIntent {
//!         addresses: vec!["1.2.3.4:17070".to_string()],
//!         ..ConfigIntent::default()
//!     };
//!     let synthesizer = Synthesizer::new(
//!         Arc::new(HostRunner::new()),
//!         "/var/lib/juju/agents/unit-jujushell-0/agent.conf",
//!     );
//!     let resolved = synthesizer.synthesize(&intent).await?;
//!     resolved.write_to("files/config.yaml".as_ref())?;
//!     Ok(())
//! }
//! ```

mod intent;
mod resolved;
mod synth;
mod tls;

pub use intent::{ConfigIntent, CredentialSource, PortChange, diff_ports, resolved_port};
pub use resolved::ResolvedConfig;
pub use synth::Synthesizer;
pub use tls::TlsMaterial;

use std::path::PathBuf;

/// Errors while resolving the daemon configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Neither the intent nor the environment provides addresses
    #[error("could not find API addresses")]
    MissingAddresses,

    /// The unit agent file is unreadable or has no certificate
    #[error("cannot read credential from {}: {reason}", path.display())]
    Credential {
        /// Agent file that was consulted
        path: PathBuf,
        /// What went wrong reading it
        reason: String,
    },

    /// Provided certificate material is not valid base64
    #[error("cannot decode {field}: {source}")]
    CertDecode {
        /// Which intent field failed to decode
        field: &'static str,
        /// Underlying decode error
        #[source]
        source: base64::DecodeError,
    },

    /// Decoded certificate material is not UTF-8 PEM text
    #[error("{field} is not valid UTF-8")]
    CertEncoding {
        /// Which intent field held the bad payload
        field: &'static str,
    },

    /// Certificate generation subprocess failure
    #[error("command execution failed: {0}")]
    Exec(#[from] crate::exec::ExecError),

    /// IO error reading or writing configuration files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization failure
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for configuration resolution.
pub type Result<T> = std::result::Result<T, ConfigError>;
