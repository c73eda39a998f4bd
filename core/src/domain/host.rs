//! Host domain types and pure validation functions.
//!
//! This module is intentionally free of I/O, async, and external layer
//! imports. All functions take data in and return data out.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::HostError;

/// TLS material for a host that requires client authentication.
/// Paths point at PEM files readable by the control plane process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TlsMaterial {
    pub ca_cert: PathBuf,
    pub client_cert: PathBuf,
    pub client_key: PathBuf,
}

/// A remote container-engine host known to the control plane.
///
/// `name` is the operator-facing identity; `hostname:port` is where
/// the engine API listens. Disabled hosts are skipped by listing and
/// search but stay in the registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Host {
    pub name: String,
    pub hostname: String,
    pub port: u16,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsMaterial>,
}

fn default_enabled() -> bool {
    true
}

impl Host {
    /// Engine API base URL. TLS material switches the scheme to https.
    #[must_use]
    pub fn endpoint(&self) -> String {
        let scheme = if self.tls.is_some() { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.hostname, self.port)
    }
}

/// Validates a host name: lowercase alphanumerics and inner dashes,
/// at most 63 characters.
///
/// # Errors
///
/// Returns [`HostError::InvalidName`] if the name doesn't match.
pub fn validate_host_name(name: &str) -> Result<()> {
    let bytes = name.as_bytes();
    let valid = !bytes.is_empty()
        && bytes.len() <= 63
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        && !name.starts_with('-')
        && !name.ends_with('-');
    if !valid {
        return Err(HostError::InvalidName(name.to_string()).into());
    }
    Ok(())
}
