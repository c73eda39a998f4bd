//! Container domain types and strict input validation.
//!
//! The accepted grammars for ports, links, volumes, and environment
//! entries match the engine's create schema; anything else is a
//! [`ValidationError`] raised before a single network call is made.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::ValidationError;

/// Who may see a container in operator-facing listings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// The registry's record of a container: local metadata layered over a
/// runtime-assigned id. `container_id` is unique within its host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Container {
    pub container_id: String,
    /// Name of the owning [`crate::domain::host::Host`] (a reference,
    /// not ownership — the host record lives separately).
    pub host: String,
    #[serde(default)]
    pub description: String,
    pub is_running: bool,
    #[serde(default)]
    pub protected: bool,
    /// Set only when the container was created as private.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to create a container on a host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub image: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub ports: Vec<String>,
    #[serde(default)]
    pub environment: Vec<String>,
    /// Memory limit in megabytes; `None` means unlimited.
    #[serde(default)]
    pub memory_mb: Option<u64>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub volumes: Vec<String>,
    #[serde(default)]
    pub volumes_from: Option<String>,
    #[serde(default)]
    pub privileged: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
}

/// Upper bound on a container's memory limit, 1 TiB expressed in MB.
/// Keeps the engine-facing byte conversion far from `u64` overflow.
pub const MAX_MEMORY_MB: u64 = 1_048_576;

impl ContainerSpec {
    /// Validate every field strictly.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.image.trim().is_empty() {
            return Err(ValidationError::EmptyImage);
        }
        if let Some(mb) = self.memory_mb {
            if mb > MAX_MEMORY_MB {
                return Err(ValidationError::InvalidMemory(mb));
            }
        }
        for p in &self.ports {
            parse_port(p)?;
        }
        for l in &self.links {
            parse_link(l)?;
        }
        for v in &self.volumes {
            parse_volume(v)?;
        }
        for e in &self.environment {
            parse_env(e)?;
        }
        Ok(())
    }
}

// ── Port grammar ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

/// A validated port specification: `PORT`, `PORT/proto`, `HOST:PORT`,
/// or `HOST:PORT/proto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    pub host_port: Option<u16>,
    pub container_port: u16,
    pub protocol: Protocol,
}

impl PortMapping {
    /// Engine-facing key, e.g. `"80/tcp"`.
    #[must_use]
    pub fn engine_key(&self) -> String {
        format!("{}/{}", self.container_port, self.protocol.as_str())
    }
}

fn parse_port_number(s: &str, raw: &str) -> Result<u16, ValidationError> {
    match s.parse::<u16>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ValidationError::InvalidPort(raw.to_string())),
    }
}

/// Parse one entry of a port list.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidPort`] on any deviation from the
/// grammar, including out-of-range or zero ports.
pub fn parse_port(raw: &str) -> Result<PortMapping, ValidationError> {
    let (spec, protocol) = match raw.split_once('/') {
        None => (raw, Protocol::Tcp),
        Some((spec, "tcp")) => (spec, Protocol::Tcp),
        Some((spec, "udp")) => (spec, Protocol::Udp),
        Some(_) => return Err(ValidationError::InvalidPort(raw.to_string())),
    };
    match spec.split_once(':') {
        None => Ok(PortMapping {
            host_port: None,
            container_port: parse_port_number(spec, raw)?,
            protocol,
        }),
        Some((host, container)) => Ok(PortMapping {
            host_port: Some(parse_port_number(host, raw)?),
            container_port: parse_port_number(container, raw)?,
            protocol,
        }),
    }
}

// ── Link grammar ──────────────────────────────────────────────────────────────

/// A validated link: `NAME` or `NAME:ALIAS`. The alias defaults to the
/// container name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub name: String,
    pub alias: String,
}

fn valid_link_part(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.')
}

/// Parse one entry of a link list.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidLink`] when either side is empty
/// or contains characters outside `[A-Za-z0-9._-]`.
pub fn parse_link(raw: &str) -> Result<Link, ValidationError> {
    let (name, alias) = match raw.split_once(':') {
        None => (raw, raw),
        Some((name, alias)) => (name, alias),
    };
    if !valid_link_part(name) || !valid_link_part(alias) {
        return Err(ValidationError::InvalidLink(raw.to_string()));
    }
    Ok(Link {
        name: name.to_string(),
        alias: alias.to_string(),
    })
}

// ── Volume grammar ────────────────────────────────────────────────────────────

/// A validated volume: an anonymous container path or a host bind with
/// an optional access mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMount {
    pub host_path: Option<String>,
    pub container_path: String,
    pub read_only: bool,
}

/// Parse one entry of a volume list. Both sides must be absolute paths.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidVolume`] for relative paths,
/// empty segments, or an unknown access mode.
pub fn parse_volume(raw: &str) -> Result<VolumeMount, ValidationError> {
    let parts: Vec<&str> = raw.split(':').collect();
    let invalid = || ValidationError::InvalidVolume(raw.to_string());
    let absolute = |p: &str| p.len() > 1 && p.starts_with('/');
    match parts.as_slice() {
        [container] if absolute(container) => Ok(VolumeMount {
            host_path: None,
            container_path: (*container).to_string(),
            read_only: false,
        }),
        [host, container] if absolute(host) && absolute(container) => Ok(VolumeMount {
            host_path: Some((*host).to_string()),
            container_path: (*container).to_string(),
            read_only: false,
        }),
        [host, container, mode] if absolute(host) && absolute(container) => {
            let read_only = match *mode {
                "ro" => true,
                "rw" => false,
                _ => return Err(invalid()),
            };
            Ok(VolumeMount {
                host_path: Some((*host).to_string()),
                container_path: (*container).to_string(),
                read_only,
            })
        }
        _ => Err(invalid()),
    }
}

// ── Environment grammar ───────────────────────────────────────────────────────

/// Parse one `KEY=VALUE` environment entry.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidEnv`] when the `=` is missing or
/// the key is empty.
pub fn parse_env(raw: &str) -> Result<(String, String), ValidationError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(ValidationError::InvalidEnv(raw.to_string())),
    }
}
