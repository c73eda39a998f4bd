//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra` or
//! `crate::application`. All error types implement `thiserror::Error`
//! and convert to `anyhow::Error` via the `?` operator, so callers can
//! recover the typed cause with `downcast_ref`.

use thiserror::Error;

// ── Host errors ───────────────────────────────────────────────────────────────

/// Errors related to host identity and administration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("host '{0}' not found")]
    NotFound(String),

    #[error("host '{0}' is disabled")]
    Disabled(String),

    #[error("invalid host name '{0}': must match ^[a-z0-9]([a-z0-9-]*[a-z0-9])?$")]
    InvalidName(String),
}

/// A host could not be reached or refused the connection handshake.
#[derive(Debug, Error)]
#[error("cannot connect to host '{host}' at {endpoint}: {reason}")]
pub struct ConnectionError {
    pub host: String,
    pub endpoint: String,
    pub reason: String,
}

// ── Container errors ──────────────────────────────────────────────────────────

/// Errors related to container records and protection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContainerError {
    #[error("container '{0}' not found")]
    NotFound(String),

    #[error("container '{id}' is protected; refusing to {op}")]
    Protected { id: String, op: &'static str },
}

/// A remote engine call was rejected or failed. Always carries the
/// host (and, where applicable, container) it was issued against.
#[derive(Debug, Error)]
#[error("{op} failed on host '{host}'{}: {reason}", .container.as_deref().map(|c| format!(" (container {c})")).unwrap_or_default())]
pub struct RuntimeError {
    pub host: String,
    pub container: Option<String>,
    pub op: &'static str,
    pub reason: String,
}

// ── Precondition errors ───────────────────────────────────────────────────────

/// Fan-out and search preconditions on the target host set.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no hosts selected")]
    NoHostsSelected,

    #[error("no enabled hosts available")]
    NoHostsAvailable,
}

// ── Input validation ──────────────────────────────────────────────────────────

/// Malformed operation input, detected before any network call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("image reference must not be empty")]
    EmptyImage,

    #[error("invalid port '{0}': expected PORT, PORT/tcp|udp, HOST:PORT or HOST:PORT/proto with ports 1-65535")]
    InvalidPort(String),

    #[error("invalid link '{0}': expected NAME or NAME:ALIAS")]
    InvalidLink(String),

    #[error("invalid volume '{0}': expected /container/path or /host/path:/container/path[:ro|rw]")]
    InvalidVolume(String),

    #[error("invalid memory limit {0} MB: must be at most 1048576 (1 TiB)")]
    InvalidMemory(u64),

    #[error("invalid environment entry '{0}': expected KEY=VALUE")]
    InvalidEnv(String),
}

// ── Build input ───────────────────────────────────────────────────────────────

/// Build-definition acquisition failures. URL fetches and local
/// uploads fail differently and the report must say which it was.
#[derive(Debug, Error)]
pub enum BuildInputError {
    #[error("failed to fetch build definition from {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("failed to read uploaded build definition: {reason}")]
    Upload { reason: String },
}

// ── Console sessions ──────────────────────────────────────────────────────────

/// Console session token failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("unknown console session token")]
    Unknown,

    #[error("console session token has expired")]
    Expired,
}
