//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must
//! fulfill. This file imports only from `crate::domain` and
//! `flotilla_common` — never from `crate::infra`.

use std::path::PathBuf;

use anyhow::Result;
use flotilla_common::{Metric, RepoResult};
use serde::{Deserialize, Serialize};

use crate::domain::config::ControlPlaneConfig;
use crate::domain::container::{Container, ContainerSpec};
use crate::domain::error::{BuildInputError, ConnectionError};
use crate::domain::host::Host;

// ── Value Types ───────────────────────────────────────────────────────────────

/// One container as reported by a host's engine listing. This is live
/// runtime state, distinct from the registry's [`Container`] record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContainerInfo {
    pub id: String,
    pub image: String,
    #[serde(default)]
    pub command: String,
    /// Engine status line, e.g. `"Up 2 hours"` or `"Exited (0) ..."`.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub names: Vec<String>,
    pub created: i64,
}

/// Result of a successful container creation on one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedContainer {
    pub id: String,
    pub warnings: Vec<String>,
}

// ── Engine Port Traits ────────────────────────────────────────────────────────

/// One live connection to a host's container engine.
///
/// Every method is a remote call; transport failures, timeouts, and
/// non-2xx responses surface as [`crate::domain::error::RuntimeError`]
/// carrying the host identity — never swallowed.
#[allow(async_fn_in_trait)]
pub trait HostRuntime {
    /// List containers; `all` includes stopped ones.
    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerInfo>>;
    /// Create and start a container from a validated spec.
    async fn create_container(&self, spec: &ContainerSpec) -> Result<CreatedContainer>;
    async fn stop(&self, id: &str) -> Result<()>;
    async fn restart(&self, id: &str) -> Result<()>;
    /// Force-remove the container from the host.
    async fn destroy(&self, id: &str) -> Result<()>;
    /// Create and start a duplicate of an existing container.
    async fn clone_container(&self, id: &str) -> Result<CreatedContainer>;
    async fn logs(&self, id: &str) -> Result<String>;
    /// Proxy an image registry search through this host.
    async fn search(&self, query: &str) -> Result<Vec<RepoResult>>;
    /// Submit an image build; returns a submission id, not completion.
    async fn build_image(&self, definition: &[u8], tag: &str) -> Result<String>;
}

/// Resolves a [`Host`] into a live engine connection.
#[allow(async_fn_in_trait)]
pub trait RuntimeConnector {
    type Conn: HostRuntime;
    /// Establish (and verify) a connection to the host's engine.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when the host is unreachable or
    /// misconfigured.
    async fn connect(&self, host: &Host) -> Result<Self::Conn, ConnectionError>;
}

// ── Registry Store Port ───────────────────────────────────────────────────────

/// Durable store for [`Host`] and [`Container`] records.
///
/// Every mutation is atomic at single-record granularity. Mutators on
/// containers return whether the record existed so services can map
/// `false` to a typed not-found error. The store is opened at process
/// start and flushed at shutdown — no ambient singletons.
#[allow(async_fn_in_trait)]
pub trait RegistryStore {
    async fn find_host(&self, name: &str) -> Result<Option<Host>>;
    async fn hosts(&self) -> Result<Vec<Host>>;
    async fn enabled_hosts(&self) -> Result<Vec<Host>>;
    /// Insert or replace a host record.
    async fn save_host(&self, host: Host) -> Result<()>;

    async fn find_container(&self, id: &str) -> Result<Option<Container>>;
    async fn containers(&self) -> Result<Vec<Container>>;
    /// Insert or replace a container record.
    async fn insert_container(&self, container: Container) -> Result<()>;
    async fn remove_container(&self, id: &str) -> Result<bool>;
    async fn set_description(&self, id: &str, description: &str) -> Result<bool>;
    async fn set_protected(&self, id: &str, protected: bool) -> Result<bool>;
    async fn set_running(&self, id: &str, running: bool) -> Result<bool>;

    /// Persist any pending state. Called at shutdown.
    async fn flush(&self) -> Result<()>;
}

// ── Metrics Port (read-only) ──────────────────────────────────────────────────

/// Read access to the external metrics store. The core never writes
/// metric points.
#[allow(async_fn_in_trait)]
pub trait MetricSource {
    /// Points for `source` and `counter`, newest first, at most `limit`.
    async fn query(&self, source: &str, counter: &str, limit: usize) -> Result<Vec<Metric>>;
}

// ── Selection and Tokens ──────────────────────────────────────────────────────

/// Uniform choice over a candidate host slice. Injected so tests can
/// substitute a deterministic picker.
pub trait HostSelector {
    /// Pick one candidate, or `None` when the slice is empty.
    fn pick<'a>(&self, candidates: &'a [Host]) -> Option<&'a Host>;
}

/// Issues unpredictable, unique session tokens.
pub trait TokenSource {
    fn issue(&self) -> String;
}

// ── Build Input Port ──────────────────────────────────────────────────────────

/// Fetches a build definition from a URL, ahead of any fan-out.
#[allow(async_fn_in_trait)]
pub trait BuildFetcher {
    /// # Errors
    ///
    /// Returns [`BuildInputError::Fetch`] — never the upload variant —
    /// so callers can tell the two input paths apart.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, BuildInputError>;
}

// ── Config Store Port ─────────────────────────────────────────────────────────

/// Loads and saves the control-plane configuration file.
pub trait ConfigStore {
    fn load(&self) -> Result<ControlPlaneConfig>;
    fn save(&self, config: &ControlPlaneConfig) -> Result<()>;
    fn path(&self) -> Result<PathBuf>;
}
