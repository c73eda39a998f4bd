//! Shared mock infrastructure for unit tests.
//!
//! Provides a scriptable [`RuntimeConnector`], an in-memory
//! [`RegistryStore`], and fixture builders so each test file doesn't
//! have to re-define the same boilerplate.

#![allow(clippy::expect_used)]

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use chrono::Utc;
use flotilla_common::{Metric, RepoResult};
use flotilla_core::application::ports::{
    BuildFetcher, ContainerInfo, CreatedContainer, HostRuntime, HostSelector, MetricSource,
    RegistryStore, RuntimeConnector, TokenSource,
};
use flotilla_core::domain::container::{Container, ContainerSpec};
use flotilla_core::domain::error::{BuildInputError, ConnectionError};
use flotilla_core::domain::host::Host;

// ── Fixtures ──────────────────────────────────────────────────────────────────

pub fn host(name: &str) -> Host {
    Host {
        name: name.to_string(),
        hostname: format!("{name}.internal"),
        port: 2375,
        enabled: true,
        tls: None,
    }
}

pub fn disabled_host(name: &str) -> Host {
    Host {
        enabled: false,
        ..host(name)
    }
}

pub fn container(id: &str, host: &str) -> Container {
    Container {
        container_id: id.to_string(),
        host: host.to_string(),
        description: String::new(),
        is_running: true,
        protected: false,
        owner: None,
        created_at: Utc::now(),
    }
}

pub fn spec(image: &str) -> ContainerSpec {
    ContainerSpec {
        image: image.to_string(),
        ..ContainerSpec::default()
    }
}

pub fn info(id: &str) -> ContainerInfo {
    ContainerInfo {
        id: id.to_string(),
        image: "busybox".to_string(),
        command: String::new(),
        status: "Up 2 minutes".to_string(),
        names: Vec::new(),
        created: 0,
    }
}

// ── Mock: runtime connector ───────────────────────────────────────────────────

#[derive(Default)]
struct ConnectorState {
    /// Every remote call, recorded as "op:host" or "op:host:arg".
    calls: Vec<String>,
    /// Hosts whose `connect` fails outright.
    fail_connect: HashSet<String>,
    /// "op:host" entries whose runtime call fails.
    fail_ops: HashSet<String>,
    /// Canned listings per host.
    listings: BTreeMap<String, Vec<ContainerInfo>>,
    /// Canned search results.
    repos: Vec<RepoResult>,
    /// When set, `list_containers` parks on this gate until notified,
    /// holding a refresh in flight for concurrency tests.
    list_gate: Option<Arc<tokio::sync::Notify>>,
    next_id: usize,
}

/// Scriptable engine connector. Records every call so tests can
/// assert not only outcomes but which remote operations ran.
#[derive(Default)]
pub struct MockConnector {
    state: Arc<Mutex<ConnectorState>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_connect(self, host: &str) -> Self {
        self.lock().fail_connect.insert(host.to_string());
        self
    }

    /// Make one operation fail, e.g. `fail_op("create", "beta")`.
    pub fn fail_op(self, op: &str, host: &str) -> Self {
        self.lock().fail_ops.insert(format!("{op}:{host}"));
        self
    }

    pub fn with_listing(self, host: &str, containers: Vec<ContainerInfo>) -> Self {
        self.lock().listings.insert(host.to_string(), containers);
        self
    }

    pub fn with_repos(self, repos: Vec<RepoResult>) -> Self {
        self.lock().repos = repos;
        self
    }

    /// Park every `list_containers` call on `gate` until notified.
    pub fn with_list_gate(self, gate: Arc<tokio::sync::Notify>) -> Self {
        self.lock().list_gate = Some(gate);
        self
    }

    /// Start failing connections to `host` mid-test.
    pub fn break_connections(&self, host: &str) {
        self.lock().fail_connect.insert(host.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ConnectorState> {
        self.state.lock().expect("connector state poisoned")
    }
}

impl RuntimeConnector for MockConnector {
    type Conn = MockRuntime;

    async fn connect(&self, host: &Host) -> Result<MockRuntime, ConnectionError> {
        let mut state = self.lock();
        state.calls.push(format!("connect:{}", host.name));
        if state.fail_connect.contains(&host.name) {
            return Err(ConnectionError {
                host: host.name.clone(),
                endpoint: host.endpoint(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(MockRuntime {
            host: host.name.clone(),
            state: Arc::clone(&self.state),
        })
    }
}

pub struct MockRuntime {
    host: String,
    state: Arc<Mutex<ConnectorState>>,
}

impl MockRuntime {
    fn call(&self, op: &str, arg: Option<&str>) -> Result<usize> {
        let mut state = self.state.lock().expect("connector state poisoned");
        match arg {
            Some(arg) => state.calls.push(format!("{op}:{}:{arg}", self.host)),
            None => state.calls.push(format!("{op}:{}", self.host)),
        }
        if state.fail_ops.contains(&format!("{op}:{}", self.host)) {
            return Err(anyhow!("{op} failed on host '{}': engine error", self.host));
        }
        state.next_id += 1;
        Ok(state.next_id)
    }
}

impl HostRuntime for MockRuntime {
    async fn list_containers(&self, _all: bool) -> Result<Vec<ContainerInfo>> {
        self.call("list", None)?;
        let gate = self
            .state
            .lock()
            .expect("connector state poisoned")
            .list_gate
            .clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let state = self.state.lock().expect("connector state poisoned");
        Ok(state.listings.get(&self.host).cloned().unwrap_or_default())
    }

    async fn create_container(&self, _spec: &ContainerSpec) -> Result<CreatedContainer> {
        let n = self.call("create", None)?;
        Ok(CreatedContainer {
            id: format!("{}-c{n}", self.host),
            warnings: Vec::new(),
        })
    }

    async fn stop(&self, id: &str) -> Result<()> {
        self.call("stop", Some(id)).map(|_| ())
    }

    async fn restart(&self, id: &str) -> Result<()> {
        self.call("restart", Some(id)).map(|_| ())
    }

    async fn destroy(&self, id: &str) -> Result<()> {
        self.call("destroy", Some(id)).map(|_| ())
    }

    async fn clone_container(&self, id: &str) -> Result<CreatedContainer> {
        let n = self.call("clone", Some(id))?;
        Ok(CreatedContainer {
            id: format!("{}-clone{n}", self.host),
            warnings: Vec::new(),
        })
    }

    async fn logs(&self, id: &str) -> Result<String> {
        self.call("logs", Some(id))?;
        Ok("  line one\nline two\n".to_string())
    }

    async fn search(&self, query: &str) -> Result<Vec<RepoResult>> {
        self.call("search", Some(query))?;
        let state = self.state.lock().expect("connector state poisoned");
        Ok(state.repos.clone())
    }

    async fn build_image(&self, _definition: &[u8], tag: &str) -> Result<String> {
        let n = self.call("build", Some(tag))?;
        Ok(format!("build-{n}"))
    }
}

// ── Mock: in-memory registry store ────────────────────────────────────────────

#[derive(Default)]
struct MemoryState {
    hosts: BTreeMap<String, Host>,
    containers: BTreeMap<String, Container>,
}

/// In-memory [`RegistryStore`] seeded through the builder methods.
#[derive(Default)]
pub struct MemoryRegistry {
    state: Mutex<MemoryState>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(self, host: Host) -> Self {
        self.lock().hosts.insert(host.name.clone(), host);
        self
    }

    pub fn with_container(self, container: Container) -> Self {
        self.lock()
            .containers
            .insert(container.container_id.clone(), container);
        self
    }

    pub fn container_count(&self) -> usize {
        self.lock().containers.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().expect("registry state poisoned")
    }
}

impl RegistryStore for MemoryRegistry {
    async fn find_host(&self, name: &str) -> Result<Option<Host>> {
        Ok(self.lock().hosts.get(name).cloned())
    }

    async fn hosts(&self) -> Result<Vec<Host>> {
        Ok(self.lock().hosts.values().cloned().collect())
    }

    async fn enabled_hosts(&self) -> Result<Vec<Host>> {
        Ok(self
            .lock()
            .hosts
            .values()
            .filter(|h| h.enabled)
            .cloned()
            .collect())
    }

    async fn save_host(&self, host: Host) -> Result<()> {
        self.lock().hosts.insert(host.name.clone(), host);
        Ok(())
    }

    async fn find_container(&self, id: &str) -> Result<Option<Container>> {
        Ok(self.lock().containers.get(id).cloned())
    }

    async fn containers(&self) -> Result<Vec<Container>> {
        Ok(self.lock().containers.values().cloned().collect())
    }

    async fn insert_container(&self, container: Container) -> Result<()> {
        self.lock()
            .containers
            .insert(container.container_id.clone(), container);
        Ok(())
    }

    async fn remove_container(&self, id: &str) -> Result<bool> {
        Ok(self.lock().containers.remove(id).is_some())
    }

    async fn set_description(&self, id: &str, description: &str) -> Result<bool> {
        let mut state = self.lock();
        match state.containers.get_mut(id) {
            Some(c) => {
                c.description = description.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_protected(&self, id: &str, protected: bool) -> Result<bool> {
        let mut state = self.lock();
        match state.containers.get_mut(id) {
            Some(c) => {
                c.protected = protected;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_running(&self, id: &str, running: bool) -> Result<bool> {
        let mut state = self.lock();
        match state.containers.get_mut(id) {
            Some(c) => {
                c.is_running = running;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

// ── Mock: selection, tokens, metrics, fetch ───────────────────────────────────

/// Always picks the first candidate, making search tests deterministic.
pub struct FirstSelector;

impl HostSelector for FirstSelector {
    fn pick<'a>(&self, candidates: &'a [Host]) -> Option<&'a Host> {
        candidates.first()
    }
}

/// Issues "tok-1", "tok-2", ... in order.
#[derive(Default)]
pub struct SeqTokenSource {
    next: AtomicUsize,
}

impl TokenSource for SeqTokenSource {
    fn issue(&self) -> String {
        format!("tok-{}", self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// Canned metric points, returned verbatim for any query.
#[derive(Default)]
pub struct StaticMetrics {
    pub points: Vec<Metric>,
}

impl MetricSource for StaticMetrics {
    async fn query(&self, _source: &str, _counter: &str, limit: usize) -> Result<Vec<Metric>> {
        Ok(self.points.iter().take(limit).cloned().collect())
    }
}

/// Returns fixed bytes, or a fetch error when constructed failing.
pub struct StaticFetcher {
    result: Result<Vec<u8>, String>,
}

impl StaticFetcher {
    pub fn ok(bytes: &[u8]) -> Self {
        Self {
            result: Ok(bytes.to_vec()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            result: Err(reason.to_string()),
        }
    }
}

impl BuildFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, BuildInputError> {
        match &self.result {
            Ok(bytes) => Ok(bytes.clone()),
            Err(reason) => Err(BuildInputError::Fetch {
                url: url.to_string(),
                reason: reason.clone(),
            }),
        }
    }
}
