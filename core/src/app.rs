//! Composition root — wires infrastructure into the application
//! services and exposes one method per caller-facing operation.
//!
//! The excluded web/CLI layer holds a [`ControlPlane`] for the process
//! lifetime: opened at startup, closed (flushing the registry) at
//! shutdown. Nothing in here is a singleton; tests wire the services
//! directly with mock ports instead.

use anyhow::Result;
use flotilla_common::{BuildSubmission, RepoResult};

use crate::application::host_cache::{CacheSnapshot, HostCache};
use crate::application::ports::RegistryStore;
use crate::application::services::build::{self, BuildInput};
use crate::application::services::console::ConsoleBroker;
use crate::application::services::lifecycle;
use crate::application::services::registry::{self, ContainerDetails};
use crate::application::services::search;
use crate::domain::config::ControlPlaneConfig;
use crate::domain::container::{Container, ContainerSpec};
use crate::domain::error::{HostError, SessionError};
use crate::domain::fanout::FanoutReport;
use crate::domain::host::{Host, validate_host_name};
use crate::domain::session::ConsoleSession;
use crate::infra::config::flotilla_dir;
use crate::infra::docker::DockerConnector;
use crate::infra::fetch::HttpFetcher;
use crate::infra::metrics::JsonMetricSource;
use crate::infra::random::{RandHostSelector, UuidTokenSource};
use crate::infra::registry::JsonRegistry;

/// The assembled control plane.
pub struct ControlPlane {
    registry: JsonRegistry,
    connector: DockerConnector,
    cache: HostCache,
    broker: ConsoleBroker<UuidTokenSource>,
    selector: RandHostSelector,
    metrics: JsonMetricSource,
    fetcher: HttpFetcher,
}

impl ControlPlane {
    /// Open the control plane: load the registry store and build the
    /// engine connector from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry file is unreadable or the
    /// default data directory cannot be resolved.
    pub async fn open(config: ControlPlaneConfig) -> Result<Self> {
        let registry_path = match &config.registry_path {
            Some(path) => path.clone(),
            None => flotilla_dir()?.join("registry.json"),
        };
        let metrics_path = match &config.metrics_path {
            Some(path) => path.clone(),
            None => flotilla_dir()?.join("metrics.json"),
        };

        Ok(Self {
            registry: JsonRegistry::open(registry_path).await?,
            connector: DockerConnector::new(config.connect_timeout(), config.request_timeout()),
            cache: HostCache::new(config.cache_ttl()),
            broker: ConsoleBroker::new(UuidTokenSource, config.session_ttl()),
            selector: RandHostSelector,
            metrics: JsonMetricSource::new(metrics_path),
            fetcher: HttpFetcher::new(config.request_timeout())?,
        })
    }

    /// Flush the registry and shut down.
    ///
    /// # Errors
    ///
    /// Returns an error if the final registry write fails.
    pub async fn close(self) -> Result<()> {
        self.registry.flush().await
    }

    // ── Host administration ──────────────────────────────────────────────

    /// Register (or replace) a host record.
    ///
    /// # Errors
    ///
    /// `HostError::InvalidName` or a store write failure.
    pub async fn add_host(&self, host: Host) -> Result<()> {
        validate_host_name(&host.name)?;
        self.registry.save_host(host).await
    }

    /// Enable or disable a host. Disabled hosts stay registered but
    /// are skipped by listing and search.
    ///
    /// # Errors
    ///
    /// `HostError::NotFound` or a store write failure.
    pub async fn set_host_enabled(&self, name: &str, enabled: bool) -> Result<()> {
        let mut host = self
            .registry
            .find_host(name)
            .await?
            .ok_or_else(|| HostError::NotFound(name.to_string()))?;
        host.enabled = enabled;
        self.registry.save_host(host).await
    }

    /// All registered hosts.
    ///
    /// # Errors
    ///
    /// Fails only on a store read failure.
    pub async fn hosts(&self) -> Result<Vec<Host>> {
        self.registry.hosts().await
    }

    // ── Listings and details ─────────────────────────────────────────────

    /// Registry records across all enabled hosts, ordered by
    /// description. `include_stopped` is the index view's "show all".
    ///
    /// # Errors
    ///
    /// Fails only on a store read failure.
    pub async fn list_containers(&self, include_stopped: bool) -> Result<Vec<Container>> {
        let hosts: Vec<String> = self
            .registry
            .enabled_hosts()
            .await?
            .into_iter()
            .map(|h| h.name)
            .collect();
        registry::list_containers(&self.registry, &hosts, include_stopped).await
    }

    /// Live container listing for one host, served from the TTL cache.
    ///
    /// # Errors
    ///
    /// `HostError::NotFound`, or a refresh failure with no prior
    /// snapshot to fall back on.
    pub async fn host_containers(&self, host_name: &str) -> Result<CacheSnapshot> {
        let host = self
            .registry
            .find_host(host_name)
            .await?
            .ok_or_else(|| HostError::NotFound(host_name.to_string()))?;
        self.cache.get(&host, &self.connector).await
    }

    /// A container with its recent cpu/memory metric series.
    ///
    /// # Errors
    ///
    /// `ContainerError::NotFound` or a metric store read failure.
    pub async fn container_details(&self, id: &str) -> Result<ContainerDetails> {
        registry::container_details(&self.registry, &self.metrics, id).await
    }

    /// Update a container's description.
    ///
    /// # Errors
    ///
    /// `ContainerError::NotFound` or a store write failure.
    pub async fn set_description(&self, id: &str, description: &str) -> Result<()> {
        registry::set_description(&self.registry, id, description).await
    }

    /// Toggle a container's protection flag.
    ///
    /// # Errors
    ///
    /// `ContainerError::NotFound` or a store write failure.
    pub async fn set_protected(&self, id: &str, protected: bool) -> Result<()> {
        registry::set_protected(&self.registry, id, protected).await
    }

    /// Invalidate every enabled host's cached listing.
    ///
    /// # Errors
    ///
    /// Fails only on a store read failure.
    pub async fn refresh(&self) -> Result<()> {
        lifecycle::refresh_all(&self.registry, &self.cache).await
    }

    // ── Lifecycle operations ─────────────────────────────────────────────

    /// Create the same container on every selected host; see
    /// [`lifecycle::create_on_hosts`].
    ///
    /// # Errors
    ///
    /// `ValidationError` or `SelectionError::NoHostsSelected` before
    /// any connection; per-host failures live inside the report.
    pub async fn create_containers(
        &self,
        spec: &ContainerSpec,
        host_names: &[String],
        operator: Option<&str>,
    ) -> Result<FanoutReport<Container>> {
        lifecycle::create_on_hosts(
            &self.connector,
            &self.registry,
            &self.cache,
            spec,
            host_names,
            operator,
        )
        .await
    }

    /// # Errors
    ///
    /// See [`lifecycle::stop_container`].
    pub async fn stop_container(&self, host: &str, id: &str) -> Result<()> {
        lifecycle::stop_container(&self.connector, &self.registry, &self.cache, host, id).await
    }

    /// # Errors
    ///
    /// See [`lifecycle::restart_container`].
    pub async fn restart_container(&self, host: &str, id: &str) -> Result<()> {
        lifecycle::restart_container(&self.connector, &self.registry, &self.cache, host, id).await
    }

    /// # Errors
    ///
    /// See [`lifecycle::destroy_container`].
    pub async fn destroy_container(&self, host: &str, id: &str) -> Result<()> {
        lifecycle::destroy_container(&self.connector, &self.registry, &self.cache, host, id).await
    }

    /// # Errors
    ///
    /// See [`lifecycle::clone_container`].
    pub async fn clone_container(&self, host: &str, id: &str) -> Result<Container> {
        lifecycle::clone_container(&self.connector, &self.registry, &self.cache, host, id).await
    }

    /// # Errors
    ///
    /// See [`lifecycle::container_logs`].
    pub async fn container_logs(&self, host: &str, id: &str) -> Result<String> {
        lifecycle::container_logs(&self.connector, &self.registry, host, id).await
    }

    /// Submit an image build to every selected host; see
    /// [`build::build_on_hosts`].
    ///
    /// # Errors
    ///
    /// `SelectionError::NoHostsSelected` or a `BuildInputError` before
    /// any submission; per-host failures live inside the report.
    pub async fn build_image(
        &self,
        input: &BuildInput,
        tag: &str,
        host_names: &[String],
    ) -> Result<FanoutReport<BuildSubmission>> {
        build::build_on_hosts(
            &self.connector,
            &self.registry,
            &self.fetcher,
            input,
            tag,
            host_names,
        )
        .await
    }

    // ── Console sessions ─────────────────────────────────────────────────

    /// Issue a console session token for an attach request.
    ///
    /// # Errors
    ///
    /// `HostError::NotFound` or `ContainerError::NotFound`.
    pub async fn create_console_session(&self, host: &str, id: &str) -> Result<String> {
        self.broker.create_session(&self.registry, host, id).await
    }

    /// Claim (and consume) a console session token.
    ///
    /// # Errors
    ///
    /// [`SessionError::Unknown`] or [`SessionError::Expired`].
    pub async fn take_console_session(&self, token: &str) -> Result<ConsoleSession, SessionError> {
        self.broker.take_session(token).await
    }

    /// Drop expired console sessions; returns how many were removed.
    /// Intended for a periodic sweep by the caller.
    pub async fn prune_console_sessions(&self) -> usize {
        self.broker.prune_expired().await
    }

    // ── Repository search ────────────────────────────────────────────────

    /// Search the image registry through one random enabled host.
    ///
    /// # Errors
    ///
    /// `SelectionError::NoHostsAvailable`, or the chosen host's
    /// connection/runtime failure.
    pub async fn search(&self, query: &str) -> Result<Vec<RepoResult>> {
        search::search_repository(&self.connector, &self.registry, &self.selector, query).await
    }
}
