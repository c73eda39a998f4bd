//! Lifecycle orchestration — the control plane's core.
//!
//! Imports only from `crate::domain` and `crate::application`. All
//! I/O is routed through injected port traits. Registry updates are
//! sequenced strictly after confirmed runtime effects.

use anyhow::{Context, Result};
use chrono::Utc;
use futures_util::future::join_all;
use tracing::{info, warn};

use crate::application::host_cache::HostCache;
use crate::application::ports::{HostRuntime, RegistryStore, RuntimeConnector};
use crate::domain::container::{Container, ContainerSpec, Visibility};
use crate::domain::error::{ContainerError, HostError, SelectionError};
use crate::domain::fanout::{FanoutReport, HostOutcome};
use crate::domain::host::Host;

/// Create the same container on every selected host.
///
/// Hosts are attempted concurrently and independently: one host's
/// failure neither aborts nor corrupts another's attempt, and the
/// report carries exactly one outcome per requested host, in request
/// order. On each success the container is recorded in the registry
/// (owner set only for private visibility) and that host's cache is
/// invalidated.
///
/// # Errors
///
/// Fails up front — before any connection — on a spec validation
/// error or an empty host set ([`SelectionError::NoHostsSelected`]).
/// Per-host failures live inside the report, not here.
pub async fn create_on_hosts<C, S>(
    connector: &C,
    store: &S,
    cache: &HostCache,
    spec: &ContainerSpec,
    host_names: &[String],
    operator: Option<&str>,
) -> Result<FanoutReport<Container>>
where
    C: RuntimeConnector,
    S: RegistryStore,
{
    spec.validate()?;
    if host_names.is_empty() {
        return Err(SelectionError::NoHostsSelected.into());
    }

    let owner = match spec.visibility {
        Visibility::Private => operator.map(str::to_string),
        Visibility::Public => None,
    };

    let attempts = host_names.iter().map(|name| {
        let owner = owner.clone();
        async move {
            HostOutcome {
                host: name.clone(),
                outcome: create_on_host(connector, store, cache, spec, name, owner).await,
            }
        }
    });
    let outcomes = join_all(attempts).await;

    let report = FanoutReport { outcomes };
    info!(
        image = %spec.image,
        requested = report.len(),
        failed = report.failures().count(),
        "create fan-out finished"
    );
    Ok(report)
}

async fn create_on_host<C, S>(
    connector: &C,
    store: &S,
    cache: &HostCache,
    spec: &ContainerSpec,
    host_name: &str,
    owner: Option<String>,
) -> Result<Container>
where
    C: RuntimeConnector,
    S: RegistryStore,
{
    let host = resolve_host(store, host_name).await?;
    let conn = connector.connect(&host).await?;
    let created = conn.create_container(spec).await?;
    for w in &created.warnings {
        warn!(host = %host.name, container = %created.id, warning = %w, "engine warning");
    }

    let container = Container {
        container_id: created.id,
        host: host.name.clone(),
        description: spec.description.clone().unwrap_or_default(),
        is_running: true,
        protected: false,
        owner,
        created_at: Utc::now(),
    };
    store.insert_container(container.clone()).await?;
    cache.invalidate(&host.name).await;
    info!(host = %host.name, container = %container.container_id, image = %spec.image, "container created");
    Ok(container)
}

/// Stop a container. Protected containers are rejected before any
/// runtime call; on success only the running flag changes.
///
/// # Errors
///
/// `ContainerError::Protected`, `ContainerError::NotFound`,
/// `HostError::NotFound`, or the connection/runtime failure wrapped
/// with host and container identity.
pub async fn stop_container<C, S>(
    connector: &C,
    store: &S,
    cache: &HostCache,
    host_name: &str,
    container_id: &str,
) -> Result<()>
where
    C: RuntimeConnector,
    S: RegistryStore,
{
    let host = resolve_host(store, host_name).await?;
    let record = resolve_container(store, container_id).await?;
    reject_protected(&record, "stop")?;

    let conn = connector.connect(&host).await?;
    conn.stop(container_id).await?;

    store.set_running(container_id, false).await?;
    cache.invalidate(&host.name).await;
    info!(host = %host.name, container = %container_id, "container stopped");
    Ok(())
}

/// Restart a container. Protected containers are rejected before any
/// runtime call; on success the registry record does not change.
///
/// # Errors
///
/// Same taxonomy as [`stop_container`].
pub async fn restart_container<C, S>(
    connector: &C,
    store: &S,
    cache: &HostCache,
    host_name: &str,
    container_id: &str,
) -> Result<()>
where
    C: RuntimeConnector,
    S: RegistryStore,
{
    let host = resolve_host(store, host_name).await?;
    let record = resolve_container(store, container_id).await?;
    reject_protected(&record, "restart")?;

    let conn = connector.connect(&host).await?;
    conn.restart(container_id).await?;

    cache.invalidate(&host.name).await;
    info!(host = %host.name, container = %container_id, "container restarted");
    Ok(())
}

/// Destroy a container. The runtime-side deletion is authoritative:
/// only after it succeeds is the registry record removed.
///
/// # Errors
///
/// Same taxonomy as [`stop_container`].
pub async fn destroy_container<C, S>(
    connector: &C,
    store: &S,
    cache: &HostCache,
    host_name: &str,
    container_id: &str,
) -> Result<()>
where
    C: RuntimeConnector,
    S: RegistryStore,
{
    let host = resolve_host(store, host_name).await?;
    let record = resolve_container(store, container_id).await?;
    reject_protected(&record, "destroy")?;

    let conn = connector.connect(&host).await?;
    conn.destroy(container_id).await?;

    store.remove_container(container_id).await?;
    cache.invalidate(&host.name).await;
    info!(host = %host.name, container = %container_id, "container destroyed");
    Ok(())
}

/// Clone a container on its host. Protection does not block cloning —
/// the source is only read. The clone inherits the source's
/// description (suffixed) and owner.
///
/// # Errors
///
/// `ContainerError::NotFound`, `HostError::NotFound`, or the
/// connection/runtime failure.
pub async fn clone_container<C, S>(
    connector: &C,
    store: &S,
    cache: &HostCache,
    host_name: &str,
    container_id: &str,
) -> Result<Container>
where
    C: RuntimeConnector,
    S: RegistryStore,
{
    let host = resolve_host(store, host_name).await?;
    let source = resolve_container(store, container_id).await?;

    let conn = connector.connect(&host).await?;
    let created = conn.clone_container(container_id).await?;

    let description = if source.description.is_empty() {
        String::new()
    } else {
        format!("{} (clone)", source.description)
    };
    let clone = Container {
        container_id: created.id,
        host: host.name.clone(),
        description,
        is_running: true,
        protected: false,
        owner: source.owner.clone(),
        created_at: Utc::now(),
    };
    store.insert_container(clone.clone()).await?;
    cache.invalidate(&host.name).await;
    info!(host = %host.name, source = %container_id, clone = %clone.container_id, "container cloned");
    Ok(clone)
}

/// Fetch a container's logs from its host, trimmed. Rendering (ANSI,
/// HTML, pagination) is the caller's concern.
///
/// # Errors
///
/// `HostError::NotFound` or the connection/runtime failure.
pub async fn container_logs<C, S>(
    connector: &C,
    store: &S,
    host_name: &str,
    container_id: &str,
) -> Result<String>
where
    C: RuntimeConnector,
    S: RegistryStore,
{
    let host = resolve_host(store, host_name).await?;
    let conn = connector.connect(&host).await?;
    let logs = conn.logs(container_id).await?;
    Ok(logs.trim().to_string())
}

/// Invalidate the cached listing of every enabled host.
///
/// # Errors
///
/// Fails only if the host listing cannot be read from the store.
pub async fn refresh_all<S: RegistryStore>(store: &S, cache: &HostCache) -> Result<()> {
    for host in store.enabled_hosts().await? {
        cache.invalidate(&host.name).await;
    }
    Ok(())
}

// ── Shared resolution helpers ─────────────────────────────────────────────────

pub(crate) async fn resolve_host<S: RegistryStore>(store: &S, name: &str) -> Result<Host> {
    store
        .find_host(name)
        .await
        .with_context(|| format!("looking up host '{name}'"))?
        .ok_or_else(|| HostError::NotFound(name.to_string()).into())
}

pub(crate) async fn resolve_container<S: RegistryStore>(store: &S, id: &str) -> Result<Container> {
    store
        .find_container(id)
        .await
        .with_context(|| format!("looking up container '{id}'"))?
        .ok_or_else(|| ContainerError::NotFound(id.to_string()).into())
}

fn reject_protected(record: &Container, op: &'static str) -> Result<()> {
    if record.protected {
        return Err(ContainerError::Protected {
            id: record.container_id.clone(),
            op,
        }
        .into());
    }
    Ok(())
}
