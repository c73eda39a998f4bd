//! Container registry operations — local-store reads and writes only.
//!
//! Nothing here calls the remote engine; sequencing registry updates
//! after confirmed runtime effects is the lifecycle service's job.

use anyhow::Result;
use flotilla_common::Metric;

use crate::application::ports::{MetricSource, RegistryStore};
use crate::application::services::lifecycle::resolve_container;
use crate::domain::container::Container;
use crate::domain::error::ContainerError;

/// A container record together with its recent metric series, for the
/// operator-facing detail view.
#[derive(Debug)]
pub struct ContainerDetails {
    pub container: Container,
    /// cpu points, newest first.
    pub cpu: Vec<Metric>,
    /// memory points, newest first.
    pub memory: Vec<Metric>,
}

/// How many metric points the detail view shows per counter.
pub const DETAIL_METRIC_LIMIT: usize = 30;

/// Look up a container by its runtime id.
///
/// # Errors
///
/// `ContainerError::NotFound` for unknown ids.
pub async fn find_by_id<S: RegistryStore>(store: &S, id: &str) -> Result<Container> {
    resolve_container(store, id).await
}

/// Containers on the given hosts, ordered by description. Stopped
/// containers are included only when `include_stopped` is set (the
/// index view's "show all" toggle).
///
/// # Errors
///
/// Fails only if the store read fails.
pub async fn list_containers<S: RegistryStore>(
    store: &S,
    host_names: &[String],
    include_stopped: bool,
) -> Result<Vec<Container>> {
    let mut containers: Vec<Container> = store
        .containers()
        .await?
        .into_iter()
        .filter(|c| host_names.iter().any(|h| *h == c.host))
        .filter(|c| include_stopped || c.is_running)
        .collect();
    containers.sort_by(|a, b| {
        a.description
            .cmp(&b.description)
            .then_with(|| a.container_id.cmp(&b.container_id))
    });
    Ok(containers)
}

/// Update a container's description.
///
/// # Errors
///
/// `ContainerError::NotFound` for unknown ids.
pub async fn set_description<S: RegistryStore>(store: &S, id: &str, description: &str) -> Result<()> {
    if !store.set_description(id, description).await? {
        return Err(ContainerError::NotFound(id.to_string()).into());
    }
    Ok(())
}

/// Toggle a container's protection flag. Protected containers reject
/// stop, restart, and destroy.
///
/// # Errors
///
/// `ContainerError::NotFound` for unknown ids.
pub async fn set_protected<S: RegistryStore>(store: &S, id: &str, protected: bool) -> Result<()> {
    if !store.set_protected(id, protected).await? {
        return Err(ContainerError::NotFound(id.to_string()).into());
    }
    Ok(())
}

/// A container plus its recent cpu and memory series from the
/// external metrics store, newest first.
///
/// # Errors
///
/// `ContainerError::NotFound`, or a metric store read failure.
pub async fn container_details<S, M>(store: &S, metrics: &M, id: &str) -> Result<ContainerDetails>
where
    S: RegistryStore,
    M: MetricSource,
{
    let container = resolve_container(store, id).await?;
    let cpu = metrics.query(id, "cpu", DETAIL_METRIC_LIMIT).await?;
    let memory = metrics.query(id, "memory", DETAIL_METRIC_LIMIT).await?;
    Ok(ContainerDetails {
        container,
        cpu,
        memory,
    })
}
