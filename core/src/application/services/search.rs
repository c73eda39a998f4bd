//! Image repository search.
//!
//! A stateless best-effort query: one enabled host, chosen uniformly
//! at random, proxies the search to the image registry. No caching,
//! no cross-host aggregation.

use anyhow::Result;
use flotilla_common::RepoResult;
use tracing::debug;

use crate::application::ports::{HostRuntime, HostSelector, RegistryStore, RuntimeConnector};
use crate::domain::error::SelectionError;

/// Search the image registry through a randomly chosen enabled host.
///
/// # Errors
///
/// [`SelectionError::NoHostsAvailable`] when no host is enabled (no
/// network call is made), otherwise the chosen host's
/// connection/runtime failure.
pub async fn search_repository<C, S, P>(
    connector: &C,
    store: &S,
    selector: &P,
    query: &str,
) -> Result<Vec<RepoResult>>
where
    C: RuntimeConnector,
    S: RegistryStore,
    P: HostSelector,
{
    let hosts = store.enabled_hosts().await?;
    let host = selector
        .pick(&hosts)
        .ok_or(SelectionError::NoHostsAvailable)?;
    debug!(host = %host.name, query, "proxying repository search");
    let conn = connector.connect(host).await?;
    conn.search(query).await
}
