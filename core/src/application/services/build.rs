//! Image build fan-out.
//!
//! The build definition is resolved once — uploaded file or URL fetch
//! — before any host is contacted, and the identical bytes go to every
//! selected host. The contract guarantees *submission* only; build
//! completion is observed out of band by the caller.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use flotilla_common::BuildSubmission;
use futures_util::future::join_all;
use tracing::info;

use crate::application::ports::{BuildFetcher, HostRuntime, RegistryStore, RuntimeConnector};
use crate::application::services::lifecycle::resolve_host;
use crate::domain::error::{BuildInputError, SelectionError};
use crate::domain::fanout::{FanoutReport, HostOutcome};

/// Where the build definition comes from. An uploaded file takes
/// precedence over a URL when the caller has both.
#[derive(Debug, Clone)]
pub enum BuildInput {
    Uploaded(PathBuf),
    Url(String),
}

/// Resolve a [`BuildInput`] into the definition bytes.
///
/// # Errors
///
/// [`BuildInputError::Upload`] for unreadable uploads,
/// [`BuildInputError::Fetch`] for URL failures — the two are distinct
/// in the error report.
pub async fn resolve_input<F: BuildFetcher>(
    fetcher: &F,
    input: &BuildInput,
) -> Result<Vec<u8>, BuildInputError> {
    match input {
        BuildInput::Uploaded(path) => read_upload(path).await,
        BuildInput::Url(url) => fetcher.fetch(url).await,
    }
}

async fn read_upload(path: &Path) -> Result<Vec<u8>, BuildInputError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| BuildInputError::Upload {
            reason: format!("{}: {e}", path.display()),
        })
}

/// Submit the same image build to every selected host, concurrently
/// and independently; returns one submission outcome per host in
/// request order.
///
/// # Errors
///
/// Fails up front on an empty host set
/// ([`SelectionError::NoHostsSelected`]) or an input that cannot be
/// resolved — in both cases nothing has been submitted anywhere.
/// Per-host submission failures live inside the report.
pub async fn build_on_hosts<C, S, F>(
    connector: &C,
    store: &S,
    fetcher: &F,
    input: &BuildInput,
    tag: &str,
    host_names: &[String],
) -> Result<FanoutReport<BuildSubmission>>
where
    C: RuntimeConnector,
    S: RegistryStore,
    F: BuildFetcher,
{
    if host_names.is_empty() {
        return Err(SelectionError::NoHostsSelected.into());
    }
    let definition = resolve_input(fetcher, input).await?;

    let attempts = host_names.iter().map(|name| {
        let definition = definition.as_slice();
        async move {
            HostOutcome {
                host: name.clone(),
                outcome: submit_on_host(connector, store, definition, tag, name).await,
            }
        }
    });
    let outcomes = join_all(attempts).await;

    let report = FanoutReport { outcomes };
    info!(
        tag,
        requested = report.len(),
        failed = report.failures().count(),
        "build fan-out submitted"
    );
    Ok(report)
}

async fn submit_on_host<C, S>(
    connector: &C,
    store: &S,
    definition: &[u8],
    tag: &str,
    host_name: &str,
) -> Result<BuildSubmission>
where
    C: RuntimeConnector,
    S: RegistryStore,
{
    let host = resolve_host(store, host_name).await?;
    let conn = connector.connect(&host).await?;
    let build_id = conn.build_image(definition, tag).await?;
    Ok(BuildSubmission {
        host: host.name,
        build_id,
        tag: tag.to_string(),
        submitted_at: Utc::now(),
    })
}
