//! Per-host cache of container listings with explicit invalidation.
//!
//! Each host has its own slot guarded by an async mutex: a refresh is
//! a per-host critical section, so concurrent `get`s observe either
//! the prior snapshot or the completed new one, never a partial write,
//! and a refresh already in flight is not duplicated. A refresh
//! failure keeps the prior snapshot and hands it back marked stale —
//! stale-but-present beats no data.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::application::ports::{ContainerInfo, HostRuntime, RuntimeConnector};
use crate::domain::host::Host;

/// What a cache lookup hands back.
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    pub containers: Vec<ContainerInfo>,
    pub refreshed_at: DateTime<Utc>,
    /// When set, the snapshot is stale: the refresh that was due
    /// failed with this reason and the previous data is being served.
    pub stale_reason: Option<String>,
}

#[derive(Default)]
struct Slot {
    snapshot: Option<(Vec<ContainerInfo>, DateTime<Utc>)>,
    invalidated: bool,
}

/// TTL-based cache of per-host container listings.
pub struct HostCache {
    ttl: Duration,
    slots: RwLock<HashMap<String, Arc<Mutex<Slot>>>>,
}

impl HostCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: RwLock::new(HashMap::new()),
        }
    }

    async fn slot(&self, host_name: &str) -> Arc<Mutex<Slot>> {
        if let Some(slot) = self.slots.read().await.get(host_name) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write().await;
        Arc::clone(slots.entry(host_name.to_string()).or_default())
    }

    /// Current container listing for `host`.
    ///
    /// Serves the cached snapshot while it is younger than the TTL and
    /// not invalidated; otherwise refreshes synchronously through
    /// `connector`, swapping the snapshot atomically.
    ///
    /// # Errors
    ///
    /// Fails only when a refresh is due, fails, and no prior snapshot
    /// exists to fall back on.
    pub async fn get<C: RuntimeConnector>(
        &self,
        host: &Host,
        connector: &C,
    ) -> Result<CacheSnapshot> {
        let slot = self.slot(&host.name).await;
        let mut slot = slot.lock().await;

        let now = Utc::now();
        if !slot.invalidated {
            if let Some((containers, refreshed_at)) = &slot.snapshot {
                let age = (now - *refreshed_at).to_std().unwrap_or_default();
                if age < self.ttl {
                    return Ok(CacheSnapshot {
                        containers: containers.clone(),
                        refreshed_at: *refreshed_at,
                        stale_reason: None,
                    });
                }
            }
        }

        match Self::refresh(host, connector).await {
            Ok(containers) => {
                debug!(host = %host.name, count = containers.len(), "host cache refreshed");
                slot.snapshot = Some((containers.clone(), now));
                slot.invalidated = false;
                Ok(CacheSnapshot {
                    containers,
                    refreshed_at: now,
                    stale_reason: None,
                })
            }
            Err(e) => match &slot.snapshot {
                Some((containers, refreshed_at)) => {
                    warn!(host = %host.name, error = %e, "refresh failed, serving stale snapshot");
                    Ok(CacheSnapshot {
                        containers: containers.clone(),
                        refreshed_at: *refreshed_at,
                        stale_reason: Some(format!("{e:#}")),
                    })
                }
                None => {
                    Err(e.context(format!("refreshing container cache for host '{}'", host.name)))
                }
            },
        }
    }

    async fn refresh<C: RuntimeConnector>(host: &Host, connector: &C) -> Result<Vec<ContainerInfo>> {
        let conn = connector.connect(host).await?;
        conn.list_containers(true).await
    }

    /// Force the next `get` for this host to refresh, TTL or not.
    pub async fn invalidate(&self, host_name: &str) {
        let slot = self.slot(host_name).await;
        slot.lock().await.invalidated = true;
    }

    /// Invalidate every host the cache has seen.
    pub async fn invalidate_all(&self) {
        let slots: Vec<Arc<Mutex<Slot>>> = self.slots.read().await.values().cloned().collect();
        for slot in slots {
            slot.lock().await.invalidated = true;
        }
    }
}
