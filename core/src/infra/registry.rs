//! Infrastructure implementation of the `RegistryStore` port.
//!
//! `JsonRegistry` keeps host and container records in memory behind a
//! `tokio::sync::RwLock` and persists them as JSON with atomic write
//! (temp file + rename, via `spawn_blocking`) so a crash mid-save
//! never corrupts the registry.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::application::ports::RegistryStore;
use crate::domain::container::Container;
use crate::domain::host::Host;

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryData {
    /// Keyed by host name.
    hosts: BTreeMap<String, Host>,
    /// Keyed by runtime container id. Engine ids are unique per host
    /// and collision-free in practice; the registry treats the id as
    /// the lookup key the way the operator-facing surface does.
    containers: BTreeMap<String, Container>,
}

/// File-backed registry store.
pub struct JsonRegistry {
    path: PathBuf,
    data: RwLock<RegistryData>,
}

impl JsonRegistry {
    /// Open the registry at `path`, loading existing records if the
    /// file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or
    /// parsed.
    pub async fn open(path: PathBuf) -> Result<Self> {
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("parsing registry file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => RegistryData::default(),
            Err(e) => {
                return Err(e).with_context(|| format!("reading registry file {}", path.display()));
            }
        };
        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    fn save_sync(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        // Atomic write via temp file then rename
        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, content)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;
        std::fs::rename(&temp_path, path)
            .with_context(|| format!("finalizing registry file {}", path.display()))?;
        Ok(())
    }

    async fn persist(&self) -> Result<()> {
        let content = {
            let data = self.data.read().await;
            serde_json::to_string_pretty(&*data).context("serializing registry")?
        };
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Self::save_sync(&path, &content))
            .await
            .context("registry save task panicked")?
    }

    async fn update_container<F>(&self, id: &str, apply: F) -> Result<bool>
    where
        F: FnOnce(&mut Container),
    {
        let found = {
            let mut data = self.data.write().await;
            match data.containers.get_mut(id) {
                Some(c) => {
                    apply(c);
                    true
                }
                None => false,
            }
        };
        if found {
            self.persist().await?;
        }
        Ok(found)
    }
}

impl RegistryStore for JsonRegistry {
    async fn find_host(&self, name: &str) -> Result<Option<Host>> {
        Ok(self.data.read().await.hosts.get(name).cloned())
    }

    async fn hosts(&self) -> Result<Vec<Host>> {
        Ok(self.data.read().await.hosts.values().cloned().collect())
    }

    async fn enabled_hosts(&self) -> Result<Vec<Host>> {
        Ok(self
            .data
            .read()
            .await
            .hosts
            .values()
            .filter(|h| h.enabled)
            .cloned()
            .collect())
    }

    async fn save_host(&self, host: Host) -> Result<()> {
        self.data
            .write()
            .await
            .hosts
            .insert(host.name.clone(), host);
        self.persist().await
    }

    async fn find_container(&self, id: &str) -> Result<Option<Container>> {
        Ok(self.data.read().await.containers.get(id).cloned())
    }

    async fn containers(&self) -> Result<Vec<Container>> {
        Ok(self.data.read().await.containers.values().cloned().collect())
    }

    async fn insert_container(&self, container: Container) -> Result<()> {
        self.data
            .write()
            .await
            .containers
            .insert(container.container_id.clone(), container);
        self.persist().await
    }

    async fn remove_container(&self, id: &str) -> Result<bool> {
        let removed = self.data.write().await.containers.remove(id).is_some();
        if removed {
            self.persist().await?;
        }
        Ok(removed)
    }

    async fn set_description(&self, id: &str, description: &str) -> Result<bool> {
        self.update_container(id, |c| c.description = description.to_string())
            .await
    }

    async fn set_protected(&self, id: &str, protected: bool) -> Result<bool> {
        self.update_container(id, |c| c.protected = protected).await
    }

    async fn set_running(&self, id: &str, running: bool) -> Result<bool> {
        self.update_container(id, |c| c.is_running = running).await
    }

    async fn flush(&self) -> Result<()> {
        self.persist().await
    }
}
