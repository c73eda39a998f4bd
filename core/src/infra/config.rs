//! Infrastructure implementation of the `ConfigStore` port.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::ConfigStore;
use crate::domain::config::ControlPlaneConfig;

/// Production implementation that uses a YAML file on disk.
///
/// The file location is, in order: an explicit path given to
/// [`YamlConfigStore::at`], the `FLOTILLA_CONFIG` environment
/// variable, then `~/.flotilla/config.yaml`.
#[derive(Default)]
pub struct YamlConfigStore {
    path: Option<PathBuf>,
}

impl YamlConfigStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn at(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }
}

impl ConfigStore for YamlConfigStore {
    fn load(&self) -> Result<ControlPlaneConfig> {
        let path = self.path()?;
        if !path.exists() {
            return Ok(ControlPlaneConfig::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
    }

    fn save(&self, config: &ControlPlaneConfig) -> Result<()> {
        let path = self.path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let content = serde_yaml::to_string(config).context("cannot serialize config")?;
        std::fs::write(&path, content)
            .with_context(|| format!("cannot write {}", path.display()))?;
        Ok(())
    }

    fn path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        if let Ok(val) = std::env::var("FLOTILLA_CONFIG") {
            return Ok(PathBuf::from(val));
        }
        Ok(flotilla_dir()?.join("config.yaml"))
    }
}

/// The control plane's data directory (`~/.flotilla`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn flotilla_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.join(".flotilla"))
}
