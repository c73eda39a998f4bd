//! Control-plane configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables loaded from `~/.flotilla/config.yaml` (or the path in
/// `FLOTILLA_CONFIG`). Every field has a default so an absent file is
/// a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlPlaneConfig {
    /// How long a host's cached container listing stays fresh.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// TCP connect timeout for engine API calls.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Overall per-request timeout for engine API calls. No remote
    /// call may block past this bound.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Console session validity window.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// Registry persistence path; `None` means `~/.flotilla/registry.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_path: Option<PathBuf>,

    /// Metric store export path; `None` means `~/.flotilla/metrics.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_path: Option<PathBuf>,
}

fn default_cache_ttl_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_session_ttl_secs() -> u64 {
    900
}

impl Default for ControlPlaneConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            session_ttl_secs: default_session_ttl_secs(),
            registry_path: None,
            metrics_path: None,
        }
    }
}

impl ControlPlaneConfig {
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Session TTL as a chrono duration, clamped to chrono's
    /// representable range so an oversized config value cannot panic.
    #[must_use]
    pub fn session_ttl(&self) -> chrono::Duration {
        i64::try_from(self.session_ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}
