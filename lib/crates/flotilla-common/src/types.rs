use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single time-series point from the external metrics store.
///
/// `source` is the container id the point was sampled from. The core
/// never writes metrics; it only reads them to assemble detail views.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metric {
    pub source: String,
    pub counter: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

impl Metric {
    /// Seconds since the Unix epoch — what chart front-ends consume.
    #[must_use]
    pub fn unix_timestamp(&self) -> i64 {
        self.timestamp.timestamp()
    }
}

/// One hit from an image registry search, as returned by the engine's
/// `/images/search` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepoResult {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub star_count: i64,
    #[serde(default)]
    pub is_official: bool,
    #[serde(default)]
    pub is_automated: bool,
}

/// Receipt for an image build accepted by one host.
///
/// The control plane guarantees submission only; completion is
/// observed out of band.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildSubmission {
    pub host: String,
    pub build_id: String,
    pub tag: String,
    pub submitted_at: DateTime<Utc>,
}
