//! Read-only adapter over the external metrics store.
//!
//! The collector (an external collaborator) exports metric points as a
//! JSON array; `JsonMetricSource` reads that export on every query so
//! the core never holds metric state of its own.

use std::path::PathBuf;

use anyhow::{Context, Result};
use flotilla_common::Metric;

use crate::application::ports::MetricSource;

/// File-backed, read-only metric source. A missing file means no
/// points have been collected yet, not an error.
pub struct JsonMetricSource {
    path: PathBuf,
}

impl JsonMetricSource {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl MetricSource for JsonMetricSource {
    async fn query(&self, source: &str, counter: &str, limit: usize) -> Result<Vec<Metric>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("reading metrics file {}", self.path.display()));
            }
        };
        let all: Vec<Metric> = serde_json::from_str(&content)
            .with_context(|| format!("parsing metrics file {}", self.path.display()))?;

        let mut matched: Vec<Metric> = all
            .into_iter()
            .filter(|m| m.source == source && m.counter == counter)
            .collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matched.truncate(limit);
        Ok(matched)
    }
}
