//! Per-host result accumulation for fan-out operations.
//!
//! Multi-host operations never abort on the first failure: every host
//! gets its attempt, and the report carries one entry per requested
//! host, in request order. Errors stay as `anyhow::Error` so typed
//! causes remain downcastable.

/// The outcome of one host's attempt within a fan-out.
#[derive(Debug)]
pub struct HostOutcome<T> {
    pub host: String,
    pub outcome: anyhow::Result<T>,
}

impl<T> HostOutcome<T> {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// All outcomes of a fan-out, in the order the hosts were supplied.
#[derive(Debug)]
pub struct FanoutReport<T> {
    pub outcomes: Vec<HostOutcome<T>>,
}

impl<T> FanoutReport<T> {
    /// Hosts whose attempt succeeded, with their results.
    pub fn successes(&self) -> impl Iterator<Item = (&str, &T)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.outcome.as_ref().ok().map(|v| (o.host.as_str(), v)))
    }

    /// Hosts whose attempt failed, with their causes.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &anyhow::Error)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.outcome.as_ref().err().map(|e| (o.host.as_str(), e)))
    }

    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(HostOutcome::is_success)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
