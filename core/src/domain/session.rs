//! Console session value type.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// An ephemeral binding between an operator-facing token and exactly
/// one (host, container) pair. The console transport consumes it to
/// establish the interactive channel; the broker never proxies the
/// stream itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsoleSession {
    pub token: String,
    pub host: String,
    pub container_id: String,
    pub created_at: DateTime<Utc>,
}

impl ConsoleSession {
    /// Whether the session has outlived `ttl` as of `now`.
    #[must_use]
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.created_at >= ttl
    }
}
