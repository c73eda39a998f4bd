//! Console session broker.
//!
//! Issues ephemeral tokens binding an operator's attach request to
//! exactly one (host, container) pair. The broker never proxies the
//! console stream — an external transport claims the binding with
//! [`ConsoleBroker::take_session`] and wires the channel itself.

use std::collections::HashMap;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::ports::{RegistryStore, TokenSource};
use crate::application::services::lifecycle::{resolve_container, resolve_host};
use crate::domain::error::SessionError;
use crate::domain::session::ConsoleSession;

/// In-memory session broker. Sessions are single-use and expire after
/// the configured TTL; they live and die independently of the
/// containers they point at.
pub struct ConsoleBroker<T: TokenSource> {
    tokens: T,
    ttl: chrono::Duration,
    sessions: Mutex<HashMap<String, ConsoleSession>>,
}

impl<T: TokenSource> ConsoleBroker<T> {
    pub fn new(tokens: T, ttl: chrono::Duration) -> Self {
        Self {
            tokens,
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Issue a session token for attaching to `container_id` on
    /// `host_name`. Both must exist and the container must be recorded
    /// on that host.
    ///
    /// # Errors
    ///
    /// `HostError::NotFound`, `ContainerError::NotFound` — including
    /// a container recorded on a different host.
    pub async fn create_session<S: RegistryStore>(
        &self,
        store: &S,
        host_name: &str,
        container_id: &str,
    ) -> Result<String> {
        let host = resolve_host(store, host_name).await?;
        let container = resolve_container(store, container_id).await?;
        if container.host != host.name {
            return Err(crate::domain::error::ContainerError::NotFound(
                container_id.to_string(),
            )
            .into());
        }

        let token = self.tokens.issue();
        let session = ConsoleSession {
            token: token.clone(),
            host: host.name,
            container_id: container.container_id,
            created_at: Utc::now(),
        };
        self.sessions.lock().await.insert(token.clone(), session);
        debug!(host = %host_name, container = %container_id, "console session issued");
        Ok(token)
    }

    /// Claim (and consume) a session. A token can be taken once.
    ///
    /// # Errors
    ///
    /// [`SessionError::Unknown`] for tokens never issued or already
    /// taken, [`SessionError::Expired`] for tokens past the TTL.
    pub async fn take_session(&self, token: &str) -> Result<ConsoleSession, SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.remove(token).ok_or(SessionError::Unknown)?;
        if session.is_expired(self.ttl, Utc::now()) {
            return Err(SessionError::Expired);
        }
        Ok(session)
    }

    /// Drop every expired session; returns how many were removed.
    pub async fn prune_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(self.ttl, now));
        before - sessions.len()
    }
}
