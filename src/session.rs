//! Session lifecycle and message handling
//!
//! Every read-modify-write of a session, including the credential lookup and
//! the backend call it may trigger, runs under that session's lock.

mod locks;
mod store;

pub use locks::SessionLocks;
pub use store::{InMemorySessionStore, Session, SessionStore};

use crate::backend::{BackendError, CalendarBackend, IdentityBroker};
use crate::dialogue::DialogueEngine;
#[cfg(test)]
use crate::dialogue::Stage;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

/// Errors surfaced to the transport. Calendar failures never show up here;
/// the dialogue turns them into reply text.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Backend call failed: {0}")]
    BackendFailure(#[from] BackendError),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A freshly created session
#[derive(Debug, Clone)]
pub struct NewSession {
    pub id: String,
    pub login_url: String,
}

/// Public surface of the session core
pub struct SessionController {
    store: Arc<dyn SessionStore>,
    locks: SessionLocks,
    identity: Arc<dyn IdentityBroker>,
    engine: DialogueEngine,
}

impl SessionController {
    pub fn new(
        store: Arc<dyn SessionStore>,
        identity: Arc<dyn IdentityBroker>,
        calendar: Arc<dyn CalendarBackend>,
    ) -> Self {
        Self {
            store,
            locks: SessionLocks::new(),
            identity,
            engine: DialogueEngine::new(calendar),
        }
    }

    /// Create a session awaiting authorization and its login URL
    pub async fn create_session(&self) -> Result<NewSession, SessionError> {
        let id = loop {
            let id = uuid::Uuid::new_v4().to_string();
            if self
                .store
                .insert_session(Session::new(id.clone()))
                .await
                .map_err(SessionError::Internal)?
            {
                break id;
            }
            tracing::warn!(session_id = %id, "Session id collision, regenerating");
        };

        tracing::info!(session_id = %id, "Session created");
        let login_url = self.identity.login_url(&id);
        Ok(NewSession { id, login_url })
    }

    /// Reject empty or unknown session ids without touching any state
    pub async fn authorize(&self, session_id: &str) -> Result<(), SessionError> {
        self.existing_session(session_id).await.map(|_| ())
    }

    async fn existing_session(&self, session_id: &str) -> Result<Session, SessionError> {
        if session_id.is_empty() {
            return Err(SessionError::Unauthorized(
                "Missing or empty Authorization header.".to_string(),
            ));
        }
        self.store
            .get_session(session_id)
            .await
            .map_err(SessionError::Internal)?
            .ok_or_else(|| SessionError::Unauthorized(format!("No session found for: {session_id}.")))
    }

    /// Complete the provider redirect for `state` by exchanging `code`.
    ///
    /// The exchange runs outside the session lock; only storing the
    /// credential is serialized with message handling. Codes are single use,
    /// so nothing is retried.
    pub async fn handle_authorization_callback(
        &self,
        state: &str,
        code: &str,
    ) -> Result<(), SessionError> {
        if code.is_empty() {
            return Err(SessionError::BadRequest(
                "Missing authorization code.".to_string(),
            ));
        }
        self.existing_session(state).await?;

        let credential = self.identity.exchange(code).await.map_err(|e| {
            tracing::warn!(session_id = %state, kind = ?e.kind, error = %e.message, "Authorization exchange failed");
            SessionError::BackendFailure(e)
        })?;

        let guard = self.locks.acquire(state).await;
        // The session may have been swept while the exchange was in flight
        if let Err(e) = self.existing_session(state).await {
            drop(guard);
            self.locks.release(state);
            return Err(e);
        }
        self.store
            .put_credential(state, credential)
            .await
            .map_err(SessionError::Internal)?;

        tracing::info!(session_id = %state, "Authorization completed");
        Ok(())
    }

    /// Run one chat message through the dialogue and return the reply
    pub async fn handle_message(
        &self,
        session_id: &str,
        message: Option<&str>,
    ) -> Result<String, SessionError> {
        // Checked before locking so unknown ids never allocate a lock
        self.existing_session(session_id).await?;
        let message =
            message.ok_or_else(|| SessionError::BadRequest("Missing message key in body.".to_string()))?;

        let guard = self.locks.acquire(session_id).await;
        let mut session = match self.existing_session(session_id).await {
            Ok(session) => session,
            Err(e) => {
                drop(guard);
                self.locks.release(session_id);
                return Err(e);
            }
        };
        let credential = self
            .store
            .get_credential(session_id)
            .await
            .map_err(SessionError::Internal)?;

        let step = self
            .engine
            .step(session.stage, credential.as_ref(), message)
            .await;

        tracing::debug!(
            session_id = %session_id,
            from = %session.stage,
            to = %step.next_stage,
            outcome = ?step.outcome,
            "Dialogue step"
        );

        session.stage = step.next_stage;
        session.last_active = Utc::now();
        self.store
            .update_session(&session)
            .await
            .map_err(SessionError::Internal)?;

        Ok(step.reply)
    }

    /// Current stage of a session, if it exists
    #[cfg(test)]
    pub async fn stage_of(&self, session_id: &str) -> Result<Option<Stage>, SessionError> {
        Ok(self
            .store
            .get_session(session_id)
            .await
            .map_err(SessionError::Internal)?
            .map(|s| s.stage))
    }

    /// Remove sessions idle for longer than `ttl`; returns how many went
    pub async fn expire_idle(&self, ttl: Duration) -> Result<usize, SessionError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| SessionError::Internal(format!("Invalid session TTL: {e}")))?;
        let cutoff = Utc::now() - ttl;
        let candidates = self
            .store
            .idle_sessions(cutoff)
            .await
            .map_err(SessionError::Internal)?;

        let mut removed = 0;
        for id in candidates {
            let guard = self.locks.acquire(&id).await;
            // Re-check: a message may have arrived since the scan
            let Some(session) = self
                .store
                .get_session(&id)
                .await
                .map_err(SessionError::Internal)?
                .filter(|s| s.last_active < cutoff)
            else {
                continue;
            };
            if self
                .store
                .remove_session(&id)
                .await
                .map_err(SessionError::Internal)?
            {
                tracing::debug!(
                    session_id = %id,
                    created_at = %session.created_at,
                    stage = %session.stage,
                    "Session expired"
                );
                removed += 1;
                drop(guard);
                self.locks.release(&id);
            }
        }

        if removed > 0 {
            tracing::info!(removed, "Expired idle sessions");
        }
        Ok(removed)
    }

    /// Periodically expire idle sessions until the runtime shuts down
    pub fn spawn_expiry_sweep(
        self: &Arc<Self>,
        ttl: Duration,
        interval: Duration,
    ) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = controller.expire_idle(ttl).await {
                    tracing::error!(error = %e, "Session sweep failed");
                }
            }
        })
    }
}
