//! Session and credential storage

use crate::backend::Credential;
use crate::dialogue::Stage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Per-client conversation record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub stage: Stage,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            stage: Stage::AwaitingAuthorization,
            created_at: now,
            last_active: now,
        }
    }
}

/// Storage for sessions and the credentials keyed by the same id.
///
/// Implementations only guarantee atomicity of single calls. Callers
/// serialize read-modify-write sequences per session themselves.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get_session(&self, id: &str) -> Result<Option<Session>, String>;

    /// Insert a new session; returns false if the id is already taken
    async fn insert_session(&self, session: Session) -> Result<bool, String>;

    /// Overwrite an existing session
    async fn update_session(&self, session: &Session) -> Result<(), String>;

    /// Remove a session and its credential; returns whether it existed
    async fn remove_session(&self, id: &str) -> Result<bool, String>;

    async fn get_credential(&self, id: &str) -> Result<Option<Credential>, String>;

    async fn put_credential(&self, id: &str, credential: Credential) -> Result<(), String>;

    /// Ids of sessions last active before `cutoff`
    async fn idle_sessions(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>, String>;
}

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn get_session(&self, id: &str) -> Result<Option<Session>, String> {
        (**self).get_session(id).await
    }

    async fn insert_session(&self, session: Session) -> Result<bool, String> {
        (**self).insert_session(session).await
    }

    async fn update_session(&self, session: &Session) -> Result<(), String> {
        (**self).update_session(session).await
    }

    async fn remove_session(&self, id: &str) -> Result<bool, String> {
        (**self).remove_session(id).await
    }

    async fn get_credential(&self, id: &str) -> Result<Option<Credential>, String> {
        (**self).get_credential(id).await
    }

    async fn put_credential(&self, id: &str, credential: Credential) -> Result<(), String> {
        (**self).put_credential(id, credential).await
    }

    async fn idle_sessions(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>, String> {
        (**self).idle_sessions(cutoff).await
    }
}

/// Process-memory store. Nothing survives a restart.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    credentials: RwLock<HashMap<String, Credential>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_session(&self, id: &str) -> Result<Option<Session>, String> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn insert_session(&self, session: Session) -> Result<bool, String> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            return Ok(false);
        }
        sessions.insert(session.id.clone(), session);
        Ok(true)
    }

    async fn update_session(&self, session: &Session) -> Result<(), String> {
        match self.sessions.write().await.get_mut(&session.id) {
            Some(existing) => {
                *existing = session.clone();
                Ok(())
            }
            None => Err(format!("Session not found: {}", session.id)),
        }
    }

    async fn remove_session(&self, id: &str) -> Result<bool, String> {
        let existed = self.sessions.write().await.remove(id).is_some();
        self.credentials.write().await.remove(id);
        Ok(existed)
    }

    async fn get_credential(&self, id: &str) -> Result<Option<Credential>, String> {
        Ok(self.credentials.read().await.get(id).cloned())
    }

    async fn put_credential(&self, id: &str, credential: Credential) -> Result<(), String> {
        self.credentials
            .write()
            .await
            .insert(id.to_string(), credential);
        Ok(())
    }

    async fn idle_sessions(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>, String> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.last_active < cutoff)
            .map(|s| s.id.clone())
            .collect())
    }
}
