//! External collaborators: the identity provider and the calendar service
//!
//! The session core only sees these traits so it can be driven by mocks in
//! tests and by the Google adapters in production.

mod error;
mod google;

#[cfg(test)]
pub mod testing;

pub use error::BackendError;
#[cfg(test)]
pub use error::BackendErrorKind;
pub use google::{GoogleCalendarBackend, GoogleIdentityBroker, GOOGLE_CALENDAR_BASE_URL};

use crate::dialogue::EventDraft;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// Access credential obtained from the identity provider
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    access_token: String,
    token_type: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, token_type: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: token_type.into(),
            expires_at: None,
        }
    }

    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self::new(access_token, "Bearer")
    }

    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Value for the `Authorization` header, e.g. `Bearer ya29...`
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

// Tokens never reach the logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Authorization-code exchange with the identity provider
#[async_trait]
pub trait IdentityBroker: Send + Sync {
    /// URL the user opens to authorize; `state` comes back in the callback
    fn login_url(&self, state: &str) -> String;

    /// Exchange a single-use authorization code for a credential
    async fn exchange(&self, code: &str) -> Result<Credential, BackendError>;
}

/// Calendar operations performed on behalf of an authenticated user
#[async_trait]
pub trait CalendarBackend: Send + Sync {
    async fn create_calendar(
        &self,
        credential: &Credential,
        summary: &str,
    ) -> Result<(), BackendError>;

    async fn create_event(
        &self,
        credential: &Credential,
        event: &EventDraft,
    ) -> Result<(), BackendError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: IdentityBroker + ?Sized> IdentityBroker for Arc<T> {
    fn login_url(&self, state: &str) -> String {
        (**self).login_url(state)
    }

    async fn exchange(&self, code: &str) -> Result<Credential, BackendError> {
        (**self).exchange(code).await
    }
}

#[async_trait]
impl<T: CalendarBackend + ?Sized> CalendarBackend for Arc<T> {
    async fn create_calendar(
        &self,
        credential: &Credential,
        summary: &str,
    ) -> Result<(), BackendError> {
        (**self).create_calendar(credential, summary).await
    }

    async fn create_event(
        &self,
        credential: &Credential,
        event: &EventDraft,
    ) -> Result<(), BackendError> {
        (**self).create_event(credential, event).await
    }
}
