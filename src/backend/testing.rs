//! Mock implementations for testing
//!
//! These mocks let the session core run without network access.

use super::{BackendError, CalendarBackend, Credential, IdentityBroker};
use crate::dialogue::EventDraft;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// Mock Identity Broker
// ============================================================================

/// Identity broker that hands out a credential per known code
pub struct MockIdentityBroker {
    codes: Mutex<HashMap<String, Credential>>,
    /// Record of all codes exchanged
    pub exchanges: Mutex<Vec<String>>,
}

impl MockIdentityBroker {
    pub fn new() -> Self {
        Self {
            codes: Mutex::new(HashMap::new()),
            exchanges: Mutex::new(Vec::new()),
        }
    }

    /// Accept `code` once, yielding a bearer credential with `token`
    pub fn with_code(self, code: &str, token: &str) -> Self {
        self.codes
            .lock()
            .unwrap()
            .insert(code.to_string(), Credential::bearer(token));
        self
    }

    pub fn recorded_exchanges(&self) -> Vec<String> {
        self.exchanges.lock().unwrap().clone()
    }
}

impl Default for MockIdentityBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityBroker for MockIdentityBroker {
    fn login_url(&self, state: &str) -> String {
        format!("https://accounts.example.com/auth?state={state}")
    }

    async fn exchange(&self, code: &str) -> Result<Credential, BackendError> {
        self.exchanges.lock().unwrap().push(code.to_string());
        // Codes are single use
        self.codes
            .lock()
            .unwrap()
            .remove(code)
            .ok_or_else(|| BackendError::rejected(format!("invalid_grant: {code}")))
    }
}

// ============================================================================
// Mock Calendar Backend
// ============================================================================

/// A recorded calendar call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarCall {
    CreateCalendar { token: String, summary: String },
    CreateEvent { token: String, event: EventDraft },
}

/// Calendar backend that records calls and succeeds unless told to fail
pub struct MockCalendarBackend {
    fail: bool,
    delay: Option<Duration>,
    /// Record of all calls made
    pub calls: Mutex<Vec<CalendarCall>>,
}

impl MockCalendarBackend {
    pub fn new() -> Self {
        Self {
            fail: false,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Sleep before answering, to widen race windows in concurrency tests
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn recorded_calls(&self) -> Vec<CalendarCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn respond(&self, call: CalendarCall) -> Result<(), BackendError> {
        self.calls.lock().unwrap().push(call);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            Err(BackendError::server_error("mock calendar failure"))
        } else {
            Ok(())
        }
    }
}

impl Default for MockCalendarBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CalendarBackend for MockCalendarBackend {
    async fn create_calendar(
        &self,
        credential: &Credential,
        summary: &str,
    ) -> Result<(), BackendError> {
        self.respond(CalendarCall::CreateCalendar {
            token: credential.access_token().to_string(),
            summary: summary.to_string(),
        })
        .await
    }

    async fn create_event(
        &self,
        credential: &Credential,
        event: &EventDraft,
    ) -> Result<(), BackendError> {
        self.respond(CalendarCall::CreateEvent {
            token: credential.access_token().to_string(),
            event: event.clone(),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_identity_codes_are_single_use() {
        let broker = MockIdentityBroker::new().with_code("c1", "tok");
        assert!(broker.exchange("c1").await.is_ok());
        assert!(broker.exchange("c1").await.is_err());
        assert_eq!(broker.recorded_exchanges(), vec!["c1", "c1"]);
    }

    #[tokio::test]
    async fn test_mock_calendar_records_calls() {
        let backend = MockCalendarBackend::failing();
        let result = backend
            .create_calendar(&Credential::bearer("tok"), "gym")
            .await;
        assert!(result.is_err());
        assert_eq!(
            backend.recorded_calls(),
            vec![CalendarCall::CreateCalendar {
                token: "tok".to_string(),
                summary: "gym".to_string()
            }]
        );
    }
}
