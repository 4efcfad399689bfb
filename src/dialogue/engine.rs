//! Executes transitions against the calendar backend

use super::transition::{transition, Effect, Response};
use super::{Outcome, Reply, Stage};
use crate::backend::{CalendarBackend, Credential};
use std::sync::Arc;

/// Outcome of processing one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub next_stage: Stage,
    pub reply: String,
    /// Set when a backend call was made
    pub outcome: Option<Outcome>,
}

/// Drives the dialogue for one message at a time. Holds no session state.
pub struct DialogueEngine {
    calendar: Arc<dyn CalendarBackend>,
}

impl DialogueEngine {
    pub fn new(calendar: Arc<dyn CalendarBackend>) -> Self {
        Self { calendar }
    }

    /// Process `message` for a session at `stage`.
    ///
    /// Backend failures are folded into the reply; this never fails.
    pub async fn step(
        &self,
        stage: Stage,
        credential: Option<&Credential>,
        message: &str,
    ) -> StepResult {
        let result = transition(stage, credential.is_some(), message);

        let (reply, outcome) = match result.response {
            Response::Reply(reply) => (reply, None),
            Response::Perform(effect) => {
                let outcome = self.perform(&effect, credential).await;
                let reply = match effect {
                    Effect::CreateCalendar { .. } => Reply::CalendarCreated(outcome),
                    Effect::CreateEvent(_) => Reply::EventCreated(outcome),
                };
                (reply, Some(outcome))
            }
        };

        StepResult {
            next_stage: result.next_stage,
            reply: reply.render(),
            outcome,
        }
    }

    async fn perform(&self, effect: &Effect, credential: Option<&Credential>) -> Outcome {
        let Some(credential) = credential else {
            tracing::warn!(effect = effect.kind(), "No credential for backend call");
            return Outcome::Failure;
        };
        if credential.is_expired(chrono::Utc::now()) {
            // No refresh flow; the provider will refuse and the user logs in again
            tracing::warn!(expires_at = ?credential.expires_at(), "Using expired credential");
        }

        let result = match effect {
            Effect::CreateCalendar { summary } => {
                self.calendar.create_calendar(credential, summary).await
            }
            Effect::CreateEvent(event) => self.calendar.create_event(credential, event).await,
        };

        match &result {
            Ok(()) => tracing::info!(effect = effect.kind(), "Calendar call succeeded"),
            Err(e) => tracing::warn!(
                effect = effect.kind(),
                kind = ?e.kind,
                error = %e.message,
                "Calendar call failed"
            ),
        }
        Outcome::from(&result)
    }
}
