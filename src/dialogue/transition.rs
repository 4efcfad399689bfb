//! Pure stage transition function
//!
//! Given the same stage, credential presence and message this always yields
//! the same result. Backend calls are described as effects and executed by
//! the engine.

use super::{Reply, Stage};

const DONE: &str = "done";
const CANCEL: &str = "cancel";
const CREATE_CALENDAR: &str = "1";
const CREATE_EVENT: &str = "2";

/// Event fields parsed from a stage-3 message
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventDraft {
    pub summary: String,
    pub start: String,
    pub end: String,
    pub attendees: Vec<String>,
}

impl EventDraft {
    /// Positional parse of `summary,start,end,attendee...`.
    ///
    /// Missing leading fields are left empty and nothing is validated; the
    /// backend decides what it accepts.
    pub fn parse(input: &str) -> Self {
        let mut fields = input.split(',').map(str::trim);
        let mut next = || fields.next().unwrap_or_default().to_string();
        let summary = next();
        let start = next();
        let end = next();
        let attendees = fields.map(str::to_string).collect();
        Self {
            summary,
            start,
            end,
            attendees,
        }
    }
}

/// Backend work requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CreateCalendar { summary: String },
    CreateEvent(EventDraft),
}

impl Effect {
    /// Name for logs; user input stays out of them
    pub fn kind(&self) -> &'static str {
        match self {
            Effect::CreateCalendar { .. } => "create_calendar",
            Effect::CreateEvent(_) => "create_event",
        }
    }
}

/// What a transition asks the engine to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Reply immediately
    Reply(Reply),
    /// Run the effect, then reply with its outcome
    Perform(Effect),
}

/// Result of a stage transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    pub next_stage: Stage,
    pub response: Response,
}

impl TransitionResult {
    fn reply(next_stage: Stage, reply: Reply) -> Self {
        Self {
            next_stage,
            response: Response::Reply(reply),
        }
    }

    fn perform(effect: Effect) -> Self {
        // Every backend call returns the session to the menu, whatever the outcome.
        Self {
            next_stage: Stage::Menu,
            response: Response::Perform(effect),
        }
    }

    #[cfg(test)]
    pub fn effect(&self) -> Option<&Effect> {
        match &self.response {
            Response::Perform(effect) => Some(effect),
            Response::Reply(_) => None,
        }
    }
}

/// Decide the next stage and response for `message` received at `stage`.
pub fn transition(stage: Stage, has_credential: bool, message: &str) -> TransitionResult {
    // Cancel wins over the stage-specific input, but only while composing.
    // At the menu "cancel" is just another unknown command.
    if stage.is_composing() && message == CANCEL {
        return TransitionResult::reply(Stage::Menu, Reply::Menu);
    }

    match stage {
        Stage::AwaitingAuthorization => match (message, has_credential) {
            (DONE, true) => TransitionResult::reply(Stage::Menu, Reply::Authenticated),
            (DONE, false) => {
                TransitionResult::reply(Stage::AwaitingAuthorization, Reply::RetryLogin)
            }
            _ => TransitionResult::reply(Stage::AwaitingAuthorization, Reply::AwaitingDone),
        },
        Stage::Menu => match message {
            CREATE_CALENDAR => {
                TransitionResult::reply(Stage::AwaitingCalendar, Reply::CalendarPrompt)
            }
            CREATE_EVENT => TransitionResult::reply(Stage::AwaitingEvent, Reply::EventPrompt),
            _ => TransitionResult::reply(Stage::Menu, Reply::Menu),
        },
        Stage::AwaitingCalendar => TransitionResult::perform(Effect::CreateCalendar {
            summary: message.to_string(),
        }),
        Stage::AwaitingEvent => TransitionResult::perform(Effect::CreateEvent(EventDraft::parse(
            message,
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply_of(result: &TransitionResult) -> Reply {
        match result.response {
            Response::Reply(reply) => reply,
            Response::Perform(_) => panic!("expected a plain reply, got {result:?}"),
        }
    }

    #[test]
    fn test_done_with_credential_authenticates() {
        let result = transition(Stage::AwaitingAuthorization, true, "done");
        assert_eq!(result.next_stage, Stage::Menu);
        assert_eq!(reply_of(&result), Reply::Authenticated);
    }

    #[test]
    fn test_done_without_credential_stays() {
        let result = transition(Stage::AwaitingAuthorization, false, "done");
        assert_eq!(result.next_stage, Stage::AwaitingAuthorization);
        assert_eq!(reply_of(&result), Reply::RetryLogin);
    }

    #[test]
    fn test_done_is_case_sensitive() {
        let result = transition(Stage::AwaitingAuthorization, true, "Done");
        assert_eq!(result.next_stage, Stage::AwaitingAuthorization);
        assert_eq!(reply_of(&result), Reply::AwaitingDone);
    }

    #[test]
    fn test_cancel_ignored_while_authenticating() {
        let result = transition(Stage::AwaitingAuthorization, true, "cancel");
        assert_eq!(result.next_stage, Stage::AwaitingAuthorization);
        assert_eq!(reply_of(&result), Reply::AwaitingDone);
    }

    #[test]
    fn test_menu_commands() {
        let calendar = transition(Stage::Menu, true, "1");
        assert_eq!(calendar.next_stage, Stage::AwaitingCalendar);
        assert_eq!(reply_of(&calendar), Reply::CalendarPrompt);

        let event = transition(Stage::Menu, true, "2");
        assert_eq!(event.next_stage, Stage::AwaitingEvent);
        assert_eq!(reply_of(&event), Reply::EventPrompt);

        let other = transition(Stage::Menu, true, "3");
        assert_eq!(other.next_stage, Stage::Menu);
        assert_eq!(reply_of(&other), Reply::Menu);
    }

    #[test]
    fn test_cancel_at_menu_is_fallback() {
        let result = transition(Stage::Menu, true, "cancel");
        assert_eq!(result.next_stage, Stage::Menu);
        assert_eq!(reply_of(&result), Reply::Menu);
    }

    #[test]
    fn test_cancel_while_composing_returns_to_menu() {
        for stage in [Stage::AwaitingCalendar, Stage::AwaitingEvent] {
            let result = transition(stage, true, "cancel");
            assert_eq!(result.next_stage, Stage::Menu);
            assert_eq!(reply_of(&result), Reply::Menu);
            assert!(result.effect().is_none());
        }
    }

    #[test]
    fn test_effect_kind_omits_user_input() {
        let calendar = Effect::CreateCalendar {
            summary: "private plans".to_string(),
        };
        let event = Effect::CreateEvent(EventDraft::parse("x,s,e,alice@example.com"));
        assert_eq!(calendar.kind(), "create_calendar");
        assert_eq!(event.kind(), "create_event");
    }

    #[test]
    fn test_calendar_input_becomes_summary() {
        let result = transition(Stage::AwaitingCalendar, true, "gym");
        assert_eq!(result.next_stage, Stage::Menu);
        assert_eq!(
            result.effect(),
            Some(&Effect::CreateCalendar {
                summary: "gym".to_string()
            })
        );
    }

    #[test]
    fn test_event_input_is_split_positionally() {
        let result = transition(
            Stage::AwaitingEvent,
            true,
            "gym,2024-01-01T09:00:00Z,2024-01-01T10:00:00Z,a@x.com,b@x.com",
        );
        assert_eq!(result.next_stage, Stage::Menu);
        assert_eq!(
            result.effect(),
            Some(&Effect::CreateEvent(EventDraft {
                summary: "gym".to_string(),
                start: "2024-01-01T09:00:00Z".to_string(),
                end: "2024-01-01T10:00:00Z".to_string(),
                attendees: vec!["a@x.com".to_string(), "b@x.com".to_string()],
            }))
        );
    }

    #[test]
    fn test_event_draft_short_input() {
        let draft = EventDraft::parse("gym");
        assert_eq!(draft.summary, "gym");
        assert_eq!(draft.start, "");
        assert_eq!(draft.end, "");
        assert!(draft.attendees.is_empty());
    }

    #[test]
    fn test_event_draft_trims_fields() {
        let draft = EventDraft::parse("gym, 2024-01-01T09:00:00Z , 2024-01-01T10:00:00Z, a@x.com");
        assert_eq!(draft.start, "2024-01-01T09:00:00Z");
        assert_eq!(draft.end, "2024-01-01T10:00:00Z");
        assert_eq!(draft.attendees, vec!["a@x.com".to_string()]);
    }
}
