//! Reply rendering
//!
//! The only place where a backend outcome becomes user-facing text.

/// Top-level menu, shown after authentication, after cancel and after every
/// backend call.
pub const MENU: &str = "To create a calendar write 1 , to create an event write 2";

const AUTHENTICATED: &str = "Authentication successful.";
const RETRY_LOGIN: &str = "open the previous url to login";
const AWAITING_DONE: &str = "write done after authorization";
const CANCEL_HINT: &str = "To cancel write 'cancel'";
const CALENDAR_PROMPT: &str = "Enter the calendar info in this form : Summary . For example: gym";
const EVENT_PROMPT: &str = "Enter the event info in this form : Summary,StartTime,EndTime,Attendees . \n\
For example: summary,2015-05-28T09:00:00-07:00,2015-05-28T09:10:00-07:00,alice@example.com,bob@example.com.";
const DONE: &str = "Done successfully";
const CALENDAR_FAILED: &str = "Cannot create the calendar";
const EVENT_FAILED: &str = "Cannot create event";

/// Result of a backend call as seen by the dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl<T, E> From<&Result<T, E>> for Outcome {
    fn from(result: &Result<T, E>) -> Self {
        if result.is_ok() {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }
}

/// What the user is told after a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Authenticated,
    RetryLogin,
    AwaitingDone,
    Menu,
    CalendarPrompt,
    EventPrompt,
    CalendarCreated(Outcome),
    EventCreated(Outcome),
}

impl Reply {
    pub fn render(self) -> String {
        match self {
            Reply::Authenticated => format!("{AUTHENTICATED} {MENU}"),
            Reply::RetryLogin => RETRY_LOGIN.to_string(),
            Reply::AwaitingDone => AWAITING_DONE.to_string(),
            Reply::Menu => MENU.to_string(),
            Reply::CalendarPrompt => format!("{CALENDAR_PROMPT} \n{CANCEL_HINT}"),
            Reply::EventPrompt => format!("{EVENT_PROMPT} \n{CANCEL_HINT}"),
            Reply::CalendarCreated(outcome) => {
                with_menu(outcome_text(outcome, CALENDAR_FAILED))
            }
            Reply::EventCreated(outcome) => with_menu(outcome_text(outcome, EVENT_FAILED)),
        }
    }
}

fn outcome_text(outcome: Outcome, failure: &'static str) -> &'static str {
    match outcome {
        Outcome::Success => DONE,
        Outcome::Failure => failure,
    }
}

fn with_menu(text: &str) -> String {
    format!("{text}\n{MENU}")
}
