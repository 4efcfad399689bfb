//! Conversation stage

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Position of a session in the conversation.
///
/// Serializes as its numeric value so clients see `0..=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Stage {
    /// Waiting for the user to finish the external authorization
    #[default]
    AwaitingAuthorization,
    /// Authenticated, waiting for a top-level command
    Menu,
    /// Waiting for the calendar summary
    AwaitingCalendar,
    /// Waiting for the comma separated event fields
    AwaitingEvent,
}

impl Stage {
    pub fn as_u8(self) -> u8 {
        match self {
            Stage::AwaitingAuthorization => 0,
            Stage::Menu => 1,
            Stage::AwaitingCalendar => 2,
            Stage::AwaitingEvent => 3,
        }
    }

    /// Stages in which the user is composing input for a backend call.
    pub fn is_composing(self) -> bool {
        matches!(self, Stage::AwaitingCalendar | Stage::AwaitingEvent)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid stage value: {0}")]
pub struct InvalidStage(pub u8);

impl TryFrom<u8> for Stage {
    type Error = InvalidStage;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Stage::AwaitingAuthorization),
            1 => Ok(Stage::Menu),
            2 => Ok(Stage::AwaitingCalendar),
            3 => Ok(Stage::AwaitingEvent),
            other => Err(InvalidStage(other)),
        }
    }
}

impl From<Stage> for u8 {
    fn from(stage: Stage) -> Self {
        stage.as_u8()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::AwaitingAuthorization => "awaiting_authorization",
            Stage::Menu => "menu",
            Stage::AwaitingCalendar => "awaiting_calendar",
            Stage::AwaitingEvent => "awaiting_event",
        };
        f.write_str(name)
    }
}
