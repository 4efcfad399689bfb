//! Dialogue state machine
//!
//! A pure transition function decides the next stage, the reply and the
//! backend effect for a message. The engine executes the effect and renders
//! the final reply text.

mod engine;
pub mod reply;
pub mod stage;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use engine::DialogueEngine;
pub use reply::{Outcome, Reply};
pub use stage::Stage;
pub use transition::EventDraft;

#[cfg(test)]
pub use reply::MENU;
