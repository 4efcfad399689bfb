//! API request and response types

use serde::{Deserialize, Serialize};

/// Response for session creation
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub id: String,
    #[serde(rename = "loginURL")]
    pub login_url: String,
    /// Instructions shown to the user before they log in
    pub message: String,
}

/// Query parameters of the provider redirect
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub code: String,
    /// Set by the provider when the user declined
    pub error: Option<String>,
}

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: Option<String>,
}

/// Reply to a chat message
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
