//! HTTP request handlers

use super::types::{
    CallbackQuery, CreateSessionResponse, ErrorResponse, MessageRequest, MessageResponse,
};
use super::AppState;
use crate::session::SessionError;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

const CALLBACK_DONE: &str = "Authentication done you should now return to chatbot";
const CALLBACK_FAILED: &str = "Authentication failed, open the login url again";

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        // Session creation
        .route(
            "/session",
            post(create_session).fallback(method_not_allowed),
        )
        // Provider redirect after the user authorizes
        .route(
            "/authorize-callback",
            get(authorize_callback).fallback(method_not_allowed),
        )
        // Chat
        .route("/message", post(send_message).fallback(method_not_allowed))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Index
// ============================================================

async fn index() -> Html<&'static str> {
    Html(concat!(
        "<!DOCTYPE html><html><head><title>Chatbot</title></head><body>",
        "<pre style=\"font-family: monospace;\">\n",
        "Available Routes:\n\n",
        "  POST /session            -> create a session and get the login URL\n",
        "  GET  /authorize-callback -> identity provider redirect\n",
        "  POST /message            -> chat (Authorization: &lt;session id&gt;)\n",
        "  GET  /version            -> server version\n",
        "  GET  /                   -> this page\n",
        "</pre></body></html>"
    ))
}

// ============================================================
// Sessions
// ============================================================

async fn create_session(
    State(state): State<AppState>,
) -> Result<Json<CreateSessionResponse>, AppError> {
    let session = state.controller.create_session().await?;
    let message = format!(
        "open the next url to login and write done when you finish\n{}",
        session.login_url
    );

    Ok(Json(CreateSessionResponse {
        id: session.id,
        login_url: session.login_url,
        message,
    }))
}

// ============================================================
// Authorization Callback
// ============================================================

/// Answers in plain text; the user lands here in a browser
async fn authorize_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(error) = query.error {
        tracing::warn!(session_id = %query.state, %error, "Authorization declined");
        return (
            StatusCode::BAD_REQUEST,
            format!("Authorization was not granted: {error}"),
        )
            .into_response();
    }

    match state
        .controller
        .handle_authorization_callback(&query.state, &query.code)
        .await
    {
        Ok(()) => CALLBACK_DONE.into_response(),
        Err(SessionError::BackendFailure(_)) => {
            (StatusCode::BAD_GATEWAY, CALLBACK_FAILED).into_response()
        }
        Err(e) => {
            let status = AppError::from(e).status();
            (status, CALLBACK_FAILED).into_response()
        }
    }
}

// ============================================================
// Chat
// ============================================================

async fn send_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MessageResponse>, AppError> {
    let session_id = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    // Unknown sessions are rejected before the body is looked at
    state.controller.authorize(session_id).await?;

    let request: MessageRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Couldn't decode JSON: {e}.")))?;

    let reply = state
        .controller
        .handle_message(session_id, request.message.as_deref())
        .await?;

    Ok(Json(MessageResponse { message: reply }))
}

async fn method_not_allowed() -> AppError {
    AppError::from(SessionError::MethodNotAllowed)
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("calendar-chatbot ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    Unauthorized(String),
    BadRequest(String),
    MethodNotAllowed(String),
    BadGateway(String),
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        let message = e.to_string();
        match e {
            SessionError::Unauthorized(_) => AppError::Unauthorized(message),
            SessionError::BadRequest(_) => AppError::BadRequest(message),
            SessionError::MethodNotAllowed => AppError::MethodNotAllowed(message),
            SessionError::BackendFailure(_) => AppError::BadGateway(message),
            SessionError::Internal(_) => {
                tracing::error!(error = %message, "Request failed");
                AppError::Internal(message)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Unauthorized(msg)
            | AppError::BadRequest(msg)
            | AppError::MethodNotAllowed(msg)
            | AppError::BadGateway(msg)
            | AppError::Internal(msg) => msg,
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
