//! Google OAuth 2.0 and Calendar v3 adapters

use super::{BackendError, CalendarBackend, Credential, IdentityBroker};
use crate::config::OAuthConfig;
use crate::dialogue::EventDraft;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::{header::AUTHORIZATION, Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const GOOGLE_CALENDAR_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

fn http_client(timeout: Duration) -> Result<Client, BackendError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| BackendError::unknown(format!("Failed to create HTTP client: {e}")))
}

fn parse_url(name: &str, raw: &str) -> Result<Url, BackendError> {
    Url::parse(raw).map_err(|e| BackendError::unknown(format!("Invalid {name} '{raw}': {e}")))
}

/// Read a response, mapping transport and status failures
async fn check_response(response: reqwest::Response) -> Result<String, BackendError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| BackendError::network(format!("Failed to read response: {e}")))?;

    if !status.is_success() {
        return Err(BackendError::from_status(status, &body));
    }
    Ok(body)
}

// ============================================================================
// Identity
// ============================================================================

/// Authorization-code flow against Google's OAuth endpoints
pub struct GoogleIdentityBroker {
    client: Client,
    config: OAuthConfig,
    auth_url: Url,
    token_url: Url,
}

impl GoogleIdentityBroker {
    pub fn new(config: OAuthConfig, timeout: Duration) -> Result<Self, BackendError> {
        let auth_url = parse_url("auth URL", &config.auth_url)?;
        let token_url = parse_url("token URL", &config.token_url)?;
        Ok(Self {
            client: http_client(timeout)?,
            config,
            auth_url,
            token_url,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_credential(self) -> Credential {
        let mut credential = match self.token_type {
            Some(token_type) => Credential::new(self.access_token, token_type),
            None => Credential::bearer(self.access_token),
        };
        if let Some(expires_in) = self.expires_in {
            // Lifetimes chrono cannot represent leave the expiry unknown
            match ChronoDuration::try_seconds(expires_in)
                .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            {
                Some(expires_at) => credential = credential.with_expires_at(expires_at),
                None => tracing::warn!(expires_in, "Ignoring out of range token lifetime"),
            }
        }
        credential
    }
}

#[async_trait]
impl IdentityBroker for GoogleIdentityBroker {
    fn login_url(&self, state: &str) -> String {
        let mut url = self.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("access_type", "offline")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_url)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", state);
        url.into()
    }

    async fn exchange(&self, code: &str) -> Result<Credential, BackendError> {
        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .client
            .post(self.token_url.clone())
            .form(&params)
            .send()
            .await
            .map_err(|e| BackendError::from_transport(&e))?;
        let body = check_response(response).await?;

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| BackendError::unknown(format!("Failed to parse token response: {e}")))?;
        Ok(token.into_credential())
    }
}

// ============================================================================
// Calendar
// ============================================================================

/// Google Calendar v3 REST client
pub struct GoogleCalendarBackend {
    client: Client,
    base_url: String,
}

impl GoogleCalendarBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        parse_url("calendar base URL", base_url)?;
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn insert<T: Serialize + Sync>(
        &self,
        path: &str,
        credential: &Credential,
        body: &T,
    ) -> Result<(), BackendError> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .header(AUTHORIZATION, credential.authorization())
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::from_transport(&e))?;
        check_response(response).await.map(|_| ())
    }
}

#[derive(Debug, Serialize)]
struct CalendarInsert<'a> {
    summary: &'a str,
}

#[derive(Debug, Serialize)]
struct EventDateTime<'a> {
    #[serde(rename = "dateTime")]
    date_time: &'a str,
}

#[derive(Debug, Serialize)]
struct EventAttendee<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct EventInsert<'a> {
    summary: &'a str,
    start: EventDateTime<'a>,
    end: EventDateTime<'a>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attendees: Vec<EventAttendee<'a>>,
}

impl<'a> From<&'a EventDraft> for EventInsert<'a> {
    fn from(draft: &'a EventDraft) -> Self {
        Self {
            summary: &draft.summary,
            start: EventDateTime {
                date_time: &draft.start,
            },
            end: EventDateTime {
                date_time: &draft.end,
            },
            attendees: draft
                .attendees
                .iter()
                .map(|email| EventAttendee { email })
                .collect(),
        }
    }
}

#[async_trait]
impl CalendarBackend for GoogleCalendarBackend {
    async fn create_calendar(
        &self,
        credential: &Credential,
        summary: &str,
    ) -> Result<(), BackendError> {
        self.insert("/calendars", credential, &CalendarInsert { summary })
            .await
    }

    async fn create_event(
        &self,
        credential: &Credential,
        event: &EventDraft,
    ) -> Result<(), BackendError> {
        self.insert(
            "/calendars/primary/events",
            credential,
            &EventInsert::from(event),
        )
        .await
    }
}
