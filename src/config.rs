//! Startup configuration
//!
//! Values come from environment variables. The OAuth client id and secret are
//! read from a JSON credentials file unless overridden by the environment.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_CREDENTIALS_FILE: &str = "./creds.json";
const DEFAULT_REDIRECT_URL: &str = "http://localhost:8000/authorize-callback";
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 5 * 60;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

const SCOPES: [&str; 3] = [
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/calendar",
    "https://www.googleapis.com/auth/calendar.readonly",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read credentials file {path}: {source}")]
    ReadCredentials {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid credentials file {path}: {source}")]
    ParseCredentials {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Missing OAuth client {0}; set it in the credentials file or the environment")]
    MissingClientField(&'static str),
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Contents of the credentials file
#[derive(Debug, Default, Deserialize)]
struct ClientCredentials {
    #[serde(default)]
    cid: String,
    #[serde(default)]
    csecret: String,
}

impl ClientCredentials {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadCredentials {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::ParseCredentials {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// OAuth client registration with the identity provider
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub oauth: OAuthConfig,
    pub calendar_base_url: String,
    /// Upper bound for every identity and calendar HTTP call
    pub backend_timeout: Duration,
    /// Idle sessions older than this are swept; `None` keeps them forever
    pub session_ttl: Option<Duration>,
    pub sweep_interval: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let credentials_path = PathBuf::from(
            get("CHATBOT_CREDENTIALS_FILE").unwrap_or_else(|| DEFAULT_CREDENTIALS_FILE.to_string()),
        );

        let env_id = get("GOOGLE_CLIENT_ID").filter(|v| !v.is_empty());
        let env_secret = get("GOOGLE_CLIENT_SECRET").filter(|v| !v.is_empty());

        // The file is only required when the environment does not supply both values
        let file = if env_id.is_some() && env_secret.is_some() {
            ClientCredentials::default()
        } else {
            ClientCredentials::load(&credentials_path)?
        };

        let client_id = env_id.unwrap_or(file.cid);
        let client_secret = env_secret.unwrap_or(file.csecret);
        if client_id.is_empty() {
            return Err(ConfigError::MissingClientField("id"));
        }
        if client_secret.is_empty() {
            return Err(ConfigError::MissingClientField("secret"));
        }

        let oauth = OAuthConfig {
            client_id,
            client_secret,
            redirect_url: get("CHATBOT_REDIRECT_URL")
                .unwrap_or_else(|| DEFAULT_REDIRECT_URL.to_string()),
            auth_url: get("CHATBOT_AUTH_URL").unwrap_or_else(|| GOOGLE_AUTH_URL.to_string()),
            token_url: get("CHATBOT_TOKEN_URL").unwrap_or_else(|| GOOGLE_TOKEN_URL.to_string()),
            scopes: SCOPES.iter().map(ToString::to_string).collect(),
        };

        let port = parse_or(&get, "CHATBOT_PORT", DEFAULT_PORT)?;
        let timeout_secs = parse_or(
            &get,
            "CHATBOT_BACKEND_TIMEOUT_SECS",
            DEFAULT_BACKEND_TIMEOUT_SECS,
        )?;
        let ttl_secs = parse_or(&get, "CHATBOT_SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;
        let sweep_secs = parse_or(
            &get,
            "CHATBOT_SWEEP_INTERVAL_SECS",
            DEFAULT_SWEEP_INTERVAL_SECS,
        )?;
        if sweep_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "CHATBOT_SWEEP_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            port,
            oauth,
            calendar_base_url: get("CHATBOT_CALENDAR_URL").unwrap_or_else(|| {
                crate::backend::GOOGLE_CALENDAR_BASE_URL.to_string()
            }),
            backend_timeout: Duration::from_secs(timeout_secs),
            session_ttl: (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs)),
            sweep_interval: Duration::from_secs(sweep_secs),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(default),
    }
}
