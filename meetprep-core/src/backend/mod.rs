//! HTTP client for the hosted backend.
//!
//! The backend exposes three surfaces that all share one base URL and one
//! public API key:
//! - `auth/v1/*` for password, OAuth and session endpoints ([`auth`])
//! - `rest/v1/{table}` for row queries ([`table`])
//! - `functions/v1/{name}` for named remote functions ([`functions`])
//!
//! Request and response bodies of remote functions are untyped JSON on the
//! wire; callers pick the type they expect back.

pub mod auth;
pub mod functions;
pub mod table;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::AppConfig;
use crate::error::{MeetPrepError, MeetPrepResult};

pub use auth::{Pkce, SignUpOutcome};
pub use table::TableQuery;

#[derive(Debug, Clone)]
pub struct Backend {
    http: reqwest::Client,
    base_url: Url,
    anon_key: String,
}

impl Backend {
    pub fn new(base_url: &str, anon_key: &str) -> MeetPrepResult<Self> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        let base_url = Url::parse(&base)
            .map_err(|e| MeetPrepError::Config(format!("Invalid backend_url '{base_url}': {e}")))?;

        Ok(Backend {
            http: reqwest::Client::new(),
            base_url,
            anon_key: anon_key.to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> MeetPrepResult<Self> {
        let (url, key) = config.backend_credentials()?;
        Backend::new(url, key)
    }

    pub(crate) fn endpoint(&self, path: &str) -> MeetPrepResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| MeetPrepError::Config(format!("Invalid endpoint '{path}': {e}")))
    }

    /// Request carrying only the public API key.
    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, path = url.path(), "backend request");
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
    }

    /// Request on behalf of a signed-in user.
    pub(crate) fn authed(&self, method: Method, url: Url, access_token: &str) -> RequestBuilder {
        self.request(method, url).bearer_auth(access_token)
    }
}

/// Turn a non-success response into an error, otherwise hand it back.
pub(crate) async fn check_status(response: Response) -> MeetPrepResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body);
    debug!(status = status.as_u16(), %message, "backend error");

    if status == StatusCode::UNAUTHORIZED {
        return Err(MeetPrepError::Unauthorized(message));
    }

    Err(MeetPrepError::Backend {
        status: status.as_u16(),
        message,
    })
}

pub(crate) async fn parse_json<T: DeserializeOwned>(response: Response) -> MeetPrepResult<T> {
    let response = check_status(response).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Pull a human-readable message out of an error body.
///
/// The auth, REST and function layers each use a different key.
fn error_message(body: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error_description", "msg", "message", "error"] {
            if let Some(serde_json::Value::String(message)) = map.get(key) {
                return message.clone();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no error details".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let backend = Backend::new("https://demo.example.co/base", "anon").unwrap();
        assert_eq!(
            backend.endpoint("auth/v1/user").unwrap().as_str(),
            "https://demo.example.co/base/auth/v1/user"
        );
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        assert!(matches!(
            Backend::new("not a url", "anon"),
            Err(MeetPrepError::Config(_))
        ));
    }

    #[test]
    fn error_message_prefers_descriptive_keys() {
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(error_message(r#"{"msg":"User already registered"}"#), "User already registered");
        assert_eq!(error_message(r#"{"error":"function crashed"}"#), "function crashed");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message(""), "no error details");
    }
}
