//! Auth endpoints: password sign-in/up, OAuth with PKCE, refresh, sign-out.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use reqwest::Method;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::info;
use url::Url;

use super::{Backend, check_status, parse_json};
use crate::error::{MeetPrepError, MeetPrepResult};
use crate::session::{Session, User};

const VERIFIER_LEN: usize = 64;

/// Proof key for the OAuth code exchange (RFC 7636, S256).
#[derive(Debug, Clone)]
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

impl Pkce {
    pub fn generate() -> Self {
        let verifier: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(VERIFIER_LEN)
            .map(char::from)
            .collect();
        Pkce::from_verifier(verifier)
    }

    pub fn from_verifier(verifier: String) -> Self {
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        Pkce { verifier, challenge }
    }
}

/// What the backend did with a sign-up request.
#[derive(Debug)]
pub enum SignUpOutcome {
    /// The account was confirmed immediately and a session issued.
    SignedIn(Session),
    /// A confirmation email was sent; the user must click it before signing in.
    ConfirmationSent { email: String },
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: WireUser,
    #[serde(default)]
    provider_token: Option<String>,
    #[serde(default)]
    provider_refresh_token: Option<String>,
}

impl TokenResponse {
    fn into_session(self) -> MeetPrepResult<Session> {
        let expires_at = Duration::try_seconds(self.expires_in)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                MeetPrepError::Auth(format!("token lifetime out of range: {}s", self.expires_in))
            })?;

        Ok(Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user.into(),
            provider_token: self.provider_token,
            provider_refresh_token: self.provider_refresh_token,
        })
    }
}

#[derive(Deserialize)]
struct WireUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: serde_json::Map<String, serde_json::Value>,
}

impl From<WireUser> for User {
    fn from(wire: WireUser) -> Self {
        let username = ["username", "full_name", "name"]
            .iter()
            .find_map(|key| wire.user_metadata.get(*key).and_then(|v| v.as_str()))
            .map(str::to_string);

        User {
            id: wire.id,
            email: wire.email,
            username,
        }
    }
}

impl Backend {
    fn token_url(&self, grant_type: &str) -> MeetPrepResult<Url> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);
        Ok(url)
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> MeetPrepResult<Session> {
        let response = self
            .request(Method::POST, self.token_url("password")?)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let tokens: TokenResponse = parse_json(response).await?;
        info!(email, "signed in with password");
        tokens.into_session()
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: Option<&str>,
    ) -> MeetPrepResult<SignUpOutcome> {
        let mut body = serde_json::json!({ "email": email, "password": password });
        if let Some(username) = username {
            body["data"] = serde_json::json!({ "username": username });
        }

        let response = self
            .request(Method::POST, self.endpoint("auth/v1/signup")?)
            .json(&body)
            .send()
            .await?;

        let value: serde_json::Value = parse_json(response).await?;

        if value.get("access_token").is_some() {
            let tokens: TokenResponse = serde_json::from_value(value)?;
            return Ok(SignUpOutcome::SignedIn(tokens.into_session()?));
        }

        let user: WireUser = match value.get("user") {
            Some(user) => serde_json::from_value(user.clone())?,
            None => serde_json::from_value(value)?,
        };
        Ok(SignUpOutcome::ConfirmationSent {
            email: user.email.unwrap_or_else(|| email.to_string()),
        })
    }

    /// Browser URL that starts an OAuth sign-in. The backend redirects to
    /// `redirect_to?code=...` once the user consents.
    pub fn authorize_url(
        &self,
        oauth_provider: &str,
        scopes: &[&str],
        redirect_to: &str,
        pkce: &Pkce,
    ) -> MeetPrepResult<Url> {
        let mut url = self.endpoint("auth/v1/authorize")?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("provider", oauth_provider)
                .append_pair("redirect_to", redirect_to);
            if !scopes.is_empty() {
                query.append_pair("scopes", &scopes.join(" "));
            }
            query
                .append_pair("code_challenge", &pkce.challenge)
                .append_pair("code_challenge_method", "s256");
        }
        Ok(url)
    }

    pub async fn exchange_code(&self, auth_code: &str, code_verifier: &str) -> MeetPrepResult<Session> {
        let response = self
            .request(Method::POST, self.token_url("pkce")?)
            .json(&serde_json::json!({ "auth_code": auth_code, "code_verifier": code_verifier }))
            .send()
            .await?;

        let tokens: TokenResponse = parse_json(response).await?;
        tokens.into_session()
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> MeetPrepResult<Session> {
        let response = self
            .request(Method::POST, self.token_url("refresh_token")?)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        let tokens: TokenResponse = parse_json(response).await?;
        tokens.into_session()
    }

    pub async fn get_user(&self, access_token: &str) -> MeetPrepResult<User> {
        let response = self
            .authed(Method::GET, self.endpoint("auth/v1/user")?, access_token)
            .send()
            .await?;

        let user: WireUser = parse_json(response).await?;
        Ok(user.into())
    }

    pub async fn sign_out(&self, access_token: &str) -> MeetPrepResult<()> {
        let response = self
            .authed(Method::POST, self.endpoint("auth/v1/logout")?, access_token)
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }
}
