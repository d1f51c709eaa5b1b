//! Signed-in session, persisted between runs.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::backend::Backend;
use crate::error::{MeetPrepError, MeetPrepResult};

/// Refresh this long before the access token actually expires.
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl User {
    pub fn label(&self) -> &str {
        self.username
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    /// Calendar provider's own access token, present right after an OAuth sign-in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_refresh_token: Option<String>,
    pub user: User,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_SKEW_SECS) >= self.expires_at
    }
}

/// Reads and writes `session.toml` in the data directory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(data_dir: &Path) -> Self {
        SessionStore {
            path: data_dir.join("session.toml"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> MeetPrepResult<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path)?;
        Ok(Some(toml::from_str(&contents)?))
    }

    pub fn save(&self, session: &Session) -> MeetPrepResult<()> {
        let contents = toml::to_string_pretty(session)?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&self.path, contents)?;

        // Owner-only, the file holds bearer tokens
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    pub fn clear(&self) -> MeetPrepResult<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    /// The stored session, refreshed first if it is about to expire.
    ///
    /// Fails with [`MeetPrepError::NotSignedIn`] when nobody is signed in.
    pub async fn load_valid(&self, backend: &Backend) -> MeetPrepResult<Session> {
        let session = self.load()?.ok_or(MeetPrepError::NotSignedIn)?;

        if !session.is_expired_at(Utc::now()) {
            return Ok(session);
        }

        debug!(user = %session.user.id, "access token expired, refreshing");
        let mut refreshed = match backend.refresh_session(&session.refresh_token).await {
            Ok(refreshed) => refreshed,
            Err(MeetPrepError::Unauthorized(_)) | Err(MeetPrepError::Backend { status: 400, .. }) => {
                self.clear()?;
                return Err(MeetPrepError::NotSignedIn);
            }
            Err(e) => return Err(e),
        };

        // Refresh responses don't repeat the provider tokens
        if refreshed.provider_token.is_none() {
            refreshed.provider_token = session.provider_token;
        }
        if refreshed.provider_refresh_token.is_none() {
            refreshed.provider_refresh_token = session.provider_refresh_token;
        }

        self.save(&refreshed)?;
        info!(user = %refreshed.user.id, "session refreshed");
        Ok(refreshed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session(expires_in: i64) -> Session {
        Session {
            access_token: "access-old".into(),
            refresh_token: "refresh-old".into(),
            expires_at: Utc::now() + Duration::seconds(expires_in),
            user: User {
                id: "user-1".into(),
                email: Some("ada@example.com".into()),
                username: None,
            },
            provider_token: Some("google-access".into()),
            provider_refresh_token: None,
        }
    }

    #[test]
    fn save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        assert!(store.load().unwrap().is_none());

        let original = session(3600);
        store.save(&original).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.access_token, original.access_token);
        assert_eq!(loaded.user, original.user);

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.save(&session(3600)).unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn expiry_includes_skew() {
        let now = Utc::now();
        assert!(session(30).is_expired_at(now));
        assert!(!session(600).is_expired_at(now));
    }

    #[test]
    fn user_label_prefers_username() {
        let mut user = session(0).user;
        assert_eq!(user.label(), "ada@example.com");
        user.username = Some("ada".into());
        assert_eq!(user.label(), "ada");
    }

    #[tokio::test]
    async fn missing_session_is_not_signed_in() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let backend = Backend::new("http://127.0.0.1:9", "anon").unwrap();

        assert!(matches!(
            store.load_valid(&backend).await,
            Err(MeetPrepError::NotSignedIn)
        ));
    }

    #[tokio::test]
    async fn fresh_session_is_returned_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.save(&session(3600)).unwrap();
        let backend = Backend::new("http://127.0.0.1:9", "anon").unwrap();

        let valid = store.load_valid(&backend).await.unwrap();
        assert_eq!(valid.access_token, "access-old");
    }

    #[tokio::test]
    async fn expired_session_is_refreshed_and_saved() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .and(body_json(serde_json::json!({ "refresh_token": "refresh-old" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access-new",
                "refresh_token": "refresh-new",
                "expires_in": 3600,
                "user": { "id": "user-1", "email": "ada@example.com" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.save(&session(-10)).unwrap();
        let backend = Backend::new(&server.uri(), "anon").unwrap();

        let refreshed = store.load_valid(&backend).await.unwrap();
        assert_eq!(refreshed.access_token, "access-new");
        assert_eq!(refreshed.provider_token.as_deref(), Some("google-access"));

        let on_disk = store.load().unwrap().unwrap();
        assert_eq!(on_disk.refresh_token, "refresh-new");
    }

    #[tokio::test]
    async fn rejected_refresh_signs_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error_description": "Invalid Refresh Token: Already Used"
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.save(&session(-10)).unwrap();
        let backend = Backend::new(&server.uri(), "anon").unwrap();

        assert!(matches!(
            store.load_valid(&backend).await,
            Err(MeetPrepError::NotSignedIn)
        ));
        assert!(store.load().unwrap().is_none());
    }
}
