//! Calendar service: provider linking, meetings, participants and briefs.
//!
//! Every operation here is a pass-through to the backend. The only client-side
//! work is tagging results with their provider and merging per-provider lists.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::backend::functions::{FETCH_MEETINGS, FETCH_PARTICIPANTS, GENERATE_BRIEF, GET_OAUTH_URL};
use crate::backend::{Backend, Pkce};
use crate::brief::MeetingBrief;
use crate::error::{MeetPrepError, MeetPrepResult};
use crate::listing::merge_provider_results;
use crate::meeting::{CalendarConnection, Meeting, MeetingParticipant, Provider};
use crate::preferences::{AiPreferences, DetailLevel};
use crate::session::Session;

pub const MEETINGS_TABLE: &str = "meetings";
pub const CONNECTIONS_TABLE: &str = "calendar_connections";

/// An OAuth link in progress: the URL to open and the verifier to finish with.
#[derive(Debug, Clone)]
pub struct PendingConnection {
    pub provider: Provider,
    pub url: Url,
    pub verifier: String,
}

/// Result of asking each connected provider for its meetings.
///
/// One provider failing never discards the others' meetings.
#[derive(Debug, Default)]
pub struct ProviderSync {
    pub meetings: Vec<Meeting>,
    pub synced: Vec<Provider>,
    pub failures: Vec<(Provider, MeetPrepError)>,
}

/// Start linking a calendar. Works signed in or not: the OAuth sign-in both
/// authenticates and grants calendar scopes.
pub fn connect_calendar(
    backend: &Backend,
    provider: Provider,
    redirect_to: &str,
) -> MeetPrepResult<PendingConnection> {
    start_oauth(backend, provider, provider.scopes(), redirect_to)
}

/// Start a plain OAuth sign-in with no calendar scopes.
pub fn sign_in_with_provider(
    backend: &Backend,
    provider: Provider,
    redirect_to: &str,
) -> MeetPrepResult<PendingConnection> {
    start_oauth(backend, provider, &[], redirect_to)
}

fn start_oauth(
    backend: &Backend,
    provider: Provider,
    scopes: &[&str],
    redirect_to: &str,
) -> MeetPrepResult<PendingConnection> {
    let pkce = Pkce::generate();
    let url = backend.authorize_url(provider.oauth_name(), scopes, redirect_to, &pkce)?;

    Ok(PendingConnection {
        provider,
        url,
        verifier: pkce.verifier,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BriefRequest<'a> {
    meeting_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<Provider>,
    preferences: BriefOptions,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BriefOptions {
    email_analysis: bool,
    talking_points: bool,
    action_items: bool,
    detail: DetailLevel,
}

impl From<&AiPreferences> for BriefOptions {
    fn from(prefs: &AiPreferences) -> Self {
        BriefOptions {
            email_analysis: prefs.email_analysis,
            talking_points: prefs.talking_points,
            action_items: prefs.action_items,
            detail: prefs.detail,
        }
    }
}

#[derive(Deserialize)]
struct ProviderRow {
    provider: Provider,
}

#[derive(Deserialize)]
struct OAuthUrlResponse {
    url: String,
}

pub struct CalendarService {
    backend: Backend,
    session: Session,
}

impl CalendarService {
    pub fn new(backend: Backend, session: Session) -> Self {
        CalendarService { backend, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn user_id(&self) -> &str {
        &self.session.user.id
    }

    fn token(&self) -> &str {
        &self.session.access_token
    }

    /// Finish an OAuth link: exchange the code and record the connection.
    ///
    /// The connection row is only written when the backend hands back the
    /// provider's own token; a plain sign-in without calendar consent links
    /// nothing.
    pub async fn complete_connection(
        backend: Backend,
        pending: &PendingConnection,
        auth_code: &str,
    ) -> MeetPrepResult<(Self, bool)> {
        let session = backend.exchange_code(auth_code, &pending.verifier).await?;
        let service = CalendarService::new(backend, session);

        let Some(access_token) = service.session.provider_token.clone() else {
            warn!(provider = %pending.provider, "sign-in returned no provider token, calendar not linked");
            return Ok((service, false));
        };

        let connection = CalendarConnection {
            user_id: service.user_id().to_string(),
            provider: pending.provider,
            access_token,
            refresh_token: service.session.provider_refresh_token.clone(),
            updated_at: Some(chrono::Utc::now()),
        };

        service
            .backend
            .table(CONNECTIONS_TABLE)
            .upsert(&[connection], "user_id,provider", service.token())
            .await?;

        info!(provider = %pending.provider, user = service.user_id(), "calendar connected");
        Ok((service, true))
    }

    /// Linking URL produced server-side by the `get-oauth-url` function.
    pub async fn oauth_url_from_function(
        &self,
        provider: Provider,
        redirect_to: &str,
    ) -> MeetPrepResult<Url> {
        let response: OAuthUrlResponse = self
            .backend
            .invoke(
                GET_OAUTH_URL,
                &serde_json::json!({ "provider": provider, "redirectTo": redirect_to }),
                self.token(),
            )
            .await?;

        Url::parse(&response.url)
            .map_err(|e| MeetPrepError::Serialization(format!("get-oauth-url returned a bad URL: {e}")))
    }

    /// Providers with a stored connection, in the order the backend lists them.
    pub async fn connected_providers(&self) -> MeetPrepResult<Vec<Provider>> {
        let rows: Vec<ProviderRow> = self
            .backend
            .table(CONNECTIONS_TABLE)
            .select("provider")
            .eq("user_id", self.user_id())
            .execute(self.token())
            .await?;

        let mut providers = Vec::new();
        for row in rows {
            if !providers.contains(&row.provider) {
                providers.push(row.provider);
            }
        }
        Ok(providers)
    }

    pub async fn disconnect(&self, provider: Provider) -> MeetPrepResult<()> {
        self.backend
            .table(CONNECTIONS_TABLE)
            .eq("user_id", self.user_id())
            .eq("provider", provider)
            .delete(self.token())
            .await?;

        info!(%provider, "calendar disconnected");
        Ok(())
    }

    /// Remove every stored connection for the signed-in user.
    pub async fn delete_all_connections(&self) -> MeetPrepResult<()> {
        self.backend
            .table(CONNECTIONS_TABLE)
            .eq("user_id", self.user_id())
            .delete(self.token())
            .await
    }

    /// Meetings persisted for the signed-in user.
    pub async fn fetch_meetings(&self) -> MeetPrepResult<Vec<Meeting>> {
        self.backend
            .table(MEETINGS_TABLE)
            .select("*")
            .eq("user_id", self.user_id())
            .execute(self.token())
            .await
    }

    /// Ask each provider's remote function for its meetings.
    pub async fn sync_provider_meetings(&self, providers: &[Provider]) -> ProviderSync {
        let mut sync = ProviderSync::default();
        let mut batches = Vec::new();

        for &provider in providers {
            match self.fetch_provider_meetings(provider).await {
                Ok(meetings) => {
                    info!(%provider, count = meetings.len(), "fetched provider meetings");
                    batches.push(meetings);
                    sync.synced.push(provider);
                }
                Err(e) => {
                    warn!(%provider, error = %e, "failed to fetch provider meetings");
                    sync.failures.push((provider, e));
                }
            }
        }

        sync.meetings = merge_provider_results(batches);
        sync
    }

    async fn fetch_provider_meetings(&self, provider: Provider) -> MeetPrepResult<Vec<Meeting>> {
        let value: serde_json::Value = self
            .backend
            .invoke(FETCH_MEETINGS, &serde_json::json!({ "provider": provider }), self.token())
            .await?;

        let mut meetings: Vec<Meeting> = unwrap_list(value, "meetings")?;
        for meeting in &mut meetings {
            meeting.provider.get_or_insert(provider);
        }
        Ok(meetings)
    }

    pub async fn get_meeting_participants(
        &self,
        meeting_id: &str,
        provider: Option<Provider>,
    ) -> MeetPrepResult<Vec<MeetingParticipant>> {
        let value: serde_json::Value = self
            .backend
            .invoke(
                FETCH_PARTICIPANTS,
                &serde_json::json!({ "meetingId": meeting_id, "provider": provider }),
                self.token(),
            )
            .await?;

        unwrap_list(value, "participants")
    }

    pub async fn generate_brief(
        &self,
        meeting_id: &str,
        provider: Option<Provider>,
        prefs: &AiPreferences,
    ) -> MeetPrepResult<MeetingBrief> {
        let request = BriefRequest {
            meeting_id,
            provider,
            preferences: prefs.into(),
        };

        let value: serde_json::Value = self
            .backend
            .invoke(GENERATE_BRIEF, &request, self.token())
            .await?;

        let brief: MeetingBrief = unwrap_object(value, "brief")?;
        Ok(brief.apply_preferences(prefs))
    }
}

/// Functions answer either with a bare array or with `{ "<key>": [...] }`.
fn unwrap_list<T: DeserializeOwned>(value: serde_json::Value, key: &str) -> MeetPrepResult<Vec<T>> {
    match value {
        serde_json::Value::Array(_) => Ok(serde_json::from_value(value)?),
        serde_json::Value::Object(mut map) => match map.remove(key) {
            Some(list) => Ok(serde_json::from_value(list)?),
            None => Err(MeetPrepError::Serialization(format!(
                "expected a list or an object with '{key}'"
            ))),
        },
        other => Err(MeetPrepError::Serialization(format!(
            "expected a list of {key}, got {other}"
        ))),
    }
}

/// Functions answer either with the object itself or with `{ "<key>": {...} }`.
fn unwrap_object<T: DeserializeOwned>(value: serde_json::Value, key: &str) -> MeetPrepResult<T> {
    match value {
        serde_json::Value::Object(mut map) => match map.remove(key) {
            Some(inner) => Ok(serde_json::from_value(inner)?),
            None => Ok(serde_json::from_value(serde_json::Value::Object(map))?),
        },
        other => Ok(serde_json::from_value(other)?),
    }
}
