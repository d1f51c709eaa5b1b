//! Meetings, participants and calendar connections.
//!
//! These are client-side projections of backend rows. The only transformation
//! applied on the way in is date coercion (see [`crate::datetime`]) and
//! tolerance for both camelCase and snake_case keys.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::MeetPrepError;

/// Calendar service a user can link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    #[serde(alias = "microsoft", alias = "azure")]
    Outlook,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Google, Provider::Outlook];

    /// Provider name understood by the backend's OAuth endpoint.
    pub fn oauth_name(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Outlook => "microsoft",
        }
    }

    /// Read-only calendar scopes requested when linking.
    pub fn scopes(&self) -> &'static [&'static str] {
        match self {
            Provider::Google => &["https://www.googleapis.com/auth/calendar.readonly"],
            Provider::Outlook => &["calendars.read"],
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Google => "Google Calendar",
            Provider::Outlook => "Outlook Calendar",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Outlook => "outlook",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = MeetPrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Provider::Google),
            "outlook" | "microsoft" | "azure" => Ok(Provider::Outlook),
            _ => Err(MeetPrepError::UnknownProvider(s.to_string())),
        }
    }
}

/// A calendar meeting as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(alias = "start_time", with = "crate::datetime::required")]
    pub date: DateTime<Utc>,
    #[serde(
        default,
        alias = "end_date",
        alias = "end_time",
        with = "crate::datetime::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "attendee_count")]
    pub attendee_count: u32,
    #[serde(default, alias = "is_upcoming")]
    pub is_upcoming: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
}

/// Whether a brief can be read yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BriefStatus {
    Pending,
    Available,
}

impl fmt::Display for BriefStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BriefStatus::Pending => f.write_str("Brief Pending"),
            BriefStatus::Available => f.write_str("Brief Available"),
        }
    }
}

impl Meeting {
    /// A meeting is upcoming if the backend flagged it so, or if it starts after `now`.
    pub fn is_upcoming_at(&self, now: DateTime<Utc>) -> bool {
        self.is_upcoming || self.date > now
    }

    pub fn attendee_label(&self) -> String {
        if self.attendee_count == 1 {
            "1 attendee".to_string()
        } else {
            format!("{} attendees", self.attendee_count)
        }
    }

    pub fn brief_status(&self, now: DateTime<Utc>) -> BriefStatus {
        if self.is_upcoming_at(now) {
            BriefStatus::Pending
        } else {
            BriefStatus::Available
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Organizer,
    Attendee,
    Optional,
}

impl fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticipantRole::Organizer => f.write_str("organizer"),
            ParticipantRole::Attendee => f.write_str("attendee"),
            ParticipantRole::Optional => f.write_str("optional"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    #[serde(rename = "accepted")]
    Accepted,
    #[serde(rename = "declined")]
    Declined,
    #[serde(rename = "tentative")]
    Tentative,
    #[serde(rename = "needsAction", alias = "needs_action")]
    NeedsAction,
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseStatus::Accepted => f.write_str("accepted"),
            ResponseStatus::Declined => f.write_str("declined"),
            ResponseStatus::Tentative => f.write_str("tentative"),
            ResponseStatus::NeedsAction => f.write_str("awaiting response"),
        }
    }
}

/// Someone invited to a meeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingParticipant {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<ParticipantRole>,
    #[serde(default, alias = "response_status", skip_serializing_if = "Option::is_none")]
    pub response_status: Option<ResponseStatus>,
}

impl MeetingParticipant {
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }

    /// Uppercased first letter of each part of the name ("Jane Smith" -> "JS").
    /// Falls back to the first letter of the email.
    pub fn initials(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name
                .split_whitespace()
                .filter_map(|part| part.chars().next())
                .flat_map(char::to_uppercase)
                .collect(),
            _ => self
                .email
                .chars()
                .next()
                .map(|c| c.to_uppercase().collect())
                .unwrap_or_default(),
        }
    }
}

/// A linked calendar, persisted in the `calendar_connections` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarConnection {
    pub user_id: String,
    pub provider: Provider,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(
        default,
        with = "crate::datetime::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Row ids are text in some tables and integers in others.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
