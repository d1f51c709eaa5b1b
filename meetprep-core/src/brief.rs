//! AI-generated meeting briefs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::preferences::AiPreferences;

/// Summary, talking points and action items for one meeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingBrief {
    pub summary: String,
    #[serde(default, alias = "recent_emails")]
    pub recent_emails: Vec<RecentEmail>,
    #[serde(default, alias = "action_items")]
    pub action_items: Vec<String>,
    #[serde(default, alias = "talking_points")]
    pub talking_points: Vec<String>,
}

/// An email thread related to the meeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentEmail {
    pub id: String,
    pub subject: String,
    #[serde(with = "crate::datetime::required")]
    pub date: DateTime<Utc>,
    pub excerpt: String,
}

impl MeetingBrief {
    /// Drop the sections the user turned off, whatever the backend sent back.
    pub fn apply_preferences(mut self, prefs: &AiPreferences) -> Self {
        if !prefs.talking_points {
            self.talking_points.clear();
        }
        if !prefs.action_items {
            self.action_items.clear();
        }
        if !prefs.email_analysis {
            self.recent_emails.clear();
        }
        self
    }

    /// Recent emails, newest first.
    pub fn emails_newest_first(&self) -> Vec<&RecentEmail> {
        let mut emails: Vec<&RecentEmail> = self.recent_emails.iter().collect();
        emails.sort_by(|a, b| b.date.cmp(&a.date));
        emails
    }
}
