//! User preferences (notifications, AI brief options, privacy).
//!
//! Stored as `settings.toml` next to the main config. Keys are addressed with
//! dotted paths like `ai.detail` or `notifications.prep_hours`.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MeetPrepError, MeetPrepResult};

/// Allowed values for how many hours before a meeting its brief is prepared.
pub const PREP_HOURS: [u32; 5] = [2, 6, 12, 24, 48];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub notifications: NotificationPreferences,
    pub ai: AiPreferences,
    pub privacy: PrivacyPreferences,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPreferences {
    /// Notify when a new brief is ready
    pub brief_ready: bool,
    /// Remind before meetings with a link to the brief
    pub reminders: bool,
    /// Also send briefs by email
    pub email_delivery: bool,
    /// Hours before the meeting that the brief is generated
    pub prep_hours: u32,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        NotificationPreferences {
            brief_ready: true,
            reminders: true,
            email_delivery: false,
            prep_hours: 24,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiPreferences {
    /// Let the brief generator read emails from participants
    pub email_analysis: bool,
    pub talking_points: bool,
    pub action_items: bool,
    pub detail: DetailLevel,
}

impl Default for AiPreferences {
    fn default() -> Self {
        AiPreferences {
            email_analysis: true,
            talking_points: true,
            action_items: true,
            detail: DetailLevel::Balanced,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacyPreferences {
    /// Keep fetched meetings in the local cache
    pub local_storage: bool,
    /// Allow public lookups for participant details
    pub third_party_lookup: bool,
    /// Forget meeting data older than 30 days
    pub limited_retention: bool,
}

impl Default for PrivacyPreferences {
    fn default() -> Self {
        PrivacyPreferences {
            local_storage: true,
            third_party_lookup: true,
            limited_retention: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Concise,
    #[default]
    Balanced,
    Detailed,
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetailLevel::Concise => f.write_str("concise"),
            DetailLevel::Balanced => f.write_str("balanced"),
            DetailLevel::Detailed => f.write_str("detailed"),
        }
    }
}

impl FromStr for DetailLevel {
    type Err = MeetPrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "concise" => Ok(DetailLevel::Concise),
            "balanced" => Ok(DetailLevel::Balanced),
            "detailed" => Ok(DetailLevel::Detailed),
            other => Err(MeetPrepError::InvalidSetting(format!(
                "'{other}' is not a detail level (concise, balanced, detailed)"
            ))),
        }
    }
}

/// Every settable key, in display order.
pub const KEYS: [&str; 11] = [
    "notifications.brief_ready",
    "notifications.reminders",
    "notifications.email_delivery",
    "notifications.prep_hours",
    "ai.email_analysis",
    "ai.talking_points",
    "ai.action_items",
    "ai.detail",
    "privacy.local_storage",
    "privacy.third_party_lookup",
    "privacy.limited_retention",
];

impl Preferences {
    /// Load preferences, falling back to defaults when the file doesn't exist yet.
    pub fn load(path: &Path) -> MeetPrepResult<Self> {
        if !path.exists() {
            return Ok(Preferences::default());
        }

        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn save(&self, path: &Path) -> MeetPrepResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> MeetPrepResult<String> {
        let value = match key {
            "notifications.brief_ready" => self.notifications.brief_ready.to_string(),
            "notifications.reminders" => self.notifications.reminders.to_string(),
            "notifications.email_delivery" => self.notifications.email_delivery.to_string(),
            "notifications.prep_hours" => self.notifications.prep_hours.to_string(),
            "ai.email_analysis" => self.ai.email_analysis.to_string(),
            "ai.talking_points" => self.ai.talking_points.to_string(),
            "ai.action_items" => self.ai.action_items.to_string(),
            "ai.detail" => self.ai.detail.to_string(),
            "privacy.local_storage" => self.privacy.local_storage.to_string(),
            "privacy.third_party_lookup" => self.privacy.third_party_lookup.to_string(),
            "privacy.limited_retention" => self.privacy.limited_retention.to_string(),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    pub fn set(&mut self, key: &str, value: &str) -> MeetPrepResult<()> {
        match key {
            "notifications.brief_ready" => self.notifications.brief_ready = parse_bool(key, value)?,
            "notifications.reminders" => self.notifications.reminders = parse_bool(key, value)?,
            "notifications.email_delivery" => {
                self.notifications.email_delivery = parse_bool(key, value)?
            }
            "notifications.prep_hours" => self.notifications.prep_hours = parse_prep_hours(value)?,
            "ai.email_analysis" => self.ai.email_analysis = parse_bool(key, value)?,
            "ai.talking_points" => self.ai.talking_points = parse_bool(key, value)?,
            "ai.action_items" => self.ai.action_items = parse_bool(key, value)?,
            "ai.detail" => self.ai.detail = value.parse()?,
            "privacy.local_storage" => self.privacy.local_storage = parse_bool(key, value)?,
            "privacy.third_party_lookup" => {
                self.privacy.third_party_lookup = parse_bool(key, value)?
            }
            "privacy.limited_retention" => {
                self.privacy.limited_retention = parse_bool(key, value)?
            }
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }

    /// All keys with their current values.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        KEYS.iter()
            .filter_map(|key| self.get(key).ok().map(|value| (*key, value)))
            .collect()
    }
}

fn unknown_key(key: &str) -> MeetPrepError {
    MeetPrepError::InvalidSetting(format!(
        "unknown key '{key}'. Available keys: {}",
        KEYS.join(", ")
    ))
}

fn parse_bool(key: &str, value: &str) -> MeetPrepResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(MeetPrepError::InvalidSetting(format!(
            "{key} expects on/off, got '{value}'"
        ))),
    }
}

fn parse_prep_hours(value: &str) -> MeetPrepResult<u32> {
    let hours: u32 = value.trim().parse().map_err(|_| {
        MeetPrepError::InvalidSetting(format!("prep_hours expects a number, got '{value}'"))
    })?;

    if !PREP_HOURS.contains(&hours) {
        return Err(MeetPrepError::InvalidSetting(format!(
            "prep_hours must be one of {:?}",
            PREP_HOURS
        )));
    }
    Ok(hours)
}
