//! Local query cache for fetched meetings.
//!
//! One JSON file per user. Entries are served while younger than the stale
//! time and refetched afterwards; nothing is refetched in the background.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MeetPrepResult;
use crate::meeting::Meeting;
use crate::preferences::PrivacyPreferences;

/// Meetings older than this are dropped when limited retention is on.
pub const RETENTION_DAYS: i64 = 30;

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    fetched_at: DateTime<Utc>,
    meetings: Vec<Meeting>,
}

#[derive(Debug, Clone)]
pub struct MeetingCache {
    dir: PathBuf,
    stale_after: Duration,
    enabled: bool,
    limited_retention: bool,
}

impl MeetingCache {
    pub fn new(dir: &Path, stale_after: Duration) -> Self {
        MeetingCache {
            dir: dir.to_path_buf(),
            stale_after,
            enabled: true,
            limited_retention: false,
        }
    }

    pub fn with_privacy(mut self, privacy: &PrivacyPreferences) -> Self {
        self.enabled = privacy.local_storage;
        self.limited_retention = privacy.limited_retention;
        self
    }

    fn path_for(&self, user_id: &str) -> PathBuf {
        let slug = user_id.replace(['/', '\\', ':', '.'], "_");
        self.dir.join(format!("meetings-{slug}.json"))
    }

    /// Cached meetings for `user_id`, if present and not stale.
    ///
    /// A corrupt or unreadable entry counts as a miss.
    pub fn get_fresh(&self, user_id: &str, now: DateTime<Utc>) -> Option<Vec<Meeting>> {
        if !self.enabled {
            return None;
        }

        let path = self.path_for(user_id);
        let contents = std::fs::read_to_string(&path).ok()?;
        let entry: CacheEntry = match serde_json::from_str(&contents) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "ignoring unreadable cache entry");
                return None;
            }
        };

        if now - entry.fetched_at >= self.stale_after {
            debug!(user = user_id, "cached meetings are stale");
            return None;
        }

        Some(entry.meetings)
    }

    pub fn put(&self, user_id: &str, meetings: &[Meeting], now: DateTime<Utc>) -> MeetPrepResult<()> {
        if !self.enabled {
            return Ok(());
        }

        let cutoff = now - Duration::days(RETENTION_DAYS);
        let meetings: Vec<Meeting> = meetings
            .iter()
            .filter(|m| !self.limited_retention || m.date >= cutoff)
            .cloned()
            .collect();

        let entry = CacheEntry {
            fetched_at: now,
            meetings,
        };

        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path_for(user_id), serde_json::to_string(&entry)?)?;
        Ok(())
    }

    pub fn invalidate(&self, user_id: &str) -> MeetPrepResult<()> {
        let path = self.path_for(user_id);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Remove every cached entry, for every user.
    pub fn clear_all(&self) -> MeetPrepResult<usize> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Ok(0);
        };

        let mut removed = 0;
        for entry in entries.filter_map(|e| e.ok()) {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with("meetings-") && name.ends_with(".json") {
                std::fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap()
    }

    fn meeting(id: &str, offset_days: i64) -> Meeting {
        Meeting {
            id: id.into(),
            title: format!("Meeting {id}"),
            date: now() + Duration::days(offset_days),
            end_date: None,
            location: Some("Zoom Call".into()),
            description: None,
            attendee_count: 3,
            is_upcoming: offset_days > 0,
            provider: None,
        }
    }

    #[test]
    fn fresh_entry_is_served_until_stale() {
        let dir = tempfile::tempdir().unwrap();
        let cache = MeetingCache::new(dir.path(), Duration::minutes(5));

        cache.put("user-1", &[meeting("1", 2)], now()).unwrap();

        let hit = cache.get_fresh("user-1", now() + Duration::minutes(4)).unwrap();
        assert_eq!(hit, vec![meeting("1", 2)]);
        assert!(cache.get_fresh("user-1", now() + Duration::minutes(5)).is_none());
        assert!(cache.get_fresh("user-2", now()).is_none());
    }

    #[test]
    fn disabled_cache_never_reads_or_writes() {
        let dir = tempfile::tempdir().unwrap();
        let privacy = PrivacyPreferences {
            local_storage: false,
            ..PrivacyPreferences::default()
        };
        let cache = MeetingCache::new(dir.path(), Duration::minutes(5)).with_privacy(&privacy);

        cache.put("user-1", &[meeting("1", 2)], now()).unwrap();
        assert!(cache.get_fresh("user-1", now()).is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn limited_retention_drops_old_meetings() {
        let dir = tempfile::tempdir().unwrap();
        let privacy = PrivacyPreferences {
            limited_retention: true,
            ..PrivacyPreferences::default()
        };
        let cache = MeetingCache::new(dir.path(), Duration::minutes(5)).with_privacy(&privacy);

        cache
            .put("user-1", &[meeting("old", -45), meeting("recent", -3), meeting("next", 1)], now())
            .unwrap();

        let ids: Vec<_> = cache
            .get_fresh("user-1", now())
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, ["recent", "next"]);
    }

    #[test]
    fn corrupt_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = MeetingCache::new(dir.path(), Duration::minutes(5));
        std::fs::write(dir.path().join("meetings-user-1.json"), "{not json").unwrap();
        assert!(cache.get_fresh("user-1", now()).is_none());
    }

    #[test]
    fn invalidate_and_clear_all() {
        let dir = tempfile::tempdir().unwrap();
        let cache = MeetingCache::new(dir.path(), Duration::minutes(5));
        cache.put("user-1", &[meeting("1", 1)], now()).unwrap();
        cache.put("user-2", &[meeting("2", 1)], now()).unwrap();
        std::fs::write(dir.path().join("unrelated.txt"), "keep").unwrap();

        cache.invalidate("user-1").unwrap();
        assert!(cache.get_fresh("user-1", now()).is_none());

        assert_eq!(cache.clear_all().unwrap(), 1);
        assert!(dir.path().join("unrelated.txt").exists());
    }
}
