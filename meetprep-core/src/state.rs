//! In-memory calendar state shared by the dashboard and detail views.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::cache::MeetingCache;
use crate::listing::partition;
use crate::meeting::{Meeting, Provider};
use crate::service::CalendarService;

/// Where the meetings from the last refresh came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingSource {
    Cache,
    Backend,
    /// The fetch failed and the previous list was kept.
    Stale,
}

#[derive(Debug, Default)]
pub struct CalendarState {
    pub meetings: Vec<Meeting>,
    pub connected_providers: Vec<Provider>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl CalendarState {
    pub fn is_calendar_connected(&self) -> bool {
        !self.connected_providers.is_empty()
    }

    pub fn upcoming_meetings(&self, now: DateTime<Utc>) -> Vec<&Meeting> {
        partition(&self.meetings, now).0
    }

    pub fn mark_connected(&mut self, provider: Provider) {
        if !self.connected_providers.contains(&provider) {
            self.connected_providers.push(provider);
        }
    }

    /// Reload the list of linked calendars.
    pub async fn load_providers(&mut self, service: &CalendarService) {
        match service.connected_providers().await {
            Ok(providers) => {
                self.connected_providers.clear();
                for provider in providers {
                    self.mark_connected(provider);
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to load calendar connections");
                self.error = Some(e.to_string());
            }
        }
    }

    /// Load meetings, preferring a fresh cache entry unless `force` is set.
    pub async fn refresh(
        &mut self,
        service: &CalendarService,
        cache: &MeetingCache,
        force: bool,
        now: DateTime<Utc>,
    ) -> MeetingSource {
        let user_id = service.user_id();

        if !force && let Some(meetings) = cache.get_fresh(user_id, now) {
            debug!(count = meetings.len(), "serving meetings from cache");
            self.meetings = meetings;
            self.error = None;
            return MeetingSource::Cache;
        }

        self.is_loading = true;
        let result = service.fetch_meetings().await;
        self.is_loading = false;

        match result {
            Ok(meetings) => {
                self.store(meetings, cache, user_id, now);
                MeetingSource::Backend
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch meetings");
                self.error = Some(e.to_string());
                MeetingSource::Stale
            }
        }
    }

    /// Replace the meeting list and write it through to the cache.
    pub fn store(&mut self, meetings: Vec<Meeting>, cache: &MeetingCache, user_id: &str, now: DateTime<Utc>) {
        if let Err(e) = cache.put(user_id, &meetings, now) {
            warn!(error = %e, "failed to write meeting cache");
        }
        self.meetings = meetings;
        self.error = None;
    }
}
