//! Filtering, splitting and merging meeting lists for display.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::meeting::Meeting;

/// Case-insensitive title match. A blank query keeps everything.
pub fn filter_by_search<'a>(meetings: &'a [Meeting], query: &str) -> Vec<&'a Meeting> {
    let needle = query.trim().to_lowercase();
    meetings
        .iter()
        .filter(|m| needle.is_empty() || m.title.to_lowercase().contains(&needle))
        .collect()
}

/// Split into (upcoming, past).
///
/// Upcoming meetings are ordered soonest first, past meetings most recent first.
pub fn partition<'a>(
    meetings: impl IntoIterator<Item = &'a Meeting>,
    now: DateTime<Utc>,
) -> (Vec<&'a Meeting>, Vec<&'a Meeting>) {
    let (mut upcoming, mut past): (Vec<_>, Vec<_>) =
        meetings.into_iter().partition(|m| m.is_upcoming_at(now));

    upcoming.sort_by(|a, b| a.date.cmp(&b.date));
    past.sort_by(|a, b| b.date.cmp(&a.date));

    (upcoming, past)
}

/// Concatenate per-provider results into one list ordered by start date.
///
/// A meeting reported twice under the same provider and id is kept once
/// (first occurrence wins).
pub fn merge_provider_results(batches: Vec<Vec<Meeting>>) -> Vec<Meeting> {
    let mut seen = HashSet::new();
    let mut merged: Vec<Meeting> = batches
        .into_iter()
        .flatten()
        .filter(|m| seen.insert((m.provider, m.id.clone())))
        .collect();

    merged.sort_by(|a, b| a.date.cmp(&b.date));
    merged
}

pub fn find_meeting<'a>(meetings: &'a [Meeting], id: &str) -> Option<&'a Meeting> {
    meetings.iter().find(|m| m.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meeting::Provider;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap()
    }

    fn meeting(id: &str, title: &str, offset_days: i64, provider: Provider) -> Meeting {
        Meeting {
            id: id.into(),
            title: title.into(),
            date: now() + Duration::days(offset_days),
            end_date: None,
            location: None,
            description: None,
            attendee_count: 2,
            is_upcoming: false,
            provider: Some(provider),
        }
    }

    fn sample() -> Vec<Meeting> {
        vec![
            meeting("1", "Weekly Team Sync", 2, Provider::Google),
            meeting("2", "Product Demo with Client", 4, Provider::Google),
            meeting("3", "Quarterly Planning", 7, Provider::Outlook),
            meeting("4", "Interview: Senior Developer", -3, Provider::Outlook),
            meeting("5", "Marketing Strategy Review", -7, Provider::Google),
        ]
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let meetings = sample();
        let hits = filter_by_search(&meetings, "  SYNC ");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "1");

        assert_eq!(filter_by_search(&meetings, "").len(), 5);
        assert!(filter_by_search(&meetings, "retro").is_empty());
    }

    #[test]
    fn partition_orders_each_side() {
        let meetings = sample();
        let (upcoming, past) = partition(&meetings, now());

        let upcoming_ids: Vec<_> = upcoming.iter().map(|m| m.id.as_str()).collect();
        let past_ids: Vec<_> = past.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(upcoming_ids, ["1", "2", "3"]);
        assert_eq!(past_ids, ["4", "5"]);
    }

    #[test]
    fn partition_respects_upcoming_flag() {
        let mut meetings = sample();
        meetings[3].is_upcoming = true;

        let (upcoming, past) = partition(&meetings, now());
        assert_eq!(upcoming.len(), 4);
        assert_eq!(upcoming[0].id, "4");
        assert_eq!(past.len(), 1);
    }

    #[test]
    fn search_then_partition() {
        let meetings = sample();
        let filtered = filter_by_search(&meetings, "view");
        let (upcoming, past) = partition(filtered, now());
        // Only "Interview: ..." and "... Review" match, both in the past.
        assert!(upcoming.is_empty());
        assert_eq!(past.len(), 2);
    }

    #[test]
    fn merge_concatenates_sorts_and_dedupes() {
        let google = vec![
            meeting("a", "Later", 5, Provider::Google),
            meeting("b", "Sooner", 1, Provider::Google),
        ];
        let outlook = vec![
            meeting("a", "Same id other provider", 3, Provider::Outlook),
            meeting("a", "Duplicate", 9, Provider::Outlook),
        ];

        let merged = merge_provider_results(vec![google, outlook]);
        let titles: Vec<_> = merged.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, ["Sooner", "Same id other provider", "Later"]);
    }

    #[test]
    fn find_by_id() {
        let meetings = sample();
        assert_eq!(find_meeting(&meetings, "3").unwrap().title, "Quarterly Planning");
        assert!(find_meeting(&meetings, "99").is_none());
    }
}
