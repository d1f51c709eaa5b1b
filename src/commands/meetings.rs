use anyhow::Result;
use chrono::{DateTime, Utc};
use meetprep_core::listing::{filter_by_search, partition};
use meetprep_core::{CalendarState, Meeting, MeetingSource};
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::meeting_card;
use crate::utils::tui::create_spinner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EmptyState {
    title: &'static str,
    description: &'static str,
}

const NOT_CONNECTED: EmptyState = EmptyState {
    title: "Connect your calendar to get started",
    description: "meetprep needs access to your calendar to provide meeting insights and briefings.",
};

const NO_UPCOMING: EmptyState = EmptyState {
    title: "No upcoming meetings",
    description: "You don't have any upcoming meetings. When you do, they'll appear here.",
};

const NO_PAST: EmptyState = EmptyState {
    title: "No past meetings",
    description: "Your past meetings will appear here.",
};

#[derive(Debug, PartialEq)]
enum TabBody<'a> {
    Empty(EmptyState),
    Cards(Vec<&'a Meeting>),
}

/// What the dashboard shows for a given state and set of flags.
#[derive(Debug, PartialEq)]
enum DashboardView<'a> {
    NotConnected(EmptyState),
    Tabs {
        upcoming: usize,
        past: usize,
        body: TabBody<'a>,
    },
}

fn dashboard_view<'a>(
    state: &'a CalendarState,
    past: bool,
    search: Option<&str>,
    now: DateTime<Utc>,
) -> DashboardView<'a> {
    if !state.is_calendar_connected() {
        return DashboardView::NotConnected(NOT_CONNECTED);
    }

    let filtered = filter_by_search(&state.meetings, search.unwrap_or_default());
    let (upcoming, past_meetings) = partition(filtered, now);
    let (upcoming_count, past_count) = (upcoming.len(), past_meetings.len());

    let (shown, empty) = if past {
        (past_meetings, NO_PAST)
    } else {
        (upcoming, NO_UPCOMING)
    };

    DashboardView::Tabs {
        upcoming: upcoming_count,
        past: past_count,
        body: if shown.is_empty() {
            TabBody::Empty(empty)
        } else {
            TabBody::Cards(shown)
        },
    }
}

pub async fn run(past: bool, search: Option<&str>, refresh: bool) -> Result<()> {
    let app = App::load()?;
    let service = app.service().await?;
    let prefs = app.preferences()?;
    let cache = app.cache(&prefs);

    let mut state = CalendarState::default();

    let spinner = create_spinner("Loading meetings");
    state.load_providers(&service).await;
    let source = if state.is_calendar_connected() {
        Some(state.refresh(&service, &cache, refresh, Utc::now()).await)
    } else {
        None
    };
    spinner.finish_and_clear();

    if let Some(error) = &state.error {
        if !state.is_calendar_connected() {
            anyhow::bail!("Error loading calendar connections: {error}");
        }
        if state.meetings.is_empty() {
            anyhow::bail!("Error loading meetings: {error}");
        }
        println!("{}\n", format!("Could not refresh meetings: {error}").yellow());
    }

    let now = Utc::now();
    match dashboard_view(&state, past, search, now) {
        DashboardView::NotConnected(empty) => {
            print_empty_state(empty);
            println!("\n  Run {}", "meetprep connect".bold());
            return Ok(());
        }
        DashboardView::Tabs {
            upcoming,
            past: past_count,
            body,
        } => {
            let upcoming_tab = format!("Upcoming ({upcoming})");
            let past_tab = format!("Past Meetings ({past_count})");
            if past {
                println!("{}   {}", upcoming_tab.dimmed(), past_tab.bold().underline());
            } else {
                println!("{}   {}", upcoming_tab.bold().underline(), past_tab.dimmed());
            }
            if let Some(query) = search.filter(|q| !q.trim().is_empty()) {
                println!("{}", format!("Matching \"{}\"", query.trim()).dimmed());
            }
            println!();

            match body {
                TabBody::Empty(empty) => print_empty_state(empty),
                TabBody::Cards(meetings) => {
                    for (i, meeting) in meetings.iter().enumerate() {
                        if i > 0 {
                            println!();
                        }
                        println!("{}", meeting_card(meeting, now));
                    }
                }
            }
        }
    }

    if source == Some(MeetingSource::Cache) {
        println!("\n{}", "(cached, use --refresh to fetch again)".dimmed());
    }

    Ok(())
}

fn print_empty_state(empty: EmptyState) {
    println!("{}", empty.title.bold());
    println!("{}", empty.description.dimmed());
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use meetprep_core::Provider;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap()
    }

    fn meeting(id: &str, title: &str, days: i64) -> Meeting {
        Meeting {
            id: id.into(),
            title: title.into(),
            date: now() + Duration::days(days),
            end_date: None,
            location: None,
            description: None,
            attendee_count: 2,
            is_upcoming: false,
            provider: Some(Provider::Google),
        }
    }

    fn connected(meetings: Vec<Meeting>) -> CalendarState {
        CalendarState {
            meetings,
            connected_providers: vec![Provider::Google],
            ..CalendarState::default()
        }
    }

    fn card_ids<'a>(view: &DashboardView<'a>) -> Vec<&'a str> {
        match view {
            DashboardView::Tabs {
                body: TabBody::Cards(meetings),
                ..
            } => meetings.iter().map(|&m| m.id.as_str()).collect(),
            other => panic!("expected cards, got {other:?}"),
        }
    }

    #[test]
    fn no_connection_shows_connect_prompt() {
        let state = CalendarState {
            meetings: vec![meeting("1", "Weekly Team Sync", 1)],
            ..CalendarState::default()
        };

        assert_eq!(
            dashboard_view(&state, false, None, now()),
            DashboardView::NotConnected(NOT_CONNECTED)
        );
        assert_eq!(
            dashboard_view(&state, true, Some("sync"), now()),
            DashboardView::NotConnected(NOT_CONNECTED)
        );
    }

    #[test]
    fn empty_tabs_show_their_own_message() {
        let state = connected(vec![meeting("old", "Retro", -2)]);

        assert_eq!(
            dashboard_view(&state, false, None, now()),
            DashboardView::Tabs {
                upcoming: 0,
                past: 1,
                body: TabBody::Empty(NO_UPCOMING),
            }
        );

        let state = connected(vec![meeting("soon", "Planning", 1)]);
        assert_eq!(
            dashboard_view(&state, true, None, now()),
            DashboardView::Tabs {
                upcoming: 1,
                past: 0,
                body: TabBody::Empty(NO_PAST),
            }
        );
    }

    #[test]
    fn connected_with_no_meetings_is_not_the_connect_prompt() {
        let state = connected(vec![]);
        assert_eq!(
            dashboard_view(&state, false, None, now()),
            DashboardView::Tabs {
                upcoming: 0,
                past: 0,
                body: TabBody::Empty(NO_UPCOMING),
            }
        );
    }

    #[test]
    fn search_narrows_cards_and_counts() {
        let state = connected(vec![
            meeting("1", "Weekly Team Sync", 3),
            meeting("2", "Product Demo with Client", 1),
            meeting("3", "Interview: Senior Developer", -1),
            meeting("4", "Team Retro", -3),
        ]);

        let all = dashboard_view(&state, false, None, now());
        assert_eq!(card_ids(&all), ["2", "1"]);

        let view = dashboard_view(&state, false, Some("TEAM"), now());
        assert_eq!(card_ids(&view), ["1"]);
        assert!(matches!(view, DashboardView::Tabs { upcoming: 1, past: 1, .. }));

        let past = dashboard_view(&state, true, Some("team"), now());
        assert_eq!(card_ids(&past), ["4"]);

        let none = dashboard_view(&state, false, Some("standup"), now());
        assert_eq!(
            none,
            DashboardView::Tabs {
                upcoming: 0,
                past: 0,
                body: TabBody::Empty(NO_UPCOMING),
            }
        );
    }
}
