use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use meetprep_core::export::brief_to_markdown;
use meetprep_core::listing::find_meeting;
use meetprep_core::{CalendarState, MeetPrepError, MeetingSource};
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::{self, Render};
use crate::utils::tui::create_spinner;

pub async fn run(id: &str, export: Option<&Path>) -> Result<()> {
    let app = App::load()?;
    let service = app.service().await?;
    let prefs = app.preferences()?;
    let cache = app.cache(&prefs);

    let mut state = CalendarState::default();

    let spinner = create_spinner("Loading meeting");
    let source = state.refresh(&service, &cache, false, Utc::now()).await;
    if should_refetch(source, find_meeting(&state.meetings, id).is_some()) {
        state.refresh(&service, &cache, true, Utc::now()).await;
    }
    spinner.finish_and_clear();

    let Some(meeting) = find_meeting(&state.meetings, id) else {
        if let Some(error) = state.error {
            anyhow::bail!("Error loading meetings: {error}");
        }
        return Err(MeetPrepError::MeetingNotFound(id.to_string()).into());
    };

    let spinner = create_spinner("Preparing brief");
    let (brief, participants) = tokio::join!(
        service.generate_brief(&meeting.id, meeting.provider, &prefs.ai),
        service.get_meeting_participants(&meeting.id, meeting.provider),
    );
    spinner.finish_and_clear();

    println!("{}\n", render::meeting_header(meeting));

    println!("{}", render::section("Participants"));
    match &participants {
        Ok(list) if list.is_empty() => println!("  {}", "No participants listed".dimmed()),
        Ok(list) => {
            for participant in list {
                println!("  {}", participant.render());
            }
        }
        Err(e) => println!("  {}", format!("Could not load participants: {e}").yellow()),
    }
    println!();

    match &brief {
        Ok(brief) => println!("{}", render::brief(brief)),
        Err(e) => println!(
            "{}\n  {}",
            render::section("Brief"),
            format!("Could not generate brief: {e}").red()
        ),
    }

    if let Some(path) = export {
        let brief = brief.context("Nothing to export")?;
        let participants = participants.unwrap_or_default();
        let markdown = brief_to_markdown(meeting, &participants, &brief);

        std::fs::write(path, markdown)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("\nBrief exported to {}", path.display().bold());
    }

    Ok(())
}

/// Only a cache hit can predate the meeting; a fresh fetch is final.
fn should_refetch(source: MeetingSource, found: bool) -> bool {
    source == MeetingSource::Cache && !found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refetches_only_after_a_cache_miss_on_the_id() {
        assert!(should_refetch(MeetingSource::Cache, false));
        assert!(!should_refetch(MeetingSource::Cache, true));
        assert!(!should_refetch(MeetingSource::Backend, false));
        assert!(!should_refetch(MeetingSource::Stale, false));
    }
}
