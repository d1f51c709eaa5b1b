use anyhow::{Context, Result};
use chrono::Utc;
use meetprep_core::CalendarState;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::Render;
use crate::utils::tui::create_spinner;

pub async fn run() -> Result<()> {
    let app = App::load()?;
    let service = app.service().await?;
    let prefs = app.preferences()?;
    let cache = app.cache(&prefs);

    let providers = service
        .connected_providers()
        .await
        .context("Error loading calendar connections")?;

    if providers.is_empty() {
        println!("{}", "No calendars connected".dimmed());
        println!("\n  Run {}", "meetprep connect".bold());
        return Ok(());
    }

    let spinner = create_spinner("Checking for new calendar events");
    let sync = service.sync_provider_meetings(&providers).await;
    spinner.finish_and_clear();

    for provider in &sync.synced {
        let count = sync
            .meetings
            .iter()
            .filter(|m| m.provider == Some(*provider))
            .count();
        println!("{} {} {}", "✓".green(), provider.render(), format!("({count} meetings)").dimmed());
    }
    for (provider, error) in &sync.failures {
        println!("{} {} {}", "✗".red(), provider.render(), error.to_string().red());
    }

    if sync.synced.is_empty() {
        anyhow::bail!("No calendar could be synced");
    }

    let mut state = CalendarState::default();
    if sync.failures.is_empty() {
        state.store(sync.meetings, &cache, service.user_id(), Utc::now());
    } else {
        // A partial list must not be served as fresh
        cache.invalidate(service.user_id())?;
        state.meetings = sync.meetings;
    }

    println!(
        "\n{} upcoming meeting(s)",
        state.upcoming_meetings(Utc::now()).len()
    );
    Ok(())
}
