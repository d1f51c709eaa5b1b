use anyhow::{Context, Result};
use dialoguer::Confirm;
use meetprep_core::{AppConfig, MeetingCache, Preferences};
use owo_colors::OwoColorize;

use crate::app::App;

const SECTIONS: [(&str, &str); 3] = [
    ("notifications", "Notification Preferences"),
    ("ai", "AI Preferences"),
    ("privacy", "Privacy Settings"),
];

fn label(key: &str) -> &'static str {
    match key {
        "notifications.brief_ready" => "Brief Ready Notifications",
        "notifications.reminders" => "Meeting Reminders",
        "notifications.email_delivery" => "Email Delivery",
        "notifications.prep_hours" => "Brief Preparation Time (hours)",
        "ai.email_analysis" => "Email Analysis",
        "ai.talking_points" => "Generate Talking Points",
        "ai.action_items" => "Suggest Action Items",
        "ai.detail" => "Brief Detail Level",
        "privacy.local_storage" => "Local Data Storage",
        "privacy.third_party_lookup" => "Third-Party Lookup",
        "privacy.limited_retention" => "Limited Data Retention",
        _ => "",
    }
}

pub fn show() -> Result<()> {
    let path = AppConfig::settings_path()?;
    let prefs = Preferences::load(&path)?;
    let entries = prefs.entries();

    for (i, (section, title)) in SECTIONS.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", title.bold());
        for (key, value) in entries.iter().filter(|(k, _)| k.split('.').next() == Some(*section)) {
            println!("  {:<32} {:<10} {}", label(key), value.cyan(), key.dimmed());
        }
    }

    println!("\n{}", "Paths".bold());
    println!("  Config:    {}", AppConfig::config_path()?.display());
    println!("  Settings:  {}", path.display());

    Ok(())
}

pub fn set(key: &str, value: &str) -> Result<()> {
    let path = AppConfig::settings_path()?;
    let mut prefs = Preferences::load(&path)?;

    prefs.set(key, value)?;
    prefs
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("{} {} = {}", "Saved".green(), key, prefs.get(key)?.cyan());

    // Turning local storage off drops what's already stored
    if key == "privacy.local_storage" && !prefs.privacy.local_storage {
        let config = AppConfig::load()?;
        let removed = MeetingCache::new(&config.cache_dir()?, config.cache_stale_after())
            .clear_all()?;
        if removed > 0 {
            println!("{}", format!("Removed {removed} cached meeting list(s)").dimmed());
        }
    }

    Ok(())
}

/// Unlink every calendar, sign out and remove all local files.
pub async fn delete_data(yes: bool) -> Result<()> {
    if !yes
        && !Confirm::new()
            .with_prompt("Delete all your data? This unlinks every calendar and signs you out")
            .default(false)
            .interact()?
    {
        println!("Cancelled");
        return Ok(());
    }

    let app = App::load()?;
    let prefs = app.preferences()?;

    if app.store.load()?.is_some() {
        let service = app.service().await?;
        service
            .delete_all_connections()
            .await
            .context("Error removing calendar connections")?;
        if let Err(e) = app.backend.sign_out(&service.session().access_token).await {
            tracing::warn!(error = %e, "remote sign-out failed");
        }
    }

    let removed = app.cache(&prefs).clear_all()?;
    app.store.clear()?;

    let settings = AppConfig::settings_path()?;
    if settings.exists() {
        std::fs::remove_file(&settings)
            .with_context(|| format!("Failed to remove {}", settings.display()))?;
    }

    println!(
        "{} Calendar connections removed, {removed} cache file(s) deleted, settings reset and signed out.",
        "Data deleted.".green().bold()
    );
    Ok(())
}
