//! Colored terminal rendering for meetprep types.

use chrono::{DateTime, Local, Utc};
use meetprep_core::timefmt::{format_card_datetime, format_clock, format_long_date, relative_to};
use meetprep_core::{BriefStatus, Meeting, MeetingBrief, MeetingParticipant, Provider, ResponseStatus};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for Provider {
    fn render(&self) -> String {
        match self {
            Provider::Google => self.display_name().blue().to_string(),
            Provider::Outlook => self.display_name().cyan().to_string(),
        }
    }
}

impl Render for MeetingParticipant {
    fn render(&self) -> String {
        let mut line = format!(
            "{} {}",
            format!("[{}]", self.initials()).dimmed(),
            self.display_name().bold()
        );

        if self.name.is_some() {
            line.push_str(&format!(" {}", self.email.dimmed()));
        }
        if let Some(role) = self.role {
            line.push_str(&format!(" · {role}"));
        }
        if let Some(status) = self.response_status {
            let status = match status {
                ResponseStatus::Accepted => status.to_string().green().to_string(),
                ResponseStatus::Declined => status.to_string().red().to_string(),
                ResponseStatus::Tentative | ResponseStatus::NeedsAction => {
                    status.to_string().yellow().to_string()
                }
            };
            line.push_str(&format!(" ({status})"));
        }

        line
    }
}

/// A meeting as a dashboard card.
pub fn meeting_card(meeting: &Meeting, now: DateTime<Utc>) -> String {
    let local = meeting.date.with_timezone(&Local);

    let status = match meeting.brief_status(now) {
        BriefStatus::Pending => BriefStatus::Pending.to_string().yellow().to_string(),
        BriefStatus::Available => BriefStatus::Available.to_string().green().to_string(),
    };

    let mut lines = vec![
        format!(
            "{}  {}",
            meeting.title.bold(),
            relative_to(meeting.date, now).dimmed()
        ),
        format!("   {}", format_card_datetime(&local)),
    ];

    if let Some(location) = meeting.location.as_deref().filter(|l| !l.trim().is_empty()) {
        lines.push(format!("   {location}"));
    }

    let mut footer = format!("   {} · {}", meeting.attendee_label(), status);
    if let Some(provider) = meeting.provider {
        footer.push_str(&format!(" · {}", provider.render()));
    }
    lines.push(footer);
    lines.push(format!("   {}", format!("meetprep meeting {}", meeting.id).dimmed()));

    lines.join("\n")
}

/// Title block of the meeting detail view.
pub fn meeting_header(meeting: &Meeting) -> String {
    let start = meeting.date.with_timezone(&Local);

    let time = match meeting.end_date {
        Some(end) => format!("{} - {}", format_clock(&start), format_clock(&end.with_timezone(&Local))),
        None => format_clock(&start),
    };

    let mut lines = vec![
        meeting.title.bold().to_string(),
        format!("  {}", format_long_date(&start)),
        format!("  {time}"),
    ];
    if let Some(location) = meeting.location.as_deref().filter(|l| !l.trim().is_empty()) {
        lines.push(format!("  {location}"));
    }
    lines.push(format!("  {}", meeting.attendee_label()));

    if let Some(description) = meeting.description.as_deref().filter(|d| !d.trim().is_empty()) {
        lines.push(String::new());
        lines.push(format!("  {}", description.trim().dimmed()));
    }

    lines.join("\n")
}

pub fn brief(brief: &MeetingBrief) -> String {
    let mut lines = vec![section("Summary"), format!("  {}", brief.summary.trim())];

    if !brief.talking_points.is_empty() {
        lines.push(String::new());
        lines.push(section("Talking Points"));
        for (i, point) in brief.talking_points.iter().enumerate() {
            lines.push(format!("  {}. {point}", i + 1));
        }
    }

    if !brief.action_items.is_empty() {
        lines.push(String::new());
        lines.push(section("Action Items"));
        for item in &brief.action_items {
            lines.push(format!("  {} {item}", "☐".dimmed()));
        }
    }

    let emails = brief.emails_newest_first();
    if !emails.is_empty() {
        lines.push(String::new());
        lines.push(section("Recent Communications"));
        for email in emails {
            let date = email.date.with_timezone(&Local).format("%b %-d, %Y");
            lines.push(format!("  {}  {}", email.subject.bold(), date.to_string().dimmed()));
            lines.push(format!("    {}", email.excerpt.trim()));
        }
    }

    lines.join("\n")
}

pub fn section(title: &str) -> String {
    title.bold().underline().to_string()
}
