//! Markdown rendering of a meeting brief.

use std::fmt::{Display, Write};

use chrono::{Local, TimeZone};

use crate::brief::MeetingBrief;
use crate::meeting::{Meeting, MeetingParticipant};
use crate::timefmt::{format_clock, format_long_date};

/// Brief as Markdown, with times in the local timezone.
pub fn brief_to_markdown(
    meeting: &Meeting,
    participants: &[MeetingParticipant],
    brief: &MeetingBrief,
) -> String {
    brief_to_markdown_in(meeting, participants, brief, &Local)
}

pub fn brief_to_markdown_in<Tz: TimeZone>(
    meeting: &Meeting,
    participants: &[MeetingParticipant],
    brief: &MeetingBrief,
    tz: &Tz,
) -> String
where
    Tz::Offset: Display,
{
    let mut out = String::new();
    let start = meeting.date.with_timezone(tz);

    let _ = writeln!(out, "# {}\n", meeting.title);
    let _ = writeln!(out, "- **Date:** {}", format_long_date(&start));
    match meeting.end_date {
        Some(end) => {
            let end = end.with_timezone(tz);
            let _ = writeln!(out, "- **Time:** {} - {}", format_clock(&start), format_clock(&end));
        }
        None => {
            let _ = writeln!(out, "- **Time:** {}", format_clock(&start));
        }
    }
    if let Some(location) = meeting.location.as_deref().filter(|l| !l.trim().is_empty()) {
        let _ = writeln!(out, "- **Location:** {location}");
    }
    let _ = writeln!(out, "- **Attendees:** {}", meeting.attendee_label());

    if !participants.is_empty() {
        out.push_str("\n## Participants\n\n");
        for p in participants {
            let _ = write!(out, "- {} <{}>", p.display_name(), p.email);
            if let Some(role) = p.role {
                let _ = write!(out, " ({role})");
            }
            out.push('\n');
        }
    }

    let _ = writeln!(out, "\n## Summary\n\n{}", brief.summary.trim());

    if !brief.talking_points.is_empty() {
        out.push_str("\n## Talking Points\n\n");
        for (i, point) in brief.talking_points.iter().enumerate() {
            let _ = writeln!(out, "{}. {point}", i + 1);
        }
    }

    if !brief.action_items.is_empty() {
        out.push_str("\n## Action Items\n\n");
        for item in &brief.action_items {
            let _ = writeln!(out, "- [ ] {item}");
        }
    }

    let emails = brief.emails_newest_first();
    if !emails.is_empty() {
        out.push_str("\n## Recent Communications\n\n");
        for email in emails {
            let _ = writeln!(
                out,
                "### {}\n\n_{}_\n\n{}\n",
                email.subject,
                format_long_date(&email.date.with_timezone(tz)),
                email.excerpt.trim()
            );
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brief::RecentEmail;
    use crate::meeting::ParticipantRole;
    use chrono::{FixedOffset, Utc};

    fn meeting() -> Meeting {
        Meeting {
            id: "m1".into(),
            title: "Product Roadmap Review".into(),
            date: Utc.with_ymd_and_hms(2025, 3, 20, 15, 0, 0).unwrap(),
            end_date: Some(Utc.with_ymd_and_hms(2025, 3, 20, 16, 0, 0).unwrap()),
            location: Some("Zoom".into()),
            description: None,
            attendee_count: 5,
            is_upcoming: true,
            provider: None,
        }
    }

    fn brief() -> MeetingBrief {
        MeetingBrief {
            summary: "Quarterly roadmap check-in.".into(),
            recent_emails: vec![
                RecentEmail {
                    id: "e1".into(),
                    subject: "Draft agenda".into(),
                    date: Utc.with_ymd_and_hms(2025, 3, 17, 9, 0, 0).unwrap(),
                    excerpt: "Attached is the agenda.".into(),
                },
                RecentEmail {
                    id: "e2".into(),
                    subject: "Re: Draft agenda".into(),
                    date: Utc.with_ymd_and_hms(2025, 3, 18, 9, 0, 0).unwrap(),
                    excerpt: "Looks good.".into(),
                },
            ],
            action_items: vec!["Confirm Q2 priorities".into()],
            talking_points: vec!["Hiring plan".into(), "Launch dates".into()],
        }
    }

    #[test]
    fn renders_all_sections() {
        let participants = vec![MeetingParticipant {
            id: "p1".into(),
            name: Some("Jane Smith".into()),
            email: "jane@example.com".into(),
            role: Some(ParticipantRole::Organizer),
            response_status: None,
        }];

        let md = brief_to_markdown_in(&meeting(), &participants, &brief(), &Utc);

        assert!(md.starts_with("# Product Roadmap Review\n"));
        assert!(md.contains("- **Date:** Thursday, March 20th, 2025"));
        assert!(md.contains("- **Time:** 3:00 PM - 4:00 PM"));
        assert!(md.contains("- **Location:** Zoom"));
        assert!(md.contains("- **Attendees:** 5 attendees"));
        assert!(md.contains("- Jane Smith <jane@example.com> (organizer)"));
        assert!(md.contains("1. Hiring plan\n2. Launch dates\n"));
        assert!(md.contains("- [ ] Confirm Q2 priorities"));

        let newer = md.find("### Re: Draft agenda").unwrap();
        let older = md.find("### Draft agenda").unwrap();
        assert!(newer < older);
    }

    #[test]
    fn times_follow_the_given_timezone() {
        let pacific = FixedOffset::west_opt(7 * 3600).unwrap();
        let md = brief_to_markdown_in(&meeting(), &[], &brief(), &pacific);

        assert!(md.contains("- **Time:** 8:00 AM - 9:00 AM"));
        assert!(md.contains("_Tuesday, March 18th, 2025_"));
    }

    #[test]
    fn default_export_uses_local_time() {
        let meeting = meeting();
        let md = brief_to_markdown(&meeting, &[], &brief());

        let start = format_clock(&meeting.date.with_timezone(&Local));
        let end = format_clock(&meeting.end_date.unwrap().with_timezone(&Local));
        assert!(md.contains(&format!("- **Time:** {start} - {end}")));
        assert!(md.contains(&format!(
            "- **Date:** {}",
            format_long_date(&meeting.date.with_timezone(&Local))
        )));
    }

    #[test]
    fn empty_sections_are_omitted() {
        let brief = MeetingBrief {
            summary: "Short sync.".into(),
            recent_emails: vec![],
            action_items: vec![],
            talking_points: vec![],
        };
        let mut meeting = meeting();
        meeting.location = None;

        let md = brief_to_markdown(&meeting, &[], &brief);
        assert!(md.contains("## Summary\n\nShort sync."));
        assert!(!md.contains("Location"));
        assert!(!md.contains("## Participants"));
        assert!(!md.contains("## Talking Points"));
        assert!(!md.contains("## Action Items"));
        assert!(!md.contains("## Recent Communications"));
    }
}
