//! Core library for meetprep.
//!
//! Typed access to the hosted backend (auth, tables, functions) plus the
//! client-side pieces built on it:
//! - `Meeting`, `MeetingParticipant` and `MeetingBrief` data types
//! - `CalendarService` for linking calendars and fetching meetings and briefs
//! - `SessionStore`, `MeetingCache` and `Preferences` for local persistence

pub mod backend;
pub mod brief;
pub mod cache;
pub mod config;
pub mod datetime;
pub mod error;
pub mod export;
pub mod listing;
pub mod meeting;
pub mod preferences;
pub mod service;
pub mod session;
pub mod state;
pub mod timefmt;

pub use backend::{Backend, Pkce, SignUpOutcome};
pub use brief::{MeetingBrief, RecentEmail};
pub use cache::MeetingCache;
pub use config::AppConfig;
pub use error::{MeetPrepError, MeetPrepResult};
pub use meeting::{
    BriefStatus, CalendarConnection, Meeting, MeetingParticipant, ParticipantRole, Provider,
    ResponseStatus,
};
pub use preferences::{AiPreferences, DetailLevel, Preferences};
pub use service::{CalendarService, PendingConnection, ProviderSync};
pub use session::{Session, SessionStore, User};
pub use state::{CalendarState, MeetingSource};
