//! Error types for meetprep.

use thiserror::Error;

/// Errors that can occur in meetprep operations.
#[derive(Error, Debug)]
pub enum MeetPrepError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not signed in. Run `meetprep signin` first")]
    NotSignedIn,

    #[error("Session expired or rejected by the backend: {0}")]
    Unauthorized(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown calendar provider '{0}' (expected google or outlook)")]
    UnknownProvider(String),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error(
        "Meeting not found: {0}\n\n\
        It doesn't exist or has been deleted. Run `meetprep meetings` to see your meetings."
    )]
    MeetingNotFound(String),
}

impl From<serde_json::Error> for MeetPrepError {
    fn from(err: serde_json::Error) -> Self {
        MeetPrepError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for MeetPrepError {
    fn from(err: toml::ser::Error) -> Self {
        MeetPrepError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for MeetPrepError {
    fn from(err: toml::de::Error) -> Self {
        MeetPrepError::Serialization(err.to_string())
    }
}

/// Result type alias for meetprep operations.
pub type MeetPrepResult<T> = Result<T, MeetPrepError>;
