//! Application configuration.
//!
//! Loaded from `~/.config/meetprep/config.toml` with `MEETPREP_*` environment
//! variables layered on top (e.g. `MEETPREP_BACKEND_URL`).

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{MeetPrepError, MeetPrepResult};

const DEFAULT_REDIRECT_PORT: u16 = 8085;
const DEFAULT_CACHE_STALE_SECS: u64 = 5 * 60;

fn default_redirect_port() -> u16 {
    DEFAULT_REDIRECT_PORT
}

fn default_cache_stale_secs() -> u64 {
    DEFAULT_CACHE_STALE_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the hosted backend project
    #[serde(default)]
    pub backend_url: Option<String>,

    /// Public (anon) API key of the backend project
    #[serde(default)]
    pub anon_key: Option<String>,

    /// Loopback port the OAuth callback listener binds to
    #[serde(default = "default_redirect_port")]
    pub redirect_port: u16,

    /// How long fetched meetings are served from the local cache
    #[serde(default = "default_cache_stale_secs")]
    pub cache_stale_secs: u64,

    /// Ask the `get-oauth-url` function for the linking URL instead of
    /// building it against the auth endpoint
    #[serde(default)]
    pub link_via_function: bool,

    /// Where session, cache and exports live (defaults to the platform data dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            backend_url: None,
            anon_key: None,
            redirect_port: DEFAULT_REDIRECT_PORT,
            cache_stale_secs: DEFAULT_CACHE_STALE_SECS,
            link_via_function: false,
            data_dir: None,
        }
    }
}

impl AppConfig {
    /// `~/.config/meetprep`, or `$MEETPREP_CONFIG_DIR` when set.
    pub fn config_dir() -> MeetPrepResult<PathBuf> {
        if let Some(dir) = std::env::var_os("MEETPREP_CONFIG_DIR") {
            return Ok(PathBuf::from(dir));
        }

        Ok(dirs::config_dir()
            .ok_or_else(|| MeetPrepError::Config("Could not determine config directory".into()))?
            .join("meetprep"))
    }

    pub fn config_path() -> MeetPrepResult<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn settings_path() -> MeetPrepResult<PathBuf> {
        Ok(Self::config_dir()?.join("settings.toml"))
    }

    /// Load the config, writing a commented template on first run.
    pub fn load() -> MeetPrepResult<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            Self::create_default_config(&path)?;
        }

        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> MeetPrepResult<Self> {
        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix("MEETPREP").try_parsing(true))
            .build()
            .map_err(|e| MeetPrepError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| MeetPrepError::Config(e.to_string()))
    }

    pub fn create_default_config(path: &Path) -> MeetPrepResult<()> {
        let contents = format!(
            "\
# meetprep configuration

# Your backend project (required):
# backend_url = \"https://your-project.supabase.co\"
# anon_key = \"your-anon-key\"

# Port for the OAuth callback when connecting a calendar:
# redirect_port = {DEFAULT_REDIRECT_PORT}

# Seconds before cached meetings are fetched again:
# cache_stale_secs = {DEFAULT_CACHE_STALE_SECS}

# Ask the backend's get-oauth-url function for the linking URL instead of
# signing in with the provider directly:
# link_via_function = false

# Where session and cache files are kept:
# data_dir = \"~/.local/share/meetprep\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MeetPrepError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| MeetPrepError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Backend URL and key, or a config error explaining how to set them.
    pub fn backend_credentials(&self) -> MeetPrepResult<(&str, &str)> {
        match (self.backend_url.as_deref(), self.anon_key.as_deref()) {
            (Some(url), Some(key)) if !url.trim().is_empty() && !key.trim().is_empty() => {
                Ok((url, key))
            }
            _ => Err(MeetPrepError::Config(
                "backend_url and anon_key must be set.\n\n\
                Add them to ~/.config/meetprep/config.toml:\n\n\
                backend_url = \"https://your-project.supabase.co\"\n\
                anon_key = \"your-anon-key\"\n\n\
                or export MEETPREP_BACKEND_URL and MEETPREP_ANON_KEY."
                    .into(),
            )),
        }
    }

    pub fn data_dir(&self) -> MeetPrepResult<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(PathBuf::from(
                shellexpand::tilde(&dir.to_string_lossy()).into_owned(),
            )),
            None => Ok(dirs::data_dir()
                .ok_or_else(|| MeetPrepError::Config("Could not determine data directory".into()))?
                .join("meetprep")),
        }
    }

    pub fn cache_dir(&self) -> MeetPrepResult<PathBuf> {
        Ok(self.data_dir()?.join("cache"))
    }

    /// Where the OAuth provider sends the browser back to.
    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}/auth/callback", self.redirect_port)
    }

    pub fn cache_stale_after(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cache_stale_secs as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.redirect_port, 8085);
        assert_eq!(config.cache_stale_after(), chrono::Duration::minutes(5));
        assert!(!config.link_via_function);
    }

    #[test]
    fn reads_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "backend_url = \"https://demo.example.co\"\n\
             anon_key = \"anon\"\n\
             redirect_port = 9000\n\
             data_dir = \"/tmp/meetprep-data\"\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.backend_credentials().unwrap(), ("https://demo.example.co", "anon"));
        assert_eq!(config.redirect_uri(), "http://127.0.0.1:9000/auth/callback");
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/meetprep-data"));
    }

    #[test]
    fn template_parses_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        AppConfig::create_default_config(&path).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.redirect_port, 8085);
    }

    #[test]
    fn missing_credentials_explain_setup() {
        let config = AppConfig {
            backend_url: Some("https://demo.example.co".into()),
            ..AppConfig::default()
        };
        let err = config.backend_credentials().unwrap_err();
        assert!(err.to_string().contains("MEETPREP_ANON_KEY"));
    }

    #[test]
    fn tilde_data_dir_is_expanded() {
        let config = AppConfig {
            data_dir: Some(PathBuf::from("~/meetprep-data")),
            ..AppConfig::default()
        };
        let expanded = config.data_dir().unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.ends_with("meetprep-data"));
    }
}
