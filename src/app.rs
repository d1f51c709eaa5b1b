//! Everything a command needs: config, backend client and local stores.

use std::path::PathBuf;

use anyhow::{Context, Result};
use meetprep_core::{AppConfig, Backend, CalendarService, MeetingCache, Preferences, SessionStore};

pub struct App {
    pub config: AppConfig,
    pub backend: Backend,
    pub store: SessionStore,
    pub cache_dir: PathBuf,
}

impl App {
    pub fn load() -> Result<Self> {
        let config = AppConfig::load().context("Failed to load config")?;
        let backend = Backend::from_config(&config)?;
        let store = SessionStore::new(&config.data_dir()?);
        let cache_dir = config.cache_dir()?;

        Ok(App {
            config,
            backend,
            store,
            cache_dir,
        })
    }

    /// Service for the signed-in user, refreshing the session if needed.
    pub async fn service(&self) -> Result<CalendarService> {
        let session = self.store.load_valid(&self.backend).await?;
        Ok(CalendarService::new(self.backend.clone(), session))
    }

    pub fn preferences(&self) -> Result<Preferences> {
        let path = AppConfig::settings_path()?;
        Preferences::load(&path).with_context(|| format!("Failed to read {}", path.display()))
    }

    pub fn cache(&self, prefs: &Preferences) -> MeetingCache {
        MeetingCache::new(&self.cache_dir, self.config.cache_stale_after())
            .with_privacy(&prefs.privacy)
    }
}
