use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use arc_swap::ArcSwap;

use crate::settings::Settings;

/// Holder of the current settings snapshot.
///
/// Readers take an `Arc<Settings>` once per query; a reload installs a new
/// snapshot without touching the ones already handed out.
pub struct SettingsStore {
    current: ArcSwap<Settings>,
    source: Option<PathBuf>,
}

impl SettingsStore {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            current: ArcSwap::from_pointee(settings),
            source: None,
        }
    }

    /// Load settings from a file that later [`SettingsStore::reload`] calls re-read
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let settings = Settings::from_file(&path)?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(Self {
            current: ArcSwap::from_pointee(settings),
            source: Some(path),
        })
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<Settings> {
        self.current.load_full()
    }

    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Install a new snapshot after validating it
    pub fn replace(&self, settings: Settings) -> Result<()> {
        settings.validate()?;
        self.current.store(Arc::new(settings));
        Ok(())
    }

    /// Re-read the backing file. On failure the previous snapshot stays active.
    pub fn reload(&self) -> Result<Arc<Settings>> {
        let Some(path) = self.source.as_deref() else {
            return Err(anyhow!("Settings store has no backing file to reload"));
        };
        match Settings::from_file(path) {
            Ok(settings) => {
                let settings = Arc::new(settings);
                self.current.store(Arc::clone(&settings));
                log::info!("Reloaded settings from {}", path.display());
                Ok(settings)
            }
            Err(err) => {
                log::warn!("Keeping previous settings, reload failed: {err:#}");
                Err(err)
            }
        }
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("current", &self.current.load_full())
            .field("source", &self.source)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn snapshot_survives_replace() {
        let store = SettingsStore::default();
        let before = store.snapshot();
        let updated = Settings {
            max_documents: 3,
            ..Settings::default()
        };
        store.replace(updated).unwrap();
        assert_eq!(before.max_documents, 20);
        assert_eq!(store.snapshot().max_documents, 3);
    }

    #[test]
    fn replace_rejects_invalid_settings() {
        let store = SettingsStore::default();
        let invalid = Settings {
            min_word_length: 0,
            ..Settings::default()
        };
        assert!(store.replace(invalid).is_err());
        assert_eq!(store.snapshot().min_word_length, 3);
    }

    #[test]
    fn reload_reads_file_and_keeps_old_snapshot_on_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("allcomplete.toml");
        std::fs::write(&path, "max_documents = 4\n").unwrap();

        let store = SettingsStore::from_file(&path).unwrap();
        assert_eq!(store.snapshot().max_documents, 4);

        std::fs::write(&path, "max_documents = 9\n").unwrap();
        assert_eq!(store.reload().unwrap().max_documents, 9);

        std::fs::write(&path, "max_documents = \"many\"\n").unwrap();
        assert!(store.reload().is_err());
        assert_eq!(store.snapshot().max_documents, 9);
    }

    #[test]
    fn reload_without_file_fails() {
        assert!(SettingsStore::default().reload().is_err());
    }
}
