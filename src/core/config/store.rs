use crate::core::config::data::Config;
use crate::core::persistence::{read_json, write_json, PersistenceError};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Owns the location of the settings record. Single writer; no locking.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the record, falling back to defaults when it is absent or
    /// unreadable. Failures are logged and never returned.
    pub fn load(&self) -> Config {
        match Self::load_from_path(&self.path) {
            Ok(Some(config)) => config,
            Ok(None) => Config::default(),
            Err(err) => {
                warn!(error = %err, "ignoring unreadable config; using defaults");
                Config::default()
            }
        }
    }

    /// Strict variant of [`ConfigStore::load`]; `Ok(None)` when the record
    /// does not exist.
    pub fn load_from_path(path: &Path) -> Result<Option<Config>, PersistenceError> {
        read_json(path)
    }

    /// Replaces the whole record.
    pub fn save(&self, config: &Config) -> Result<(), PersistenceError> {
        write_json(&self.path, config)?;
        debug!(path = %self.path.display(), "saved config");
        Ok(())
    }

    /// Writes the default record if none exists. Returns whether a record was
    /// created.
    pub fn ensure_exists(&self) -> Result<bool, PersistenceError> {
        if self.path.exists() {
            return Ok(false);
        }
        self.save(&Config::default())?;
        Ok(true)
    }
}
