//! Persisted user preferences
//!
//! A flat string-to-string store kept as JSON in the user's config directory.
//! The only key the setup itself reads is [`CACHE_ROOT_OVERRIDE_KEY`]; it is
//! read fresh on every path resolution, so changes apply without a restart.

use crate::error::{Result, SetupError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Preference key holding the asset cache root override
pub const CACHE_ROOT_OVERRIDE_KEY: &str = "AssetStoreCacheRootPath";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Preferences {
    values: BTreeMap<String, String>,
}

impl Preferences {
    /// Default location: `<config_dir>/projsetup/preferences.json`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SetupError::preferences("Could not determine config directory"))?;
        Ok(config_dir.join("projsetup").join("preferences.json"))
    }

    /// Load from `path`; a missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No preferences at {}, using empty store", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let prefs = serde_json::from_str(&content).map_err(|e| {
            SetupError::preferences(format!("Invalid preferences file {}: {e}", path.display()))
        })?;
        Ok(prefs)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Remove `key`, returning its previous value
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }
}

/// Where preferences are read from at resolution time
#[derive(Debug, Clone)]
pub enum PreferenceSource {
    /// Re-read this file on every lookup
    File(PathBuf),
    /// Fixed in-memory values
    Fixed(Preferences),
}

impl PreferenceSource {
    /// Current snapshot of the preferences
    pub fn snapshot(&self) -> Result<Preferences> {
        match self {
            Self::File(path) => Preferences::load(path),
            Self::Fixed(prefs) => Ok(prefs.clone()),
        }
    }
}
