//! Asset cache path resolution
//!
//! Maps an asset name plus its publisher/category folder to the cached package
//! file on disk. The cache root differs per platform:
//!
//! - Linux / macOS: `<home>/.var/app/com.unity.UnityHub/data/unity3d/Asset Store-5.x`
//! - otherwise: `<override or <app-data>/Unity>/Asset Store-5.x`, where the
//!   override comes from the [`CACHE_ROOT_OVERRIDE_KEY`] preference
//!
//! Nothing is cached between calls: the preference and the filesystem are
//! consulted on every [`PathResolver::resolve`].

use crate::error::{Result, SetupError};
use crate::preferences::{CACHE_ROOT_OVERRIDE_KEY, PreferenceSource};
use crate::types::HostPlatform;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Cache location relative to the home directory on Unix-like hosts
pub const UNIX_CACHE_SUBPATH: &str = ".var/app/com.unity.UnityHub/data/unity3d/Asset Store-5.x";

/// Versioned cache folder under the configurable root
pub const CACHE_FOLDER_NAME: &str = "Asset Store-5.x";

/// Host facts the resolver depends on.
///
/// Detected once with [`HostEnvironment::detect`]; tests build it by hand to
/// exercise either platform branch on any machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnvironment {
    pub platform: HostPlatform,
    pub home_dir: PathBuf,
    pub app_data_dir: PathBuf,
}

impl HostEnvironment {
    pub fn detect() -> Result<Self> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| SetupError::config("Could not determine home directory"))?;
        // Roaming AppData on Windows, XDG/Library dirs elsewhere
        let app_data_dir = dirs::config_dir().unwrap_or_else(|| home_dir.clone());

        Ok(Self {
            platform: HostPlatform::current(),
            home_dir,
            app_data_dir,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PathResolver {
    host: HostEnvironment,
    preferences: PreferenceSource,
    extension: String,
}

impl PathResolver {
    pub fn new(host: HostEnvironment, preferences: PreferenceSource, extension: impl Into<String>) -> Self {
        Self {
            host,
            preferences,
            extension: extension.into(),
        }
    }

    /// Cache root for the current host and preference values
    pub fn cache_root(&self) -> Result<PathBuf> {
        if self.host.platform.is_unix_like() {
            return Ok(self.host.home_dir.join(UNIX_CACHE_SUBPATH));
        }

        let default_root = self.host.app_data_dir.join("Unity");
        let prefs = self.preferences.snapshot()?;
        let root = match prefs.get(CACHE_ROOT_OVERRIDE_KEY) {
            Some(over) if !over.trim().is_empty() => PathBuf::from(over),
            _ => default_root,
        };
        Ok(root.join(CACHE_FOLDER_NAME))
    }

    /// Candidate path for an asset, whether or not it exists
    pub fn candidate(&self, asset_name: &str, category: &str) -> Result<PathBuf> {
        let file_name = with_extension(asset_name, &self.extension);
        Ok(self.cache_root()?.join(category).join(file_name))
    }

    /// Resolve an asset to an existing package file.
    ///
    /// Returns [`SetupError::NotFound`] when the candidate file is absent.
    pub fn resolve(&self, asset_name: &str, category: &str) -> Result<PathBuf> {
        let path = self.candidate(asset_name, category)?;
        debug!("Resolved asset {:?} ({}) to {}", asset_name, category, path.display());

        if !path.is_file() {
            return Err(SetupError::not_found(path));
        }
        Ok(path)
    }
}

fn with_extension(asset_name: &str, extension: &str) -> String {
    if asset_name.ends_with(extension) {
        asset_name.to_string()
    } else {
        format!("{asset_name}{extension}")
    }
}

/// True if `path` exists as a regular file
pub(crate) fn package_exists(path: &Path) -> bool {
    path.is_file()
}
