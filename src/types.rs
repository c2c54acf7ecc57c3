//! Shared value types for projsetup
//!
//! Identifiers and layout entries are newtypes / small structs rather than bare
//! strings so the install queue and the orchestrator cannot mix them up.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};

/// Opaque token naming an installable package (git URL, `name@version`, ...).
///
/// Immutable once created. No uniqueness is implied: the same identifier may be
/// queued twice and is then installed twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageIdentifier(String);

impl PackageIdentifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PackageIdentifier {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PackageIdentifier {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Host platform family, as far as cache-path resolution cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum HostPlatform {
    Linux,
    #[strum(serialize = "macos")]
    MacOs,
    Windows,
}

impl HostPlatform {
    /// Platform of the running binary
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(windows) {
            Self::Windows
        } else {
            Self::Linux
        }
    }

    /// Unix-like hosts keep the asset cache under the home directory
    pub const fn is_unix_like(self) -> bool {
        matches!(self, Self::Linux | Self::MacOs)
    }
}

/// A cached asset package to import: file name plus publisher/category folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSpec {
    pub name: String,
    pub category: String,
}

impl AssetSpec {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
        }
    }
}

/// A single asset file to relocate inside the `Assets/` tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRelocation {
    pub from: String,
    pub to: String,
}
