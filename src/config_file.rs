//! Configuration file handling for saving and loading setup plans.
//!
//! The defaults reproduce the built-in "essentials" plan, so running without a
//! config file gives the stock project layout.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::folders::is_contained;
use crate::install_queue::QueueTiming;
use crate::types::{AssetSpec, FileRelocation, PackageIdentifier};

/// Extension appended to asset names that lack it
pub const DEFAULT_PACKAGE_EXTENSION: &str = ".unitypackage";

/// Folder reorganization plan, applied under the project's `Assets/` tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolderLayout {
    /// Root folder every convention folder lives under
    pub root: String,
    /// `/`-separated paths created under `root`
    pub subfolders: Vec<String>,
    /// Top-level folders moved under `root`
    pub move_into_root: Vec<String>,
    /// Top-level folders removed
    pub delete: Vec<String>,
    /// Single files relocated after the folder moves
    pub relocate_files: Vec<FileRelocation>,
    /// Single files removed
    pub delete_files: Vec<String>,
}

impl Default for FolderLayout {
    fn default() -> Self {
        Self {
            root: "_Project".to_string(),
            subfolders: [
                "Animation",
                "Art",
                "Materials",
                "Prefabs",
                "Scripts/Tests",
                "Scripts/Tests/Editor",
                "Scripts/Tests/Runtime",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            move_into_root: vec!["Scenes".to_string(), "Settings".to_string()],
            delete: vec!["TutorialInfo".to_string()],
            relocate_files: vec![FileRelocation {
                from: "InputSystem_Actions.inputactions".to_string(),
                to: "_Project/Settings/InputSystem_Actions.inputactions".to_string(),
            }],
            delete_files: vec!["Readme.asset".to_string()],
        }
    }
}

/// Setup plan that can be saved/loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    /// Cached asset packages imported by `import-assets`
    pub assets: Vec<AssetSpec>,
    /// Packages installed by `install-packages`, in order
    pub packages: Vec<PackageIdentifier>,
    /// Folder plan applied by `create-folders`
    pub folders: FolderLayout,
    /// Extension of cached asset packages
    pub package_extension: String,
    /// Delay between two completion checks of one install request
    pub poll_interval_ms: u64,
    /// Delay between two install requests
    pub cooldown_ms: u64,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            assets: vec![AssetSpec::new(
                "PrimeTween High-Performance Animations and Sequences.unitypackage",
                "Kyrylo Kuzyk/Editor ExtensionsAnimation",
            )],
            packages: [
                "git+https://github.com/BinderFluids/Unity-Scriptable-Variables.git",
                "git+https://github.com/adammyhre/Unity-Utils.git",
                "git+https://github.com/adammyhre/Unity-Improved-Timers.git",
                "git+https://github.com/KyleBanks/scene-ref-attribute.git",
                "git+https://github.com/Cysharp/UniTask.git?path=src/UniTask/Assets/Plugins/UniTask",
            ]
            .into_iter()
            .map(PackageIdentifier::from)
            .collect(),
            folders: FolderLayout::default(),
            package_extension: DEFAULT_PACKAGE_EXTENSION.to_string(),
            poll_interval_ms: 10,
            cooldown_ms: 1000,
        }
    }
}

impl SetupConfig {
    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            anyhow::bail!("poll_interval_ms must be greater than zero");
        }

        if !self.package_extension.starts_with('.') || self.package_extension.len() < 2 {
            anyhow::bail!(
                "package_extension must look like \".ext\", got {:?}",
                self.package_extension
            );
        }

        for asset in &self.assets {
            if asset.name.trim().is_empty() {
                anyhow::bail!("Asset name must not be empty (category {:?})", asset.category);
            }
        }

        for package in &self.packages {
            if package.as_str().trim().is_empty() {
                anyhow::bail!("Package identifiers must not be empty");
            }
        }

        let layout = &self.folders;
        if layout.root.trim().is_empty() {
            anyhow::bail!("Folder layout root must not be empty");
        }
        let paths = std::iter::once(&layout.root)
            .chain(&layout.subfolders)
            .chain(&layout.move_into_root)
            .chain(&layout.delete)
            .chain(&layout.delete_files)
            .chain(layout.relocate_files.iter().flat_map(|r| [&r.from, &r.to]));
        for path in paths {
            if path.starts_with('/') || !is_contained(path) {
                anyhow::bail!("Folder paths must be relative and stay inside Assets/: {path}");
            }
        }

        Ok(())
    }

    /// Queue timing derived from the configured intervals
    pub fn timing(&self) -> QueueTiming {
        QueueTiming {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            cooldown: Duration::from_millis(self.cooldown_ms),
        }
    }
}
