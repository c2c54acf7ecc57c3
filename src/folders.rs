//! Project folder organization
//!
//! All paths are `/`-separated and relative to the project's `Assets/` folder.
//! Every operation is guarded by an existence check so the whole plan can be
//! re-run safely:
//!
//! - creating an existing folder is a no-op
//! - moving or deleting a missing folder is a no-op
//! - move/delete failures for any other reason are logged, never raised

use crate::error::{Result, SetupError};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error, info};

/// Virtual view of the project's asset tree
pub trait AssetDatabase {
    fn is_valid_folder(&self, path: &str) -> bool;

    fn is_asset_file(&self, path: &str) -> bool;

    /// Create `path` and its missing parents; returns true if anything was created
    fn create_folder_all(&mut self, path: &str) -> Result<bool>;

    fn move_asset(&mut self, from: &str, to: &str) -> Result<()>;

    fn delete_asset(&mut self, path: &str) -> Result<()>;

    /// Re-scan the tree after a batch of changes
    fn refresh(&mut self);
}

/// [`AssetDatabase`] backed by the real filesystem.
///
/// `.meta` sidecar files travel with the asset they describe.
#[derive(Debug, Clone)]
pub struct LocalAssetDatabase {
    assets_root: PathBuf,
}

impl LocalAssetDatabase {
    /// Database over `<project_root>/Assets`
    pub fn for_project(project_root: &Path) -> Self {
        Self {
            assets_root: project_root.join("Assets"),
        }
    }

    /// Filesystem path for an asset path; `None` if it would leave `Assets/`
    fn full_path(&self, path: &str) -> Option<PathBuf> {
        if !is_contained(path) {
            return None;
        }
        Some(
            path.split('/')
                .filter(|part| !part.is_empty())
                .fold(self.assets_root.clone(), |acc, part| acc.join(part)),
        )
    }

    fn checked_path(&self, path: &str) -> Result<PathBuf> {
        self.full_path(path)
            .ok_or_else(|| SetupError::config(format!("Asset path {path:?} leaves the Assets folder")))
    }
}

/// True if every `/`-separated segment of `path` is a plain name, so the
/// path cannot climb out of the folder it is joined onto
pub fn is_contained(path: &str) -> bool {
    path.split('/').filter(|part| !part.is_empty()).all(|part| {
        let mut components = Path::new(part).components();
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        )
    })
}

fn meta_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".meta");
    PathBuf::from(name)
}

impl AssetDatabase for LocalAssetDatabase {
    fn is_valid_folder(&self, path: &str) -> bool {
        self.full_path(path).is_some_and(|full| full.is_dir())
    }

    fn is_asset_file(&self, path: &str) -> bool {
        self.full_path(path).is_some_and(|full| full.is_file())
    }

    fn create_folder_all(&mut self, path: &str) -> Result<bool> {
        let full = self.checked_path(path)?;
        if full.is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(&full)?;
        Ok(true)
    }

    fn move_asset(&mut self, from: &str, to: &str) -> Result<()> {
        let source = self.checked_path(from)?;
        let target = self.checked_path(to)?;

        if !source.exists() {
            return Err(SetupError::not_found(source));
        }
        if target.exists() {
            return Err(SetupError::move_failed(
                from,
                format!("Destination path {to} already exists"),
            ));
        }
        match target.parent() {
            Some(parent) if parent.is_dir() => {}
            _ => {
                return Err(SetupError::move_failed(
                    from,
                    format!("Parent directory of {to} does not exist"),
                ));
            }
        }

        fs::rename(&source, &target).map_err(|e| SetupError::move_failed(from, e.to_string()))?;

        let source_meta = meta_path(&source);
        if source_meta.exists() {
            fs::rename(&source_meta, meta_path(&target))
                .map_err(|e| SetupError::move_failed(from, e.to_string()))?;
        }
        Ok(())
    }

    fn delete_asset(&mut self, path: &str) -> Result<()> {
        let full = self.checked_path(path)?;
        let removed = if full.is_dir() {
            fs::remove_dir_all(&full)
        } else {
            fs::remove_file(&full)
        };
        removed.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SetupError::not_found(&full),
            _ => SetupError::delete_failed(path, e.to_string()),
        })?;

        let meta = meta_path(&full);
        if meta.exists() {
            fs::remove_file(&meta).map_err(|e| SetupError::delete_failed(path, e.to_string()))?;
        }
        Ok(())
    }

    fn refresh(&mut self) {
        debug!("Asset database refreshed: {}", self.assets_root.display());
    }
}

/// What a guarded folder operation ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderOutcome {
    /// The change was made
    Applied,
    /// Precondition already satisfied, nothing to do
    Skipped,
    /// The change was attempted and failed; already logged
    Failed(String),
}

pub struct FolderOrganizer<D: AssetDatabase> {
    db: D,
}

impl<D: AssetDatabase> FolderOrganizer<D> {
    pub fn new(db: D) -> Self {
        Self { db }
    }

    /// Create `root` and every `/`-separated path under it.
    ///
    /// Intermediate folders are created as needed. Filesystem errors are
    /// returned to the caller.
    pub fn create_tree<S: AsRef<str>>(
        &mut self,
        root: &str,
        relative_paths: &[S],
    ) -> Result<FolderOutcome> {
        let mut created = self.db.create_folder_all(root)?;

        for relative in relative_paths {
            let mut current = root.to_string();
            for part in relative.as_ref().split('/').filter(|p| !p.is_empty()) {
                current = format!("{current}/{part}");
                created |= self.db.create_folder_all(&current)?;
            }
        }

        if created {
            info!("Created folder tree under {}", root);
            Ok(FolderOutcome::Applied)
        } else {
            Ok(FolderOutcome::Skipped)
        }
    }

    /// Move the top-level folder `name` under `new_parent`, if it exists
    pub fn move_folder(&mut self, new_parent: &str, name: &str) -> FolderOutcome {
        if !self.db.is_valid_folder(name) {
            debug!("Folder {} not present, skipping move", name);
            return FolderOutcome::Skipped;
        }
        self.guarded_move(name, &format!("{new_parent}/{name}"))
    }

    /// Delete the top-level folder `name`, if it exists
    pub fn delete_folder(&mut self, name: &str) -> FolderOutcome {
        if !self.db.is_valid_folder(name) {
            return FolderOutcome::Skipped;
        }
        self.guarded_delete(name)
    }

    /// Move a single asset file, if it exists
    pub fn move_asset(&mut self, from: &str, to: &str) -> FolderOutcome {
        if !self.db.is_asset_file(from) {
            debug!("Asset {} not present, skipping move", from);
            return FolderOutcome::Skipped;
        }
        self.guarded_move(from, to)
    }

    /// Delete a single asset file, if it exists
    pub fn delete_asset(&mut self, path: &str) -> FolderOutcome {
        if !self.db.is_asset_file(path) {
            return FolderOutcome::Skipped;
        }
        self.guarded_delete(path)
    }

    pub fn refresh(&mut self) {
        self.db.refresh();
    }

    fn guarded_move(&mut self, from: &str, to: &str) -> FolderOutcome {
        match self.db.move_asset(from, to) {
            Ok(()) => {
                info!("Moved {} to {}", from, to);
                FolderOutcome::Applied
            }
            // Gone between the check and the move
            Err(e) if e.is_not_found() => FolderOutcome::Skipped,
            Err(e) => {
                let message = match e {
                    SetupError::Move { message, .. } => message,
                    other => other.to_string(),
                };
                error!("Failed to move {}: {}", from, message);
                FolderOutcome::Failed(message)
            }
        }
    }

    fn guarded_delete(&mut self, path: &str) -> FolderOutcome {
        match self.db.delete_asset(path) {
            Ok(()) => {
                info!("Deleted {}", path);
                FolderOutcome::Applied
            }
            Err(e) if e.is_not_found() => FolderOutcome::Skipped,
            Err(e) => {
                error!("{}", e);
                FolderOutcome::Failed(e.to_string())
            }
        }
    }
}
