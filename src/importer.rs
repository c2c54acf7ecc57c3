//! Asset package import
//!
//! [`AssetImporter`] is the gate in front of an [`ImportBackend`]: it checks
//! the package still exists, then hands it over. The shipped backend stages a
//! copy under `<project>/Packages/Imported/`, overwriting earlier imports.

use crate::error::{Result, SetupError};
use crate::path_resolver::package_exists;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Something that can take a package file and make it part of the project
pub trait ImportBackend {
    /// Import the package at `path`, which is known to exist
    fn import_package(&mut self, path: &Path) -> Result<()>;
}

/// Copies imported packages into a staging folder inside the project
#[derive(Debug, Clone)]
pub struct StagingImportBackend {
    staging_dir: PathBuf,
}

impl StagingImportBackend {
    /// Staging folder for a project rooted at `project_root`
    pub fn for_project(project_root: &Path) -> Self {
        Self {
            staging_dir: project_root.join("Packages").join("Imported"),
        }
    }
}

impl ImportBackend for StagingImportBackend {
    fn import_package(&mut self, path: &Path) -> Result<()> {
        let file_name = path
            .file_name()
            .ok_or_else(|| SetupError::not_found(path))?;

        fs::create_dir_all(&self.staging_dir)?;
        let target = self.staging_dir.join(file_name);
        fs::copy(path, &target)?;
        Ok(())
    }
}

pub struct AssetImporter<B: ImportBackend> {
    backend: B,
}

impl<B: ImportBackend> AssetImporter<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Import a resolved package path.
    ///
    /// Existence is checked again here: the file may have vanished since it
    /// was resolved.
    pub fn import(&mut self, path: &Path) -> Result<()> {
        if !package_exists(path) {
            return Err(SetupError::not_found(path));
        }

        self.backend.import_package(path)?;
        info!("Imported asset package {}", path.display());
        Ok(())
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
