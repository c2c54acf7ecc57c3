//! Setup orchestration
//!
//! Runs the three setup steps against the components, in a fixed order with
//! no decisions of its own. Each step is also exposed on its own so the CLI can
//! trigger them independently.

use crate::config_file::SetupConfig;
use crate::error::Result;
use crate::folders::{AssetDatabase, FolderOrganizer, LocalAssetDatabase};
use crate::importer::{AssetImporter, ImportBackend, StagingImportBackend};
use crate::install_queue::{InstallEvent, PackageInstallQueue};
use crate::package_service::{ManifestPackageService, PackageService};
use crate::path_resolver::{HostEnvironment, PathResolver};
use crate::preferences::PreferenceSource;
use std::path::Path;
use tracing::{error, info};

/// Orchestrator wired to the local project on disk
pub type LocalOrchestrator =
    SetupOrchestrator<ManifestPackageService, StagingImportBackend, LocalAssetDatabase>;

pub struct SetupOrchestrator<S, B, D>
where
    S: PackageService + Clone,
    B: ImportBackend,
    D: AssetDatabase,
{
    config: SetupConfig,
    resolver: PathResolver,
    importer: AssetImporter<B>,
    folders: FolderOrganizer<D>,
    service: S,
}

impl LocalOrchestrator {
    /// Wire every component to the project rooted at `project_root`
    pub fn for_project(
        project_root: &Path,
        config: SetupConfig,
        host: HostEnvironment,
        preferences: PreferenceSource,
    ) -> Self {
        let resolver = PathResolver::new(host, preferences, config.package_extension.clone());
        Self::new(
            config,
            resolver,
            StagingImportBackend::for_project(project_root),
            ManifestPackageService::for_project(project_root),
            LocalAssetDatabase::for_project(project_root),
        )
    }
}

impl<S, B, D> SetupOrchestrator<S, B, D>
where
    S: PackageService + Clone,
    B: ImportBackend,
    D: AssetDatabase,
{
    pub fn new(config: SetupConfig, resolver: PathResolver, backend: B, service: S, db: D) -> Self {
        Self {
            config,
            resolver,
            importer: AssetImporter::new(backend),
            folders: FolderOrganizer::new(db),
            service,
        }
    }

    /// Import every configured asset package, stopping at the first failure.
    ///
    /// Returns how many packages were imported.
    pub fn import_assets(&mut self) -> Result<usize> {
        let mut imported = 0;
        for asset in &self.config.assets {
            let path = self.resolver.resolve(&asset.name, &asset.category)?;
            self.importer.import(&path)?;
            imported += 1;
        }
        info!("Imported {} asset package(s)", imported);
        Ok(imported)
    }

    /// Install every configured package through a fresh queue and wait for it
    /// to drain. Failures are already logged; the outcomes are returned in order.
    pub async fn install_packages(&self) -> Vec<InstallEvent> {
        let (queue, mut events) =
            PackageInstallQueue::new(self.service.clone(), self.config.timing());

        queue.submit(self.config.packages.iter().cloned());
        queue.wait_idle().await;

        let mut outcomes = Vec::with_capacity(self.config.packages.len());
        while let Ok(event) = events.try_recv() {
            outcomes.push(event);
        }
        outcomes
    }

    /// Reorganize `Assets/` into the configured layout
    pub fn create_folders(&mut self) -> Result<()> {
        let layout = &self.config.folders;

        self.folders.create_tree(&layout.root, &layout.subfolders)?;
        self.folders.refresh();

        for name in &layout.move_into_root {
            self.folders.move_folder(&layout.root, name);
        }
        for name in &layout.delete {
            self.folders.delete_folder(name);
        }
        self.folders.refresh();

        for relocation in &layout.relocate_files {
            self.folders.move_asset(&relocation.from, &relocation.to);
        }
        for path in &layout.delete_files {
            self.folders.delete_asset(path);
        }
        self.folders.refresh();

        info!("Folder layout applied under {}", layout.root);
        Ok(())
    }

    /// Run all three steps in order.
    ///
    /// An import failure is logged and the remaining steps still run; folder
    /// errors are returned.
    pub async fn run_all(&mut self) -> Result<()> {
        if let Err(e) = self.import_assets() {
            error!("Asset import stopped: {}", e);
        }

        // Each outcome was logged as it happened
        self.install_packages().await;

        self.create_folders()
    }

    pub fn importer(&self) -> &AssetImporter<B> {
        &self.importer
    }
}
