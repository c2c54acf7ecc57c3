//! projsetup library
//!
//! Core functionality for bootstrapping a freshly generated project: cached
//! asset import, sequential package installation and folder organization.

pub mod cli;
pub mod config_file;
pub mod error;
pub mod folders;
pub mod importer;
pub mod install_queue;
pub mod orchestrator;
pub mod package_service;
pub mod path_resolver;
pub mod preferences;
pub mod types;

// Re-export main types for convenience
pub use config_file::{FolderLayout, SetupConfig};
pub use error::SetupError;
pub use folders::{AssetDatabase, FolderOrganizer, FolderOutcome, LocalAssetDatabase};
pub use importer::{AssetImporter, ImportBackend, StagingImportBackend};
pub use install_queue::{DrainState, InstallEvent, InstallEvents, PackageInstallQueue, QueueTiming};
pub use orchestrator::{LocalOrchestrator, SetupOrchestrator};
pub use package_service::{
    ChannelRequest, ManifestPackageService, PackageService, RequestHandle, RequestStatus,
};
pub use path_resolver::{HostEnvironment, PathResolver};
pub use preferences::{PreferenceSource, Preferences, CACHE_ROOT_OVERRIDE_KEY};
pub use types::{AssetSpec, FileRelocation, HostPlatform, PackageIdentifier};
