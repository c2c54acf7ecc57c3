use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// projsetup - bootstrap a freshly generated project
#[derive(Parser, Debug)]
#[command(name = "projsetup")]
#[command(about = "Import cached asset packages, install essential packages and organize project folders")]
#[command(version)]
pub struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Setup plan to use instead of the built-in essentials
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Preferences file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub prefs: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import the essential cached asset packages
    ImportAssets,
    /// Install the essential packages, one at a time
    InstallPackages,
    /// Create the project folder layout and tidy the defaults
    CreateFolders,
    /// Run import, install and folder setup in order
    All,
    /// Write the built-in setup plan to a file for editing
    InitConfig {
        /// Destination file
        path: PathBuf,
    },
    /// Read or change persisted preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum PrefsCommands {
    /// Print a preference value
    Get {
        /// Preference key (e.g. AssetStoreCacheRootPath)
        key: String,
    },
    /// Set a preference value
    Set {
        /// Preference key
        key: String,
        /// New value
        value: String,
    },
    /// Remove a preference
    Unset {
        /// Preference key
        key: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
